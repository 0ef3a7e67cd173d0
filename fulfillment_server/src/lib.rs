//! # Tour fulfillment server
//! This crate hosts the HTTP front end for the fulfillment engine. It is responsible for:
//! * Receiving payment confirmations from the payment gateway and driving the order state machine with them.
//! * Receiving delivery reports from the SMS and WhatsApp providers.
//! * Serving orders, invoices, badges and notifications to customers and administrators.
//! * Periodically retrying booking confirmations that could not be delivered.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/payment/callback`, `/payment/status`: Signed payment gateway webhooks.
//! * `/callbacks/sms`, `/callbacks/whatsapp`: Signed delivery status callbacks.
//! * `/api/...`: Order, badge, notification and preference routes. See [routes](routes/index.html).
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod retry_worker;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
