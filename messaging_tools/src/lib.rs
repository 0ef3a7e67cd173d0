//! Clients for the external messaging providers, and the shapes of the delivery callbacks they post back.
//!
//! The SMS provider speaks a form-encoded REST API with basic auth; the WhatsApp provider speaks the Cloud API JSON
//! dialect with a bearer token. Neither client retries: a failed send is reported to the caller, who owns the retry
//! policy.
mod config;
mod data_objects;
mod error;
mod sms;
mod whatsapp;

pub use config::{SmsConfig, WhatsAppConfig};
pub use data_objects::{SmsStatusCallback, WhatsAppStatusUpdate, WhatsAppWebhook};
pub use error::MessagingApiError;
pub use sms::SmsApi;
pub use whatsapp::WhatsAppApi;
