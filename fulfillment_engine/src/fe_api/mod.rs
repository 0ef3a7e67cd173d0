//! # Fulfillment engine public API
//!
//! The `fe_api` module exposes the programmatic API for the fulfillment pipeline. Each API object wraps a database
//! backend (and, where it sends messages, the messaging providers), so callers only construct the pieces they need.
//!
//! * [`order_flow_api`] owns the order and payment transitions and triggers the confirmation side effects.
//! * [`badge_api`] issues, verifies and revokes tourist badges.
//! * [`invoice`] renders invoices from stored orders.
//! * [`dispatch_api`] sends booking confirmations on every enabled channel, and re-sends stale messages.
//! * [`delivery_api`] reconciles provider delivery callbacks against the queued messages.
//! * [`notifications_api`] is the customer's view of in-app notifications and channel preferences.
//!
//! # API usage
//!
//! ```rust,ignore
//! use fulfillment_engine::{events::EventProducers, BadgeApi, DispatchApi, OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let badges = BadgeApi::new(db.clone());
//! let dispatcher = DispatchApi::new(db.clone(), providers, EventProducers::default());
//! let api = OrderFlowApi::new(db, badges, dispatcher, EventProducers::default());
//! let result = api.record_payment_success(&order_number, PaymentDetails::default()).await?;
//! ```
pub mod badge_api;
pub mod delivery_api;
pub mod dispatch_api;
pub mod dispatch_objects;
pub mod errors;
pub mod invoice;
pub mod notifications_api;
pub mod order_flow_api;
pub mod order_objects;
