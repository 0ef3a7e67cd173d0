//! Tour Fulfillment Engine
//!
//! The fulfillment engine runs the part of the tour-booking storefront that starts when a payment gateway confirms a
//! charge and ends with the customer holding a verifiable tourist badge and a booking confirmation on every channel
//! they have enabled. It is provider-agnostic.
//!
//! The library is divided into three main sections:
//! 1. Storage ([`mod@traits`] and [`mod@sqlite`]). The traits describe what a backend must provide; SQLite is the
//!    supported backend. You should never need to access the database directly. The exception is the data types used
//!    in the database. These are defined in the [`mod@db_types`] module and are public.
//! 2. The public API ([`mod@fe_api`]). This provides the order state machine, badge issuance, invoice rendering,
//!    notification dispatch and delivery status reconciliation.
//! 3. Events ([`mod@events`]). Other components can subscribe to order confirmations and message status changes
//!    without touching the pipeline itself.
pub mod db_types;
pub mod events;
pub mod fe_api;
pub mod helpers;
pub mod message_status;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use fe_api::{
    badge_api::{BadgeApi, BadgeVerification, IssuedBadge},
    delivery_api::DeliveryApi,
    dispatch_api::DispatchApi,
    dispatch_objects,
    errors::{BadgeError, DispatchError, InvoiceError, NotificationsError, OrderFlowError, ReconcileError},
    invoice::{render_invoice, Invoice, InvoiceApi},
    notifications_api::NotificationsApi,
    order_flow_api::OrderFlowApi,
    order_objects,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{FulfillmentDatabase, FulfillmentDbError, MessagingProviders};
