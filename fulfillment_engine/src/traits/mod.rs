//! #  Storage and collaborator contracts.
//!
//! This module defines the interfaces that a fulfillment database *backend* must expose, plus the contracts for the
//! external collaborators the engine calls out to (messaging providers and the badge code renderer).
//!
//! ## Storage
//! * [`OrderManagement`] stores orders and applies payment and lifecycle transitions as single atomic writes.
//! * [`BadgeManagement`] persists tourist badges. The unique constraints on the badge code and on the active badge for
//!   an order are the authoritative idempotency guards for badge issuance.
//! * [`MessageManagement`] tracks outbound SMS and WhatsApp messages and their delivery status.
//! * [`NotificationManagement`] stores in-app notifications and per-customer channel preferences.
//! * [`FulfillmentDatabase`] ties them together into a single backend.
//!
//! ## Collaborators
//! * [`MessagingProviders`] sends a message body to a recipient on an external channel.
//! * [`CodeRenderer`] renders arbitrary text into a scannable image artifact.
mod badge_management;
mod code_renderer;
mod fulfillment_database;
mod message_management;
mod message_sender;
mod notification_management;
mod order_management;

pub use badge_management::BadgeManagement;
pub use code_renderer::{CodeRenderError, CodeRenderer, RenderedCode};
pub use fulfillment_database::{FulfillmentDatabase, FulfillmentDbError};
pub use message_management::{MessageManagement, StatusUpdate};
pub use message_sender::{MessagingProviders, SendError, SendReceipt};
pub use notification_management::NotificationManagement;
pub use order_management::OrderManagement;
