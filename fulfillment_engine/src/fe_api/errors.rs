use thiserror::Error;

use crate::{
    db_types::{InvalidStatus, OrderNumber},
    traits::FulfillmentDbError,
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("Invalid status. {0}")]
    InvalidStatus(String),
    #[error("Invalid order. {0}")]
    InvalidOrder(String),
}

impl From<FulfillmentDbError> for OrderFlowError {
    fn from(e: FulfillmentDbError) -> Self {
        match e {
            FulfillmentDbError::OrderNotFound(n) => Self::OrderNotFound(n),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

impl From<InvalidStatus> for OrderFlowError {
    fn from(e: InvalidStatus) -> Self {
        Self::InvalidStatus(e.0)
    }
}

#[derive(Debug, Clone, Error)]
pub enum BadgeError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("Order {0} is not confirmed, so no badge can be issued for it")]
    OrderNotConfirmed(OrderNumber),
    #[error("Order {order_number} already has a badge ({code})")]
    AlreadyExists { order_number: OrderNumber, code: String },
    #[error("Badge code {0} collided with an existing badge")]
    DuplicateCode(String),
    #[error("Badge {0} does not exist")]
    BadgeNotFound(String),
    #[error("Badge {0} has already been revoked")]
    AlreadyRevoked(String),
    #[error("A reason is required to revoke a badge")]
    MissingReason,
    #[error("Could not render the badge code. {0}")]
    RenderError(String),
}

impl From<FulfillmentDbError> for BadgeError {
    fn from(e: FulfillmentDbError) -> Self {
        match e {
            FulfillmentDbError::OrderNotFound(n) => Self::OrderNotFound(n),
            FulfillmentDbError::BadgeNotFound(code) => Self::BadgeNotFound(code),
            FulfillmentDbError::DuplicateBadgeCode(code) => Self::DuplicateCode(code),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum InvoiceError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("There is no invoice template for locale '{0}'")]
    UnsupportedLocale(String),
}

impl From<FulfillmentDbError> for InvoiceError {
    fn from(e: FulfillmentDbError) -> Self {
        match e {
            FulfillmentDbError::OrderNotFound(n) => Self::OrderNotFound(n),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

/// Errors that abort a dispatch or retry run as a whole. Failures on a single channel are never raised; they are
/// recorded on the message and reported in the [`crate::fe_api::dispatch_objects::DispatchReport`].
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderNumber),
}

impl From<FulfillmentDbError> for DispatchError {
    fn from(e: FulfillmentDbError) -> Self {
        match e {
            FulfillmentDbError::OrderNotFound(n) => Self::OrderNotFound(n),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid status. {0}")]
    InvalidStatus(String),
    #[error("Message #{0} kept changing underneath the reconciler. Giving up.")]
    Contention(i64),
}

impl From<FulfillmentDbError> for ReconcileError {
    fn from(e: FulfillmentDbError) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

impl From<InvalidStatus> for ReconcileError {
    fn from(e: InvalidStatus) -> Self {
        Self::InvalidStatus(e.0)
    }
}

#[derive(Debug, Clone, Error)]
pub enum NotificationsError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Notification #{0} does not exist")]
    NotificationNotFound(i64),
}

impl From<FulfillmentDbError> for NotificationsError {
    fn from(e: FulfillmentDbError) -> Self {
        Self::DatabaseError(e.to_string())
    }
}
