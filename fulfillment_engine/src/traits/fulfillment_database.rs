use thiserror::Error;

use crate::{
    db_types::OrderNumber,
    traits::{BadgeManagement, MessageManagement, NotificationManagement, OrderManagement},
};

/// This trait defines the highest level of behaviour for backends supporting the fulfillment engine.
///
/// A backend must be cheap to clone (typically a handle to a connection pool), since every API object holds its own
/// copy.
pub trait FulfillmentDatabase:
    Clone + OrderManagement + BadgeManagement + MessageManagement + NotificationManagement
{
    /// The URL of the database
    fn url(&self) -> &str;
}

#[derive(Debug, Clone, Error)]
pub enum FulfillmentDbError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("The requested badge {0} does not exist")]
    BadgeNotFound(String),
    #[error("Badge code {0} is already in use")]
    DuplicateBadgeCode(String),
    #[error("Order {0} already has an active badge")]
    BadgeAlreadyExists(OrderNumber),
    #[error("The requested message (id {0}) does not exist")]
    MessageNotFound(i64),
    #[error("A {message_type} {channel} message already exists for order {order_number}")]
    MessageAlreadyExists { order_number: OrderNumber, channel: String, message_type: String },
    #[error("A {notification_type} notification already exists for order {order_number}")]
    NotificationAlreadyExists { order_number: OrderNumber, notification_type: String },
    #[error("Provider message id {0} is already assigned to another message")]
    DuplicateProviderMessageId(String),
    #[error("A stored record could not be read. {0}")]
    CorruptRecord(String),
}

impl FulfillmentDbError {
    /// True for the idempotency collisions that callers absorb as "already handled".
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            Self::DuplicateBadgeCode(_) |
                Self::BadgeAlreadyExists(_) |
                Self::MessageAlreadyExists { .. } |
                Self::NotificationAlreadyExists { .. } |
                Self::DuplicateProviderMessageId(_)
        )
    }
}

impl From<sqlx::Error> for FulfillmentDbError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Decode(e) => FulfillmentDbError::CorruptRecord(e.to_string()),
            sqlx::Error::ColumnDecode { index, source } => {
                FulfillmentDbError::CorruptRecord(format!("column {index}: {source}"))
            },
            e => FulfillmentDbError::DatabaseError(e.to_string()),
        }
    }
}
