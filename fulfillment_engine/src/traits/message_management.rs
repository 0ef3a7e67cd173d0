use chrono::{DateTime, Utc};

use crate::{
    db_types::{MessageStatus, NewOutboundMessage, OrderNumber, OutboundMessage},
    traits::FulfillmentDbError,
};

/// The complete set of tracking fields written by a reconciled status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: MessageStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[allow(async_fn_in_trait)]
pub trait MessageManagement {
    /// Stores a new message in the `queued` state.
    ///
    /// Fails with [`FulfillmentDbError::MessageAlreadyExists`] if a booking confirmation already exists for this order
    /// and channel.
    async fn insert_message(
        &self,
        message: NewOutboundMessage,
        now: DateTime<Utc>,
    ) -> Result<OutboundMessage, FulfillmentDbError>;

    async fn fetch_message(&self, id: i64) -> Result<Option<OutboundMessage>, FulfillmentDbError>;

    async fn fetch_message_by_provider_id(
        &self,
        provider_message_id: &str,
    ) -> Result<Option<OutboundMessage>, FulfillmentDbError>;

    async fn fetch_messages_for_order(
        &self,
        order_number: &OrderNumber,
    ) -> Result<Vec<OutboundMessage>, FulfillmentDbError>;

    /// Records a successful send attempt: `queued`/`failed` → `sent`, storing the provider id and clearing any error.
    /// Returns `None` if the message has already moved past those states.
    async fn record_send_success(
        &self,
        id: i64,
        provider_message_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<OutboundMessage>, FulfillmentDbError>;

    /// Records a failed send attempt: `queued`/`failed` → `failed` with the error detail.
    /// Returns `None` if the message has already moved past those states.
    async fn record_send_failure(
        &self,
        id: i64,
        error_code: &str,
        error_message: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OutboundMessage>, FulfillmentDbError>;

    /// Applies `update` only if the message status is still `expected`. Returns `None` if the status changed in the
    /// meantime (or the message does not exist).
    async fn compare_and_set_status(
        &self,
        id: i64,
        expected: MessageStatus,
        update: StatusUpdate,
    ) -> Result<Option<OutboundMessage>, FulfillmentDbError>;

    /// Messages in `queued` or `failed` state, last touched before `older_than`, with fewer than `max_attempts`
    /// send attempts and not scheduled for later than `now`.
    async fn fetch_retryable_messages(
        &self,
        older_than: DateTime<Utc>,
        max_attempts: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<OutboundMessage>, FulfillmentDbError>;
}
