use chrono::{DateTime, Utc};

use crate::{
    db_types::{NewNotification, Notification, NotificationPreference, OrderNumber},
    traits::FulfillmentDbError,
};

#[allow(async_fn_in_trait)]
pub trait NotificationManagement {
    /// Fails with [`FulfillmentDbError::NotificationAlreadyExists`] if a notification of the same type is already linked
    /// to the order.
    async fn insert_notification(
        &self,
        notification: NewNotification,
        now: DateTime<Utc>,
    ) -> Result<Notification, FulfillmentDbError>;

    async fn fetch_notifications_for_recipient(
        &self,
        recipient_id: &str,
        unread_only: bool,
    ) -> Result<Vec<Notification>, FulfillmentDbError>;

    async fn fetch_notifications_for_order(
        &self,
        order_number: &OrderNumber,
    ) -> Result<Vec<Notification>, FulfillmentDbError>;

    /// Marks a single notification as read. Only the recipient may do this, so `None` is returned if the notification
    /// does not exist or belongs to someone else.
    async fn mark_notification_read(
        &self,
        id: i64,
        recipient_id: &str,
    ) -> Result<Option<Notification>, FulfillmentDbError>;

    /// Returns the number of notifications that were changed.
    async fn mark_all_notifications_read(&self, recipient_id: &str) -> Result<u64, FulfillmentDbError>;

    async fn fetch_preference(&self, customer_id: &str) -> Result<Option<NotificationPreference>, FulfillmentDbError>;

    async fn upsert_preference(
        &self,
        customer_id: &str,
        sms_enabled: bool,
        whatsapp_enabled: bool,
        now: DateTime<Utc>,
    ) -> Result<NotificationPreference, FulfillmentDbError>;
}
