use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{Notification, NotificationPreference},
    fe_api::errors::NotificationsError,
    traits::NotificationManagement,
};

/// The recipient's view of their in-app notifications and channel preferences.
pub struct NotificationsApi<B> {
    db: B,
}

impl<B> Debug for NotificationsApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NotificationsApi")
    }
}

impl<B> NotificationsApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B: NotificationManagement> NotificationsApi<B> {
    /// Newest first.
    pub async fn list(&self, recipient_id: &str, unread_only: bool) -> Result<Vec<Notification>, NotificationsError> {
        let notifications = self.db.fetch_notifications_for_recipient(recipient_id, unread_only).await?;
        Ok(notifications)
    }

    /// Marks one notification read. Recipients can only mark their own notifications.
    pub async fn mark_read(&self, id: i64, recipient_id: &str) -> Result<Notification, NotificationsError> {
        self.db.mark_notification_read(id, recipient_id).await?.ok_or(NotificationsError::NotificationNotFound(id))
    }

    pub async fn mark_all_read(&self, recipient_id: &str) -> Result<u64, NotificationsError> {
        let count = self.db.mark_all_notifications_read(recipient_id).await?;
        debug!("🔔️ {count} notifications marked read for {recipient_id}");
        Ok(count)
    }

    /// The stored preference, or the everything-enabled default.
    pub async fn get_preference(&self, customer_id: &str) -> Result<NotificationPreference, NotificationsError> {
        let pref = self.db.fetch_preference(customer_id).await?;
        Ok(pref.unwrap_or_else(|| NotificationPreference::all_enabled(customer_id)))
    }

    pub async fn set_preference(
        &self,
        customer_id: &str,
        sms_enabled: bool,
        whatsapp_enabled: bool,
    ) -> Result<NotificationPreference, NotificationsError> {
        let pref = self.db.upsert_preference(customer_id, sms_enabled, whatsapp_enabled, Utc::now()).await?;
        info!("🔔️ Preferences for {customer_id} updated. SMS: {sms_enabled}, WhatsApp: {whatsapp_enabled}");
        Ok(pref)
    }
}
