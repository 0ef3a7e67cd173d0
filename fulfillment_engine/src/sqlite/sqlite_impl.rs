//! `SqliteDatabase` is a concrete implementation of a fulfillment engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqlitePool;

use super::db::{badges, db_url, messages, new_pool, notifications, orders, preferences};
use crate::{
    db_types::{
        MessageStatus,
        NewBadge,
        NewNotification,
        NewOrder,
        NewOutboundMessage,
        Notification,
        NotificationPreference,
        Order,
        OrderNumber,
        OutboundMessage,
        PaymentDetails,
        PaymentStatus,
        TouristBadge,
    },
    traits::{
        BadgeManagement,
        FulfillmentDatabase,
        FulfillmentDbError,
        MessageManagement,
        NotificationManagement,
        OrderManagement,
        StatusUpdate,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl FulfillmentDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, order_number: &OrderNumber) -> Result<Option<Order>, FulfillmentDbError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_number, &mut conn).await?;
        Ok(order)
    }

    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), FulfillmentDbError> {
        let mut conn = self.pool.acquire().await?;
        let result = orders::idempotent_insert(order, Utc::now(), &mut conn).await?;
        Ok(result)
    }

    async fn confirm_payment(
        &self,
        order_number: &OrderNumber,
        details: &PaymentDetails,
        now: DateTime<Utc>,
    ) -> Result<Option<Order>, FulfillmentDbError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::confirm_payment(order_number, details, now, &mut conn).await?;
        if let Some(o) = &order {
            debug!("🗃️ Order {order_number} payment is now {} and order status is {}", o.payment_status, o.status);
        }
        Ok(order)
    }

    async fn update_payment_status(
        &self,
        order_number: &OrderNumber,
        status: PaymentStatus,
        details: &PaymentDetails,
        now: DateTime<Utc>,
    ) -> Result<Option<Order>, FulfillmentDbError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::update_payment_status(order_number, status, details, now, &mut conn).await?;
        Ok(order)
    }

    /// Cancels the order and revokes its active badge (if any) in one transaction, so a cancelled order can never be
    /// left holding a valid badge.
    async fn cancel_order(
        &self,
        order_number: &OrderNumber,
        actor: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<(Order, Option<TouristBadge>)>, FulfillmentDbError> {
        let mut tx = self.pool.begin().await?;
        let order = match orders::cancel_order(order_number, now, &mut tx).await? {
            Some(o) => o,
            None => {
                tx.rollback().await?;
                return Ok(None);
            },
        };
        let badge = badges::revoke_active_badge_for_order(order_number, actor, reason, now, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Order {order_number} cancelled by {actor}. {}",
            badge.as_ref().map(|b| format!("Badge {} revoked.", b.badge_code)).unwrap_or_else(|| "No active badge.".into())
        );
        Ok(Some((order, badge)))
    }
}

impl BadgeManagement for SqliteDatabase {
    async fn insert_badge(&self, badge: NewBadge) -> Result<TouristBadge, FulfillmentDbError> {
        let mut conn = self.pool.acquire().await?;
        badges::insert_badge(badge, Utc::now(), &mut conn).await
    }

    async fn fetch_badge_by_code(&self, code: &str) -> Result<Option<TouristBadge>, FulfillmentDbError> {
        let mut conn = self.pool.acquire().await?;
        let badge = badges::fetch_badge_by_code(code, &mut conn).await?;
        Ok(badge)
    }

    async fn fetch_active_badge_for_order(
        &self,
        order_number: &OrderNumber,
    ) -> Result<Option<TouristBadge>, FulfillmentDbError> {
        let mut conn = self.pool.acquire().await?;
        let badge = badges::fetch_active_badge_for_order(order_number, &mut conn).await?;
        Ok(badge)
    }

    async fn fetch_badges_for_order(
        &self,
        order_number: &OrderNumber,
    ) -> Result<Vec<TouristBadge>, FulfillmentDbError> {
        let mut conn = self.pool.acquire().await?;
        let result = badges::fetch_badges_for_order(order_number, &mut conn).await?;
        Ok(result)
    }

    async fn revoke_badge(
        &self,
        code: &str,
        actor: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<TouristBadge>, FulfillmentDbError> {
        let mut conn = self.pool.acquire().await?;
        let badge = badges::revoke_badge(code, actor, reason, now, &mut conn).await?;
        Ok(badge)
    }
}

impl MessageManagement for SqliteDatabase {
    async fn insert_message(
        &self,
        message: NewOutboundMessage,
        now: DateTime<Utc>,
    ) -> Result<OutboundMessage, FulfillmentDbError> {
        let mut conn = self.pool.acquire().await?;
        messages::insert_message(message, now, &mut conn).await
    }

    async fn fetch_message(&self, id: i64) -> Result<Option<OutboundMessage>, FulfillmentDbError> {
        let mut conn = self.pool.acquire().await?;
        let message = messages::fetch_message(id, &mut conn).await?;
        Ok(message)
    }

    async fn fetch_message_by_provider_id(
        &self,
        provider_message_id: &str,
    ) -> Result<Option<OutboundMessage>, FulfillmentDbError> {
        let mut conn = self.pool.acquire().await?;
        let message = messages::fetch_message_by_provider_id(provider_message_id, &mut conn).await?;
        Ok(message)
    }

    async fn fetch_messages_for_order(
        &self,
        order_number: &OrderNumber,
    ) -> Result<Vec<OutboundMessage>, FulfillmentDbError> {
        let mut conn = self.pool.acquire().await?;
        let result = messages::fetch_messages_for_order(order_number, &mut conn).await?;
        Ok(result)
    }

    async fn record_send_success(
        &self,
        id: i64,
        provider_message_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<OutboundMessage>, FulfillmentDbError> {
        let mut conn = self.pool.acquire().await?;
        messages::record_send_success(id, provider_message_id, now, &mut conn).await
    }

    async fn record_send_failure(
        &self,
        id: i64,
        error_code: &str,
        error_message: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OutboundMessage>, FulfillmentDbError> {
        let mut conn = self.pool.acquire().await?;
        let message = messages::record_send_failure(id, error_code, error_message, now, &mut conn).await?;
        Ok(message)
    }

    async fn compare_and_set_status(
        &self,
        id: i64,
        expected: MessageStatus,
        update: StatusUpdate,
    ) -> Result<Option<OutboundMessage>, FulfillmentDbError> {
        let mut conn = self.pool.acquire().await?;
        let message = messages::compare_and_set_status(id, expected, update, &mut conn).await?;
        Ok(message)
    }

    async fn fetch_retryable_messages(
        &self,
        older_than: DateTime<Utc>,
        max_attempts: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<OutboundMessage>, FulfillmentDbError> {
        let mut conn = self.pool.acquire().await?;
        let result = messages::fetch_retryable_messages(older_than, max_attempts, now, &mut conn).await?;
        trace!("🗃️ {} messages are eligible for a retry", result.len());
        Ok(result)
    }
}

impl NotificationManagement for SqliteDatabase {
    async fn insert_notification(
        &self,
        notification: NewNotification,
        now: DateTime<Utc>,
    ) -> Result<Notification, FulfillmentDbError> {
        let mut conn = self.pool.acquire().await?;
        notifications::insert_notification(notification, now, &mut conn).await
    }

    async fn fetch_notifications_for_recipient(
        &self,
        recipient_id: &str,
        unread_only: bool,
    ) -> Result<Vec<Notification>, FulfillmentDbError> {
        let mut conn = self.pool.acquire().await?;
        let result = notifications::fetch_notifications_for_recipient(recipient_id, unread_only, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_notifications_for_order(
        &self,
        order_number: &OrderNumber,
    ) -> Result<Vec<Notification>, FulfillmentDbError> {
        let mut conn = self.pool.acquire().await?;
        let result = notifications::fetch_notifications_for_order(order_number, &mut conn).await?;
        Ok(result)
    }

    async fn mark_notification_read(
        &self,
        id: i64,
        recipient_id: &str,
    ) -> Result<Option<Notification>, FulfillmentDbError> {
        let mut conn = self.pool.acquire().await?;
        let result = notifications::mark_read(id, recipient_id, &mut conn).await?;
        Ok(result)
    }

    async fn mark_all_notifications_read(&self, recipient_id: &str) -> Result<u64, FulfillmentDbError> {
        let mut conn = self.pool.acquire().await?;
        let count = notifications::mark_all_read(recipient_id, &mut conn).await?;
        Ok(count)
    }

    async fn fetch_preference(&self, customer_id: &str) -> Result<Option<NotificationPreference>, FulfillmentDbError> {
        let mut conn = self.pool.acquire().await?;
        let pref = preferences::fetch_preference(customer_id, &mut conn).await?;
        Ok(pref)
    }

    async fn upsert_preference(
        &self,
        customer_id: &str,
        sms_enabled: bool,
        whatsapp_enabled: bool,
        now: DateTime<Utc>,
    ) -> Result<NotificationPreference, FulfillmentDbError> {
        let mut conn = self.pool.acquire().await?;
        let pref = preferences::upsert_preference(customer_id, sms_enabled, whatsapp_enabled, now, &mut conn).await?;
        Ok(pref)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using `TFS_DATABASE_URL` (or the default URL).
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }
}
