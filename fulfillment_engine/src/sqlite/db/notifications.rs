use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewNotification, Notification, OrderNumber},
    traits::FulfillmentDbError,
};

/// Stores an in-app notification. Notifications linked to an order are unique per type, so re-running a transition
/// does not notify twice.
pub async fn insert_notification(
    notification: NewNotification,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Notification, FulfillmentDbError> {
    let NewNotification { recipient_id, notification_type, title, message, order_number } = notification;
    let inserted = sqlx::query_as(
        r#"
            INSERT INTO notifications (recipient_id, notification_type, title, message, order_number, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(recipient_id)
    .bind(notification_type.as_str())
    .bind(title)
    .bind(message)
    .bind(order_number.as_ref().map(|o| o.as_str()))
    .bind(now)
    .fetch_optional(conn)
    .await?;
    inserted.ok_or_else(|| FulfillmentDbError::NotificationAlreadyExists {
        order_number: order_number.unwrap_or_else(|| OrderNumber::from("")),
        notification_type,
    })
}

pub async fn fetch_notifications_for_recipient(
    recipient_id: &str,
    unread_only: bool,
    conn: &mut SqliteConnection,
) -> Result<Vec<Notification>, sqlx::Error> {
    let sql = if unread_only {
        "SELECT * FROM notifications WHERE recipient_id = $1 AND is_read = FALSE ORDER BY id DESC"
    } else {
        "SELECT * FROM notifications WHERE recipient_id = $1 ORDER BY id DESC"
    };
    sqlx::query_as(sql).bind(recipient_id).fetch_all(conn).await
}

pub async fn fetch_notifications_for_order(
    order_number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Vec<Notification>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM notifications WHERE order_number = $1 ORDER BY id")
        .bind(order_number.as_str())
        .fetch_all(conn)
        .await
}

pub async fn mark_read(
    id: i64,
    recipient_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Notification>, sqlx::Error> {
    sqlx::query_as("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND recipient_id = $2 RETURNING *")
        .bind(id)
        .bind(recipient_id)
        .fetch_optional(conn)
        .await
}

pub async fn mark_all_read(recipient_id: &str, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE recipient_id = $1 AND is_read = FALSE")
        .bind(recipient_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
