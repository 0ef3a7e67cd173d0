use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::db_types::NotificationPreference;

pub async fn fetch_preference(
    customer_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<NotificationPreference>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM notification_preferences WHERE customer_id = $1")
        .bind(customer_id)
        .fetch_optional(conn)
        .await
}

pub async fn upsert_preference(
    customer_id: &str,
    sms_enabled: bool,
    whatsapp_enabled: bool,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<NotificationPreference, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO notification_preferences (customer_id, sms_enabled, whatsapp_enabled, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (customer_id) DO UPDATE SET
                sms_enabled = excluded.sms_enabled,
                whatsapp_enabled = excluded.whatsapp_enabled,
                updated_at = excluded.updated_at
            RETURNING *;
        "#,
    )
    .bind(customer_id)
    .bind(sms_enabled)
    .bind(whatsapp_enabled)
    .bind(now)
    .fetch_one(conn)
    .await
}
