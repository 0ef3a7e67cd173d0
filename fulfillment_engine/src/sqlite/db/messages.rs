use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::SqliteConnection;

use super::unique_violation;
use crate::{
    db_types::{MessageStatus, NewOutboundMessage, OrderNumber, OutboundMessage},
    traits::{FulfillmentDbError, StatusUpdate},
};

/// Stores a new `queued` message. A second booking confirmation for the same order and channel is rejected with
/// [`FulfillmentDbError::MessageAlreadyExists`].
pub async fn insert_message(
    message: NewOutboundMessage,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<OutboundMessage, FulfillmentDbError> {
    let NewOutboundMessage { order_number, channel, recipient, body, message_type, scheduled_for } = message;
    let queued = MessageStatus::queued(channel).ok_or_else(|| {
        FulfillmentDbError::DatabaseError(format!("{channel} messages are not tracked as outbound messages"))
    })?;
    let inserted: Option<OutboundMessage> = sqlx::query_as(
        r#"
            INSERT INTO outbound_messages (
                order_number,
                channel,
                recipient,
                body,
                message_type,
                status,
                scheduled_for,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            ON CONFLICT DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(order_number.as_str())
    .bind(channel)
    .bind(recipient)
    .bind(body)
    .bind(message_type)
    .bind(queued.as_str())
    .bind(scheduled_for)
    .bind(now)
    .fetch_optional(conn)
    .await?;
    match inserted {
        Some(m) => {
            debug!("🗃️ {channel} message #{} queued for order {order_number}", m.id);
            Ok(m)
        },
        None => Err(FulfillmentDbError::MessageAlreadyExists {
            order_number,
            channel: channel.to_string(),
            message_type: message_type.to_string(),
        }),
    }
}

pub async fn fetch_message(id: i64, conn: &mut SqliteConnection) -> Result<Option<OutboundMessage>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM outbound_messages WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_message_by_provider_id(
    provider_message_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<OutboundMessage>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM outbound_messages WHERE provider_message_id = $1")
        .bind(provider_message_id)
        .fetch_optional(conn)
        .await
}

pub async fn fetch_messages_for_order(
    order_number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Vec<OutboundMessage>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM outbound_messages WHERE order_number = $1 ORDER BY id")
        .bind(order_number.as_str())
        .fetch_all(conn)
        .await
}

pub async fn record_send_success(
    id: i64,
    provider_message_id: Option<&str>,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<OutboundMessage>, FulfillmentDbError> {
    let result = sqlx::query_as(
        r#"
            UPDATE outbound_messages SET
                status = 'sent',
                provider_message_id = COALESCE($2, provider_message_id),
                sent_at = COALESCE(sent_at, $3),
                attempts = attempts + 1,
                error_code = NULL,
                error_message = NULL,
                updated_at = $3
            WHERE id = $1 AND status IN ('queued', 'failed')
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(provider_message_id)
    .bind(now)
    .fetch_optional(conn)
    .await;
    match result {
        Ok(m) => Ok(m),
        Err(e) if unique_violation(&e).is_some() => {
            let pid = provider_message_id.unwrap_or_default().to_string();
            Err(FulfillmentDbError::DuplicateProviderMessageId(pid))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn record_send_failure(
    id: i64,
    error_code: &str,
    error_message: &str,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<OutboundMessage>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE outbound_messages SET
                status = 'failed',
                attempts = attempts + 1,
                error_code = $2,
                error_message = $3,
                updated_at = $4
            WHERE id = $1 AND status IN ('queued', 'failed')
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(error_code)
    .bind(error_message)
    .bind(now)
    .fetch_optional(conn)
    .await
}

/// A compare-and-set on the status column. The update only lands if no other writer has changed the status since the
/// caller read it.
pub async fn compare_and_set_status(
    id: i64,
    expected: MessageStatus,
    update: StatusUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<OutboundMessage>, sqlx::Error> {
    trace!("🗃️ Message #{id}: {expected} -> {}", update.status);
    sqlx::query_as(
        r#"
            UPDATE outbound_messages SET
                status = $3,
                sent_at = $4,
                delivered_at = $5,
                read_at = $6,
                error_code = $7,
                error_message = $8,
                updated_at = $9
            WHERE id = $1 AND status = $2
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(expected.as_str())
    .bind(update.status.as_str())
    .bind(update.sent_at)
    .bind(update.delivered_at)
    .bind(update.read_at)
    .bind(update.error_code)
    .bind(update.error_message)
    .bind(update.updated_at)
    .fetch_optional(conn)
    .await
}

/// `undelivered` is left out: the carrier already holds that message, so a resend could reach the customer twice.
pub async fn fetch_retryable_messages(
    older_than: DateTime<Utc>,
    max_attempts: i64,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<OutboundMessage>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT * FROM outbound_messages
            WHERE status IN ('queued', 'failed')
              AND attempts < $2
              AND julianday(updated_at) < julianday($1)
              AND (scheduled_for IS NULL OR julianday(scheduled_for) <= julianday($3))
            ORDER BY id;
        "#,
    )
    .bind(older_than)
    .bind(max_attempts)
    .bind(now)
    .fetch_all(conn)
    .await
}
