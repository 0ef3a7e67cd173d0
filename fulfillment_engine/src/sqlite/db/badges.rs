use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use super::unique_violation;
use crate::{
    db_types::{NewBadge, OrderNumber, TouristBadge},
    traits::FulfillmentDbError,
};

/// Inserts a new active badge. Unique-constraint failures are mapped to the specific collision that occurred.
pub async fn insert_badge(
    badge: NewBadge,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<TouristBadge, FulfillmentDbError> {
    let code = badge.badge_code.clone();
    let order_number = badge.order_number.clone();
    let result = sqlx::query_as(
        r#"
            INSERT INTO tourist_badges (
                badge_code,
                order_number,
                holder_id,
                holder_name,
                trip_summary,
                status,
                valid_from,
                valid_until,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, 'active', $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(badge.badge_code)
    .bind(badge.order_number)
    .bind(badge.holder_id)
    .bind(badge.holder_name)
    .bind(badge.trip_summary)
    .bind(badge.valid_from)
    .bind(badge.valid_until)
    .bind(now)
    .fetch_one(conn)
    .await;
    match result {
        Ok(badge) => Ok(badge),
        Err(e) => match unique_violation(&e) {
            Some(msg) if msg.contains("badge_code") => {
                debug!("🗃️ Badge code {code} collided with an existing badge");
                Err(FulfillmentDbError::DuplicateBadgeCode(code))
            },
            Some(_) => Err(FulfillmentDbError::BadgeAlreadyExists(order_number)),
            None => Err(e.into()),
        },
    }
}

pub async fn fetch_badge_by_code(code: &str, conn: &mut SqliteConnection) -> Result<Option<TouristBadge>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM tourist_badges WHERE badge_code = $1").bind(code).fetch_optional(conn).await
}

pub async fn fetch_active_badge_for_order(
    order_number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<TouristBadge>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM tourist_badges WHERE order_number = $1 AND status = 'active'")
        .bind(order_number.as_str())
        .fetch_optional(conn)
        .await
}

pub async fn fetch_badges_for_order(
    order_number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Vec<TouristBadge>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM tourist_badges WHERE order_number = $1 ORDER BY id DESC")
        .bind(order_number.as_str())
        .fetch_all(conn)
        .await
}

pub async fn revoke_badge(
    code: &str,
    actor: &str,
    reason: &str,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<TouristBadge>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE tourist_badges SET
                status = 'revoked',
                revoked_at = $4,
                revoked_by = $2,
                revoke_reason = $3
            WHERE badge_code = $1 AND status = 'active'
            RETURNING *;
        "#,
    )
    .bind(code)
    .bind(actor)
    .bind(reason)
    .bind(now)
    .fetch_optional(conn)
    .await
}

/// Revokes whichever badge is active for the order, if any.
pub async fn revoke_active_badge_for_order(
    order_number: &OrderNumber,
    actor: &str,
    reason: &str,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<TouristBadge>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE tourist_badges SET
                status = 'revoked',
                revoked_at = $4,
                revoked_by = $2,
                revoke_reason = $3
            WHERE order_number = $1 AND status = 'active'
            RETURNING *;
        "#,
    )
    .bind(order_number.as_str())
    .bind(actor)
    .bind(reason)
    .bind(now)
    .fetch_optional(conn)
    .await
}
