use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::db_types::{NewOrder, Order, OrderNumber, PaymentDetails, PaymentStatus};

/// Inserts the order into the database, returning `false` in the second parameter if the order already exists.
///
/// The insert and the existence check are the same statement, so two concurrent checkouts for the same order number
/// cannot both insert.
pub async fn idempotent_insert(
    order: NewOrder,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(Order, bool), sqlx::Error> {
    let order_number = order.order_number.clone();
    match insert_order(order, now, conn).await? {
        Some(order) => {
            debug!("🗃️ Order [{}] inserted with id {}", order.order_number, order.id);
            Ok((order, true))
        },
        None => {
            trace!("🗃️ Order [{order_number}] already exists");
            let order = fetch_order(&order_number, conn).await?.ok_or(sqlx::Error::RowNotFound)?;
            Ok((order, false))
        },
    }
}

async fn insert_order(
    order: NewOrder,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let cart = order.cart.to_string();
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_number,
                customer_id,
                customer_name,
                customer_email,
                customer_phone,
                cart,
                total,
                currency,
                trip_date,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            ON CONFLICT (order_number) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(order.order_number)
    .bind(order.customer_id)
    .bind(order.customer_name)
    .bind(order.customer_email)
    .bind(order.customer_phone)
    .bind(cart)
    .bind(order.total)
    .bind(order.currency)
    .bind(order.trip_date)
    .bind(now)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_order(order_number: &OrderNumber, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE order_number = $1")
        .bind(order_number.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Applies a successful payment. `paid_at` is only ever set once; cancelled orders stay cancelled.
pub async fn confirm_payment(
    order_number: &OrderNumber,
    details: &PaymentDetails,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let paid_at = details.paid_at.unwrap_or(now);
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET
                payment_status = 'success',
                status = CASE WHEN status = 'cancelled' THEN status ELSE 'confirmed' END,
                paid_at = COALESCE(paid_at, $2),
                transaction_id = COALESCE($3, transaction_id),
                payment_method = COALESCE($4, payment_method),
                updated_at = $5
            WHERE order_number = $1
            RETURNING *;
        "#,
    )
    .bind(order_number.as_str())
    .bind(paid_at)
    .bind(details.transaction_id.clone())
    .bind(details.payment_method.clone())
    .bind(now)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Sets the payment status. Any status may follow any other; only the move to `success` has knock-on effects on the
/// order status and `paid_at`.
pub async fn update_payment_status(
    order_number: &OrderNumber,
    status: PaymentStatus,
    details: &PaymentDetails,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET
                payment_status = $2,
                status = CASE WHEN $2 = 'success' AND status = 'pending' THEN 'confirmed' ELSE status END,
                paid_at = CASE
                    WHEN $2 = 'success' THEN COALESCE($3, paid_at, $6)
                    ELSE COALESCE($3, paid_at)
                END,
                transaction_id = COALESCE($4, transaction_id),
                payment_method = COALESCE($5, payment_method),
                updated_at = $6
            WHERE order_number = $1
            RETURNING *;
        "#,
    )
    .bind(order_number.as_str())
    .bind(status)
    .bind(details.paid_at)
    .bind(details.transaction_id.clone())
    .bind(details.payment_method.clone())
    .bind(now)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

pub async fn cancel_order(
    order_number: &OrderNumber,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        "UPDATE orders SET status = 'cancelled', updated_at = $2 WHERE order_number = $1 RETURNING *",
    )
    .bind(order_number.as_str())
    .bind(now)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}
