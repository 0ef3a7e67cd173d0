use chrono::{DateTime, Utc};

use crate::{
    db_types::{NewOrder, Order, OrderNumber, PaymentDetails, PaymentStatus, TouristBadge},
    traits::FulfillmentDbError,
};

/// Order storage. Every transition is a single atomic write so that concurrent duplicate triggers cannot interleave.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order(&self, order_number: &OrderNumber) -> Result<Option<Order>, FulfillmentDbError>;

    /// Inserts the order, unless one with the same order number exists. Returns the stored order and `true` if it was
    /// newly inserted.
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), FulfillmentDbError>;

    /// Marks the payment as successful and the order as confirmed. `paid_at` is only set if it is currently unset, so
    /// re-delivery of the same confirmation leaves it untouched. Cancelled orders keep their `cancelled` status.
    ///
    /// Returns `None` if the order does not exist.
    async fn confirm_payment(
        &self,
        order_number: &OrderNumber,
        details: &PaymentDetails,
        now: DateTime<Utc>,
    ) -> Result<Option<Order>, FulfillmentDbError>;

    /// Sets the payment status and any supplied payment fields. Moving to `success` confirms a pending order and
    /// stamps `paid_at` (explicit value, else the existing one, else `now`).
    ///
    /// Returns `None` if the order does not exist.
    async fn update_payment_status(
        &self,
        order_number: &OrderNumber,
        status: PaymentStatus,
        details: &PaymentDetails,
        now: DateTime<Utc>,
    ) -> Result<Option<Order>, FulfillmentDbError>;

    /// Cancels the order and, in the same transaction, revokes its active badge if there is one.
    ///
    /// Returns `None` if the order does not exist.
    async fn cancel_order(
        &self,
        order_number: &OrderNumber,
        actor: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<(Order, Option<TouristBadge>)>, FulfillmentDbError>;
}
