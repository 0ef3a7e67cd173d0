use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{
        Channel,
        NewNotification,
        NewOrder,
        Order,
        OrderNumber,
        OrderStatusType,
        PaymentDetails,
        PaymentStatus,
    },
    events::{EventProducers, OrderConfirmedEvent},
    fe_api::{
        badge_api::BadgeApi,
        dispatch_api::DispatchApi,
        errors::{BadgeError, OrderFlowError},
        order_objects::{BadgeOutcome, CancellationResult, ConfirmationResult},
    },
    traits::{FulfillmentDatabase, FulfillmentDbError, MessagingProviders},
};

pub const ORDER_CANCELLED_NOTIFICATION: &str = "order_cancelled";

/// `OrderFlowApi` owns the order and payment status transitions, and is the trigger point for everything that
/// happens when a booking is paid for.
///
/// On the pending → confirmed edge it issues the tourist badge and dispatches the booking confirmation, concurrently.
/// Both side effects are best-effort: their failures are reported in the [`ConfirmationResult`] but never undo the
/// transition itself.
pub struct OrderFlowApi<B, M> {
    db: B,
    badges: BadgeApi<B>,
    dispatcher: DispatchApi<B, M>,
    producers: EventProducers,
}

impl<B, M> Debug for OrderFlowApi<B, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, M> OrderFlowApi<B, M> {
    pub fn new(db: B, badges: BadgeApi<B>, dispatcher: DispatchApi<B, M>, producers: EventProducers) -> Self {
        Self { db, badges, dispatcher, producers }
    }
}

impl<B, M> OrderFlowApi<B, M>
where
    B: FulfillmentDatabase,
    M: MessagingProviders,
{
    /// Stores a new order at checkout, with both statuses `pending`.
    ///
    /// Submitting the same order number again returns the stored order and `false`, and changes nothing.
    pub async fn create_order(&self, order: NewOrder) -> Result<(Order, bool), OrderFlowError> {
        if order.order_number.as_str().trim().is_empty() {
            return Err(OrderFlowError::InvalidOrder("The order number is empty".into()));
        }
        if order.customer_id.trim().is_empty() {
            return Err(OrderFlowError::InvalidOrder("The customer id is empty".into()));
        }
        if order.total.value() < 0 {
            return Err(OrderFlowError::InvalidOrder(format!("The order total ({}) is negative", order.total)));
        }
        let (order, inserted) = self.db.insert_order(order).await?;
        if inserted {
            info!("🔄️📦️ Order {} created for customer {}", order.order_number, order.customer_id);
        } else {
            debug!("🔄️📦️ Order {} already exists. Nothing to do.", order.order_number);
        }
        Ok((order, inserted))
    }

    pub async fn fetch_order(&self, order_number: &OrderNumber) -> Result<Option<Order>, OrderFlowError> {
        let order = self.db.fetch_order(order_number).await?;
        Ok(order)
    }

    /// Records a successful payment for the order and runs the confirmation side effects.
    ///
    /// Safe to call repeatedly: the badge and every notification record are guarded by unique constraints, so a
    /// duplicate payment callback produces the same single badge and single set of messages. A repeat call issues the
    /// badge if the first attempt failed to, and records any message that was never stored. A message whose send
    /// failed is reported as already handled and is left to the retry scan. A badge that was revoked stays revoked.
    ///
    /// Payments against a cancelled order are recorded, but the order stays cancelled and nothing is issued or sent.
    pub async fn record_payment_success(
        &self,
        order_number: &OrderNumber,
        details: PaymentDetails,
    ) -> Result<ConfirmationResult, OrderFlowError> {
        trace!("🔄️💰️ Recording payment for order {order_number}");
        let order = self
            .db
            .confirm_payment(order_number, &details, Utc::now())
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_number.clone()))?;
        if order.status == OrderStatusType::Cancelled {
            warn!("🔄️💰️ Payment received for cancelled order {order_number}. It is recorded, but nothing is issued.");
            return Ok(ConfirmationResult::without_side_effects(order));
        }
        Ok(self.run_confirmation_side_effects(order).await)
    }

    /// Sets the payment status of an order, typically as an admin correction or from a gateway status webhook.
    ///
    /// Any payment status may follow any other. Moving to `success` confirms a pending order and stamps `paid_at` if
    /// the caller did not supply one. The confirmation side effects only run when the new status is `success` and the
    /// order has never had a badge.
    pub async fn update_payment_status(
        &self,
        order_number: &OrderNumber,
        status: &str,
        details: PaymentDetails,
    ) -> Result<ConfirmationResult, OrderFlowError> {
        let status = status.parse::<PaymentStatus>()?;
        let order = self
            .db
            .update_payment_status(order_number, status, &details, Utc::now())
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_number.clone()))?;
        info!("🔄️💰️ Payment status for order {order_number} set to {status}. Order is {}.", order.status);
        if status != PaymentStatus::Success || order.status != OrderStatusType::Confirmed {
            return Ok(ConfirmationResult::without_side_effects(order));
        }
        if !self.db.fetch_badges_for_order(order_number).await?.is_empty() {
            debug!("🔄️💰️ Order {order_number} already has a badge. Skipping the confirmation side effects.");
            return Ok(ConfirmationResult::without_side_effects(order));
        }
        Ok(self.run_confirmation_side_effects(order).await)
    }

    /// Cancels the order, revokes its active badge and lets the customer know in-app.
    pub async fn cancel_order(
        &self,
        order_number: &OrderNumber,
        actor: &str,
        reason: &str,
    ) -> Result<CancellationResult, OrderFlowError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(OrderFlowError::InvalidOrder("A reason is required to cancel an order".into()));
        }
        let (order, revoked_badge) = self
            .db
            .cancel_order(order_number, actor, reason, Utc::now())
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_number.clone()))?;
        info!("🔄️❌️ Order {order_number} cancelled by {actor}: {reason}");
        let notification = NewNotification {
            recipient_id: order.customer_id.clone(),
            notification_type: ORDER_CANCELLED_NOTIFICATION.to_string(),
            title: "Booking cancelled".to_string(),
            message: format!("Your booking {order_number} has been cancelled. Reason: {reason}"),
            order_number: Some(order_number.clone()),
        };
        match self.db.insert_notification(notification, Utc::now()).await {
            Ok(_) => {},
            Err(FulfillmentDbError::NotificationAlreadyExists { .. }) => {
                debug!("🔄️❌️ The customer was already told that order {order_number} is cancelled");
            },
            Err(e) => warn!("🔄️❌️ Could not notify the customer that order {order_number} is cancelled. {e}"),
        }
        Ok(CancellationResult { order, revoked_badge })
    }

    async fn run_confirmation_side_effects(&self, order: Order) -> ConfirmationResult {
        let (badge, dispatch) =
            tokio::join!(self.badges.issue_first(&order), self.dispatcher.dispatch(&order, &Channel::ALL));
        let badge = match badge {
            Ok(issued) => BadgeOutcome::Issued { badge: issued.badge },
            Err(BadgeError::AlreadyExists { code, .. }) => BadgeOutcome::AlreadyIssued { code },
            Err(e) => {
                error!("🔄️🎫️ Could not issue a badge for order {}. {e}", order.order_number);
                BadgeOutcome::Failed { reason: e.to_string() }
            },
        };
        // A newly issued badge marks the first confirmation. Replays do not fire the hook again.
        if let Some(issued) = badge.badge() {
            let event = OrderConfirmedEvent::new(order.clone(), Some(issued.clone()));
            self.producers.publish_order_confirmed(event).await;
        }
        debug!("🔄️✅️ Order {} confirmation side effects complete", order.order_number);
        ConfirmationResult { order, badge, dispatch: Some(dispatch) }
    }
}
