use std::{fmt::Debug, time::Duration};

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use log::*;

use crate::{
    db_types::{
        Channel,
        MessageType,
        NewNotification,
        NewOutboundMessage,
        NotificationPreference,
        Order,
        OrderNumber,
        OutboundMessage,
    },
    events::{EventProducers, MessageStatusChangedEvent},
    fe_api::{
        dispatch_objects::{ChannelOutcome, ChannelReport, DispatchReport, RetryReport},
        errors::DispatchError,
    },
    traits::{FulfillmentDatabase, FulfillmentDbError, MessagingProviders, SendError},
};

pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);
pub const BOOKING_CONFIRMED_NOTIFICATION: &str = "booking_confirmed";

/// `DispatchApi` fans a confirmed order out to the customer on every enabled channel.
///
/// Each channel is handled independently: a failure on one is recorded on that channel's message and never affects the
/// others. Every channel's record is created before the send is attempted, and the unique constraint on
/// `(order, channel, message type)` turns a repeated dispatch into a no-op.
pub struct DispatchApi<B, M> {
    db: B,
    messengers: M,
    producers: EventProducers,
    send_timeout: Duration,
}

impl<B, M> Debug for DispatchApi<B, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DispatchApi (timeout {:?})", self.send_timeout)
    }
}

impl<B: Clone, M: Clone> Clone for DispatchApi<B, M> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            messengers: self.messengers.clone(),
            producers: self.producers.clone(),
            send_timeout: self.send_timeout,
        }
    }
}

impl<B, M> DispatchApi<B, M> {
    pub fn new(db: B, messengers: M, producers: EventProducers) -> Self {
        Self { db, messengers, producers, send_timeout: DEFAULT_SEND_TIMEOUT }
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }
}

impl<B, M> DispatchApi<B, M>
where
    B: FulfillmentDatabase,
    M: MessagingProviders,
{
    /// Sends the booking confirmation for `order` on each of `channels`, concurrently.
    ///
    /// This never fails as a whole. Per-channel problems are logged, stored on the message record and summarised in
    /// the returned [`DispatchReport`].
    pub async fn dispatch(&self, order: &Order, channels: &[Channel]) -> DispatchReport {
        let preference = match self.db.fetch_preference(&order.customer_id).await {
            Ok(Some(p)) => p,
            Ok(None) => NotificationPreference::all_enabled(&order.customer_id),
            Err(e) => {
                warn!(
                    "📨️ Could not read the notification preferences for customer {}. Assuming every channel is \
                     enabled. {e}",
                    order.customer_id
                );
                NotificationPreference::all_enabled(&order.customer_id)
            },
        };
        let jobs = channels.iter().map(|&channel| {
            let preference = &preference;
            async move {
                let outcome = if preference.allows(channel) {
                    self.dispatch_channel(order, channel).await
                } else {
                    debug!("📨️ {} has switched off {channel} notifications", order.customer_id);
                    ChannelOutcome::Disabled
                };
                ChannelReport { channel, outcome }
            }
        });
        let mut report = DispatchReport::new(order.order_number.clone());
        report.channels = join_all(jobs).await;
        let failures = report.failure_count();
        if failures > 0 {
            warn!("📨️ Order {} dispatched with {failures} failed channel(s)", order.order_number);
        } else {
            info!("📨️ Order {} dispatched on {} channel(s)", order.order_number, report.channels.len());
        }
        report
    }

    async fn dispatch_channel(&self, order: &Order, channel: Channel) -> ChannelOutcome {
        match channel {
            Channel::InApp => self.notify_in_app(order).await,
            Channel::Sms | Channel::WhatsApp => {
                let recipient = order.customer_phone.clone().unwrap_or_default();
                let message = NewOutboundMessage {
                    order_number: order.order_number.clone(),
                    channel,
                    recipient,
                    body: confirmation_body(order, channel),
                    message_type: MessageType::BookingConfirmation,
                    scheduled_for: None,
                };
                match self.db.insert_message(message, Utc::now()).await {
                    Ok(message) => self.attempt_send(&message).await,
                    Err(e) if e.is_duplicate() => {
                        debug!("📨️ {channel} confirmation for order {} was already queued", order.order_number);
                        ChannelOutcome::AlreadyHandled
                    },
                    Err(e) => {
                        error!("📨️ Could not queue the {channel} confirmation for order {}. {e}", order.order_number);
                        ChannelOutcome::failed("storage", e.to_string())
                    },
                }
            },
        }
    }

    async fn notify_in_app(&self, order: &Order) -> ChannelOutcome {
        let notification = NewNotification {
            recipient_id: order.customer_id.clone(),
            notification_type: BOOKING_CONFIRMED_NOTIFICATION.to_string(),
            title: "Booking confirmed".to_string(),
            message: format!(
                "Your booking {} is confirmed. Show your tourist badge to your guide at pickup.",
                order.order_number
            ),
            order_number: Some(order.order_number.clone()),
        };
        match self.db.insert_notification(notification, Utc::now()).await {
            Ok(_) => ChannelOutcome::Sent { provider_message_id: None },
            Err(FulfillmentDbError::NotificationAlreadyExists { .. }) => ChannelOutcome::AlreadyHandled,
            Err(e) => {
                error!("📨️ Could not store the in-app confirmation for order {}. {e}", order.order_number);
                ChannelOutcome::failed("storage", e.to_string())
            },
        }
    }

    /// Makes one delivery attempt for a queued or failed message and records the result on the message.
    pub async fn attempt_send(&self, message: &OutboundMessage) -> ChannelOutcome {
        let channel = message.channel();
        let result = if message.recipient.trim().is_empty() {
            Err(SendError::new("missing_recipient", format!("Order {} has no phone number", message.order_number)))
        } else {
            let send = self.messengers.send(channel, &message.recipient, &message.body);
            match tokio::time::timeout(self.send_timeout, send).await {
                Ok(result) => result,
                Err(_) => Err(SendError::new(
                    "timeout",
                    format!("The {channel} provider did not respond within {}s", self.send_timeout.as_secs_f32()),
                )),
            }
        };
        let now = Utc::now();
        match result {
            Ok(receipt) => {
                let pid = receipt.provider_message_id.as_deref();
                match self.db.record_send_success(message.id, pid, now).await {
                    Ok(Some(updated)) => {
                        debug!("📨️ {channel} message #{} sent. Provider id: {pid:?}", message.id);
                        let provider_message_id = updated.provider_message_id.clone();
                        self.publish(updated, message).await;
                        ChannelOutcome::Sent { provider_message_id }
                    },
                    Ok(None) => {
                        debug!("📨️ {channel} message #{} was already moved on by another writer", message.id);
                        ChannelOutcome::AlreadyHandled
                    },
                    Err(e) => {
                        error!("📨️ {channel} message #{} was sent, but the result could not be stored. {e}", message.id);
                        ChannelOutcome::failed("storage", e.to_string())
                    },
                }
            },
            Err(SendError { code, message: reason }) => {
                warn!("📨️ {channel} message #{} could not be sent. [{code}] {reason}", message.id);
                match self.db.record_send_failure(message.id, &code, &reason, now).await {
                    Ok(Some(updated)) => self.publish(updated, message).await,
                    Ok(None) => {},
                    Err(e) => error!("📨️ Could not record the failure of {channel} message #{}. {e}", message.id),
                }
                ChannelOutcome::Failed { code, message: reason }
            },
        }
    }

    /// Every outbound message recorded for the order, across all channels.
    pub async fn messages_for_order(&self, order_number: &OrderNumber) -> Result<Vec<OutboundMessage>, DispatchError> {
        let messages = self.db.fetch_messages_for_order(order_number).await?;
        Ok(messages)
    }

    /// Re-attempts every queued or failed message last touched before `older_than` that has had fewer than
    /// `max_attempts` attempts.
    pub async fn retry_stale(&self, older_than: DateTime<Utc>, max_attempts: i64) -> Result<RetryReport, DispatchError> {
        let stale = self.db.fetch_retryable_messages(older_than, max_attempts, Utc::now()).await?;
        let mut report = RetryReport { considered: stale.len(), ..Default::default() };
        for message in &stale {
            match self.attempt_send(message).await {
                ChannelOutcome::Sent { .. } => report.sent += 1,
                ChannelOutcome::Failed { .. } => report.failed += 1,
                ChannelOutcome::AlreadyHandled | ChannelOutcome::Disabled => report.skipped += 1,
            }
        }
        if report.considered > 0 {
            info!(
                "📨️ Retried {} message(s): {} sent, {} failed, {} skipped",
                report.considered, report.sent, report.failed, report.skipped
            );
        }
        Ok(report)
    }

    async fn publish(&self, updated: OutboundMessage, previous: &OutboundMessage) {
        let event = MessageStatusChangedEvent::new(updated, previous.status);
        self.producers.publish_message_status_changed(event).await;
    }
}

fn confirmation_body(order: &Order, channel: Channel) -> String {
    let trip = order.trip_date.map(|d| d.format("%Y-%m-%d").to_string());
    match channel {
        Channel::WhatsApp => {
            let mut body = format!(
                "Hello {}! 🎉 Your booking *{}* is confirmed.\nTotal paid: {} {}",
                order.customer_name, order.order_number, order.total, order.currency
            );
            if let Some(date) = trip {
                body.push_str(&format!("\nTrip date: {date}"));
            }
            body.push_str("\nShow your tourist badge to your guide at pickup.");
            body
        },
        _ => {
            let trip = trip.map(|d| format!(" Trip date: {d}.")).unwrap_or_default();
            format!(
                "Booking {} confirmed. Total paid: {} {}.{trip} Show your tourist badge at pickup.",
                order.order_number, order.total, order.currency
            )
        },
    }
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;

    use super::*;
    use crate::db_types::{Money, NewOrder, OrderNumber, OrderStatusType, PaymentStatus};

    fn order() -> Order {
        let new = NewOrder::new(OrderNumber::from("DT-1001"), "cust-1", "Jane Doe", Money::from_major(120))
            .with_trip_date(NaiveDate::from_ymd_opt(2024, 11, 2).unwrap());
        Order {
            id: 1,
            order_number: new.order_number,
            customer_id: new.customer_id,
            customer_name: new.customer_name,
            customer_email: None,
            customer_phone: Some("+15550001".into()),
            cart: "[]".into(),
            total: new.total,
            currency: new.currency,
            status: OrderStatusType::Confirmed,
            payment_status: PaymentStatus::Success,
            transaction_id: None,
            payment_method: None,
            trip_date: new.trip_date,
            paid_at: Some(Utc::now()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn sms_body_is_a_single_line() {
        let body = confirmation_body(&order(), Channel::Sms);
        assert_eq!(
            body,
            "Booking DT-1001 confirmed. Total paid: 120.00 USD. Trip date: 2024-11-02. Show your tourist badge at \
             pickup."
        );
    }

    #[test]
    fn whatsapp_body_greets_the_customer() {
        let body = confirmation_body(&order(), Channel::WhatsApp);
        assert!(body.starts_with("Hello Jane Doe!"));
        assert!(body.contains("*DT-1001*"));
        assert!(body.contains("Trip date: 2024-11-02"));
    }
}
