//! Event hooks the server installs on the fulfillment engine.
//!
//! These only log. They give operators a single place to watch confirmations and message status changes, and are
//! the place to hang further integrations off.
use fulfillment_engine::events::{EventHandlers, EventHooks, MessageStatusChangedEvent, OrderConfirmedEvent};
use log::*;

pub const AUDIT_EVENT_BUFFER_SIZE: usize = 25;

pub fn create_audit_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_order_confirmed(|ev| {
        let OrderConfirmedEvent { order, badge } = ev;
        Box::pin(async move {
            let code = badge.map(|b| b.badge_code).unwrap_or_else(|| "none".to_string());
            info!("📬️ Order {} confirmed for {}. Badge: {code}", order.order_number, order.customer_id);
        })
    });
    hooks.on_message_status_changed(|ev| {
        let MessageStatusChangedEvent { message, previous } = ev;
        Box::pin(async move {
            info!(
                "📬️ {} message #{} for order {}: {previous} → {}",
                message.channel(),
                message.id,
                message.order_number,
                message.status
            );
            if let Some(reason) = message.error_message.as_deref().filter(|_| message.status.is_failure()) {
                warn!("📬️ Message #{} failed. [{}] {reason}", message.id, message.error_code.as_deref().unwrap_or("-"));
            }
        })
    });
    EventHandlers::new(AUDIT_EVENT_BUFFER_SIZE, hooks)
}
