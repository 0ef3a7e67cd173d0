use serde::Serialize;

use crate::db_types::{MessageStatus, Order, OutboundMessage, TouristBadge};

/// Emitted once an order has crossed the pending → confirmed edge and its side effects have run.
#[derive(Debug, Clone, Serialize)]
pub struct OrderConfirmedEvent {
    pub order: Order,
    /// The badge issued for the order, if issuance succeeded.
    pub badge: Option<TouristBadge>,
}

impl OrderConfirmedEvent {
    pub fn new(order: Order, badge: Option<TouristBadge>) -> Self {
        Self { order, badge }
    }
}

/// Emitted whenever a delivery callback or a send attempt moves a message to a new status.
#[derive(Debug, Clone, Serialize)]
pub struct MessageStatusChangedEvent {
    pub message: OutboundMessage,
    pub previous: MessageStatus,
}

impl MessageStatusChangedEvent {
    pub fn new(message: OutboundMessage, previous: MessageStatus) -> Self {
        Self { message, previous }
    }
}

#[derive(Debug, Clone)]
pub enum EventType {
    OrderConfirmed(OrderConfirmedEvent),
    MessageStatusChanged(MessageStatusChangedEvent),
}
