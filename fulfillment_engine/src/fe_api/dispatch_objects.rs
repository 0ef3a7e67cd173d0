use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Channel, MessageStatus, OrderNumber, OutboundMessage};

/// What happened on a single channel during a dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ChannelOutcome {
    /// Handed to the provider (or stored, for in-app notifications).
    Sent { provider_message_id: Option<String> },
    /// The send failed. The error is also stored on the message record.
    Failed { code: String, message: String },
    /// A record for this channel already existed, so nothing was sent.
    AlreadyHandled,
    /// The customer has switched this channel off.
    Disabled,
}

impl ChannelOutcome {
    pub fn failed<S: Into<String>, T: Into<String>>(code: S, message: T) -> Self {
        Self::Failed { code: code.into(), message: message.into() }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelReport {
    pub channel: Channel,
    #[serde(flatten)]
    pub outcome: ChannelOutcome,
}

/// The aggregate, non-fatal result of dispatching an order's notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub order_number: OrderNumber,
    pub channels: Vec<ChannelReport>,
}

impl DispatchReport {
    pub fn new(order_number: OrderNumber) -> Self {
        Self { order_number, channels: Vec::new() }
    }

    pub fn outcome_for(&self, channel: Channel) -> Option<&ChannelOutcome> {
        self.channels.iter().find(|r| r.channel == channel).map(|r| &r.outcome)
    }

    pub fn failure_count(&self) -> usize {
        self.channels.iter().filter(|r| r.outcome.is_failure()).count()
    }
}

/// Tallies from one pass of the retry scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryReport {
    pub considered: usize,
    pub sent: usize,
    pub failed: usize,
    /// Messages another writer had already moved on by the time the retry landed.
    pub skipped: usize,
}

/// Error detail attached to a provider's failure report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderError {
    pub code: Option<String>,
    pub message: Option<String>,
}

impl ProviderError {
    pub fn new(code: Option<String>, message: Option<String>) -> Option<Self> {
        if code.is_none() && message.is_none() {
            None
        } else {
            Some(Self { code, message })
        }
    }
}

/// A delivery-status callback from a messaging provider, normalised across providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryCallback {
    pub channel: Channel,
    pub provider_message_id: String,
    pub status: String,
    #[serde(default)]
    pub error: Option<ProviderError>,
}

/// Everything that can move an outbound message's status after it was queued.
#[derive(Debug, Clone)]
pub enum DeliveryInput {
    StatusCallback(DeliveryCallback),
    RetryScan { older_than: DateTime<Utc>, max_attempts: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// The status advanced and the message was updated.
    Applied { message: OutboundMessage },
    /// The reported status does not advance the message; nothing changed.
    Ignored { current: MessageStatus },
    /// No message carries this provider id. Acknowledged and dropped.
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DeliveryResult {
    Reconciled(ReconcileOutcome),
    Retried(RetryReport),
}
