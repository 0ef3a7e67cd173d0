use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::Channel;

/// What a provider hands back for an accepted message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    /// The provider-assigned message identifier, used to correlate later delivery callbacks. A message sent without
    /// one can never be reconciled.
    pub provider_message_id: Option<String>,
}

impl SendReceipt {
    pub fn new(provider_message_id: &str) -> Self {
        Self { provider_message_id: Some(provider_message_id.to_string()) }
    }
}

/// A failed send. The code and message are stored verbatim on the message record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{code}] {message}")]
pub struct SendError {
    pub code: String,
    pub message: String,
}

impl SendError {
    pub fn new<S: Into<String>, T: Into<String>>(code: S, message: T) -> Self {
        Self { code: code.into(), message: message.into() }
    }
}

/// The external messaging providers, one per channel.
///
/// Implementations should not retry internally; retries are driven by the dispatcher's retry scan.
#[allow(async_fn_in_trait)]
pub trait MessagingProviders: Clone {
    async fn send(&self, channel: Channel, recipient: &str, body: &str) -> Result<SendReceipt, SendError>;
}
