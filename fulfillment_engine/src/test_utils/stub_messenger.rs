use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
        Mutex,
    },
    time::Duration,
};

use crate::{
    db_types::Channel,
    traits::{MessagingProviders, SendError, SendReceipt},
};

/// A message handed to the [`StubMessenger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub channel: Channel,
    pub recipient: String,
    pub body: String,
    pub provider_message_id: String,
}

/// An in-memory stand-in for the SMS and WhatsApp providers.
///
/// Every send succeeds with a fresh provider id (`SM…` for SMS, `wamid.…` for WhatsApp) unless its channel has been
/// told to fail or to hang. Clones share their state.
#[derive(Debug, Clone, Default)]
pub struct StubMessenger {
    failing: Arc<Mutex<HashSet<Channel>>>,
    slow: Arc<Mutex<HashSet<Channel>>>,
    sent: Arc<Mutex<Vec<SentMessage>>>,
    counter: Arc<AtomicU64>,
}

impl StubMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_channel(&self, channel: Channel) {
        self.failing.lock().unwrap().insert(channel);
    }

    pub fn restore_channel(&self, channel: Channel) {
        self.failing.lock().unwrap().remove(&channel);
        self.slow.lock().unwrap().remove(&channel);
    }

    /// Sends on this channel never complete.
    pub fn hang_channel(&self, channel: Channel) {
        self.slow.lock().unwrap().insert(channel);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_on(&self, channel: Channel) -> Vec<SentMessage> {
        self.sent().into_iter().filter(|m| m.channel == channel).collect()
    }
}

impl MessagingProviders for StubMessenger {
    async fn send(&self, channel: Channel, recipient: &str, body: &str) -> Result<SendReceipt, SendError> {
        let hangs = self.slow.lock().unwrap().contains(&channel);
        if hangs {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        let fails = self.failing.lock().unwrap().contains(&channel);
        if fails {
            return Err(SendError::new("63016", format!("{channel} provider rejected the message")));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let provider_message_id = match channel {
            Channel::WhatsApp => format!("wamid.stub{n:06}"),
            _ => format!("SM{n:032x}"),
        };
        let message = SentMessage {
            channel,
            recipient: recipient.to_string(),
            body: body.to_string(),
            provider_message_id: provider_message_id.clone(),
        };
        self.sent.lock().unwrap().push(message);
        Ok(SendReceipt::new(&provider_message_id))
    }
}
