use std::time::Duration;

use fulfillment_engine::{
    db_types::Channel,
    traits::{MessagingProviders, SendError, SendReceipt},
};
use log::*;
use messaging_tools::{MessagingApiError, SmsApi, SmsConfig, WhatsAppApi, WhatsAppConfig};

/// The production messaging providers: one REST client per channel.
#[derive(Clone)]
pub struct ProviderClients {
    sms: SmsApi,
    whatsapp: WhatsAppApi,
}

impl ProviderClients {
    pub fn new(sms: SmsConfig, whatsapp: WhatsAppConfig, timeout: Duration) -> Result<Self, MessagingApiError> {
        let sms = SmsApi::new(sms, timeout)?;
        let whatsapp = WhatsAppApi::new(whatsapp, timeout)?;
        Ok(Self { sms, whatsapp })
    }
}

impl MessagingProviders for ProviderClients {
    async fn send(&self, channel: Channel, recipient: &str, body: &str) -> Result<SendReceipt, SendError> {
        let result = match channel {
            Channel::Sms => self.sms.send_message(recipient, body).await,
            Channel::WhatsApp => self.whatsapp.send_text(recipient, body).await,
            Channel::InApp => {
                warn!("📨️ In-app notifications are stored, not sent. Ignoring send request.");
                return Err(SendError::new("unsupported_channel", "In-app notifications have no provider"));
            },
        };
        result.map(|id| SendReceipt::new(&id)).map_err(|e| SendError::new(e.code(), e.to_string()))
    }
}
