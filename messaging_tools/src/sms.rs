use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::Client;
use serde::Deserialize;

use crate::{config::SmsConfig, error::MessagingApiError};

#[derive(Clone)]
pub struct SmsApi {
    config: SmsConfig,
    client: Arc<Client>,
}

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResource {
    code: Option<i64>,
    message: Option<String>,
}

impl SmsApi {
    pub fn new(config: SmsConfig, timeout: Duration) -> Result<Self, MessagingApiError> {
        let client =
            Client::builder().timeout(timeout).build().map_err(|e| MessagingApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self) -> String {
        format!("{}/Accounts/{}/Messages.json", self.config.base_url.trim_end_matches('/'), self.config.account_sid)
    }

    /// Submits a text message. Returns the provider's message sid, which its delivery reports will quote.
    pub async fn send_message(&self, to: &str, body: &str) -> Result<String, MessagingApiError> {
        let mut form = vec![("To", to), ("From", self.config.from_number.as_str()), ("Body", body)];
        if let Some(url) = &self.config.status_callback_url {
            form.push(("StatusCallback", url.as_str()));
        }
        trace!("📱️ Sending SMS to {to}");
        let response = self
            .client
            .post(self.url())
            .basic_auth(&self.config.account_sid, Some(self.config.auth_token.reveal()))
            .form(&form)
            .send()
            .await
            .map_err(MessagingApiError::from_reqwest)?;
        let status = response.status();
        let text = response.text().await.map_err(|e| MessagingApiError::ResponseError(e.to_string()))?;
        if !status.is_success() {
            let (code, message) = match serde_json::from_str::<ErrorResource>(&text) {
                Ok(ErrorResource { code, message }) => {
                    let code = code.map(|c| c.to_string()).unwrap_or_else(|| status.as_u16().to_string());
                    (code, message.unwrap_or(text))
                },
                Err(_) => (status.as_u16().to_string(), text),
            };
            warn!("📱️ SMS provider rejected message to {to}. [{code}] {message}");
            return Err(MessagingApiError::Rejected { status: status.as_u16(), code, message });
        }
        let resource =
            serde_json::from_str::<MessageResource>(&text).map_err(|e| MessagingApiError::JsonError(e.to_string()))?;
        debug!("📱️ SMS {} accepted with status {}", resource.sid, resource.status.as_deref().unwrap_or("unknown"));
        Ok(resource.sid)
    }
}
