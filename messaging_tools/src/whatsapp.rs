use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{config::WhatsAppConfig, error::MessagingApiError};

#[derive(Clone)]
pub struct WhatsAppApi {
    config: WhatsAppConfig,
    client: Arc<Client>,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

impl WhatsAppApi {
    pub fn new(config: WhatsAppConfig, timeout: Duration) -> Result<Self, MessagingApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(&format!("Bearer {}", config.access_token.reveal()))
            .map_err(|e| MessagingApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| MessagingApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self) -> String {
        format!(
            "{}/{}/{}/messages",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_version,
            self.config.phone_number_id
        )
    }

    /// Sends a plain text message. Returns the `wamid` that status webhooks will refer to.
    pub async fn send_text(&self, to: &str, body: &str) -> Result<String, MessagingApiError> {
        let payload = json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": to.trim_start_matches('+'),
            "type": "text",
            "text": { "preview_url": false, "body": body },
        });
        trace!("💬️ Sending WhatsApp message to {to}");
        let response =
            self.client.post(self.url()).json(&payload).send().await.map_err(MessagingApiError::from_reqwest)?;
        let status = response.status();
        let value = response.json::<Value>().await.map_err(|e| MessagingApiError::JsonError(e.to_string()))?;
        if !status.is_success() {
            let error = &value["error"];
            let code = error["code"].as_i64().map(|c| c.to_string()).unwrap_or_else(|| status.as_u16().to_string());
            let message = error["message"].as_str().map(String::from).unwrap_or_else(|| value.to_string());
            warn!("💬️ WhatsApp provider rejected message to {to}. [{code}] {message}");
            return Err(MessagingApiError::Rejected { status: status.as_u16(), code, message });
        }
        let response =
            serde_json::from_value::<SendResponse>(value).map_err(|e| MessagingApiError::JsonError(e.to_string()))?;
        let id = response
            .messages
            .into_iter()
            .next()
            .map(|m| m.id)
            .ok_or_else(|| MessagingApiError::ResponseError("No message id in response".into()))?;
        debug!("💬️ WhatsApp message {id} accepted");
        Ok(id)
    }
}
