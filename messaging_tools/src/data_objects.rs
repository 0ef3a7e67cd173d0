use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The form body of an SMS delivery report.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SmsStatusCallback {
    #[serde(rename = "MessageSid")]
    pub message_sid: String,
    #[serde(rename = "MessageStatus")]
    pub message_status: String,
    #[serde(rename = "To", default)]
    pub to: Option<String>,
    #[serde(rename = "ErrorCode", default)]
    pub error_code: Option<String>,
    #[serde(rename = "ErrorMessage", default)]
    pub error_message: Option<String>,
}

/// A WhatsApp webhook notification. One notification can batch several status updates, and may also carry inbound
/// messages, which are ignored here.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WhatsAppWebhook {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub statuses: Vec<WhatsAppStatusUpdate>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WhatsAppStatusUpdate {
    /// The `wamid` returned when the message was sent
    pub id: String,
    pub status: String,
    /// Unix time, as a string
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub errors: Vec<WhatsAppError>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WhatsAppError {
    pub code: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl WhatsAppWebhook {
    pub fn status_updates(&self) -> impl Iterator<Item = &WhatsAppStatusUpdate> {
        self.entry.iter().flat_map(|e| e.changes.iter()).flat_map(|c| c.value.statuses.iter())
    }
}

impl WhatsAppStatusUpdate {
    pub fn reported_at(&self) -> Option<DateTime<Utc>> {
        let secs = self.timestamp.as_deref()?.parse::<i64>().ok()?;
        DateTime::from_timestamp(secs, 0)
    }

    /// The first reported error as a `(code, message)` pair.
    pub fn error(&self) -> Option<(String, String)> {
        self.errors.first().map(|e| {
            let message = e.message.clone().or_else(|| e.title.clone()).unwrap_or_default();
            (e.code.to_string(), message)
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sms_status_callback() {
        let form = serde_json::json!({
            "MessageSid": "SM0123456789abcdef0123456789abcdef",
            "MessageStatus": "undelivered",
            "To": "+84901234567",
            "ErrorCode": "30003",
            "AccountSid": "AC00000000000000000000000000000000",
        });
        let callback: SmsStatusCallback = serde_json::from_value(form).unwrap();
        assert_eq!(callback.message_sid, "SM0123456789abcdef0123456789abcdef");
        assert_eq!(callback.message_status, "undelivered");
        assert_eq!(callback.error_code.as_deref(), Some("30003"));
        assert!(callback.error_message.is_none());
    }

    #[test]
    fn whatsapp_status_webhook() {
        let body = r#"{
          "object": "whatsapp_business_account",
          "entry": [{
            "id": "102290129340398",
            "changes": [{
              "field": "messages",
              "value": {
                "messaging_product": "whatsapp",
                "metadata": { "display_phone_number": "15550783881", "phone_number_id": "106540352242922" },
                "statuses": [
                  { "id": "wamid.HBgLMTY1MDM4Nzk0MzkVAgARGBJDQjZCMzlEQUE4OTJBMTE4RTUA", "status": "read",
                    "timestamp": "1724098547", "recipient_id": "84901234567" },
                  { "id": "wamid.HBgLMTY1MDM4Nzk0MzkVAgARGBI5QTNDQTVCM0Q0Q0Q2RTY3RTcA", "status": "failed",
                    "timestamp": "1724098550", "recipient_id": "84901234568",
                    "errors": [{ "code": 131026, "title": "Message undeliverable" }] }
                ]
              }
            }]
          }]
        }"#;
        let webhook: WhatsAppWebhook = serde_json::from_str(body).unwrap();
        let updates = webhook.status_updates().collect::<Vec<_>>();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].status, "read");
        assert!(updates[0].error().is_none());
        assert_eq!(updates[0].reported_at().unwrap().timestamp(), 1_724_098_547);
        assert_eq!(updates[1].error(), Some(("131026".to_string(), "Message undeliverable".to_string())));
    }

    #[test]
    fn inbound_messages_carry_no_statuses() {
        let body = r#"{"object":"whatsapp_business_account","entry":[{"id":"1","changes":[{"field":"messages",
            "value":{"messages":[{"from":"84901234567","id":"wamid.x","type":"text","text":{"body":"hi"}}]}}]}]}"#;
        let webhook: WhatsAppWebhook = serde_json::from_str(body).unwrap();
        assert_eq!(webhook.status_updates().count(), 0);
    }
}
