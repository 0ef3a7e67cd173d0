use log::*;
use tour_common::Secret;

const DEFAULT_SMS_BASE_URL: &str = "https://api.twilio.com/2010-04-01";
const DEFAULT_WHATSAPP_BASE_URL: &str = "https://graph.facebook.com";
const DEFAULT_WHATSAPP_API_VERSION: &str = "v19.0";

#[derive(Debug, Clone, Default)]
pub struct SmsConfig {
    pub base_url: String,
    pub account_sid: String,
    pub auth_token: Secret<String>,
    /// The sender number, in E.164 format.
    pub from_number: String,
    /// Where the provider should post delivery reports. Without it, SMS statuses never advance past `sent`.
    pub status_callback_url: Option<String>,
}

impl SmsConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("TFS_SMS_BASE_URL").unwrap_or_else(|_| {
            info!("🪛️ TFS_SMS_BASE_URL not set, using {DEFAULT_SMS_BASE_URL}");
            DEFAULT_SMS_BASE_URL.to_string()
        });
        let account_sid = std::env::var("TFS_SMS_ACCOUNT_SID").unwrap_or_else(|_| {
            warn!("🪛️ TFS_SMS_ACCOUNT_SID not set, using (probably useless) default");
            "AC00000000000000000000000000000000".to_string()
        });
        let auth_token = Secret::new(std::env::var("TFS_SMS_AUTH_TOKEN").unwrap_or_else(|_| {
            warn!("🪛️ TFS_SMS_AUTH_TOKEN not set, using (probably useless) default");
            "00000000000000".to_string()
        }));
        let from_number = std::env::var("TFS_SMS_FROM").unwrap_or_else(|_| {
            warn!("🪛️ TFS_SMS_FROM not set, using (probably useless) default");
            "+15005550006".to_string()
        });
        let status_callback_url = std::env::var("TFS_SMS_STATUS_CALLBACK_URL").ok();
        if status_callback_url.is_none() {
            warn!("🪛️ TFS_SMS_STATUS_CALLBACK_URL not set. SMS delivery reports will not be received.");
        }
        Self { base_url, account_sid, auth_token, from_number, status_callback_url }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WhatsAppConfig {
    pub base_url: String,
    pub api_version: String,
    pub phone_number_id: String,
    pub access_token: Secret<String>,
}

impl WhatsAppConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("TFS_WHATSAPP_BASE_URL").unwrap_or_else(|_| {
            info!("🪛️ TFS_WHATSAPP_BASE_URL not set, using {DEFAULT_WHATSAPP_BASE_URL}");
            DEFAULT_WHATSAPP_BASE_URL.to_string()
        });
        let api_version = std::env::var("TFS_WHATSAPP_API_VERSION").unwrap_or_else(|_| {
            info!("🪛️ TFS_WHATSAPP_API_VERSION not set, using {DEFAULT_WHATSAPP_API_VERSION}");
            DEFAULT_WHATSAPP_API_VERSION.to_string()
        });
        let phone_number_id = std::env::var("TFS_WHATSAPP_PHONE_NUMBER_ID").unwrap_or_else(|_| {
            warn!("🪛️ TFS_WHATSAPP_PHONE_NUMBER_ID not set, using (probably useless) default");
            "000000000000000".to_string()
        });
        let access_token = Secret::new(std::env::var("TFS_WHATSAPP_ACCESS_TOKEN").unwrap_or_else(|_| {
            warn!("🪛️ TFS_WHATSAPP_ACCESS_TOKEN not set, using (probably useless) default");
            "EAA00000000000".to_string()
        }));
        Self { base_url, api_version, phone_number_id, access_token }
    }
}
