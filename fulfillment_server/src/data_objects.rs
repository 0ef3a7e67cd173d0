use std::fmt::Display;

use chrono::{DateTime, Utc};
use fulfillment_engine::db_types::{Order, OrderNumber, OutboundMessage, PaymentDetails, TouristBadge};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The payment gateway's confirmation that a booking has been paid for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCallback {
    pub order_number: OrderNumber,
    #[serde(flatten)]
    pub details: PaymentDetails,
}

/// A payment status change, as posted by the gateway's status webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStatusNotification {
    pub order_number: OrderNumber,
    #[serde(flatten)]
    pub update: PaymentStatusUpdate,
}

/// An administrative payment status correction. The order number is taken from the path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStatusUpdate {
    pub status: String,
    #[serde(flatten)]
    pub details: PaymentDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonParams {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceParams {
    pub locale: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyParams {
    /// Verify as of this instant rather than now
    pub at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationParams {
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceUpdate {
    pub sms_enabled: bool,
    pub whatsapp_enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetryParams {
    /// Overrides the configured retry deadline, in minutes
    pub older_than_mins: Option<i64>,
    pub max_attempts: Option<i64>,
}

/// An order, with everything the pipeline has produced for it.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    pub order: Order,
    pub badge: Option<TouristBadge>,
    pub messages: Vec<OutboundMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkedRead {
    pub updated: u64,
}
