//! Data types that are stored in, and read from, the fulfillment database.
//!
//! Most of these map one-to-one onto a table row. The exception is [`OutboundMessage`], whose `status` column is
//! interpreted according to the message's [`Channel`] (see [`MessageStatus`]).
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row, Type};
use thiserror::Error;
pub use tour_common::Money;

pub use crate::message_status::{MessageStatus, SmsStatus, WhatsAppStatus};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid status: {0}")]
pub struct InvalidStatus(pub String);

//--------------------------------------     OrderNumber       ---------------------------------------------------------
/// The human-readable order number assigned at checkout, e.g. `DT-1001`. Unique and immutable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(pub String);

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderNumber {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// Created at checkout. No confirmed payment yet.
    Pending,
    /// Payment succeeded and the order is confirmed.
    Confirmed,
    /// Cancelled by an administrator.
    Cancelled,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "pending"),
            OrderStatusType::Confirmed => write!(f, "confirmed"),
            OrderStatusType::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(InvalidStatus(s.to_string())),
        }
    }
}

//--------------------------------------    PaymentStatus      ---------------------------------------------------------
/// The payment lifecycle of an order. Unlike channel delivery statuses, payment statuses are not ordered: an
/// administrator may move a payment between any two states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Success,
    Failed,
    Cancelled,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

impl FromStr for PaymentStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(InvalidStatus(s.to_string())),
        }
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_number: OrderNumber,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    /// The serialized cart, exactly as it was submitted at checkout.
    pub cart: String,
    pub total: Money,
    pub currency: String,
    pub status: OrderStatusType,
    pub payment_status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub payment_method: Option<String>,
    pub trip_date: Option<NaiveDate>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_confirmed(&self) -> bool {
        self.status == OrderStatusType::Confirmed
    }
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub customer_id: String,
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    /// The cart payload. Stored verbatim; only the invoice renderer interprets it.
    pub cart: serde_json::Value,
    pub total: Money,
    pub currency: String,
    #[serde(default)]
    pub trip_date: Option<NaiveDate>,
}

impl NewOrder {
    pub fn new(order_number: OrderNumber, customer_id: &str, customer_name: &str, total: Money) -> Self {
        Self {
            order_number,
            customer_id: customer_id.to_string(),
            customer_name: customer_name.to_string(),
            customer_email: None,
            customer_phone: None,
            cart: serde_json::Value::Array(vec![]),
            total,
            currency: "USD".to_string(),
            trip_date: None,
        }
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.customer_email = Some(email.to_string());
        self
    }

    pub fn with_phone(mut self, phone: &str) -> Self {
        self.customer_phone = Some(phone.to_string());
        self
    }

    pub fn with_cart(mut self, cart: serde_json::Value) -> Self {
        self.cart = cart;
        self
    }

    pub fn with_currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_string();
        self
    }

    pub fn with_trip_date(mut self, date: NaiveDate) -> Self {
        self.trip_date = Some(date);
        self
    }
}

//--------------------------------------    PaymentDetails     ---------------------------------------------------------
/// Optional payment-processor metadata that accompanies a payment confirmation or status update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    /// An explicit payment time. When absent, moving to `success` stamps the current time (if not already set).
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}

impl PaymentDetails {
    pub fn with_transaction_id(mut self, txid: &str) -> Self {
        self.transaction_id = Some(txid.to_string());
        self
    }

    pub fn with_payment_method(mut self, method: &str) -> Self {
        self.payment_method = Some(method.to_string());
        self
    }

    pub fn with_paid_at(mut self, paid_at: DateTime<Utc>) -> Self {
        self.paid_at = Some(paid_at);
        self
    }
}

//--------------------------------------     BadgeStatus       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BadgeStatus {
    Active,
    Revoked,
}

impl Display for BadgeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BadgeStatus::Active => write!(f, "active"),
            BadgeStatus::Revoked => write!(f, "revoked"),
        }
    }
}

//--------------------------------------     TouristBadge      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct TouristBadge {
    pub id: i64,
    pub badge_code: String,
    pub order_number: OrderNumber,
    pub holder_id: String,
    pub holder_name: String,
    pub trip_summary: String,
    pub status: BadgeStatus,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revoked_by: Option<String>,
    pub revoke_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TouristBadge {
    pub fn is_active(&self) -> bool {
        self.status == BadgeStatus::Active
    }
}

#[derive(Debug, Clone)]
pub struct NewBadge {
    pub badge_code: String,
    pub order_number: OrderNumber,
    pub holder_id: String,
    pub holder_name: String,
    pub trip_summary: String,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

//--------------------------------------         Role          ---------------------------------------------------------
/// Roles asserted by the external identity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Customer => write!(f, "customer"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" | "user" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            _ => Err(InvalidStatus(format!("Unknown role: {s}"))),
        }
    }
}

//--------------------------------------        Channel        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    InApp,
    Sms,
    #[sqlx(rename = "whatsapp")]
    #[serde(rename = "whatsapp")]
    WhatsApp,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::InApp, Channel::Sms, Channel::WhatsApp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::InApp => "in_app",
            Channel::Sms => "sms",
            Channel::WhatsApp => "whatsapp",
        }
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in_app" | "inapp" => Ok(Self::InApp),
            "sms" => Ok(Self::Sms),
            "whatsapp" => Ok(Self::WhatsApp),
            _ => Err(InvalidStatus(format!("Unknown channel: {s}"))),
        }
    }
}

//--------------------------------------      MessageType      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    BookingConfirmation,
    Reminder,
    PickupNotice,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::BookingConfirmation => "booking_confirmation",
            MessageType::Reminder => "reminder",
            MessageType::PickupNotice => "pickup_notice",
        }
    }
}

impl Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "booking_confirmation" => Ok(Self::BookingConfirmation),
            "reminder" => Ok(Self::Reminder),
            "pickup_notice" => Ok(Self::PickupNotice),
            _ => Err(InvalidStatus(format!("Unknown message type: {s}"))),
        }
    }
}

//--------------------------------------    OutboundMessage    ---------------------------------------------------------
/// One SMS or WhatsApp message, tracked from the moment it is queued until the provider reports a final status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub id: i64,
    pub order_number: OrderNumber,
    pub recipient: String,
    pub body: String,
    pub message_type: MessageType,
    pub status: MessageStatus,
    pub provider_message_id: Option<String>,
    pub attempts: i64,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OutboundMessage {
    pub fn channel(&self) -> Channel {
        self.status.channel()
    }
}

impl FromRow<'_, SqliteRow> for OutboundMessage {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let channel: Channel = row.try_get("channel")?;
        let status: String = row.try_get("status")?;
        let status = MessageStatus::parse(channel, &status).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(Self {
            id: row.try_get("id")?,
            order_number: row.try_get("order_number")?,
            recipient: row.try_get("recipient")?,
            body: row.try_get("body")?,
            message_type: row.try_get("message_type")?,
            status,
            provider_message_id: row.try_get("provider_message_id")?,
            attempts: row.try_get("attempts")?,
            scheduled_for: row.try_get("scheduled_for")?,
            sent_at: row.try_get("sent_at")?,
            delivered_at: row.try_get("delivered_at")?,
            read_at: row.try_get("read_at")?,
            error_code: row.try_get("error_code")?,
            error_message: row.try_get("error_message")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewOutboundMessage {
    pub order_number: OrderNumber,
    pub channel: Channel,
    pub recipient: String,
    pub body: String,
    pub message_type: MessageType,
    pub scheduled_for: Option<DateTime<Utc>>,
}

//--------------------------------------     Notification      ---------------------------------------------------------
/// An in-app notification.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub recipient_id: String,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub order_number: Option<OrderNumber>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: String,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub order_number: Option<OrderNumber>,
}

//--------------------------------------  NotificationPreference  ------------------------------------------------------
/// Per-customer channel opt-outs. A customer with no stored preference receives every channel.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct NotificationPreference {
    pub customer_id: String,
    pub sms_enabled: bool,
    pub whatsapp_enabled: bool,
    pub updated_at: DateTime<Utc>,
}

impl NotificationPreference {
    pub fn all_enabled(customer_id: &str) -> Self {
        Self { customer_id: customer_id.to_string(), sms_enabled: true, whatsapp_enabled: true, updated_at: Utc::now() }
    }

    /// In-app notifications cannot be switched off.
    pub fn allows(&self, channel: Channel) -> bool {
        match channel {
            Channel::InApp => true,
            Channel::Sms => self.sms_enabled,
            Channel::WhatsApp => self.whatsapp_enabled,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn payment_status_parsing() {
        assert_eq!("SUCCESS".parse::<PaymentStatus>().unwrap(), PaymentStatus::Success);
        assert_eq!(" processing".parse::<PaymentStatus>().unwrap(), PaymentStatus::Processing);
        let err = "refunded".parse::<PaymentStatus>().unwrap_err();
        assert_eq!(err, InvalidStatus("refunded".into()));
    }

    #[test]
    fn channel_names() {
        for c in Channel::ALL {
            assert_eq!(c.as_str().parse::<Channel>().unwrap(), c);
        }
        assert_eq!(serde_json::to_string(&Channel::WhatsApp).unwrap(), "\"whatsapp\"");
        assert_eq!(serde_json::to_string(&Channel::InApp).unwrap(), "\"in_app\"");
    }

    #[test]
    fn preferences_gate_external_channels_only() {
        let mut pref = NotificationPreference::all_enabled("alice");
        pref.sms_enabled = false;
        pref.whatsapp_enabled = false;
        assert!(pref.allows(Channel::InApp));
        assert!(!pref.allows(Channel::Sms));
        assert!(!pref.allows(Channel::WhatsApp));
    }
}
