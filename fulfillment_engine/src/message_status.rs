//! Per-channel delivery status enumerations.
//!
//! Each external channel has its own ordered set of statuses. The declaration order of the variants *is* the delivery
//! order, so `Ord` gives the monotonic-forward comparison directly:
//!
//! | channel  | order                                              |
//! |----------|----------------------------------------------------|
//! | SMS      | queued → sent → delivered → undelivered → failed   |
//! | WhatsApp | queued → sent → delivered → read → failed          |
//!
//! [`MessageStatus`] tags a status with its channel so that a status from one channel can never be compared with, or
//! applied to, a message on another.
use std::fmt::Display;

use serde::{Serialize, Serializer};

use crate::db_types::{Channel, InvalidStatus};

/// The status-tracking behaviour shared by every external channel.
pub trait ChannelStatus: Copy + Ord + Display {
    const CHANNEL: Channel;

    /// Parses a provider status string. Matching is case-insensitive and accepts the provider's synonyms.
    fn parse(s: &str) -> Result<Self, InvalidStatus>;
    fn as_str(&self) -> &'static str;
    fn queued() -> Self;
    fn sent() -> Self;
    fn failed() -> Self;
    fn is_delivered(&self) -> bool;
    fn is_read(&self) -> bool;
    fn is_failure(&self) -> bool;
}

//--------------------------------------       SmsStatus       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SmsStatus {
    Queued,
    Sent,
    Delivered,
    Undelivered,
    Failed,
}

impl ChannelStatus for SmsStatus {
    const CHANNEL: Channel = Channel::Sms;

    fn parse(s: &str) -> Result<Self, InvalidStatus> {
        match s.trim().to_ascii_lowercase().as_str() {
            "queued" | "accepted" | "scheduled" => Ok(Self::Queued),
            "sent" | "sending" => Ok(Self::Sent),
            "delivered" => Ok(Self::Delivered),
            "undelivered" => Ok(Self::Undelivered),
            "failed" => Ok(Self::Failed),
            _ => Err(InvalidStatus(format!("'{s}' is not a valid SMS status"))),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Undelivered => "undelivered",
            Self::Failed => "failed",
        }
    }

    fn queued() -> Self {
        Self::Queued
    }

    fn sent() -> Self {
        Self::Sent
    }

    fn failed() -> Self {
        Self::Failed
    }

    fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    fn is_read(&self) -> bool {
        false
    }

    fn is_failure(&self) -> bool {
        matches!(self, Self::Undelivered | Self::Failed)
    }
}

impl Display for SmsStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//--------------------------------------     WhatsAppStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WhatsAppStatus {
    Queued,
    Sent,
    Delivered,
    Read,
    Failed,
}

impl ChannelStatus for WhatsAppStatus {
    const CHANNEL: Channel = Channel::WhatsApp;

    fn parse(s: &str) -> Result<Self, InvalidStatus> {
        match s.trim().to_ascii_lowercase().as_str() {
            "queued" | "accepted" => Ok(Self::Queued),
            "sent" => Ok(Self::Sent),
            "delivered" => Ok(Self::Delivered),
            "read" => Ok(Self::Read),
            "failed" => Ok(Self::Failed),
            _ => Err(InvalidStatus(format!("'{s}' is not a valid WhatsApp status"))),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
            Self::Failed => "failed",
        }
    }

    fn queued() -> Self {
        Self::Queued
    }

    fn sent() -> Self {
        Self::Sent
    }

    fn failed() -> Self {
        Self::Failed
    }

    /// A read receipt implies delivery.
    fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered | Self::Read)
    }

    fn is_read(&self) -> bool {
        matches!(self, Self::Read)
    }

    fn is_failure(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl Display for WhatsAppStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//--------------------------------------     MessageStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageStatus {
    Sms(SmsStatus),
    WhatsApp(WhatsAppStatus),
}

impl MessageStatus {
    /// Parses `status` using the enumeration of the given channel. The in-app channel has no delivery statuses.
    pub fn parse(channel: Channel, status: &str) -> Result<Self, InvalidStatus> {
        match channel {
            Channel::Sms => SmsStatus::parse(status).map(Self::Sms),
            Channel::WhatsApp => WhatsAppStatus::parse(status).map(Self::WhatsApp),
            Channel::InApp => Err(InvalidStatus(format!("The in-app channel has no delivery status ({status})"))),
        }
    }

    pub fn queued(channel: Channel) -> Option<Self> {
        match channel {
            Channel::Sms => Some(Self::Sms(SmsStatus::queued())),
            Channel::WhatsApp => Some(Self::WhatsApp(WhatsAppStatus::queued())),
            Channel::InApp => None,
        }
    }

    pub fn channel(&self) -> Channel {
        match self {
            Self::Sms(_) => SmsStatus::CHANNEL,
            Self::WhatsApp(_) => WhatsAppStatus::CHANNEL,
        }
    }

    /// True when `self` is strictly later than `current` in the channel's delivery order. Statuses from different
    /// channels never advance one another.
    pub fn advances_from(&self, current: &MessageStatus) -> bool {
        match (self, current) {
            (Self::Sms(new), Self::Sms(old)) => new > old,
            (Self::WhatsApp(new), Self::WhatsApp(old)) => new > old,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sms(s) => s.as_str(),
            Self::WhatsApp(s) => s.as_str(),
        }
    }

    pub fn is_queued(&self) -> bool {
        match self {
            Self::Sms(s) => *s == SmsStatus::queued(),
            Self::WhatsApp(s) => *s == WhatsAppStatus::queued(),
        }
    }

    pub fn is_sent(&self) -> bool {
        match self {
            Self::Sms(s) => *s == SmsStatus::sent(),
            Self::WhatsApp(s) => *s == WhatsAppStatus::sent(),
        }
    }

    pub fn is_failed(&self) -> bool {
        match self {
            Self::Sms(s) => *s == SmsStatus::failed(),
            Self::WhatsApp(s) => *s == WhatsAppStatus::failed(),
        }
    }

    pub fn is_delivered(&self) -> bool {
        match self {
            Self::Sms(s) => s.is_delivered(),
            Self::WhatsApp(s) => s.is_delivered(),
        }
    }

    pub fn is_read(&self) -> bool {
        match self {
            Self::Sms(s) => s.is_read(),
            Self::WhatsApp(s) => s.is_read(),
        }
    }

    pub fn is_failure(&self) -> bool {
        match self {
            Self::Sms(s) => s.is_failure(),
            Self::WhatsApp(s) => s.is_failure(),
        }
    }
}

impl Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.channel(), self.as_str())
    }
}

impl Serialize for MessageStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sms_ordering() {
        use SmsStatus::*;
        assert!(Queued < Sent);
        assert!(Sent < Delivered);
        assert!(Delivered < Undelivered);
        assert!(Undelivered < Failed);
    }

    #[test]
    fn whatsapp_ordering() {
        use WhatsAppStatus::*;
        assert!(Queued < Sent && Sent < Delivered && Delivered < Read && Read < Failed);
    }

    #[test]
    fn advances_only_forward_within_a_channel() {
        let sent = MessageStatus::Sms(SmsStatus::Sent);
        let delivered = MessageStatus::Sms(SmsStatus::Delivered);
        assert!(delivered.advances_from(&sent));
        assert!(!sent.advances_from(&delivered));
        assert!(!sent.advances_from(&sent));
        let wa_read = MessageStatus::WhatsApp(WhatsAppStatus::Read);
        assert!(!wa_read.advances_from(&sent));
    }

    #[test]
    fn provider_synonyms() {
        assert_eq!(MessageStatus::parse(Channel::Sms, "Accepted").unwrap(), MessageStatus::Sms(SmsStatus::Queued));
        assert_eq!(MessageStatus::parse(Channel::Sms, "sending").unwrap(), MessageStatus::Sms(SmsStatus::Sent));
        assert_eq!(
            MessageStatus::parse(Channel::WhatsApp, "READ").unwrap(),
            MessageStatus::WhatsApp(WhatsAppStatus::Read)
        );
    }

    #[test]
    fn statuses_outside_the_channel_set_are_rejected() {
        assert!(MessageStatus::parse(Channel::Sms, "read").is_err());
        assert!(MessageStatus::parse(Channel::WhatsApp, "undelivered").is_err());
        assert!(MessageStatus::parse(Channel::InApp, "sent").is_err());
        assert!(MessageStatus::parse(Channel::Sms, "").is_err());
    }

    #[test]
    fn read_implies_delivered() {
        let read = MessageStatus::WhatsApp(WhatsAppStatus::Read);
        assert!(read.is_delivered());
        assert!(read.is_read());
        assert!(!MessageStatus::Sms(SmsStatus::Delivered).is_read());
        assert!(MessageStatus::Sms(SmsStatus::Undelivered).is_failure());
    }
}
