use std::{fmt::Debug, sync::Arc};

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use log::*;
use serde::Serialize;
use serde_json::json;

use crate::{
    db_types::{NewBadge, Order, OrderNumber, TouristBadge},
    fe_api::{errors::BadgeError, invoice::trip_summary},
    helpers::{generate_badge_code, is_valid_badge_code, QrCodeRenderer},
    traits::{BadgeManagement, CodeRenderer, FulfillmentDbError, RenderedCode},
};

/// How long a badge stays valid after the start of the trip day.
pub const DEFAULT_VALIDITY_DAYS: i64 = 1;
/// Orders without a trip date get a badge that is valid from the moment of issue for this many days.
pub const OPEN_DATED_VALIDITY_DAYS: i64 = 30;

/// A freshly issued badge together with its scannable artifact. The artifact is not stored; it can be regenerated from
/// the badge at any time with [`BadgeApi::render_artifact`].
#[derive(Debug, Clone)]
pub struct IssuedBadge {
    pub badge: TouristBadge,
    pub artifact: RenderedCode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "badge", rename_all = "snake_case")]
pub enum BadgeVerification {
    Valid(TouristBadge),
    Revoked(TouristBadge),
    NotYetValid(TouristBadge),
    Expired(TouristBadge),
    NotFound,
}

impl BadgeVerification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// `BadgeApi` issues, verifies and revokes tourist badges.
///
/// An order holds at most one active badge. The store enforces that, and it also owns the uniqueness of badge codes:
/// issuance never checks-then-inserts on codes, it inserts and reacts to the collision.
pub struct BadgeApi<B> {
    db: B,
    renderer: Arc<dyn CodeRenderer + Send + Sync>,
    validity_days: i64,
}

impl<B> Debug for BadgeApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BadgeApi ({} day validity)", self.validity_days)
    }
}

impl<B: Clone> Clone for BadgeApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), renderer: Arc::clone(&self.renderer), validity_days: self.validity_days }
    }
}

impl<B> BadgeApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, renderer: Arc::new(QrCodeRenderer::default()), validity_days: DEFAULT_VALIDITY_DAYS }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn CodeRenderer + Send + Sync>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Values below one day are raised to one day, so that `valid_until` is always after `valid_from`.
    pub fn with_validity_days(mut self, days: i64) -> Self {
        self.validity_days = days.max(1);
        self
    }

    /// The validity window for a badge issued for `order` at `now`.
    ///
    /// With a trip date, the window opens at midnight UTC on the trip day. Without one, it opens immediately and stays
    /// open for [`OPEN_DATED_VALIDITY_DAYS`].
    pub fn validity_window(&self, order: &Order, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        match order.trip_date {
            Some(date) => {
                let from = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
                (from, from + Duration::days(self.validity_days))
            },
            None => (now, now + Duration::days(OPEN_DATED_VALIDITY_DAYS)),
        }
    }

    fn render(
        &self,
        badge_code: &str,
        order_number: &OrderNumber,
        valid_until: &DateTime<Utc>,
    ) -> Result<RenderedCode, BadgeError> {
        let payload = json!({
            "code": badge_code,
            "order": order_number.as_str(),
            "valid_until": valid_until.to_rfc3339(),
        });
        self.renderer.render(&payload.to_string()).map_err(|e| BadgeError::RenderError(e.to_string()))
    }
}

impl<B: BadgeManagement> BadgeApi<B> {
    /// Issues the badge for a confirmed order.
    ///
    /// Fails with [`BadgeError::AlreadyExists`] if the order already has an active badge. A badge code collision is
    /// retried exactly once with a fresh code.
    pub async fn issue(&self, order: &Order) -> Result<IssuedBadge, BadgeError> {
        let order_number = &order.order_number;
        if !order.is_confirmed() {
            return Err(BadgeError::OrderNotConfirmed(order_number.clone()));
        }
        if let Some(badge) = self.db.fetch_active_badge_for_order(order_number).await? {
            return Err(BadgeError::AlreadyExists { order_number: order_number.clone(), code: badge.badge_code });
        }
        let summary = match trip_summary(&order.cart) {
            s if s.is_empty() => format!("Tour booking {order_number}"),
            s => s,
        };
        let mut retried = false;
        loop {
            let now = Utc::now();
            let (valid_from, valid_until) = self.validity_window(order, now);
            let badge_code = generate_badge_code(now);
            let artifact = self.render(&badge_code, order_number, &valid_until)?;
            let new_badge = NewBadge {
                badge_code,
                order_number: order_number.clone(),
                holder_id: order.customer_id.clone(),
                holder_name: order.customer_name.clone(),
                trip_summary: summary.clone(),
                valid_from,
                valid_until,
            };
            match self.db.insert_badge(new_badge).await {
                Ok(badge) => {
                    info!("🎫️ Badge {} issued for order {order_number}", badge.badge_code);
                    return Ok(IssuedBadge { badge, artifact });
                },
                Err(FulfillmentDbError::DuplicateBadgeCode(code)) if !retried => {
                    warn!("🎫️ Badge code {code} is already taken. Trying again with a new code.");
                    retried = true;
                },
                Err(FulfillmentDbError::BadgeAlreadyExists(_)) => {
                    // Lost a race with a concurrent issuance for the same order
                    let code = self
                        .db
                        .fetch_active_badge_for_order(order_number)
                        .await?
                        .map(|b| b.badge_code)
                        .unwrap_or_default();
                    return Err(BadgeError::AlreadyExists { order_number: order_number.clone(), code });
                },
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Issues the order's first badge.
    ///
    /// An order that has ever held a badge, revoked or not, gets [`BadgeError::AlreadyExists`] with its most recent
    /// code. Replacing a revoked badge is an explicit [`BadgeApi::issue`], never a side effect of a payment replay.
    pub async fn issue_first(&self, order: &Order) -> Result<IssuedBadge, BadgeError> {
        let order_number = &order.order_number;
        if let Some(latest) = self.db.fetch_badges_for_order(order_number).await?.into_iter().next() {
            trace!("🎫️ Order {order_number} already had badge {}. Not issuing another.", latest.badge_code);
            return Err(BadgeError::AlreadyExists { order_number: order_number.clone(), code: latest.badge_code });
        }
        self.issue(order).await
    }

    /// Re-creates the scannable artifact for an existing badge.
    pub async fn render_artifact(&self, code: &str) -> Result<RenderedCode, BadgeError> {
        let badge = self.fetch_badge(code).await?;
        self.render(&badge.badge_code, &badge.order_number, &badge.valid_until)
    }

    /// Checks a scanned code. A badge is valid when it is active and `at` falls inside its validity window.
    pub async fn verify(&self, code: &str, at: DateTime<Utc>) -> Result<BadgeVerification, BadgeError> {
        if !is_valid_badge_code(code) {
            return Ok(BadgeVerification::NotFound);
        }
        let verdict = match self.db.fetch_badge_by_code(code).await? {
            None => BadgeVerification::NotFound,
            Some(b) if !b.is_active() => BadgeVerification::Revoked(b),
            Some(b) if at < b.valid_from => BadgeVerification::NotYetValid(b),
            Some(b) if at >= b.valid_until => BadgeVerification::Expired(b),
            Some(b) => BadgeVerification::Valid(b),
        };
        trace!("🎫️ Badge {code} verified at {at}: {}", verdict.is_valid());
        Ok(verdict)
    }

    /// Soft-revokes a badge. The actor and a non-empty reason are recorded on the badge.
    pub async fn revoke(&self, code: &str, actor: &str, reason: &str) -> Result<TouristBadge, BadgeError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(BadgeError::MissingReason);
        }
        match self.db.revoke_badge(code, actor, reason, Utc::now()).await? {
            Some(badge) => {
                info!("🎫️ Badge {code} revoked by {actor}: {reason}");
                Ok(badge)
            },
            None => {
                let badge = self.fetch_badge(code).await?;
                Err(BadgeError::AlreadyRevoked(badge.badge_code))
            },
        }
    }

    /// The active badge for the order, if there is one.
    pub async fn badge_for_order(&self, order_number: &OrderNumber) -> Result<Option<TouristBadge>, BadgeError> {
        let badge = self.db.fetch_active_badge_for_order(order_number).await?;
        Ok(badge)
    }

    pub async fn fetch_badge(&self, code: &str) -> Result<TouristBadge, BadgeError> {
        self.db.fetch_badge_by_code(code).await?.ok_or_else(|| BadgeError::BadgeNotFound(code.to_string()))
    }
}
