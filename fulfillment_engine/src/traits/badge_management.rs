use chrono::{DateTime, Utc};

use crate::{
    db_types::{NewBadge, OrderNumber, TouristBadge},
    traits::FulfillmentDbError,
};

#[allow(async_fn_in_trait)]
pub trait BadgeManagement {
    /// Persists a new, active badge.
    ///
    /// Fails with [`FulfillmentDbError::DuplicateBadgeCode`] if the code is already taken, and with
    /// [`FulfillmentDbError::BadgeAlreadyExists`] if the order already has an active badge.
    async fn insert_badge(&self, badge: NewBadge) -> Result<TouristBadge, FulfillmentDbError>;

    async fn fetch_badge_by_code(&self, code: &str) -> Result<Option<TouristBadge>, FulfillmentDbError>;

    async fn fetch_active_badge_for_order(
        &self,
        order_number: &OrderNumber,
    ) -> Result<Option<TouristBadge>, FulfillmentDbError>;

    /// All badges ever issued for the order, newest first.
    async fn fetch_badges_for_order(&self, order_number: &OrderNumber)
        -> Result<Vec<TouristBadge>, FulfillmentDbError>;

    /// Revokes the badge if it is active. Returns `None` if no active badge with this code exists.
    async fn revoke_badge(
        &self,
        code: &str,
        actor: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<TouristBadge>, FulfillmentDbError>;
}
