use serde::Serialize;

use crate::{
    db_types::{Order, TouristBadge},
    fe_api::dispatch_objects::DispatchReport,
};

/// What happened to the badge when an order was confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum BadgeOutcome {
    Issued { badge: TouristBadge },
    /// The order already has, or once had, a badge. Revoked badges are not replaced by a replay.
    AlreadyIssued { code: String },
    /// Issuance failed. The order stays confirmed; the badge can be issued later.
    Failed { reason: String },
    /// Side effects were not run for this transition.
    Skipped,
}

impl BadgeOutcome {
    pub fn badge(&self) -> Option<&TouristBadge> {
        match self {
            Self::Issued { badge } => Some(badge),
            _ => None,
        }
    }
}

/// The result of a payment transition: the updated order, plus the outcome of any side effects it triggered.
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmationResult {
    pub order: Order,
    pub badge: BadgeOutcome,
    /// `None` when the notification dispatch did not run.
    pub dispatch: Option<DispatchReport>,
}

impl ConfirmationResult {
    pub fn without_side_effects(order: Order) -> Self {
        Self { order, badge: BadgeOutcome::Skipped, dispatch: None }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CancellationResult {
    pub order: Order,
    pub revoked_badge: Option<TouristBadge>,
}
