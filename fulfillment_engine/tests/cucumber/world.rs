use std::fmt::Debug;

use cucumber::World;
use fulfillment_engine::{dispatch_objects::ReconcileOutcome, order_objects::ConfirmationResult};

use crate::support::TestSystem;

#[derive(Default, World)]
pub struct FulfillmentWorld {
    pub system: Option<TestSystem>,
    /// The result of the most recent confirmation step
    pub last_confirmation: Option<ConfirmationResult>,
    pub last_reconcile: Option<ReconcileOutcome>,
}

impl Debug for FulfillmentWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.system {
            Some(sys) => write!(f, "FulfillmentWorld({})", sys.url),
            None => write!(f, "FulfillmentWorld(uninitialised)"),
        }
    }
}

impl FulfillmentWorld {
    pub fn system(&self) -> &TestSystem {
        self.system.as_ref().expect("Test system not initialised")
    }

    pub fn last_confirmation(&self) -> &ConfirmationResult {
        self.last_confirmation.as_ref().expect("No order has been confirmed in this scenario")
    }
}
