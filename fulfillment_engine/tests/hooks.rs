use std::{
    sync::{
        atomic::{AtomicI32, Ordering},
        Arc,
    },
    time::Duration,
};

use fulfillment_engine::{
    db_types::{Channel, OrderNumber},
    events::{EventHandlers, EventHooks},
    traits::MessageManagement,
};
use futures_util::FutureExt;
use log::*;
use tokio::runtime::Runtime;

mod support;

use support::TestSystem;

#[derive(Default, Clone)]
struct HookCalled {
    called: Arc<AtomicI32>,
}

impl HookCalled {
    pub fn called(&self) {
        let _ = self.called.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> i32 {
        self.called.load(Ordering::Relaxed)
    }
}

/// Hooks run on their own tasks, so give them a moment to drain their queues.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

#[test]
fn on_order_confirmed_fires_once_per_order() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let rt = Runtime::new().unwrap();
    let event = HookCalled::default();
    let event_copy = event.clone();
    rt.block_on(async move {
        let mut hooks = EventHooks::default();
        hooks.on_order_confirmed(move |ev| {
            info!("🪝️ Order {} confirmed", ev.order.order_number);
            assert!(ev.badge.is_some());
            event_copy.called();
            async {}.boxed()
        });
        let handlers = EventHandlers::new(16, hooks);
        let sys = TestSystem::with_producers(handlers.producers()).await;
        handlers.start_handlers().await;

        let first = sys.paid_order("DT-7001").await;
        // A duplicate payment callback replays the side effects without issuing a new badge
        sys.paid_order("DT-7001").await;
        // Nor does a replay after the badge was revoked
        let code = first.badge.badge().unwrap().badge_code.clone();
        sys.badges.revoke(&code, "admin-1", "Lost badge").await.unwrap();
        sys.paid_order("DT-7001").await;
        sys.paid_order("DT-7002").await;
        settle().await;
        sys.tear_down().await;
    });
    assert_eq!(event.count(), 2);
    info!("🪝️ test complete");
}

#[test]
fn on_message_status_changed_follows_sends_and_callbacks() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let rt = Runtime::new().unwrap();
    let event = HookCalled::default();
    let event_copy = event.clone();
    rt.block_on(async move {
        let mut hooks = EventHooks::default();
        hooks.on_message_status_changed(move |ev| {
            info!("🪝️ Message {} moved from {} to {}", ev.message.id, ev.previous, ev.message.status);
            event_copy.called();
            async {}.boxed()
        });
        let handlers = EventHandlers::new(16, hooks);
        let sys = TestSystem::with_producers(handlers.producers()).await;
        handlers.start_handlers().await;

        // One event per channel send
        sys.paid_order("DT-7003").await;
        let messages = sys.db.fetch_messages_for_order(&OrderNumber::from("DT-7003")).await.unwrap();
        let sms = messages.into_iter().find(|m| m.channel() == Channel::Sms).unwrap();
        let pid = sms.provider_message_id.clone().unwrap();
        // One more for the applied callback, none for the stale one
        sys.delivery.reconcile(&pid, "delivered", None).await.unwrap();
        sys.delivery.reconcile(&pid, "sent", None).await.unwrap();
        settle().await;
        sys.tear_down().await;
    });
    assert_eq!(event.count(), 3);
    info!("🪝️ test complete");
}
