use std::time::Duration;

use chrono::Utc;
use cucumber::{then, when};
use fulfillment_engine::{
    db_types::{Channel, OrderNumber, OrderStatusType, OutboundMessage, PaymentDetails},
    dispatch_objects::ReconcileOutcome,
    order_objects::BadgeOutcome,
    traits::{BadgeManagement, MessageManagement, OrderManagement},
};

use crate::{cucumber::FulfillmentWorld, support::new_order};

#[when(expr = "order {word} is placed")]
async fn place_order(world: &mut FulfillmentWorld, number: String) {
    let (_, inserted) = world.system().orders.create_order(new_order(&number)).await.expect("Error creating order");
    assert!(inserted, "Order {number} already existed");
}

#[when(expr = "the payment for order {word} succeeds with transaction [{word}]")]
async fn payment_succeeds(world: &mut FulfillmentWorld, number: String, txid: String) {
    let details = PaymentDetails::default().with_transaction_id(&txid).with_paid_at(Utc::now());
    let result = world
        .system()
        .orders
        .record_payment_success(&OrderNumber::from(number), details)
        .await
        .expect("Error recording payment");
    world.last_confirmation = Some(result);
}

#[when(expr = "the {word} provider reports the confirmation for order {word} as {word}")]
async fn provider_reports(world: &mut FulfillmentWorld, channel: String, number: String, status: String) {
    let message = confirmation_message(world, &number, &channel).await;
    let pid = message.provider_message_id.expect("The confirmation was never accepted by the provider");
    let outcome = world.system().delivery.reconcile(&pid, &status, None).await.expect("Error reconciling status");
    world.last_reconcile = Some(outcome);
}

#[when(expr = "the provider reports message [{word}] as {word}")]
async fn provider_reports_unknown(world: &mut FulfillmentWorld, pid: String, status: String) {
    let outcome = world.system().delivery.reconcile(&pid, &status, None).await.expect("Error reconciling status");
    world.last_reconcile = Some(outcome);
}

#[when(expr = "I pause for {int}ms")]
async fn pause(_world: &mut FulfillmentWorld, ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

async fn confirmation_message(world: &FulfillmentWorld, number: &str, channel: &str) -> OutboundMessage {
    let channel = channel.parse::<Channel>().expect("Unknown channel");
    let messages = world
        .system()
        .db
        .fetch_messages_for_order(&OrderNumber::from(number))
        .await
        .expect("Error fetching messages");
    let mut on_channel = messages.into_iter().filter(|m| m.channel() == channel).collect::<Vec<_>>();
    assert_eq!(on_channel.len(), 1, "Expected exactly one {channel} confirmation for order {number}");
    on_channel.remove(0)
}

#[then(expr = "order {word} is {word}")]
async fn check_order_status(world: &mut FulfillmentWorld, number: String, status: String) {
    let order = world
        .system()
        .db
        .fetch_order(&OrderNumber::from(number.as_str()))
        .await
        .expect("Error fetching order")
        .expect("Order does not exist");
    let expected = status.parse::<OrderStatusType>().expect("Not a valid order status");
    assert_eq!(order.status, expected, "Order {number} has the wrong status");
}

#[then(expr = "order {word} has {int} active badge(s)")]
async fn check_active_badges(world: &mut FulfillmentWorld, number: String, count: usize) {
    let badges = world
        .system()
        .db
        .fetch_badges_for_order(&OrderNumber::from(number))
        .await
        .expect("Error fetching badges");
    assert_eq!(badges.iter().filter(|b| b.is_active()).count(), count);
}

#[then("the last confirmation issued a new badge")]
async fn check_new_badge(world: &mut FulfillmentWorld) {
    let badge = &world.last_confirmation().badge;
    assert!(matches!(badge, BadgeOutcome::Issued { .. }), "Expected a new badge, got {badge:?}");
}

#[then("the last confirmation reused the existing badge")]
async fn check_reused_badge(world: &mut FulfillmentWorld) {
    let badge = &world.last_confirmation().badge;
    assert!(matches!(badge, BadgeOutcome::AlreadyIssued { .. }), "Expected the existing badge, got {badge:?}");
}

#[then(expr = "the {word} confirmation for order {word} is {word}")]
async fn check_message_status(world: &mut FulfillmentWorld, channel: String, number: String, status: String) {
    let message = confirmation_message(world, &number, &channel).await;
    assert_eq!(message.status.as_str(), status, "The {channel} confirmation has the wrong status");
}

#[then(expr = "the {word} provider was asked to send {int} message(s)")]
async fn check_provider_sends(world: &mut FulfillmentWorld, channel: String, count: usize) {
    let channel = channel.parse::<Channel>().expect("Unknown channel");
    assert_eq!(world.system().messenger.sent_on(channel).len(), count);
}

#[then(expr = "customer '{word}' has {int} unread notification(s)")]
async fn check_unread(world: &mut FulfillmentWorld, customer: String, count: usize) {
    let unread = world.system().notifications.list(&customer, true).await.expect("Error fetching notifications");
    assert_eq!(unread.len(), count);
}

#[then("the report is acknowledged and ignored")]
async fn check_ignored_report(world: &mut FulfillmentWorld) {
    let outcome = world.last_reconcile.as_ref().expect("No delivery report was processed");
    assert!(
        matches!(outcome, ReconcileOutcome::Ignored { .. } | ReconcileOutcome::NotFound),
        "Expected the report to be ignored, got {outcome:?}"
    );
}

#[then(expr = "the badge for order {word} is valid during the trip")]
async fn check_badge_valid(world: &mut FulfillmentWorld, number: String) {
    let sys = world.system();
    let badge = sys
        .db
        .fetch_active_badge_for_order(&OrderNumber::from(number))
        .await
        .expect("Error fetching badge")
        .expect("Order has no active badge");
    let verdict = sys.badges.verify(&badge.badge_code, badge.valid_from).await.expect("Error verifying badge");
    assert!(verdict.is_valid(), "Expected the badge to be valid, got {verdict:?}");
}
