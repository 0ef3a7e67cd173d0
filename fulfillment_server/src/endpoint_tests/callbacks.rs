use actix_web::{http::StatusCode, test::TestRequest};
use chrono::Duration;
use fulfillment_engine::{
    db_types::{Channel, OrderNumber},
    test_utils::prepare_env::age_messages,
};
use serde_json::{json, Value};

use super::helpers::{as_admin, signed_form, signed_json, TestContext, CALLBACK_SECRET, PAYMENT_SECRET};

async fn message_status(ctx: &TestContext, order_number: &str, provider_id: &str) -> Value {
    let req = as_admin(TestRequest::get().uri(&format!("/api/orders/{order_number}")));
    let (status, details) = ctx.call_json(req).await;
    assert_eq!(status, StatusCode::OK);
    details["messages"]
        .as_array()
        .and_then(|ms| ms.iter().find(|m| m["provider_message_id"] == provider_id))
        .map(|m| m["status"].clone())
        .unwrap_or(Value::Null)
}

fn sms_report(sid: &str, status: &str) -> TestRequest {
    signed_form("/callbacks/sms", CALLBACK_SECRET, &[("MessageSid", sid), ("MessageStatus", status)])
}

#[actix_web::test]
async fn sms_reports_advance_the_message() {
    let ctx = TestContext::new().await;
    ctx.paid_order("DT-4001").await;
    let sid = ctx.messenger.sent_on(Channel::Sms)[0].provider_message_id.clone();
    assert_eq!(message_status(&ctx, "DT-4001", &sid).await, "sent");

    let (status, ack) = ctx.call_json(sms_report(&sid, "delivered")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["success"], true);
    assert_eq!(message_status(&ctx, "DT-4001", &sid).await, "delivered");

    // A late 'sent' never moves the message backwards
    let (status, ack) = ctx.call_json(sms_report(&sid, "sent")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["success"], true);
    assert_eq!(message_status(&ctx, "DT-4001", &sid).await, "delivered");
    ctx.tear_down().await;
}

#[actix_web::test]
async fn sms_failures_keep_the_provider_error() {
    let ctx = TestContext::new().await;
    ctx.paid_order("DT-4002").await;
    let sid = ctx.messenger.sent_on(Channel::Sms)[0].provider_message_id.clone();
    let fields = [("MessageSid", sid.as_str()), ("MessageStatus", "undelivered"), ("ErrorCode", "30003")];
    let (status, _) = ctx.call(signed_form("/callbacks/sms", CALLBACK_SECRET, &fields)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, details) = ctx.call_json(as_admin(TestRequest::get().uri("/api/orders/DT-4002"))).await;
    let message = details["messages"]
        .as_array()
        .and_then(|ms| ms.iter().find(|m| m["provider_message_id"] == sid.as_str()).cloned())
        .expect("the SMS message should be listed");
    assert_eq!(message["status"], "undelivered");
    assert_eq!(message["error_code"], "30003");
    ctx.tear_down().await;
}

#[actix_web::test]
async fn unusable_reports_are_acknowledged() {
    let ctx = TestContext::new().await;
    ctx.paid_order("DT-4003").await;
    let sid = ctx.messenger.sent_on(Channel::Sms)[0].provider_message_id.clone();

    let (status, ack) = ctx.call_json(sms_report("SM00000000000000000000000000000000", "delivered")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["success"], true);

    // 'read' is not an SMS status
    let (status, ack) = ctx.call_json(sms_report(&sid, "read")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["success"], false);
    assert_eq!(message_status(&ctx, "DT-4003", &sid).await, "sent");
    ctx.tear_down().await;
}

#[actix_web::test]
async fn delivery_reports_must_be_signed() {
    let ctx = TestContext::new().await;
    let body = "MessageSid=SM1&MessageStatus=delivered";
    let req = TestRequest::post()
        .uri("/callbacks/sms")
        .insert_header(("Content-Type", "application/x-www-form-urlencoded"))
        .set_payload(body);
    let (status, _) = ctx.call(req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Payment webhooks use a different secret
    let (status, _) = ctx.call(signed_form("/callbacks/sms", PAYMENT_SECRET, &[("MessageSid", "SM1")])).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    ctx.tear_down().await;
}

#[actix_web::test]
async fn whatsapp_batches_are_reconciled_in_order() {
    let ctx = TestContext::new().await;
    ctx.paid_order("DT-4004").await;
    let wamid = ctx.messenger.sent_on(Channel::WhatsApp)[0].provider_message_id.clone();
    let webhook = json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "1029384756",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "statuses": [
                        { "id": wamid, "status": "delivered", "timestamp": "1893456000" },
                        { "id": wamid, "status": "read", "timestamp": "1893456060", "recipient_id": "84907654321" },
                        { "id": "wamid.unknown", "status": "read", "timestamp": "1893456060" }
                    ]
                }
            }]
        }]
    });
    let (status, acks) = ctx.call_json(signed_json("/callbacks/whatsapp", CALLBACK_SECRET, &webhook)).await;
    assert_eq!(status, StatusCode::OK);
    let acks = acks.as_array().expect("one acknowledgement per status");
    assert_eq!(acks.len(), 3);
    assert!(acks.iter().all(|a| a["success"] == true));
    assert_eq!(message_status(&ctx, "DT-4004", &wamid).await, "read");
    ctx.tear_down().await;
}

#[actix_web::test]
async fn failed_messages_can_be_retried_on_demand() {
    let ctx = TestContext::new().await;
    ctx.messenger.fail_channel(Channel::WhatsApp);
    ctx.paid_order("DT-4005").await;
    assert!(ctx.messenger.sent_on(Channel::WhatsApp).is_empty());
    ctx.messenger.restore_channel(Channel::WhatsApp);

    let retry = |body: Value| TestRequest::post().uri("/api/messages/retry").set_json(body);
    let (status, _) = ctx.call(retry(json!({ "older_than_mins": 5 }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Nothing is old enough yet
    let (status, report) = ctx.call_json(as_admin(retry(json!({ "older_than_mins": 5 })))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["considered"], 0);

    age_messages(&ctx.db, &OrderNumber::from("DT-4005"), Duration::minutes(10)).await;
    let (status, report) = ctx.call_json(as_admin(retry(json!({ "older_than_mins": 5 })))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["considered"], 1);
    assert_eq!(report["sent"], 1);
    assert_eq!(ctx.messenger.sent_on(Channel::WhatsApp).len(), 1);
    ctx.tear_down().await;
}

#[actix_web::test]
async fn retry_parameters_are_validated() {
    let ctx = TestContext::new().await;
    ctx.messenger.fail_channel(Channel::WhatsApp);
    ctx.paid_order("DT-4006").await;
    ctx.messenger.restore_channel(Channel::WhatsApp);

    let retry = |body: Value| as_admin(TestRequest::post().uri("/api/messages/retry").set_json(body));
    for body in [
        json!({ "older_than_mins": -60 }),
        json!({ "older_than_mins": 0 }),
        json!({ "older_than_mins": i64::MAX }),
        json!({ "max_attempts": 0 }),
        json!({ "max_attempts": -1 }),
    ] {
        let (status, err) = ctx.call_json(retry(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert!(err.to_string().contains("not valid"), "{err}");
    }
    // The message that just failed was never resent
    assert!(ctx.messenger.sent_on(Channel::WhatsApp).is_empty());
    ctx.tear_down().await;
}
