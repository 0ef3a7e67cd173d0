use actix_web::{http::StatusCode, test::TestRequest};
use fulfillment_engine::db_types::Channel;
use serde_json::json;

use super::helpers::{signed_json, TestContext, CALLBACK_SECRET, PAYMENT_SECRET};
use crate::middleware::SIGNATURE_HEADER;

#[actix_web::test]
async fn unsigned_payment_callbacks_are_rejected() {
    let ctx = TestContext::new().await;
    ctx.create_order("DT-3001").await;
    let payload = json!({ "order_number": "DT-3001" });

    let req = TestRequest::post().uri("/payment/callback").set_json(&payload);
    let (status, _) = ctx.call(req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Signed with the wrong secret
    let (status, _) = ctx.call(signed_json("/payment/callback", CALLBACK_SECRET, &payload)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let req = TestRequest::post()
        .uri("/payment/callback")
        .insert_header((SIGNATURE_HEADER, "bm90IGEgc2lnbmF0dXJl"))
        .set_json(&payload);
    let (status, _) = ctx.call(req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(ctx.messenger.sent().is_empty());
    ctx.tear_down().await;
}

#[actix_web::test]
async fn a_payment_confirms_the_order_and_fans_out() {
    let ctx = TestContext::new().await;
    let result = ctx.paid_order("DT-3002").await;
    assert_eq!(result["order"]["status"], "confirmed");
    assert_eq!(result["order"]["payment_status"], "success");
    assert_eq!(result["order"]["transaction_id"], "tx-1");
    assert_eq!(result["badge"]["result"], "issued");
    assert_eq!(result["badge"]["badge"]["order_number"], "DT-3002");
    assert_eq!(ctx.messenger.sent_on(Channel::Sms).len(), 1);
    assert_eq!(ctx.messenger.sent_on(Channel::WhatsApp).len(), 1);
    ctx.tear_down().await;
}

#[actix_web::test]
async fn duplicate_payment_callbacks_change_nothing() {
    let ctx = TestContext::new().await;
    let first = ctx.paid_order("DT-3003").await;
    let code = first["badge"]["badge"]["badge_code"].as_str().expect("badge code").to_string();

    let payload = json!({ "order_number": "DT-3003", "transaction_id": "tx-1" });
    let (status, second) = ctx.call_json(signed_json("/payment/callback", PAYMENT_SECRET, &payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["badge"]["result"], "already_issued");
    assert_eq!(second["badge"]["code"], code.as_str());
    assert_eq!(ctx.messenger.sent().len(), 2);
    ctx.tear_down().await;
}

#[actix_web::test]
async fn payments_for_unknown_orders_are_not_found() {
    let ctx = TestContext::new().await;
    let payload = json!({ "order_number": "DT-0000" });
    let (status, body) = ctx.call(signed_json("/payment/callback", PAYMENT_SECRET, &payload)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("DT-0000"), "{body}");
    ctx.tear_down().await;
}

#[actix_web::test]
async fn malformed_payment_callbacks_are_bad_requests() {
    let ctx = TestContext::new().await;
    let payload = json!({ "transaction_id": "tx-1" });
    let (status, _) = ctx.call(signed_json("/payment/callback", PAYMENT_SECRET, &payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    ctx.tear_down().await;
}

#[actix_web::test]
async fn the_status_webhook_can_confirm_and_fail_payments() {
    let ctx = TestContext::new().await;
    ctx.create_order("DT-3004").await;
    ctx.create_order("DT-3005").await;

    let payload = json!({ "order_number": "DT-3004", "status": "failed" });
    let (status, result) = ctx.call_json(signed_json("/payment/status", PAYMENT_SECRET, &payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["order"]["payment_status"], "failed");
    assert_eq!(result["order"]["status"], "pending");

    let payload = json!({ "order_number": "DT-3005", "status": "SUCCESS", "payment_method": "card" });
    let (status, result) = ctx.call_json(signed_json("/payment/status", PAYMENT_SECRET, &payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["order"]["status"], "confirmed");
    assert_eq!(result["order"]["payment_method"], "card");
    assert!(!result["order"]["paid_at"].is_null());
    assert_eq!(result["badge"]["result"], "issued");
    ctx.tear_down().await;
}
