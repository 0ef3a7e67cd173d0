use actix_web::{http::StatusCode, test::TestRequest};

use super::helpers::{as_admin, as_customer, new_order, TestContext, CUSTOMER};

#[actix_web::test]
async fn creating_orders_is_for_admins() {
    let ctx = TestContext::new().await;
    let req = TestRequest::post().uri("/api/orders").set_json(new_order("DT-2001"));
    let (status, body) = ctx.call(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{body}");

    let req = as_customer(TestRequest::post().uri("/api/orders").set_json(new_order("DT-2001")), CUSTOMER);
    let (status, body) = ctx.call(req).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
    ctx.tear_down().await;
}

#[actix_web::test]
async fn resubmitting_an_order_returns_the_stored_one() {
    let ctx = TestContext::new().await;
    ctx.create_order("DT-2002").await;
    let req = as_admin(TestRequest::post().uri("/api/orders").set_json(new_order("DT-2002")));
    let (status, order) = ctx.call_json(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["order_number"], "DT-2002");
    assert_eq!(order["status"], "pending");
    assert_eq!(order["payment_status"], "pending");
    ctx.tear_down().await;
}

#[actix_web::test]
async fn customers_only_see_their_own_orders() {
    let ctx = TestContext::new().await;
    ctx.paid_order("DT-2003").await;

    let req = as_customer(TestRequest::get().uri("/api/orders/DT-2003"), CUSTOMER);
    let (status, details) = ctx.call_json(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["order"]["status"], "confirmed");
    assert_eq!(details["badge"]["status"], "active");
    let messages = details["messages"].as_array().expect("messages should be a list");
    assert!(messages.iter().any(|m| m["recipient"] == "84907654321"));

    let req = as_customer(TestRequest::get().uri("/api/orders/DT-2003"), "cust-99");
    let (status, _) = ctx.call(req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.call(as_admin(TestRequest::get().uri("/api/orders/DT-2003"))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx.call(as_admin(TestRequest::get().uri("/api/orders/DT-9999"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    ctx.tear_down().await;
}

#[actix_web::test]
async fn admins_can_correct_the_payment_status() {
    let ctx = TestContext::new().await;
    ctx.create_order("DT-2004").await;
    let uri = "/api/orders/DT-2004/payment_status";

    let req = as_admin(TestRequest::post().uri(uri).set_json(serde_json::json!({ "status": "processing" })));
    let (status, result) = ctx.call_json(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["order"]["payment_status"], "processing");
    assert_eq!(result["order"]["status"], "pending");
    assert_eq!(result["badge"]["result"], "skipped");

    let payload = serde_json::json!({ "status": "success", "transaction_id": "tx-manual" });
    let (status, result) = ctx.call_json(as_admin(TestRequest::post().uri(uri).set_json(payload))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["order"]["status"], "confirmed");
    assert_eq!(result["order"]["transaction_id"], "tx-manual");
    assert_eq!(result["badge"]["result"], "issued");

    let req = as_admin(TestRequest::post().uri(uri).set_json(serde_json::json!({ "status": "refunded-ish" })));
    let (status, _) = ctx.call(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    ctx.tear_down().await;
}

#[actix_web::test]
async fn cancelling_an_order_revokes_its_badge() {
    let ctx = TestContext::new().await;
    ctx.paid_order("DT-2005").await;
    let uri = "/api/orders/DT-2005/cancel";

    let req = as_admin(TestRequest::post().uri(uri).set_json(serde_json::json!({ "reason": "  " })));
    let (status, _) = ctx.call(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let reason = serde_json::json!({ "reason": "changed my mind" });
    let req = as_customer(TestRequest::post().uri(uri).set_json(reason), CUSTOMER);
    let (status, _) = ctx.call(req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let req = as_admin(TestRequest::post().uri(uri).set_json(serde_json::json!({ "reason": "Tour operator closed" })));
    let (status, result) = ctx.call_json(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["order"]["status"], "cancelled");
    assert_eq!(result["revoked_badge"]["status"], "revoked");
    assert_eq!(result["revoked_badge"]["revoke_reason"], "Tour operator closed");

    let (status, details) = ctx.call_json(as_admin(TestRequest::get().uri("/api/orders/DT-2005"))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(details["badge"].is_null());
    ctx.tear_down().await;
}

#[actix_web::test]
async fn invoices_are_rendered_in_the_requested_locale() {
    let ctx = TestContext::new().await;
    ctx.paid_order("DT-2006").await;

    let req = as_customer(TestRequest::get().uri("/api/orders/DT-2006/invoice?locale=fr"), CUSTOMER);
    let (status, body) = ctx.call(req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("FACTURE"), "{body}");
    assert!(body.contains("DT-2006"));

    // Unknown locales fall back to English
    let req = as_customer(TestRequest::get().uri("/api/orders/DT-2006/invoice?locale=xx"), CUSTOMER);
    let (status, body) = ctx.call(req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("INVOICE"), "{body}");

    let req = as_customer(TestRequest::get().uri("/api/orders/DT-2006/invoice"), "cust-99");
    let (status, _) = ctx.call(req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    ctx.tear_down().await;
}
