use actix_web::{http::StatusCode, test::TestRequest};

use super::helpers::{as_admin, as_customer, TestContext, CUSTOMER};

async fn paid_badge(ctx: &TestContext, order_number: &str) -> String {
    let result = ctx.paid_order(order_number).await;
    result["badge"]["badge"]["badge_code"].as_str().expect("a badge should have been issued").to_string()
}

#[actix_web::test]
async fn badges_verify_against_their_validity_window() {
    let ctx = TestContext::new().await;
    let code = paid_badge(&ctx, "DT-5001").await;
    let verify = |at: &str| {
        let uri = format!("/api/badges/{code}/verify?at={at}");
        as_customer(TestRequest::get().uri(&uri), CUSTOMER)
    };

    let (status, verdict) = ctx.call_json(verify("2030-03-01T12:00:00Z")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verdict["verdict"], "valid");
    assert_eq!(verdict["badge"]["order_number"], "DT-5001");
    assert_eq!(verdict["badge"]["holder_id"], CUSTOMER);

    let (_, verdict) = ctx.call_json(verify("2030-02-28T12:00:00Z")).await;
    assert_eq!(verdict["verdict"], "not_yet_valid");

    let (_, verdict) = ctx.call_json(verify("2030-03-05T12:00:00Z")).await;
    assert_eq!(verdict["verdict"], "expired");

    let req = as_customer(TestRequest::get().uri("/api/badges/not-a-badge/verify"), CUSTOMER);
    let (status, verdict) = ctx.call_json(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verdict["verdict"], "not_found");
    ctx.tear_down().await;
}

#[actix_web::test]
async fn only_the_holder_can_fetch_the_qr_code() {
    let ctx = TestContext::new().await;
    let code = paid_badge(&ctx, "DT-5002").await;
    let uri = format!("/api/badges/{code}/qr");

    let (status, svg) = ctx.call(as_customer(TestRequest::get().uri(&uri), CUSTOMER)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(svg.contains("<svg"), "{svg}");

    let (status, _) = ctx.call(as_customer(TestRequest::get().uri(&uri), "cust-99")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.call(as_admin(TestRequest::get().uri(&uri))).await;
    assert_eq!(status, StatusCode::OK);
    ctx.tear_down().await;
}

#[actix_web::test]
async fn revocation_needs_an_admin_and_a_reason() {
    let ctx = TestContext::new().await;
    let code = paid_badge(&ctx, "DT-5003").await;
    let uri = format!("/api/badges/{code}/revoke");
    let reason = serde_json::json!({ "reason": "Reported lost" });

    let req = as_customer(TestRequest::post().uri(&uri).set_json(&reason), CUSTOMER);
    let (status, _) = ctx.call(req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let req = as_admin(TestRequest::post().uri(&uri).set_json(serde_json::json!({})));
    let (status, _) = ctx.call(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, badge) = ctx.call_json(as_admin(TestRequest::post().uri(&uri).set_json(&reason))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(badge["status"], "revoked");
    assert_eq!(badge["revoked_by"], "admin-1");

    let (status, _) = ctx.call(as_admin(TestRequest::post().uri(&uri).set_json(&reason))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let req = as_customer(TestRequest::get().uri(&format!("/api/badges/{code}/verify")), CUSTOMER);
    let (_, verdict) = ctx.call_json(req).await;
    assert_eq!(verdict["verdict"], "revoked");

    let (status, _) = ctx.call(as_admin(TestRequest::post().uri("/api/badges/nope/revoke").set_json(&reason))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    ctx.tear_down().await;
}
