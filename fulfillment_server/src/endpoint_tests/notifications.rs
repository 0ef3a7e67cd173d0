use actix_web::{http::StatusCode, test::TestRequest};
use fulfillment_engine::db_types::Channel;
use serde_json::json;

use super::helpers::{as_admin, as_customer, TestContext, CUSTOMER};

#[actix_web::test]
async fn customers_read_their_own_notifications() {
    let ctx = TestContext::new().await;
    ctx.paid_order("DT-6001").await;
    ctx.paid_order("DT-6002").await;

    let (status, list) = ctx.call_json(as_customer(TestRequest::get().uri("/api/notifications"), CUSTOMER)).await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().expect("a list of notifications").clone();
    assert_eq!(list.len(), 2);
    assert!(list.iter().all(|n| n["recipient_id"] == CUSTOMER && n["is_read"] == false));
    let id = list[0]["id"].as_i64().expect("notification id");

    // Someone else's notification looks like a missing one
    let uri = format!("/api/notifications/{id}/read");
    let (status, _) = ctx.call(as_customer(TestRequest::post().uri(&uri), "cust-99")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, read) = ctx.call_json(as_customer(TestRequest::post().uri(&uri), CUSTOMER)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read["is_read"], true);

    let req = as_customer(TestRequest::get().uri("/api/notifications?unread_only=true"), CUSTOMER);
    let (_, unread) = ctx.call_json(req).await;
    assert_eq!(unread.as_array().map(|a| a.len()), Some(1));

    let req = as_customer(TestRequest::post().uri("/api/notifications/read_all"), CUSTOMER);
    let (status, marked) = ctx.call_json(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(marked["updated"], 1);

    let (_, others) = ctx.call_json(as_customer(TestRequest::get().uri("/api/notifications"), "cust-99")).await;
    assert_eq!(others, json!([]));
    ctx.tear_down().await;
}

#[actix_web::test]
async fn preferences_switch_channels_off() {
    let ctx = TestContext::new().await;
    let (status, pref) = ctx.call_json(as_customer(TestRequest::get().uri("/api/preferences"), CUSTOMER)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pref["sms_enabled"], true);
    assert_eq!(pref["whatsapp_enabled"], true);

    let update = json!({ "sms_enabled": false, "whatsapp_enabled": true });
    let req = as_customer(TestRequest::put().uri("/api/preferences").set_json(update), CUSTOMER);
    let (status, pref) = ctx.call_json(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pref["customer_id"], CUSTOMER);
    assert_eq!(pref["sms_enabled"], false);

    let result = ctx.paid_order("DT-6003").await;
    let channels = result["dispatch"]["channels"].as_array().expect("a dispatch report").clone();
    let sms = channels.iter().find(|c| c["channel"] == "sms").expect("an SMS entry");
    assert_eq!(sms["outcome"], "disabled");
    assert!(ctx.messenger.sent_on(Channel::Sms).is_empty());
    assert_eq!(ctx.messenger.sent_on(Channel::WhatsApp).len(), 1);

    let (status, _) = ctx.call(TestRequest::get().uri("/api/preferences")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = ctx.call(as_admin(TestRequest::get().uri("/api/preferences"))).await;
    assert_eq!(status, StatusCode::OK);
    ctx.tear_down().await;
}
