use std::time::Duration;

use actix_web::{
    http::{header::ContentType, StatusCode},
    test,
    test::TestRequest,
    App,
};
use fulfillment_engine::{
    db_types::{Money, NewOrder, OrderNumber},
    events::EventProducers,
    test_utils::{
        prepare_env::{drop_database, prepare_test_env, random_db_path},
        StubMessenger,
    },
    SqliteDatabase,
};
use log::*;
use serde_json::Value;

use crate::{
    auth::{ROLE_HEADER, SUBJECT_HEADER},
    config::{HmacConfig, RetryConfig},
    helpers::calculate_hmac,
    middleware::SIGNATURE_HEADER,
    server::{register_apis, register_routes, ApiOptions},
};

pub const PAYMENT_SECRET: &str = "payment-secret";
pub const CALLBACK_SECRET: &str = "callback-secret";
pub const CUSTOMER: &str = "cust-42";

/// A server over a throwaway database and a stub messaging provider.
pub struct TestContext {
    url: String,
    pub db: SqliteDatabase,
    pub messenger: StubMessenger,
}

impl TestContext {
    pub async fn new() -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        Self { url, db, messenger: StubMessenger::new() }
    }

    pub async fn tear_down(self) {
        let TestContext { url, mut db, .. } = self;
        let _ = db.close().await;
        drop_database(&url).await;
    }

    /// Sends the request through a freshly configured app. Middleware rejections are returned like any other response.
    pub async fn call(&self, req: TestRequest) -> (StatusCode, String) {
        let db = self.db.clone();
        let messenger = self.messenger.clone();
        let options = ApiOptions {
            send_timeout: Duration::from_millis(250),
            badge_validity_days: 1,
            retry: RetryConfig::default(),
        };
        let payment_hmac = HmacConfig::new(PAYMENT_SECRET, true);
        let callback_hmac = HmacConfig::new(CALLBACK_SECRET, true);
        let app = App::new()
            .configure(move |cfg| register_apis(cfg, db, messenger, EventProducers::default(), &options))
            .configure(move |cfg| {
                register_routes::<SqliteDatabase, StubMessenger>(cfg, &payment_hmac, &callback_hmac)
            });
        let service = test::init_service(app).await;
        debug!("Making request");
        match test::try_call_service(&service, req.to_request()).await {
            Ok(res) => {
                let status = res.status();
                let body = test::read_body(res).await;
                (status, String::from_utf8_lossy(&body).into_owned())
            },
            Err(e) => (e.as_response_error().status_code(), e.to_string()),
        }
    }

    /// Like [`TestContext::call`], but also parses the body.
    pub async fn call_json(&self, req: TestRequest) -> (StatusCode, Value) {
        let (status, body) = self.call(req).await;
        let json = serde_json::from_str(&body).unwrap_or(Value::String(body));
        (status, json)
    }

    /// Creates the order through the admin API.
    pub async fn create_order(&self, number: &str) {
        let req = as_admin(TestRequest::post().uri("/api/orders").set_json(new_order(number)));
        let (status, body) = self.call(req).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    /// Creates the order and confirms it with a signed payment callback.
    pub async fn paid_order(&self, number: &str) -> Value {
        self.create_order(number).await;
        let payload = serde_json::json!({ "order_number": number, "transaction_id": "tx-1" });
        let (status, body) = self.call_json(signed_json("/payment/callback", PAYMENT_SECRET, &payload)).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body
    }
}

pub fn new_order(number: &str) -> NewOrder {
    let cart = serde_json::json!([{
        "name": "Mekong Delta Day Trip",
        "selected": ["Floating market"],
        "travellers": { "adult": 2 },
        "subtotal": 99.0
    }]);
    NewOrder::new(OrderNumber::from(number), CUSTOMER, "Minh Tran", Money::from(9900))
        .with_email("minh@example.com")
        .with_phone("84907654321")
        .with_cart(cart)
        .with_trip_date(chrono::NaiveDate::from_ymd_opt(2030, 3, 1).unwrap())
}

pub fn as_admin(req: TestRequest) -> TestRequest {
    req.insert_header((SUBJECT_HEADER, "admin-1")).insert_header((ROLE_HEADER, "admin"))
}

pub fn as_customer(req: TestRequest, customer_id: &str) -> TestRequest {
    req.insert_header((SUBJECT_HEADER, customer_id)).insert_header((ROLE_HEADER, "customer"))
}

pub fn signed_json(uri: &str, secret: &str, payload: &Value) -> TestRequest {
    let body = payload.to_string();
    TestRequest::post()
        .uri(uri)
        .insert_header(ContentType::json())
        .insert_header((SIGNATURE_HEADER, calculate_hmac(secret, body.as_bytes())))
        .set_payload(body)
}

/// Field values must already be url-safe.
pub fn signed_form(uri: &str, secret: &str, fields: &[(&str, &str)]) -> TestRequest {
    let body = fields.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<String>>().join("&");
    TestRequest::post()
        .uri(uri)
        .insert_header(ContentType::form_url_encoded())
        .insert_header((SIGNATURE_HEADER, calculate_hmac(secret, body.as_bytes())))
        .set_payload(body)
}
