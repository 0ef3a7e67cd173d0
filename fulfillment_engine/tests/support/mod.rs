#![allow(dead_code)]
use std::time::Duration;

use chrono::NaiveDate;
use fulfillment_engine::{
    db_types::{Money, NewOrder, OrderNumber, PaymentDetails},
    events::EventProducers,
    order_objects::ConfirmationResult,
    test_utils::{
        prepare_env::{drop_database, prepare_test_env, random_db_path},
        StubMessenger,
    },
    BadgeApi,
    DeliveryApi,
    DispatchApi,
    NotificationsApi,
    OrderFlowApi,
    SqliteDatabase,
};
use log::*;

pub const SEND_TIMEOUT: Duration = Duration::from_millis(250);

/// A complete pipeline over a throwaway database and a stub messaging provider.
pub struct TestSystem {
    pub url: String,
    pub db: SqliteDatabase,
    pub messenger: StubMessenger,
    pub orders: OrderFlowApi<SqliteDatabase, StubMessenger>,
    pub badges: BadgeApi<SqliteDatabase>,
    pub dispatcher: DispatchApi<SqliteDatabase, StubMessenger>,
    pub delivery: DeliveryApi<SqliteDatabase, StubMessenger>,
    pub notifications: NotificationsApi<SqliteDatabase>,
}

impl TestSystem {
    pub async fn new() -> Self {
        Self::with_producers(EventProducers::default()).await
    }

    pub async fn with_producers(producers: EventProducers) -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        let messenger = StubMessenger::new();
        let badges = BadgeApi::new(db.clone());
        let dispatcher =
            DispatchApi::new(db.clone(), messenger.clone(), producers.clone()).with_send_timeout(SEND_TIMEOUT);
        let orders = OrderFlowApi::new(db.clone(), badges.clone(), dispatcher.clone(), producers.clone());
        let delivery = DeliveryApi::new(db.clone(), dispatcher.clone(), producers);
        let notifications = NotificationsApi::new(db.clone());
        debug!("🚀️ Test system ready at {url}");
        Self { url, db, messenger, orders, badges, dispatcher, delivery, notifications }
    }

    pub async fn tear_down(self) {
        let TestSystem { url, mut db, .. } = self;
        if let Err(e) = db.close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        drop_database(&url).await;
    }

    /// Creates the order and records a successful payment for it.
    pub async fn paid_order(&self, number: &str) -> ConfirmationResult {
        self.orders.create_order(new_order(number)).await.expect("Error creating order");
        self.orders
            .record_payment_success(&OrderNumber::from(number), PaymentDetails::default().with_transaction_id("tx-1"))
            .await
            .expect("Error recording payment")
    }
}

pub fn trip_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 6, 15).unwrap()
}

pub fn new_order(number: &str) -> NewOrder {
    let cart = serde_json::json!([{
        "name": "Ha Long Bay Cruise",
        "selected": ["Kayaking"],
        "travellers": { "adult": 2, "child": 1 },
        "subtotal": 240.5
    }]);
    NewOrder::new(OrderNumber::from(number), "cust-42", "Jane Doe", Money::from(24050))
        .with_email("jane@example.com")
        .with_phone("+84901234567")
        .with_cart(cart)
        .with_trip_date(trip_date())
}
