use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use fulfillment_engine::{
    events::EventProducers,
    traits::{FulfillmentDatabase, MessagingProviders},
    BadgeApi,
    DeliveryApi,
    DispatchApi,
    InvoiceApi,
    NotificationsApi,
    OrderFlowApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    config::{HmacConfig, RetryConfig, ServerConfig},
    errors::ServerError,
    integrations::{audit::create_audit_event_handlers, messaging::ProviderClients},
    middleware::{HmacMiddlewareFactory, SIGNATURE_HEADER},
    retry_worker::start_retry_worker,
    routes::{
        health,
        BadgeQrRoute,
        CancelOrderRoute,
        CreateOrderRoute,
        InvoiceRoute,
        MarkAllNotificationsReadRoute,
        MarkNotificationReadRoute,
        MyNotificationsRoute,
        MyPreferencesRoute,
        OrderByNumberRoute,
        PaymentCallbackRoute,
        PaymentStatusWebhookRoute,
        RetryMessagesRoute,
        RevokeBadgeRoute,
        SmsCallbackRoute,
        UpdatePaymentStatusRoute,
        UpdatePreferencesRoute,
        VerifyBadgeRoute,
        WhatsappCallbackRoute,
    },
};

/// Engine settings that every worker's API objects are built with.
#[derive(Clone, Copy, Debug)]
pub struct ApiOptions {
    pub send_timeout: Duration,
    pub badge_validity_days: i64,
    pub retry: RetryConfig,
}

impl From<&ServerConfig> for ApiOptions {
    fn from(config: &ServerConfig) -> Self {
        Self {
            send_timeout: config.send_timeout,
            badge_validity_days: config.badge_validity_days,
            retry: config.retry,
        }
    }
}

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let messengers = ProviderClients::new(config.sms.clone(), config.whatsapp.clone(), config.send_timeout)
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_audit_event_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let options = ApiOptions::from(&config);
    if options.retry.is_enabled() {
        let dispatcher = DispatchApi::new(db.clone(), messengers.clone(), producers.clone())
            .with_send_timeout(options.send_timeout);
        let delivery_api = DeliveryApi::new(db.clone(), dispatcher, producers.clone());
        // Runs for the lifetime of the server
        let _handle = start_retry_worker(delivery_api, options.retry);
    } else {
        info!("🕰️ Message retry worker is disabled");
    }
    let srv = create_server_instance(config, db, messengers, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    messengers: ProviderClients,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let options = ApiOptions::from(&config);
    let payment_hmac = config.payment_hmac.clone();
    let callback_hmac = config.callback_hmac.clone();
    let srv = HttpServer::new(move || {
        let db = db.clone();
        let messengers = messengers.clone();
        let producers = producers.clone();
        let payment_hmac = payment_hmac.clone();
        let callback_hmac = callback_hmac.clone();
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("tfs::access_log"))
            .configure(move |cfg| register_apis(cfg, db, messengers, producers, &options))
            .configure(move |cfg| {
                register_routes::<SqliteDatabase, ProviderClients>(cfg, &payment_hmac, &callback_hmac)
            })
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Builds one set of engine APIs and hands them to actix as app data.
pub fn register_apis<B, M>(
    cfg: &mut web::ServiceConfig,
    db: B,
    messengers: M,
    producers: EventProducers,
    options: &ApiOptions,
) where
    B: FulfillmentDatabase + 'static,
    M: MessagingProviders + Clone + 'static,
{
    let badges = BadgeApi::new(db.clone()).with_validity_days(options.badge_validity_days);
    let dispatcher =
        DispatchApi::new(db.clone(), messengers, producers.clone()).with_send_timeout(options.send_timeout);
    let delivery = DeliveryApi::new(db.clone(), dispatcher.clone(), producers.clone());
    let orders = OrderFlowApi::new(db.clone(), badges.clone(), dispatcher.clone(), producers);
    cfg.app_data(web::Data::new(orders))
        .app_data(web::Data::new(badges))
        .app_data(web::Data::new(dispatcher))
        .app_data(web::Data::new(delivery))
        .app_data(web::Data::new(InvoiceApi::new(db.clone())))
        .app_data(web::Data::new(NotificationsApi::new(db)))
        .app_data(web::Data::new(options.retry));
}

/// Mounts every route.
///
/// * `/health` is open.
/// * `/payment` takes the payment gateway's webhooks, signed with the payment secret.
/// * `/callbacks` takes the messaging providers' delivery reports, signed with the callback secret.
/// * `/api` is for customers and administrators. Each route checks the caller's role.
pub fn register_routes<B, M>(cfg: &mut web::ServiceConfig, payment_hmac: &HmacConfig, callback_hmac: &HmacConfig)
where
    B: FulfillmentDatabase + 'static,
    M: MessagingProviders + 'static,
{
    let payment_scope = web::scope("/payment")
        .wrap(HmacMiddlewareFactory::new(SIGNATURE_HEADER, payment_hmac.secret.clone(), payment_hmac.checks))
        .service(PaymentCallbackRoute::<B, M>::new())
        .service(PaymentStatusWebhookRoute::<B, M>::new());
    let callback_scope = web::scope("/callbacks")
        .wrap(HmacMiddlewareFactory::new(SIGNATURE_HEADER, callback_hmac.secret.clone(), callback_hmac.checks))
        .service(SmsCallbackRoute::<B, M>::new())
        .service(WhatsappCallbackRoute::<B, M>::new());
    let api_scope = web::scope("/api")
        .service(CreateOrderRoute::<B, M>::new())
        .service(UpdatePaymentStatusRoute::<B, M>::new())
        .service(CancelOrderRoute::<B, M>::new())
        .service(InvoiceRoute::<B, M>::new())
        .service(OrderByNumberRoute::<B, M>::new())
        .service(VerifyBadgeRoute::<B>::new())
        .service(BadgeQrRoute::<B>::new())
        .service(RevokeBadgeRoute::<B>::new())
        .service(MarkAllNotificationsReadRoute::<B>::new())
        .service(MarkNotificationReadRoute::<B>::new())
        .service(MyNotificationsRoute::<B>::new())
        .service(MyPreferencesRoute::<B>::new())
        .service(UpdatePreferencesRoute::<B>::new())
        .service(RetryMessagesRoute::<B, M>::new());
    cfg.service(health).service(payment_scope).service(callback_scope).service(api_scope);
}
