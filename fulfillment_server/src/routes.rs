//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST delegate to the engine APIs. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every handler here awaits the engine, which does its I/O
//! asynchronously, so the confirmation fan-out (badge plus three channels) never ties up a worker.
use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use fulfillment_engine::{
    db_types::{
        Channel,
        NewOrder,
        Order,
        OrderNumber,
        Role::{Admin, Customer},
    },
    dispatch_objects::{DeliveryCallback, DeliveryInput, DeliveryResult, ProviderError, ReconcileOutcome},
    traits::{FulfillmentDatabase, MessagingProviders},
    BadgeApi,
    DeliveryApi,
    DispatchApi,
    InvoiceApi,
    NotificationsApi,
    OrderFlowApi,
    ReconcileError,
};
use log::*;
use messaging_tools::{SmsStatusCallback, WhatsAppWebhook};

use crate::{
    auth::Caller,
    config::RetryConfig,
    data_objects::{
        InvoiceParams,
        JsonResponse,
        MarkedRead,
        NotificationParams,
        OrderDetails,
        PaymentCallback,
        PaymentStatusNotification,
        PaymentStatusUpdate,
        PreferenceUpdate,
        ReasonParams,
        RetryParams,
        VerifyParams,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(payment_callback => Post "/callback" impl FulfillmentDatabase, MessagingProviders);
/// The payment gateway's confirmation that an order has been paid.
///
/// This triggers the confirmation pipeline: the order is confirmed, and the badge and booking confirmations are issued
/// before the response is sent. Side-effect failures are reported in the body but never fail the request; as far as
/// the gateway is concerned, the payment was accepted as long as the order exists.
pub async fn payment_callback<B, M>(
    body: web::Json<PaymentCallback>,
    api: web::Data<OrderFlowApi<B, M>>,
) -> Result<HttpResponse, ServerError>
where
    B: FulfillmentDatabase,
    M: MessagingProviders,
{
    let PaymentCallback { order_number, details } = body.into_inner();
    info!("💻️ Payment confirmation received for order {order_number}");
    let result = api.record_payment_success(&order_number, details).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(payment_status_webhook => Post "/status" impl FulfillmentDatabase, MessagingProviders);
pub async fn payment_status_webhook<B, M>(
    body: web::Json<PaymentStatusNotification>,
    api: web::Data<OrderFlowApi<B, M>>,
) -> Result<HttpResponse, ServerError>
where
    B: FulfillmentDatabase,
    M: MessagingProviders,
{
    let PaymentStatusNotification { order_number, update } = body.into_inner();
    debug!("💻️ Payment status webhook for order {order_number}: {}", update.status);
    let result = api.update_payment_status(&order_number, &update.status, update.details).await?;
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   Delivery callbacks  ----------------------------------------------
route!(sms_callback => Post "/sms" impl FulfillmentDatabase, MessagingProviders);
/// SMS delivery reports arrive form-encoded, one message per request.
pub async fn sms_callback<B, M>(
    form: web::Form<SmsStatusCallback>,
    api: web::Data<DeliveryApi<B, M>>,
) -> Result<HttpResponse, ServerError>
where
    B: FulfillmentDatabase,
    M: MessagingProviders,
{
    let report = form.into_inner();
    trace!("💻️ SMS delivery report for {}: {}", report.message_sid, report.message_status);
    let callback = DeliveryCallback {
        channel: Channel::Sms,
        provider_message_id: report.message_sid,
        status: report.message_status,
        error: ProviderError::new(report.error_code, report.error_message),
    };
    let response = acknowledge(api.process(DeliveryInput::StatusCallback(callback)).await)?;
    Ok(HttpResponse::Ok().json(response))
}

route!(whatsapp_callback => Post "/whatsapp" impl FulfillmentDatabase, MessagingProviders);
/// WhatsApp webhooks may batch several status updates. Each is reconciled on its own.
pub async fn whatsapp_callback<B, M>(
    body: web::Json<WhatsAppWebhook>,
    api: web::Data<DeliveryApi<B, M>>,
) -> Result<HttpResponse, ServerError>
where
    B: FulfillmentDatabase,
    M: MessagingProviders,
{
    let webhook = body.into_inner();
    let mut responses = Vec::new();
    for update in webhook.status_updates() {
        trace!("💻️ WhatsApp status update for {}: {} at {:?}", update.id, update.status, update.reported_at());
        let error = update.error().and_then(|(code, message)| ProviderError::new(Some(code), Some(message)));
        let callback = DeliveryCallback {
            channel: Channel::WhatsApp,
            provider_message_id: update.id.clone(),
            status: update.status.clone(),
            error,
        };
        responses.push(acknowledge(api.process(DeliveryInput::StatusCallback(callback)).await)?);
    }
    Ok(HttpResponse::Ok().json(responses))
}

/// Providers retry anything that is not a 2xx. Reports that can never succeed are acknowledged, so that only
/// infrastructure failures produce a retry.
fn acknowledge(result: Result<DeliveryResult, ReconcileError>) -> Result<JsonResponse, ServerError> {
    match result {
        Ok(DeliveryResult::Reconciled(ReconcileOutcome::Applied { message })) => {
            Ok(JsonResponse::success(format!("Message {} is now {}", message.id, message.status)))
        },
        Ok(DeliveryResult::Reconciled(ReconcileOutcome::Ignored { current })) => {
            Ok(JsonResponse::success(format!("Stale report ignored. Message is already {current}")))
        },
        Ok(DeliveryResult::Reconciled(ReconcileOutcome::NotFound)) => {
            Ok(JsonResponse::success("Unknown message. Report ignored"))
        },
        Ok(DeliveryResult::Retried(report)) => Ok(JsonResponse::success(format!("{} retried", report.considered))),
        Err(ReconcileError::InvalidStatus(s)) => {
            warn!("💻️ Delivery report with an unrecognised status. {s}");
            Ok(JsonResponse::failure(s))
        },
        Err(e) => Err(e.into()),
    }
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl FulfillmentDatabase, MessagingProviders where requires [Admin]);
pub async fn create_order<B, M>(
    body: web::Json<NewOrder>,
    api: web::Data<OrderFlowApi<B, M>>,
) -> Result<HttpResponse, ServerError>
where
    B: FulfillmentDatabase,
    M: MessagingProviders,
{
    let (order, inserted) = api.create_order(body.into_inner()).await?;
    if inserted {
        Ok(HttpResponse::Created().json(order))
    } else {
        Ok(HttpResponse::Ok().json(order))
    }
}

route!(order_by_number => Get "/orders/{order_number}"
    impl FulfillmentDatabase, MessagingProviders where requires [Customer, Admin]);
pub async fn order_by_number<B, M>(
    caller: Caller,
    path: web::Path<String>,
    orders: web::Data<OrderFlowApi<B, M>>,
    badges: web::Data<BadgeApi<B>>,
    dispatcher: web::Data<DispatchApi<B, M>>,
) -> Result<HttpResponse, ServerError>
where
    B: FulfillmentDatabase,
    M: MessagingProviders,
{
    let order_number = OrderNumber::from(path.into_inner());
    let order = visible_order(&caller, &order_number, &orders).await?;
    let badge = badges.badge_for_order(&order_number).await?;
    let messages = dispatcher.messages_for_order(&order_number).await?;
    Ok(HttpResponse::Ok().json(OrderDetails { order, badge, messages }))
}

route!(update_payment_status => Post "/orders/{order_number}/payment_status"
    impl FulfillmentDatabase, MessagingProviders where requires [Admin]);
pub async fn update_payment_status<B, M>(
    caller: Caller,
    path: web::Path<String>,
    body: web::Json<PaymentStatusUpdate>,
    api: web::Data<OrderFlowApi<B, M>>,
) -> Result<HttpResponse, ServerError>
where
    B: FulfillmentDatabase,
    M: MessagingProviders,
{
    let order_number = OrderNumber::from(path.into_inner());
    let PaymentStatusUpdate { status, details } = body.into_inner();
    info!("💻️ {} is setting the payment status of order {order_number} to {status}", caller.subject);
    let result = api.update_payment_status(&order_number, &status, details).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(cancel_order => Post "/orders/{order_number}/cancel"
    impl FulfillmentDatabase, MessagingProviders where requires [Admin]);
pub async fn cancel_order<B, M>(
    caller: Caller,
    path: web::Path<String>,
    body: web::Json<ReasonParams>,
    api: web::Data<OrderFlowApi<B, M>>,
) -> Result<HttpResponse, ServerError>
where
    B: FulfillmentDatabase,
    M: MessagingProviders,
{
    let order_number = OrderNumber::from(path.into_inner());
    let result = api.cancel_order(&order_number, &caller.subject, &body.reason).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(invoice => Get "/orders/{order_number}/invoice"
    impl FulfillmentDatabase, MessagingProviders where requires [Customer, Admin]);
pub async fn invoice<B, M>(
    caller: Caller,
    path: web::Path<String>,
    query: web::Query<InvoiceParams>,
    orders: web::Data<OrderFlowApi<B, M>>,
    invoices: web::Data<InvoiceApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: FulfillmentDatabase,
    M: MessagingProviders,
{
    let order_number = OrderNumber::from(path.into_inner());
    visible_order(&caller, &order_number, &orders).await?;
    let locale = query.into_inner().locale.unwrap_or_default();
    let invoice = invoices.invoice_for_order(&order_number, &locale).await?;
    let filename = format!("invoice-{order_number}-{}.txt", invoice.locale);
    Ok(HttpResponse::Ok()
        .content_type(invoice.content_type)
        .insert_header(("Content-Disposition", format!("inline; filename=\"{filename}\"")))
        .insert_header(("Content-Language", invoice.locale))
        .body(invoice.bytes))
}

/// Customers may only see their own orders. A foreign order looks exactly like a missing one.
async fn visible_order<B, M>(
    caller: &Caller,
    order_number: &OrderNumber,
    orders: &OrderFlowApi<B, M>,
) -> Result<Order, ServerError>
where
    B: FulfillmentDatabase,
    M: MessagingProviders,
{
    let not_found = || ServerError::NoRecordFound(format!("Order {order_number} does not exist"));
    let order = orders.fetch_order(order_number).await?.ok_or_else(not_found)?;
    if caller.is_admin() || order.customer_id == caller.subject {
        Ok(order)
    } else {
        debug!("💻️ {} asked for order {order_number}, which belongs to someone else", caller.subject);
        Err(not_found())
    }
}

//----------------------------------------------   Badges  ----------------------------------------------------
route!(verify_badge => Get "/badges/{code}/verify" impl FulfillmentDatabase where requires [Customer, Admin]);
pub async fn verify_badge<B>(
    path: web::Path<String>,
    query: web::Query<VerifyParams>,
    api: web::Data<BadgeApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: FulfillmentDatabase,
{
    let code = path.into_inner();
    let at = query.into_inner().at.unwrap_or_else(Utc::now);
    let verdict = api.verify(&code, at).await?;
    Ok(HttpResponse::Ok().json(verdict))
}

route!(badge_qr => Get "/badges/{code}/qr" impl FulfillmentDatabase where requires [Customer, Admin]);
pub async fn badge_qr<B>(
    caller: Caller,
    path: web::Path<String>,
    api: web::Data<BadgeApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: FulfillmentDatabase,
{
    let code = path.into_inner();
    let badge = api.fetch_badge(&code).await?;
    if !caller.is_admin() && badge.holder_id != caller.subject {
        return Err(ServerError::NoRecordFound(format!("Badge {code} does not exist")));
    }
    let artifact = api.render_artifact(&code).await?;
    Ok(HttpResponse::Ok().content_type(artifact.content_type).body(artifact.bytes))
}

route!(revoke_badge => Post "/badges/{code}/revoke" impl FulfillmentDatabase where requires [Admin]);
pub async fn revoke_badge<B>(
    caller: Caller,
    path: web::Path<String>,
    body: web::Json<ReasonParams>,
    api: web::Data<BadgeApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: FulfillmentDatabase,
{
    let code = path.into_inner();
    let badge = api.revoke(&code, &caller.subject, &body.reason).await?;
    Ok(HttpResponse::Ok().json(badge))
}

//----------------------------------------------   Notifications  --------------------------------------------------
route!(my_notifications => Get "/notifications" impl FulfillmentDatabase where requires [Customer, Admin]);
pub async fn my_notifications<B>(
    caller: Caller,
    query: web::Query<NotificationParams>,
    api: web::Data<NotificationsApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: FulfillmentDatabase,
{
    let notifications = api.list(&caller.subject, query.unread_only).await?;
    Ok(HttpResponse::Ok().json(notifications))
}

route!(mark_notification_read => Post "/notifications/{id}/read"
    impl FulfillmentDatabase where requires [Customer, Admin]);
pub async fn mark_notification_read<B>(
    caller: Caller,
    path: web::Path<i64>,
    api: web::Data<NotificationsApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: FulfillmentDatabase,
{
    let notification = api.mark_read(path.into_inner(), &caller.subject).await?;
    Ok(HttpResponse::Ok().json(notification))
}

route!(mark_all_notifications_read => Post "/notifications/read_all"
    impl FulfillmentDatabase where requires [Customer, Admin]);
pub async fn mark_all_notifications_read<B>(
    caller: Caller,
    api: web::Data<NotificationsApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: FulfillmentDatabase,
{
    let updated = api.mark_all_read(&caller.subject).await?;
    Ok(HttpResponse::Ok().json(MarkedRead { updated }))
}

route!(my_preferences => Get "/preferences" impl FulfillmentDatabase where requires [Customer, Admin]);
pub async fn my_preferences<B>(
    caller: Caller,
    api: web::Data<NotificationsApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: FulfillmentDatabase,
{
    let preference = api.get_preference(&caller.subject).await?;
    Ok(HttpResponse::Ok().json(preference))
}

route!(update_preferences => Put "/preferences" impl FulfillmentDatabase where requires [Customer, Admin]);
pub async fn update_preferences<B>(
    caller: Caller,
    body: web::Json<PreferenceUpdate>,
    api: web::Data<NotificationsApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: FulfillmentDatabase,
{
    let PreferenceUpdate { sms_enabled, whatsapp_enabled } = body.into_inner();
    let preference = api.set_preference(&caller.subject, sms_enabled, whatsapp_enabled).await?;
    Ok(HttpResponse::Ok().json(preference))
}

//----------------------------------------------   Messages  ----------------------------------------------------
route!(retry_messages => Post "/messages/retry" impl FulfillmentDatabase, MessagingProviders where requires [Admin]);
/// Runs a retry scan immediately, rather than waiting for the retry worker.
pub async fn retry_messages<B, M>(
    body: Option<web::Json<RetryParams>>,
    config: web::Data<RetryConfig>,
    api: web::Data<DeliveryApi<B, M>>,
) -> Result<HttpResponse, ServerError>
where
    B: FulfillmentDatabase,
    M: MessagingProviders,
{
    let params = body.map(|b| b.into_inner()).unwrap_or_default();
    let deadline = match params.older_than_mins {
        Some(mins) if mins <= 0 => {
            return Err(ServerError::InvalidRequest("older_than_mins must be a positive number of minutes".into()))
        },
        Some(mins) => chrono::Duration::try_minutes(mins)
            .ok_or_else(|| ServerError::InvalidRequest(format!("older_than_mins is out of range: {mins}")))?,
        None => config.deadline,
    };
    let max_attempts = match params.max_attempts {
        Some(n) if n <= 0 => return Err(ServerError::InvalidRequest("max_attempts must be positive".into())),
        Some(n) => n,
        None => config.max_attempts,
    };
    let older_than = Utc::now()
        .checked_sub_signed(deadline)
        .ok_or_else(|| ServerError::InvalidRequest("older_than_mins reaches too far into the past".into()))?;
    let scan = DeliveryInput::RetryScan { older_than, max_attempts };
    match api.process(scan).await? {
        DeliveryResult::Retried(report) => Ok(HttpResponse::Ok().json(report)),
        DeliveryResult::Reconciled(_) => Err(ServerError::Unspecified("A retry scan produced a reconciliation".into())),
    }
}
