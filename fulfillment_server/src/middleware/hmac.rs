//! HMAC signature checks for inbound webhooks.
//!
//! The payment gateway and the messaging providers sign every webhook body with a shared secret. The base64-encoded
//! HMAC-SHA256 of the raw body is sent in a header (`X-Signature-SHA256` by default). Requests with a missing or wrong
//! signature are rejected with a 403 before the body is parsed.
//!
//! Checks can be switched off per route group in configuration, which is only sensible in development.
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorBadRequest, ErrorForbidden},
    http::header::HeaderValue,
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use tour_common::Secret;

use crate::helpers::verify_signature;

pub const SIGNATURE_HEADER: &str = "X-Signature-SHA256";

/// How one group of webhooks is signed.
#[derive(Clone)]
struct WebhookSignature {
    header: String,
    secret: Secret<String>,
    /// When false, every request is let through unchecked.
    enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignatureCheck {
    Valid,
    Missing,
    Mismatch,
}

impl SignatureCheck {
    fn reason(&self) -> &'static str {
        match self {
            Self::Valid => "",
            Self::Missing => "No webhook signature was supplied.",
            Self::Mismatch => "The webhook signature does not match the body.",
        }
    }
}

impl WebhookSignature {
    fn check(&self, signature: Option<&HeaderValue>, body: &[u8]) -> SignatureCheck {
        let Some(signature) = signature.and_then(|v| v.to_str().ok()) else {
            return SignatureCheck::Missing;
        };
        if verify_signature(self.secret.reveal(), body, signature) {
            SignatureCheck::Valid
        } else {
            SignatureCheck::Mismatch
        }
    }
}

/// Wraps a scope so that every request in it must carry a valid signature of its body.
pub struct HmacMiddlewareFactory {
    guard: WebhookSignature,
}

impl HmacMiddlewareFactory {
    pub fn new(header: &str, secret: Secret<String>, enabled: bool) -> Self {
        Self { guard: WebhookSignature { header: header.into(), secret, enabled } }
    }
}

impl<S, B> Transform<S, ServiceRequest> for HmacMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = HmacMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(HmacMiddlewareService { guard: self.guard.clone(), service: Rc::new(service) }))
    }
}

pub struct HmacMiddlewareService<S> {
    guard: WebhookSignature,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for HmacMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let guard = self.guard.clone();
        Box::pin(async move {
            if !guard.enabled {
                trace!("🔐️ Signature checks are disabled for {}. Allowing request.", req.path());
                return service.call(req).await;
            }
            let body = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Could not read the webhook body for {}: {e:?}", req.path());
                ErrorBadRequest("Could not read the webhook body.")
            })?;
            match guard.check(req.headers().get(guard.header.as_str()), &body) {
                SignatureCheck::Valid => trace!("🔐️ Webhook signature for {} ✅️", req.path()),
                failure => {
                    warn!("🔐️ Webhook to {} rejected: {failure:?}", req.path());
                    return Err(ErrorForbidden(failure.reason()));
                },
            }
            req.set_payload(body_to_payload(body));
            service.call(req).await
        })
    }
}

/// Puts a body that was read for signing back on the request, so that the route's extractors can still read it.
fn body_to_payload(body: web::Bytes) -> Payload {
    let (_, mut payload) = h1::Payload::create(true);
    payload.unread_data(body);
    Payload::from(payload)
}
