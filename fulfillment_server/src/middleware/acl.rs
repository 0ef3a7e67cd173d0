//! Access control for routes.
//!
//! Resolves the caller from the trusted identity headers (see [`crate::auth`]) and checks their role against the
//! roles the route accepts. A caller holding any one of the listed roles is let through, and the resolved [`Caller`]
//! is left in the request extensions for the handler. Requests without an identity get a 401; requests with the wrong
//! role get a 403.
use std::{future::Future, pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorForbidden, ErrorUnauthorized},
    Error,
    HttpMessage,
};
use fulfillment_engine::db_types::Role;
use futures::future::{ok, Ready};
use log::*;

use crate::auth::Caller;

pub struct AclMiddlewareFactory {
    allowed_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(allowed_roles: &[Role]) -> Self {
        AclMiddlewareFactory { allowed_roles: allowed_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = AclMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { allowed_roles: self.allowed_roles.clone(), service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    allowed_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let allowed_roles = self.allowed_roles.clone();
        Box::pin(async move {
            let caller = Caller::from_headers(req.headers()).map_err(|e| {
                debug!("🔐️ Denying request to {}. {e}", req.path());
                ErrorUnauthorized(e.to_string())
            })?;
            if !caller.has_any_role(&allowed_roles) {
                warn!("🔐️ {} ({}) may not call {}", caller.subject, caller.role, req.path());
                return Err(ErrorForbidden("Insufficient permissions."));
            }
            trace!("🔐️ {} ({}) authorised for {}", caller.subject, caller.role, req.path());
            req.extensions_mut().insert(caller);
            service.call(req).await
        })
    }
}
