//! Caller identity.
//!
//! Authentication happens upstream. The identity service (or the gateway in front of this server) verifies the caller
//! and forwards the result as two trusted headers: `X-Auth-Subject` carries the caller's id and `X-Auth-Role` carries
//! their role. This server must therefore never be exposed directly to the internet.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header::HeaderMap, FromRequest, HttpMessage, HttpRequest};
use fulfillment_engine::db_types::Role;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::{AuthError, ServerError};

pub const SUBJECT_HEADER: &str = "X-Auth-Subject";
pub const ROLE_HEADER: &str = "X-Auth-Role";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub subject: String,
    pub role: Role,
}

impl Caller {
    pub fn new(subject: &str, role: Role) -> Self {
        Self { subject: subject.to_string(), role }
    }

    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AuthError> {
        let subject = headers
            .get(SUBJECT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::MissingIdentity)?;
        let role = headers
            .get(ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingIdentity)?
            .parse::<Role>()
            .map_err(|e| AuthError::InvalidRole(e.to_string()))?;
        Ok(Self::new(subject, role))
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}

impl FromRequest for Caller {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // The ACL middleware has usually resolved the caller already
        if let Some(caller) = req.extensions().get::<Caller>() {
            return ready(Ok(caller.clone()));
        }
        let result = Caller::from_headers(req.headers()).map_err(|e| {
            debug!("🔐️ Request has no usable caller identity. {e}");
            ServerError::from(e)
        });
        ready(result)
    }
}
