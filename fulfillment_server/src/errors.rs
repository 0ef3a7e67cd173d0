use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use fulfillment_engine::{
    db_types::InvalidStatus,
    BadgeError,
    DispatchError,
    InvoiceError,
    NotificationsError,
    OrderFlowError,
    ReconcileError,
};
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error. {0}")]
    CouldNotDeserializePayload(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("The request is not valid. {0}")]
    InvalidRequest(String),
    #[error("The request conflicts with the current state. {0}")]
    Conflict(String),
    #[error("The record is busy. Try again shortly. {0}")]
    TryAgain(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::CouldNotDeserializePayload(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingIdentity => StatusCode::UNAUTHORIZED,
                AuthError::InvalidRole(_) => StatusCode::UNAUTHORIZED,
            },
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::TryAgain(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("💻️ {self}");
        }
        HttpResponse::build(status)
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No caller identity was supplied with the request.")]
    MissingIdentity,
    #[error("The caller role is not recognised. {0}")]
    InvalidRole(String),
}

impl From<InvalidStatus> for ServerError {
    fn from(e: InvalidStatus) -> Self {
        Self::InvalidRequest(e.to_string())
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::DatabaseError(s) => Self::BackendError(s),
            OrderFlowError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::InvalidStatus(_) | OrderFlowError::InvalidOrder(_) => Self::InvalidRequest(e.to_string()),
        }
    }
}

impl From<BadgeError> for ServerError {
    fn from(e: BadgeError) -> Self {
        match e {
            BadgeError::DatabaseError(s) => Self::BackendError(s),
            BadgeError::OrderNotFound(_) | BadgeError::BadgeNotFound(_) => Self::NoRecordFound(e.to_string()),
            BadgeError::OrderNotConfirmed(_) | BadgeError::AlreadyExists { .. } | BadgeError::AlreadyRevoked(_) => {
                Self::Conflict(e.to_string())
            },
            BadgeError::MissingReason => Self::InvalidRequest(e.to_string()),
            BadgeError::DuplicateCode(_) => Self::TryAgain(e.to_string()),
            BadgeError::RenderError(s) => Self::BackendError(s),
        }
    }
}

impl From<InvoiceError> for ServerError {
    fn from(e: InvoiceError) -> Self {
        match e {
            InvoiceError::DatabaseError(s) => Self::BackendError(s),
            InvoiceError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            InvoiceError::UnsupportedLocale(_) => Self::InvalidRequest(e.to_string()),
        }
    }
}

impl From<DispatchError> for ServerError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::DatabaseError(s) => Self::BackendError(s),
            DispatchError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
        }
    }
}

impl From<ReconcileError> for ServerError {
    fn from(e: ReconcileError) -> Self {
        match e {
            ReconcileError::DatabaseError(s) => Self::BackendError(s),
            ReconcileError::InvalidStatus(_) => Self::InvalidRequest(e.to_string()),
            ReconcileError::Contention(_) => Self::TryAgain(e.to_string()),
        }
    }
}

impl From<NotificationsError> for ServerError {
    fn from(e: NotificationsError) -> Self {
        match e {
            NotificationsError::DatabaseError(s) => Self::BackendError(s),
            NotificationsError::NotificationNotFound(_) => Self::NoRecordFound(e.to_string()),
        }
    }
}
