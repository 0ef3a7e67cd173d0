use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessagingApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Request could not be sent: {0}")]
    RequestError(String),
    #[error("Invalid response: {0}")]
    ResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Provider rejected the message. Error {code} (HTTP {status}). {message}")]
    Rejected { status: u16, code: String, message: String },
}

impl MessagingApiError {
    /// A short, stable code for the failure, suitable for storing against the message.
    pub fn code(&self) -> String {
        match self {
            Self::Initialization(_) => "client_init".into(),
            Self::RequestError(_) => "request".into(),
            Self::ResponseError(_) | Self::JsonError(_) => "bad_response".into(),
            Self::Timeout => "timeout".into(),
            Self::Rejected { code, .. } => code.clone(),
        }
    }

    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::RequestError(e.to_string())
        }
    }
}

#[cfg(test)]
mod test {
    use super::MessagingApiError;

    #[test]
    fn rejections_keep_the_provider_code() {
        let err = MessagingApiError::Rejected { status: 400, code: "21211".into(), message: "Invalid 'To'".into() };
        assert_eq!(err.code(), "21211");
        assert_eq!(MessagingApiError::Timeout.code(), "timeout");
        assert_eq!(MessagingApiError::JsonError("eof".into()).code(), "bad_response");
    }
}
