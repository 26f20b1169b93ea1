use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LaggingError {
    #[error("invalid parameter: {message}")]
    InvalidParameter { code: &'static str, message: String },
    #[error("source `{collection}` unavailable: {message}")]
    SourceUnavailable {
        collection: &'static str,
        message: String,
    },
    #[error("`{operation}` did not answer within {seconds}s")]
    SourceTimeout {
        operation: &'static str,
        seconds: u64,
    },
}

impl LaggingError {
    pub fn invalid(code: &'static str, message: impl Into<String>) -> Self {
        LaggingError::InvalidParameter {
            code,
            message: message.into(),
        }
    }
    pub fn unavailable(collection: &'static str, error: impl ToString) -> Self {
        LaggingError::SourceUnavailable {
            collection,
            message: error.to_string(),
        }
    }
    /// Upper-snake code sent as the response body.
    pub fn code(&self) -> &'static str {
        match self {
            LaggingError::InvalidParameter { code, .. } => code,
            LaggingError::SourceUnavailable { .. } => "SOURCE_UNAVAILABLE",
            LaggingError::SourceTimeout { .. } => "SOURCE_TIMEOUT",
        }
    }
}

impl ResponseError for LaggingError {
    fn status_code(&self) -> StatusCode {
        match self {
            LaggingError::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
            LaggingError::SourceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            LaggingError::SourceTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).body(self.code())
    }
}
