use lambda_http::http::StatusCode;
use thiserror::Error;

/// Failures from the record store or the blob store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{operation} failed: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },

    #[error("Malformed record: {0}")]
    MalformedItem(String),
}

impl StoreError {
    pub fn backend(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Backend {
            operation,
            message: err.to_string(),
        }
    }
}

/// Errors surfaced to the caller as an error envelope.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Route not found: {method} {path}")]
    RouteNotFound { method: String, path: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn user_not_found() -> Self {
        Self::NotFound("User not found".to_string())
    }

    pub fn missing_user_id() -> Self {
        Self::Validation("userId is required".to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) | Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<lambda_http::http::Error> for ApiError {
    fn from(err: lambda_http::http::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
