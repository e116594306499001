//! HTTP error responses.
//!
//! Every failure is answered with a plain-text body. Storage failures are
//! logged here with their cause and reported to the caller generically.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::error::Error;

/// Body returned for missing static resources.
pub const NOT_FOUND_BODY: &str = "Not found";

const GENERIC_SERVER_ERROR: &str = "Server error.";

/// Request-level error with an HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request was rejected (400).
    #[error("{0}")]
    BadRequest(String),

    /// No static resource at the requested path (404).
    #[error("Not found")]
    NotFound,

    /// The request could not be completed (500).
    #[error("{0}")]
    Internal(String),
}

/// Result type alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Log a storage failure and hide it behind `message`.
    #[must_use]
    pub fn storage(message: &str, err: &Error) -> Self {
        error!("{message} {err}");
        Self::Internal(message.to_string())
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(message) => Self::BadRequest(message),
            other => Self::storage(GENERIC_SERVER_ERROR, &other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound => (StatusCode::NOT_FOUND, NOT_FOUND_BODY.to_string()),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, message).into_response()
    }
}
