//! Unified error handling.
//!
//! Provides a unified `AppError` type that every route handler returns in its
//! `Result`. Conversion to a response always produces an HTTP status plus a
//! JSON body with a `message` field, so no failure ever reaches the transport
//! layer unserialized.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::middleware::auth::AuthError;
use crate::services::UpstreamError;
use crate::store::StoreError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Record store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Token authentication failed.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Outbound collaborator (payment, mail) failed.
    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Create on an existing record.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Malformed caller input - field presence or shape.
    #[error("Validation: {0}")]
    Validation(String),

    /// Credentials rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated caller does not own the resource.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for the field validation failure every handler reports the
    /// same way.
    #[must_use]
    pub fn missing_fields() -> Self {
        Self::Validation(
            "Some required fields are either missing or incorrectly filled.".to_owned(),
        )
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Store(err) => match err {
                StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                StoreError::AlreadyExists { .. } => StatusCode::BAD_REQUEST,
                StoreError::InvalidKey { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                StoreError::Corrupt { .. } | StoreError::Encode(_) | StoreError::Io(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Auth(err) => err.status(),
            // The original surfaced a declined/unreachable gateway as a client
            // error; kept for wire compatibility.
            Self::Upstream(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyExists(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The client-facing message. Internal detail stays in the logs.
    fn message(&self) -> String {
        match self {
            Self::Store(err) => match err {
                StoreError::NotFound { .. } => "Not found.".to_owned(),
                StoreError::AlreadyExists { .. } => "Already exists.".to_owned(),
                StoreError::InvalidKey { .. } => {
                    "Some required fields are either missing or incorrectly filled.".to_owned()
                }
                StoreError::Corrupt { .. } | StoreError::Encode(_) | StoreError::Io(_) => {
                    "Something went wrong.".to_owned()
                }
            },
            Self::Auth(err) => err.to_string(),
            Self::Upstream(_) => "Could not charge card.".to_owned(),
            Self::Internal(_) => "Something went wrong.".to_owned(),
            Self::NotFound(msg)
            | Self::AlreadyExists(msg)
            | Self::Validation(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request error");
        }

        (status, Json(json!({ "message": self.message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
