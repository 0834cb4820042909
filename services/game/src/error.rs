//! Custom error types for the game service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::{identity::IdentityError, repositories::LedgerError, wheel::SelectionError};

/// Custom error type for the game service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Input failed a validation rule; carries the first violated rule only
    #[error("{0}")]
    Validation(String),

    /// The identity flow failed with a message safe to show the caller
    #[error("{0}")]
    Auth(String),

    /// No valid session for a protected operation
    #[error("Unauthorized")]
    Unauthorized,

    /// Requested row does not exist
    #[error("Not found")]
    NotFound,

    /// Conflicting state in the data store, e.g. a duplicate profile row
    #[error("{0}")]
    Conflict(String),

    /// Spin precondition violated; surfaced explicitly, never defaulted away
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// Win ledger failure
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Data store failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Identity provider failure whose detail must not leak to the caller
    #[error("An unexpected error occurred")]
    Upstream,
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Rejected(message) => ApiError::Auth(message),
            IdentityError::Unavailable(detail) => {
                error!("Identity provider failure: {detail}");
                ApiError::Upstream
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Selection(err) => (StatusCode::CONFLICT, err.to_string()),
            ApiError::Ledger(err) => {
                error!("Win ledger error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
            ApiError::Database(err) => {
                error!("Database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
            ApiError::Upstream => (
                StatusCode::BAD_GATEWAY,
                "An unexpected error occurred".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for game service results
pub type ApiResult<T> = Result<T, ApiError>;
