// Error taxonomy for the account service and its HTTP mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Rejection raised while mapping a request body onto an [`crate::Account`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is absent (or `null`).
    #[error("Invalid Account: missing {0}")]
    MissingKey(&'static str),

    /// A field is present but has the wrong shape.
    #[error("Invalid Account: {field} must be {expected}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid Account: body of request contained bad or no data ({0})")]
    MalformedBody(String),

    #[error("Content-Type must be {expected}")]
    UnsupportedMediaType {
        expected: String,
        found: Option<String>,
    },

    #[error("Account with id [{0}] could not be found.")]
    NotFound(i64),

    /// Path segment that is not a non-negative integer; treated like an
    /// unmatched route.
    #[error("The requested URL was not found on the server ({0}).")]
    InvalidId(String),

    #[error("account has no id")]
    MissingId,

    #[error("database error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("database connection is unavailable")]
    Unavailable,
}

pub type Result<T, E = AccountError> = std::result::Result<T, E>;

impl AccountError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AccountError::Validation(_) | AccountError::MalformedBody(_) => {
                StatusCode::BAD_REQUEST
            }
            AccountError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AccountError::NotFound(_) | AccountError::InvalidId(_) => StatusCode::NOT_FOUND,
            AccountError::MissingId | AccountError::Persistence(_) | AccountError::Unavailable => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// JSON error body shared by handler errors and the router fallback.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub error: &'static str,
    pub message: String,
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ErrorBody {
        status: status.as_u16(),
        error: status.canonical_reason().unwrap_or("Error"),
        message: message.into(),
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            // Details stay in the log.
            error!(error = %self, "request failed");
            return error_response(status, "Internal Server Error");
        }
        error_response(status, self.to_string())
    }
}
