//! cobro-errors - unified error handling
//!
//! Every failure a request handler can produce is an [`AppError`]. The HTTP
//! layer renders it as `{"error": "<message>"}` with the matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Client input error (missing or malformed parameters)
    #[error("Validation error: {0}")]
    Validation(String),

    /// The database could not be reached
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// The database rejected or failed a statement
    #[error("Database error: {0}")]
    Database(String),

    /// Anything not covered above
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Message carried by the error, without the kind prefix
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(msg)
            | Self::Unavailable(msg)
            | Self::Database(msg)
            | Self::Internal(msg) => msg,
        }
    }

    /// HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Unavailable(_) => 500,
            Self::Database(_) => 500,
            Self::Internal(_) => 500,
        }
    }
}

/// JSON body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            error: self.message().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result alias
pub type AppResult<T> = Result<T, AppError>;
