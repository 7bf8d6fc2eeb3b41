//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and its mapping
//! onto HTTP responses. Every failure path produces a structured
//! `{error, details?}` JSON body; nothing is surfaced as a bare string.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::error;

use crate::config::ConfigError;
use tutorlink_core::domain::DomainError;
use tutorlink_core::ports::PortError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from the core store port.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Port(PortError::Validation(err.to_string()))
    }
}

/// The JSON body returned on every failure path.
#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    fn status_and_body(&self) -> (StatusCode, ErrorBody) {
        match self {
            ApiError::Port(PortError::Validation(msg)) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: msg.clone(),
                    details: None,
                },
            ),
            ApiError::Port(PortError::NotFound(msg)) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: msg.clone(),
                    details: None,
                },
            ),
            ApiError::Port(PortError::Unauthorized) => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    error: "You are not a party to this resource".to_string(),
                    details: None,
                },
            ),
            // The schedule-override case: the manual flag contradicts a
            // published recurring slot.
            ApiError::Port(PortError::Conflict(msg)) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    error: "SCHEDULE_OVERRIDE".to_string(),
                    details: Some(msg.clone()),
                },
            ),
            ApiError::Port(PortError::Unexpected(msg)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: "Internal server error".to_string(),
                    details: Some(msg.clone()),
                },
            ),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: "Internal server error".to_string(),
                    details: Some(other.to_string()),
                },
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("request failed: {:?}", self);
        }
        (status, Json(body)).into_response()
    }
}
