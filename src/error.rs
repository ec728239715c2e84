//! Domain error types for the Allure dashboard.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use actix_web::{HttpResponse, ResponseError};
use std::fmt;

use crate::models::BuildIdentity;

/// Build URL could not be mapped to a job name and build number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("Malformed build URL '{url}': {reason}")]
    MalformedUrl { url: String, reason: String },

    #[error("Build URL '{0}' does not match '.../job/<name>/<number>/'")]
    UnrecognizedPattern(String),
}

/// A single read against Jenkins failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Request timed out")]
    Timeout,

    #[error("Unexpected HTTP status {0}")]
    HttpStatus(u16),

    #[error("Malformed response body: {0}")]
    MalformedBody(String),

    #[error("Jenkins rejected the session credential")]
    AuthRejected,

    #[error("Network error: {0}")]
    Network(String),
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::Network(_) => true,
            Self::HttpStatus(code) => *code >= 500 || *code == 429,
            Self::MalformedBody(_) | Self::AuthRejected => false,
        }
    }
}

/// A batch could not produce any records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregationError {
    #[error("Build {0} is configured more than once")]
    DuplicateBuild(BuildIdentity),

    #[error("Batch {generation} was superseded by a newer refresh")]
    Superseded { generation: u64 },
}

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Request conflicts with current state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Jenkins rejected the session; the user must sign in again
    #[error("Jenkins session rejected, please re-authenticate")]
    Reauthenticate,

    /// Jenkins could not be reached or answered unexpectedly
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Build list could not be persisted
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_code, response_message) = match self {
            AppError::NotFound(_) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "NOT_FOUND",
                self.to_string(),
            ),
            AppError::InvalidInput(_) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "INVALID_INPUT",
                self.to_string(),
            ),
            AppError::Conflict(_) => (
                actix_web::http::StatusCode::CONFLICT,
                "CONFLICT",
                self.to_string(),
            ),
            AppError::Reauthenticate => (
                actix_web::http::StatusCode::UNAUTHORIZED,
                "REAUTHENTICATE",
                self.to_string(),
            ),
            AppError::Upstream(_) => (
                actix_web::http::StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                self.to_string(),
            ),
            AppError::Storage(err_str) => {
                tracing::error!("Storage error: {}", err_str);
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "Failed to persist build configuration".to_string(),
                )
            }
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: error_code.to_string(),
            message: response_message,
        })
    }
}

/// Error response body matching OpenAPI schema.
#[derive(Debug, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

// Conversion implementations for domain error types

impl From<ResolutionError> for AppError {
    fn from(err: ResolutionError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::AuthRejected => AppError::Reauthenticate,
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl From<AggregationError> for AppError {
    fn from(err: AggregationError) -> Self {
        match err {
            AggregationError::DuplicateBuild(_) => AppError::InvalidInput(err.to_string()),
            AggregationError::Superseded { .. } => AppError::Conflict(err.to_string()),
        }
    }
}
