//! Error types for Labtrack server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    lifecycle::state_machine::TransitionError,
    models::pending::PersonMatchPending,
};

/// Stable error codes carried in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    DbFailure = 2,
    NotFound = 3,
    BadValue = 4,
    InvalidTransition = 5,
    PersonMatchPending = 6,
    DuplicateTrackingCode = 7,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    /// Not a failure: the caller must resolve an ambiguous person match
    #[error("Person match pending confirmation")]
    PersonMatchPending(Box<PersonMatchPending>),

    #[error("Duplicate tracking code: {0}")]
    DuplicateTrackingCode(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the recorder may retry the whole unit with a fresh tracking code
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::DuplicateTrackingCode(_))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, ErrorCode) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue),
            AppError::InvalidTransition(_) => (StatusCode::CONFLICT, ErrorCode::InvalidTransition),
            AppError::PersonMatchPending(_) => (StatusCode::ACCEPTED, ErrorCode::PersonMatchPending),
            AppError::DuplicateTrackingCode(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, ErrorCode::DuplicateTrackingCode)
            }
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DbFailure),
            AppError::Redis(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Failure)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match self {
            AppError::PersonMatchPending(pending) => {
                return (status, Json(*pending)).into_response();
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Redis(e) => {
                tracing::error!("Redis error: {:?}", e);
                "Internal server error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::DuplicateTrackingCode(code) => {
                tracing::error!("Tracking code collisions exhausted retries (last: {})", code);
                format!("Could not allocate a unique tracking code ({})", code)
            }
            AppError::InvalidTransition(e) => e.to_string(),
            AppError::NotFound(msg) | AppError::Validation(msg) => msg,
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
