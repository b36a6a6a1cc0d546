/// Unified error types for the helpdesk service
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the helpdesk
#[derive(Error, Debug)]
pub enum HelpdeskError {
    /// Malformed or missing input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing, invalid or expired credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Access policy denial
    #[error("Not authorized: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness violations (duplicate phone or email)
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<validator::ValidationErrors> for HelpdeskError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors.field_errors().keys().map(|k| k.to_string()).collect();
        fields.sort_unstable();
        HelpdeskError::Validation(format!("Missing or invalid fields: {}", fields.join(", ")))
    }
}

impl From<crate::auth::TokenError> for HelpdeskError {
    fn from(err: crate::auth::TokenError) -> Self {
        HelpdeskError::Authentication(err.to_string())
    }
}

impl HelpdeskError {
    /// Map a store error, turning unique-constraint violations into `Conflict`
    pub fn from_store(err: sqlx::Error, conflict_message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return HelpdeskError::Conflict(conflict_message.to_string());
            }
        }
        HelpdeskError::Database(err)
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            HelpdeskError::Validation(_) => StatusCode::BAD_REQUEST,
            HelpdeskError::Authentication(_) => StatusCode::UNAUTHORIZED,
            HelpdeskError::Authorization(_) => StatusCode::FORBIDDEN,
            HelpdeskError::NotFound(_) => StatusCode::NOT_FOUND,
            HelpdeskError::Conflict(_) => StatusCode::CONFLICT,
            HelpdeskError::Internal(_) | HelpdeskError::Database(_) | HelpdeskError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Failure envelope returned by every handler
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
}

/// Convert HelpdeskError to HTTP response
impl IntoResponse for HelpdeskError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error_code, message) = match self {
            HelpdeskError::Validation(msg) => ("BadRequest", msg),
            HelpdeskError::Authentication(msg) => ("Unauthenticated", msg),
            HelpdeskError::Authorization(msg) => ("Forbidden", msg),
            HelpdeskError::NotFound(msg) => ("NotFound", msg),
            HelpdeskError::Conflict(msg) => ("Conflict", msg),
            other => {
                tracing::error!("Request failed: {}", other);
                // Don't leak details
                ("Internal", "Internal server error".to_string())
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for helpdesk operations
pub type HelpdeskResult<T> = Result<T, HelpdeskError>;
