/// Unified error types for Pupmatch
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum AppError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Authorization errors
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// Malformed input (bad cursor, missing fields, bad registration data)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Preference codes outside their fixed enumeration, or empty selections
    #[error("Invalid preference: {0}")]
    InvalidPreference(String),

    /// Bucket keyword other than liked/disliked/undecided
    #[error("Unknown bucket: {0}")]
    UnknownBucket(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (e.g., duplicate username)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limiting errors
    #[error("Rate limit exceeded")]
    RateLimitExceeded { retry_after: std::time::Duration },

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JWT errors
    #[error("JWT error: {0}")]
    Jwt(String),

    /// Password hashing errors
    #[error("Password hashing error: {0}")]
    PasswordHash(String),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Undecodable or incomplete JSON bodies are malformed input
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            AppError::Authentication(_) => (
                StatusCode::UNAUTHORIZED,
                "AuthenticationRequired",
                self.to_string(),
            ),
            AppError::Authorization(_) => (StatusCode::FORBIDDEN, "Forbidden", self.to_string()),
            AppError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                self.to_string(),
            ),
            AppError::InvalidPreference(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidPreference",
                self.to_string(),
            ),
            // Unknown buckets behave like a missing route
            AppError::NotFound(_) | AppError::UnknownBucket(_) => {
                (StatusCode::NOT_FOUND, "NotFound", self.to_string())
            }
            AppError::Conflict(_) => (StatusCode::CONFLICT, "Conflict", self.to_string()),
            AppError::RateLimitExceeded { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RateLimitExceeded",
                "Rate limit exceeded".to_string(),
            ),
            AppError::Database(_)
            | AppError::Internal(_)
            | AppError::Io(_)
            | AppError::Jwt(_)
            | AppError::PasswordHash(_) => {
                tracing::error!("Request failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalServerError",
                    "Internal server error".to_string(), // Don't leak details
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for service operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::NotFound("dog".into()), StatusCode::NOT_FOUND),
            (AppError::UnknownBucket("likedd".into()), StatusCode::NOT_FOUND),
            (AppError::InvalidPreference("q".into()), StatusCode::BAD_REQUEST),
            (AppError::Validation("cursor".into()), StatusCode::BAD_REQUEST),
            (AppError::Authentication("token".into()), StatusCode::UNAUTHORIZED),
            (AppError::Conflict("user".into()), StatusCode::CONFLICT),
            (AppError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
