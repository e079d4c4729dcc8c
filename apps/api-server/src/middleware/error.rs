//! Error presentation: every failure leaves as `{"error": {"code", "details"}}`.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use std::fmt;

use insights_core::error::{DomainError, RepoError, ValidationErrors};
use insights_core::ports::AuthError;
use insights_shared::{ErrorCode, ErrorEnvelope};

pub const NOT_AUTHENTICATED: &str = "Authentication credentials were not provided.";
pub const INVALID_CREDENTIALS: &str = "No active account found with the given credentials.";

/// Application-level error type rendered as the error envelope.
#[derive(Debug)]
pub enum AppError {
    /// Field-keyed validation failures.
    Validation(ValidationErrors),
    /// Request body or query string that could not be parsed.
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound,
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => ErrorCode::ValidationError,
            AppError::Unauthorized(_) => ErrorCode::Unauthorized,
            AppError::Forbidden(_) => ErrorCode::Forbidden,
            AppError::NotFound => ErrorCode::NotFound,
            AppError::Internal(_) => ErrorCode::ServerError,
        }
    }

    fn envelope(&self) -> ErrorEnvelope {
        let code = self.code();
        match self {
            AppError::Validation(errors) => ErrorEnvelope::new(code, json!(errors)),
            AppError::BadRequest(msg) | AppError::Unauthorized(msg) | AppError::Forbidden(msg) => {
                ErrorEnvelope::message(code, msg.as_str())
            }
            AppError::NotFound => ErrorEnvelope::new(code, json!({"detail": "Not found."})),
            AppError::Internal(_) => {
                ErrorEnvelope::new(code, json!({"detail": "A server error occurred."}))
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(errors) => write!(f, "Validation failed: {}", errors),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::NotFound => write!(f, "Not found"),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.code().status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Internal(detail) => tracing::error!("Internal error: {}", detail),
            other => tracing::debug!(code = ?other.code(), "{}", other),
        }

        HttpResponse::build(self.status_code()).json(self.envelope())
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(errors) => AppError::Validation(errors),
            DomainError::Forbidden(msg) => AppError::Forbidden(msg),
            DomainError::NotFound { .. } => AppError::NotFound,
            DomainError::Unauthorized => AppError::Unauthorized(INVALID_CREDENTIALS.to_string()),
            DomainError::Repository(e) => e.into(),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound,
            other => AppError::Internal(format!("Database error: {}", other)),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingAuth => AppError::Unauthorized(NOT_AUTHENTICATED.to_string()),
            AuthError::InvalidCredentials => {
                AppError::Unauthorized(INVALID_CREDENTIALS.to_string())
            }
            AuthError::TokenExpired => AppError::Unauthorized("Token has expired.".to_string()),
            AuthError::InvalidToken(_) => {
                AppError::Unauthorized("Given token not valid for any token type.".to_string())
            }
            AuthError::HashingError(msg) => AppError::Internal(msg),
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
