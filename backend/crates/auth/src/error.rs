//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::jwt::JwtError;
use platform::storage::StorageError;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User not found")]
    UserNotFound,

    #[error("An account with this email already exists")]
    EmailTaken,

    /// Unknown email or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Too many failed attempts
    #[error("Account is temporarily locked")]
    AccountLocked,

    #[error("Account is suspended")]
    AccountSuspended,

    #[error("Role cannot be chosen at sign up: {0}")]
    RoleNotSelfAssignable(String),

    #[error("Refresh token is invalid or expired")]
    RefreshTokenInvalid,

    /// A rotated refresh token was presented again
    #[error("Refresh token was already used")]
    RefreshTokenReused,

    #[error("Access token expired")]
    AccessTokenExpired,

    #[error("Access token invalid")]
    AccessTokenInvalid,

    #[error("Password reset link is invalid or expired")]
    ResetTokenInvalid,

    #[error("Current password is incorrect")]
    CurrentPasswordMismatch,

    #[error("Administrators cannot change their own role or status")]
    CannotModifySelf,

    #[error("Validation error: {0}")]
    Validation(String),

    /// Error raised by a value object or platform service, kind preserved
    #[error("{0}")]
    App(AppError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::EmailTaken => ErrorKind::Conflict,
            AuthError::InvalidCredentials
            | AuthError::RefreshTokenInvalid
            | AuthError::RefreshTokenReused
            | AuthError::AccessTokenExpired
            | AuthError::AccessTokenInvalid
            | AuthError::CurrentPasswordMismatch => ErrorKind::Unauthorized,
            AuthError::AccountLocked => ErrorKind::Locked,
            AuthError::AccountSuspended => ErrorKind::Forbidden,
            AuthError::RoleNotSelfAssignable(_)
            | AuthError::ResetTokenInvalid
            | AuthError::CannotModifySelf
            | AuthError::Validation(_) => ErrorKind::BadRequest,
            AuthError::App(e) => e.kind(),
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn into_app_error(self) -> AppError {
        let kind = self.kind();
        match self {
            AuthError::App(e) => e,
            AuthError::Database(_) | AuthError::Internal(_) => {
                AppError::new(kind, "An unexpected error occurred")
            }
            AuthError::AccountLocked => AppError::new(kind, self.to_string())
                .with_action("Wait 15 minutes or reset your password"),
            AuthError::AccessTokenExpired => AppError::new(kind, self.to_string())
                .with_action("Refresh the access token"),
            AuthError::RefreshTokenInvalid | AuthError::RefreshTokenReused => {
                AppError::new(kind, self.to_string()).with_action("Sign in again")
            }
            other => AppError::new(kind, other.to_string()),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::App(e) if e.is_server_error() => {
                tracing::error!(error = %e, "Auth service error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::AccountLocked => {
                tracing::warn!("Login attempt on locked account");
            }
            AuthError::RefreshTokenReused => {
                tracing::warn!("Refresh token reuse detected");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.into_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::App(err)
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::AccessTokenExpired,
            JwtError::Invalid => AuthError::AccessTokenInvalid,
            JwtError::WeakSecret | JwtError::Encoding(_) => AuthError::Internal(err.to_string()),
        }
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        AuthError::App(err.into())
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(err: validator::ValidationErrors) -> Self {
        AuthError::Validation(err.to_string())
    }
}
