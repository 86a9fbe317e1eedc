//! Admin Error Types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

pub type AdminResult<T> = Result<T, AdminError>;

#[derive(Debug, Error)]
pub enum AdminError {
    /// Role checks from the kernel, kind preserved
    #[error("{0}")]
    App(AppError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AdminError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AdminError::App(e) => e.kind(),
            AdminError::Database(_) | AdminError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn into_app_error(self) -> AppError {
        match self {
            AdminError::App(e) => e,
            other => AppError::new(other.kind(), "An unexpected error occurred"),
        }
    }

    fn log(&self) {
        match self {
            AdminError::Database(e) => {
                tracing::error!(error = %e, "Admin database error");
            }
            AdminError::Internal(msg) => {
                tracing::error!(message = %msg, "Admin internal error");
            }
            AdminError::App(e) => {
                tracing::debug!(error = %e, "Admin error");
            }
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        self.log();
        self.into_app_error().into_response()
    }
}

impl From<AppError> for AdminError {
    fn from(err: AppError) -> Self {
        AdminError::App(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_passes_through() {
        let err = AdminError::from(AppError::forbidden("Administrator role required"));
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AdminError::Internal("bad user_role 9".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.into_app_error().message().contains("user_role"));
    }
}
