//! Billing Error Types
//!
//! Checkout, refund and payout failures, mapped onto the unified
//! `kernel::error::AppError` shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

use crate::domain::value_object::{payment_status::PaymentStatus, payout_status::PayoutStatus};

/// Billing-specific result type alias
pub type BillingResult<T> = Result<T, BillingError>;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("Course not found")]
    CourseNotFound,

    #[error("Payment not found")]
    PaymentNotFound,

    #[error("Payout not found")]
    PayoutNotFound,

    #[error("This course is free")]
    FreeCourse,

    #[error("Instructors cannot buy their own course")]
    OwnCourse,

    #[error("Already enrolled in this course")]
    AlreadyEnrolled,

    #[error("Payment declined: {0}")]
    PaymentDeclined(String),

    #[error("Payment provider is unavailable")]
    GatewayUnavailable,

    #[error("Cannot move payment from {from} to {to}")]
    InvalidPaymentTransition { from: PaymentStatus, to: PaymentStatus },

    #[error("Payout is already {0}")]
    PayoutAlreadyProcessed(PayoutStatus),

    #[error("A payout request is already open")]
    PayoutAlreadyOpen,

    #[error("Payouts start at {min_cents} cents")]
    PayoutBelowMinimum { min_cents: i64 },

    #[error("Only {available_cents} cents are available for payout")]
    InsufficientBalance { available_cents: i64 },

    #[error("Validation error: {0}")]
    Validation(String),

    /// Error raised by the kernel (role checks), kind preserved
    #[error("{0}")]
    App(AppError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BillingError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BillingError::CourseNotFound
            | BillingError::PaymentNotFound
            | BillingError::PayoutNotFound => ErrorKind::NotFound,
            BillingError::FreeCourse | BillingError::OwnCourse | BillingError::Validation(_) => {
                ErrorKind::BadRequest
            }
            BillingError::AlreadyEnrolled
            | BillingError::InvalidPaymentTransition { .. }
            | BillingError::PayoutAlreadyProcessed(_)
            | BillingError::PayoutAlreadyOpen => ErrorKind::Conflict,
            BillingError::PaymentDeclined(_) => ErrorKind::PaymentRequired,
            BillingError::GatewayUnavailable => ErrorKind::ServiceUnavailable,
            BillingError::PayoutBelowMinimum { .. } | BillingError::InsufficientBalance { .. } => {
                ErrorKind::UnprocessableEntity
            }
            BillingError::App(e) => e.kind(),
            BillingError::Database(_) | BillingError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    pub fn into_app_error(self) -> AppError {
        let kind = self.kind();
        match self {
            BillingError::App(e) => e,
            BillingError::Database(_) | BillingError::Internal(_) => {
                AppError::new(kind, "An unexpected error occurred")
            }
            BillingError::FreeCourse => {
                AppError::new(kind, self.to_string()).with_action("Enroll in the course directly")
            }
            BillingError::PaymentDeclined(_) => AppError::new(kind, self.to_string())
                .with_action("Use a different payment method"),
            BillingError::GatewayUnavailable => {
                AppError::new(kind, self.to_string()).with_action("Try again in a few minutes")
            }
            other => AppError::new(kind, other.to_string()),
        }
    }

    fn log(&self) {
        match self {
            BillingError::Database(e) => {
                tracing::error!(error = %e, "Billing database error");
            }
            BillingError::Internal(msg) => {
                tracing::error!(message = %msg, "Billing internal error");
            }
            BillingError::GatewayUnavailable => {
                tracing::error!("Payment gateway unavailable");
            }
            BillingError::App(e) if e.is_server_error() => {
                tracing::error!(error = %e, "Billing service error");
            }
            _ => {
                tracing::debug!(error = %self, "Billing error");
            }
        }
    }
}

impl IntoResponse for BillingError {
    fn into_response(self) -> Response {
        self.log();
        self.into_app_error().into_response()
    }
}

impl From<AppError> for BillingError {
    fn from(err: AppError) -> Self {
        BillingError::App(err)
    }
}

impl From<validator::ValidationErrors> for BillingError {
    fn from(err: validator::ValidationErrors) -> Self {
        BillingError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(BillingError::FreeCourse.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(BillingError::AlreadyEnrolled.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            BillingError::PaymentDeclined("Insufficient funds".to_string()).status_code(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            BillingError::GatewayUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            BillingError::InsufficientBalance { available_cents: 10 }.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(BillingError::PayoutAlreadyOpen.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_decline_reason_reaches_client() {
        let err = BillingError::PaymentDeclined("Insufficient funds".to_string()).into_app_error();
        assert_eq!(err.status_code(), 402);
        assert!(err.message().contains("Insufficient funds"));
        assert!(err.action().is_some());
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = BillingError::Internal("bad status id 7".to_string()).into_app_error();
        assert!(!err.message().contains("status id"));
    }
}
