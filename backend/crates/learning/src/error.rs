//! Learning Error Types
//!
//! Course, lesson, quiz and enrollment failures, mapped onto the unified
//! `kernel::error::AppError` shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::storage::StorageError;
use thiserror::Error;

use crate::domain::value_object::course_status::CourseStatus;

/// Learning-specific result type alias
pub type LearningResult<T> = Result<T, LearningError>;

#[derive(Debug, Error)]
pub enum LearningError {
    #[error("Course not found")]
    CourseNotFound,

    #[error("Lesson not found")]
    LessonNotFound,

    #[error("Quiz not found")]
    QuizNotFound,

    #[error("Certificate not found")]
    CertificateNotFound,

    /// Caller is neither the course owner nor an admin
    #[error("Only the course instructor can do this")]
    NotCourseOwner,

    #[error("You are not enrolled in this course")]
    NotEnrolled,

    #[error("Lesson content is available to enrolled students only")]
    LessonLocked,

    #[error("Already enrolled in this course")]
    AlreadyEnrolled,

    #[error("This course must be purchased")]
    PaymentRequired,

    #[error("Instructors cannot enroll in their own course")]
    OwnCourse,

    #[error("Cannot move course from {from} to {to}")]
    InvalidTransition { from: CourseStatus, to: CourseStatus },

    #[error("Course is awaiting review and cannot be edited")]
    CourseUnderReview,

    #[error("Course has enrollments or payments and cannot be deleted")]
    CourseInUse,

    #[error("Course needs at least one lesson before review")]
    NoLessons,

    #[error("Quiz has no questions")]
    EmptyQuiz,

    #[error("Invalid answer: {0}")]
    InvalidAnswer(String),

    #[error("Course is not complete yet")]
    CourseIncomplete,

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

impl LearningError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LearningError::CourseNotFound
            | LearningError::LessonNotFound
            | LearningError::QuizNotFound
            | LearningError::CertificateNotFound => ErrorKind::NotFound,
            LearningError::NotCourseOwner
            | LearningError::NotEnrolled
            | LearningError::LessonLocked => ErrorKind::Forbidden,
            LearningError::AlreadyEnrolled
            | LearningError::InvalidTransition { .. }
            | LearningError::CourseUnderReview
            | LearningError::CourseInUse => ErrorKind::Conflict,
            LearningError::PaymentRequired => ErrorKind::PaymentRequired,
            LearningError::OwnCourse
            | LearningError::InvalidAnswer(_)
            | LearningError::Validation(_) => ErrorKind::BadRequest,
            LearningError::NoLessons
            | LearningError::EmptyQuiz
            | LearningError::CourseIncomplete => ErrorKind::UnprocessableEntity,
            LearningError::App(e) => e.kind(),
            LearningError::Database(_) | LearningError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    pub fn into_app_error(self) -> AppError {
        let kind = self.kind();
        match self {
            LearningError::App(e) => e,
            LearningError::Database(_) | LearningError::Internal(_) => {
                AppError::new(kind, "An unexpected error occurred")
            }
            LearningError::PaymentRequired => AppError::new(kind, self.to_string())
                .with_action("Purchase the course through checkout"),
            LearningError::NotEnrolled => AppError::new(kind, self.to_string())
                .with_action("Enroll in the course first"),
            LearningError::NoLessons => AppError::new(kind, self.to_string())
                .with_action("Add a lesson and submit again"),
            other => AppError::new(kind, other.to_string()),
        }
    }

    fn log(&self) {
        match self {
            LearningError::Database(e) => {
                tracing::error!(error = %e, "Learning database error");
            }
            LearningError::Internal(msg) => {
                tracing::error!(message = %msg, "Learning internal error");
            }
            LearningError::App(e) if e.is_server_error() => {
                tracing::error!(error = %e, "Learning service error");
            }
            LearningError::InvalidAnswer(reason) => {
                tracing::warn!(reason = %reason, "Malformed quiz submission");
            }
            _ => {
                tracing::debug!(error = %self, "Learning error");
            }
        }
    }
}

impl IntoResponse for LearningError {
    fn into_response(self) -> Response {
        self.log();
        self.into_app_error().into_response()
    }
}

impl From<AppError> for LearningError {
    fn from(err: AppError) -> Self {
        LearningError::App(err)
    }
}

impl From<StorageError> for LearningError {
    fn from(err: StorageError) -> Self {
        LearningError::App(err.into())
    }
}

impl From<validator::ValidationErrors> for LearningError {
    fn from(err: validator::ValidationErrors) -> Self {
        LearningError::Validation(err.to_string())
    }
}
