//! Learning Router
//!
//! Paths are relative to `/api`:
//! - `/courses`, `/lessons`, `/quizzes`: catalog, authoring and study
//! - `/me`, `/dashboard`, `/instructor`: per-caller views
//! - `/certificates/{code}`: public verification
//! - `/admin/courses`: moderation
//!
//! Authentication comes from the `CurrentUser` extractor; routes without
//! it are public.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

use crate::infra::postgres::PgLearningRepository;
use crate::presentation::handlers::{self, LearningAppState, LearningRepositories};

/// Slack on top of the image limit for the raw body extractor
const UPLOAD_BODY_SLACK: usize = 1024;

/// Create the Learning router with PostgreSQL repository
pub fn learning_router(state: LearningAppState<PgLearningRepository>) -> Router {
    learning_router_generic(state)
}

/// Create a generic Learning router for any repository implementation
pub fn learning_router_generic<R>(state: LearningAppState<R>) -> Router
where
    R: LearningRepositories,
{
    let body_limit = state.config.max_thumbnail_bytes + UPLOAD_BODY_SLACK;

    Router::new()
        // Catalog and course authoring
        .route(
            "/courses",
            get(handlers::list_catalog::<R>).post(handlers::create_course::<R>),
        )
        .route(
            "/courses/{course_id}",
            get(handlers::get_course::<R>)
                .put(handlers::update_course::<R>)
                .delete(handlers::delete_course::<R>),
        )
        .route("/courses/{course_id}/submit", post(handlers::submit_course::<R>))
        .route("/courses/{course_id}/archive", post(handlers::archive_course::<R>))
        .route(
            "/courses/{course_id}/thumbnail",
            put(handlers::upload_thumbnail::<R>).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/courses/{course_id}/roster", get(handlers::course_roster::<R>))
        .route("/courses/{course_id}/lessons", post(handlers::add_lesson::<R>))
        .route(
            "/courses/{course_id}/lessons/order",
            put(handlers::reorder_lessons::<R>),
        )
        .route("/courses/{course_id}/quizzes", post(handlers::create_quiz::<R>))
        .route("/courses/{course_id}/enroll", post(handlers::enroll::<R>))
        .route("/courses/{course_id}/progress", get(handlers::course_progress::<R>))
        .route(
            "/courses/{course_id}/certificate",
            post(handlers::issue_certificate::<R>),
        )
        // Lessons
        .route(
            "/lessons/{lesson_id}",
            get(handlers::get_lesson::<R>)
                .put(handlers::update_lesson::<R>)
                .delete(handlers::delete_lesson::<R>),
        )
        .route("/lessons/{lesson_id}/complete", post(handlers::complete_lesson::<R>))
        // Quizzes
        .route(
            "/quizzes/{quiz_id}",
            get(handlers::get_quiz::<R>)
                .put(handlers::replace_quiz::<R>)
                .delete(handlers::delete_quiz::<R>),
        )
        .route("/quizzes/{quiz_id}/submit", post(handlers::submit_quiz::<R>))
        .route("/quizzes/{quiz_id}/attempts", get(handlers::list_attempts::<R>))
        // Per-caller views
        .route("/me/enrollments", get(handlers::list_enrollments::<R>))
        .route("/me/certificates", get(handlers::list_certificates::<R>))
        .route("/dashboard/student", get(handlers::student_dashboard::<R>))
        .route("/dashboard/instructor", get(handlers::instructor_dashboard::<R>))
        .route("/instructor/courses", get(handlers::list_own_courses::<R>))
        // Public verification
        .route("/certificates/{code}", get(handlers::verify_certificate::<R>))
        // Moderation
        .route("/admin/courses", get(handlers::list_courses_for_review::<R>))
        .route(
            "/admin/courses/{course_id}/approve",
            post(handlers::approve_course::<R>),
        )
        .route(
            "/admin/courses/{course_id}/reject",
            post(handlers::reject_course::<R>),
        )
        .with_state(state)
}
