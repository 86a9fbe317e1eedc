//! Learning Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, grading, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - Course catalog with search and filters, course outlines
//! - Instructor authoring of courses, lessons and quizzes with a review
//!   workflow (draft, pending review, published, rejected, archived)
//! - Free enrollment, lesson progress and course completion
//! - Quiz auto-grading with stored attempts
//! - Certificates with public verification codes
//! - Student and instructor dashboards, course rosters
//! - Admin moderation of submitted courses

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::config::LearningConfig;
pub use error::{LearningError, LearningResult};
pub use infra::postgres::PgLearningRepository;
pub use presentation::router::{learning_router, learning_router_generic};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod store {
    pub use crate::infra::postgres::PgLearningRepository as LearningStore;
}
