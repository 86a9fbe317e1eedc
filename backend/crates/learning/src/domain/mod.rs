//! Domain Layer
//!
//! Contains entities, value objects, grading and repository traits.

pub mod entity;
pub mod grading;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{
    certificate::Certificate,
    course::{Course, CourseDetails},
    enrollment::Enrollment,
    lesson::{Lesson, LessonDraft},
    progress::{CourseProgress, LessonProgress},
    quiz::{AnswerOption, OptionDraft, Question, QuestionDraft, Quiz, QuizDraft},
    quiz_attempt::{AttemptAnswer, QuizAttempt},
};
pub use grading::{Grade, QuestionResult, SubmittedAnswer};
pub use repository::{
    AttemptRepository, AttemptSummary, CatalogFilter, CertificateRepository, CertificateView,
    CourseRepository, CourseSummary, EnrolledCourse, EnrollmentRepository, LessonRepository,
    ProgressRepository, QuizRepository, RosterEntry,
};
