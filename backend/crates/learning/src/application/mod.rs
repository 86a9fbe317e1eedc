//! Application Layer
//!
//! Use cases of the learning context, generic over the repository traits.

mod access;
pub mod catalog;
pub mod certificates;
pub mod config;
pub mod courses;
pub mod dashboard;
pub mod enrollment;
pub mod lessons;
pub mod moderation;
pub mod progress;
pub mod quizzes;
pub mod roster;
pub mod submit_quiz;

pub use catalog::{CourseDetailUseCase, CourseOutline, ListCatalogUseCase};
pub use certificates::{
    IssueCertificateUseCase, IssuedCertificate, ListCertificatesUseCase, VerifyCertificateUseCase,
};
pub use config::LearningConfig;
pub use courses::{CourseAuthoringUseCase, UploadThumbnailUseCase};
pub use dashboard::{
    EnrolledCourseProgress, InstructorCourseStats, InstructorDashboard,
    InstructorDashboardUseCase, StudentDashboard, StudentDashboardUseCase,
};
pub use enrollment::{EnrollUseCase, ListEnrollmentsUseCase};
pub use lessons::{LessonAuthoringUseCase, ReadLessonUseCase};
pub use moderation::ModerationUseCase;
pub use progress::{CompleteLessonUseCase, CourseProgressUseCase, ProgressView};
pub use quizzes::{GetQuizUseCase, QuizAuthoringUseCase, QuizView};
pub use roster::{CourseRoster, CourseRosterUseCase, RosterStudent};
pub use submit_quiz::{ListAttemptsUseCase, SubmissionResult, SubmitQuizUseCase};
