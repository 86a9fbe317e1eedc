//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.
//! Method names are unique across traits so one store can implement all of
//! them and be used through any combination of bounds.

use chrono::{DateTime, Utc};
use kernel::id::{CourseId, LessonId, QuizId, UserId};
use kernel::page::{Page, PageRequest};

use crate::domain::entity::{
    certificate::Certificate, course::Course, enrollment::Enrollment, lesson::Lesson,
    progress::LessonProgress, quiz::Quiz, quiz_attempt::QuizAttempt,
};
use crate::domain::value_object::{
    certificate_code::CertificateCode, course_level::CourseLevel, course_status::CourseStatus,
};
use crate::error::LearningResult;

// ============================================================================
// Read models
// ============================================================================

/// Course with the figures shown on catalog cards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseSummary {
    pub course: Course,
    pub instructor_name: String,
    pub lesson_count: i64,
    pub enrollment_count: i64,
}

/// Catalog filter over published courses
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    /// Case-insensitive substring of title or summary
    pub search: Option<String>,
    pub category: Option<String>,
    pub level: Option<CourseLevel>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrolledCourse {
    pub enrollment: Enrollment,
    pub course: CourseSummary,
}

/// Student row of a course roster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub user_id: UserId,
    pub full_name: String,
    pub email: String,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub lessons_completed: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptSummary {
    pub attempt: QuizAttempt,
    pub quiz_title: String,
    pub course_id: CourseId,
    pub course_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateView {
    pub certificate: Certificate,
    pub course_title: String,
    pub student_name: String,
}

// ============================================================================
// Repositories
// ============================================================================

#[trait_variant::make(CourseRepository: Send)]
pub trait LocalCourseRepository {
    async fn create_course(&self, course: &Course) -> LearningResult<()>;

    async fn find_course(&self, course_id: &CourseId) -> LearningResult<Option<Course>>;

    async fn update_course(&self, course: &Course) -> LearningResult<()>;

    /// Fails with `LearningError::CourseInUse` when rows still reference it
    async fn delete_course(&self, course_id: &CourseId) -> LearningResult<()>;

    async fn course_summary(&self, course_id: &CourseId) -> LearningResult<Option<CourseSummary>>;

    /// Published courses, newest first
    async fn list_published(
        &self,
        filter: &CatalogFilter,
        page: PageRequest,
    ) -> LearningResult<Page<CourseSummary>>;

    /// Newest first
    async fn list_by_instructor(
        &self,
        instructor_id: &UserId,
    ) -> LearningResult<Vec<CourseSummary>>;

    /// Oldest first, so reviewers work through the queue in order
    async fn list_by_status(
        &self,
        status: CourseStatus,
        page: PageRequest,
    ) -> LearningResult<Page<CourseSummary>>;
}

#[trait_variant::make(LessonRepository: Send)]
pub trait LocalLessonRepository {
    async fn create_lesson(&self, lesson: &Lesson) -> LearningResult<()>;

    async fn find_lesson(&self, lesson_id: &LessonId) -> LearningResult<Option<Lesson>>;

    async fn update_lesson(&self, lesson: &Lesson) -> LearningResult<()>;

    /// Deletes and shifts later lessons up by one
    async fn delete_lesson(&self, lesson: &Lesson) -> LearningResult<()>;

    /// Ordered by position
    async fn list_lessons(&self, course_id: &CourseId) -> LearningResult<Vec<Lesson>>;

    /// `ordered` must hold every lesson of the course exactly once
    async fn reorder_lessons(
        &self,
        course_id: &CourseId,
        ordered: &[LessonId],
        now: DateTime<Utc>,
    ) -> LearningResult<()>;
}

#[trait_variant::make(QuizRepository: Send)]
pub trait LocalQuizRepository {
    /// Insert or replace the quiz with all its questions
    async fn save_quiz(&self, quiz: &Quiz) -> LearningResult<()>;

    async fn find_quiz(&self, quiz_id: &QuizId) -> LearningResult<Option<Quiz>>;

    async fn list_quizzes(&self, course_id: &CourseId) -> LearningResult<Vec<Quiz>>;

    async fn delete_quiz(&self, quiz_id: &QuizId) -> LearningResult<()>;
}

#[trait_variant::make(AttemptRepository: Send)]
pub trait LocalAttemptRepository {
    async fn create_attempt(&self, attempt: &QuizAttempt) -> LearningResult<()>;

    /// Newest first
    async fn list_attempts(
        &self,
        user_id: &UserId,
        quiz_id: &QuizId,
    ) -> LearningResult<Vec<QuizAttempt>>;

    /// Newest first, across all courses
    async fn recent_attempts(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> LearningResult<Vec<AttemptSummary>>;

    /// Quizzes of the course with at least one passing attempt
    async fn passed_quiz_ids(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> LearningResult<Vec<QuizId>>;

    /// Mean over (student, quiz) of the best percentage, `None` without attempts
    async fn average_best_percentage(&self, course_id: &CourseId) -> LearningResult<Option<f64>>;
}

#[trait_variant::make(EnrollmentRepository: Send)]
pub trait LocalEnrollmentRepository {
    /// Fails with `LearningError::AlreadyEnrolled` on a duplicate
    async fn create_enrollment(&self, enrollment: &Enrollment) -> LearningResult<()>;

    async fn find_enrollment(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> LearningResult<Option<Enrollment>>;

    async fn update_enrollment(&self, enrollment: &Enrollment) -> LearningResult<()>;

    /// Newest first
    async fn list_enrollments(&self, user_id: &UserId) -> LearningResult<Vec<EnrolledCourse>>;

    async fn count_completions(&self, course_id: &CourseId) -> LearningResult<i64>;

    /// Oldest enrollment first
    async fn roster(&self, course_id: &CourseId) -> LearningResult<Vec<RosterEntry>>;
}

#[trait_variant::make(ProgressRepository: Send)]
pub trait LocalProgressRepository {
    /// Returns false when the lesson was already complete
    async fn record_completion(&self, progress: &LessonProgress) -> LearningResult<bool>;

    async fn completed_lesson_ids(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> LearningResult<Vec<LessonId>>;
}

#[trait_variant::make(CertificateRepository: Send)]
pub trait LocalCertificateRepository {
    /// Insert unless one exists for (user, course); returns whether it did
    async fn insert_certificate(&self, certificate: &Certificate) -> LearningResult<bool>;

    async fn find_certificate(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> LearningResult<Option<Certificate>>;

    async fn find_certificate_by_code(
        &self,
        code: &CertificateCode,
    ) -> LearningResult<Option<CertificateView>>;

    /// Newest first
    async fn list_certificates(&self, user_id: &UserId) -> LearningResult<Vec<CertificateView>>;
}
