//! Dashboard Use Cases

use kernel::auth::CurrentUser;
use std::sync::Arc;

use crate::application::config::LearningConfig;
use crate::application::progress::course_progress;
use crate::domain::entity::progress::CourseProgress;
use crate::domain::repository::{
    AttemptRepository, AttemptSummary, CertificateRepository, CertificateView, CourseRepository,
    CourseSummary, EnrolledCourse, EnrollmentRepository, LessonRepository, ProgressRepository,
    QuizRepository,
};
use crate::domain::value_object::course_status::CourseStatus;
use crate::error::LearningResult;

// ============================================================================
// Student
// ============================================================================

#[derive(Debug, Clone)]
pub struct EnrolledCourseProgress {
    pub enrolled: EnrolledCourse,
    pub progress: CourseProgress,
}

#[derive(Debug, Clone)]
pub struct StudentDashboard {
    pub courses: Vec<EnrolledCourseProgress>,
    pub certificates: Vec<CertificateView>,
    pub recent_attempts: Vec<AttemptSummary>,
    pub enrolled_count: usize,
    pub completed_count: usize,
    pub certificate_count: usize,
}

pub struct StudentDashboardUseCase<R>
where
    R: EnrollmentRepository
        + CertificateRepository
        + LessonRepository
        + QuizRepository
        + AttemptRepository
        + ProgressRepository,
{
    repo: Arc<R>,
    config: Arc<LearningConfig>,
}

impl<R> StudentDashboardUseCase<R>
where
    R: EnrollmentRepository
        + CertificateRepository
        + LessonRepository
        + QuizRepository
        + AttemptRepository
        + ProgressRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<LearningConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, caller: &CurrentUser) -> LearningResult<StudentDashboard> {
        let enrollments = self.repo.list_enrollments(&caller.user_id).await?;

        let mut courses = Vec::with_capacity(enrollments.len());
        for enrolled in enrollments {
            let progress =
                course_progress(&*self.repo, &caller.user_id, &enrolled.enrollment.course_id)
                    .await?;
            courses.push(EnrolledCourseProgress { enrolled, progress });
        }

        let certificates = self.repo.list_certificates(&caller.user_id).await?;
        let recent_attempts = self
            .repo
            .recent_attempts(&caller.user_id, self.config.recent_attempts_limit)
            .await?;

        let completed_count = courses
            .iter()
            .filter(|c| c.enrolled.enrollment.is_completed())
            .count();

        Ok(StudentDashboard {
            enrolled_count: courses.len(),
            completed_count,
            certificate_count: certificates.len(),
            courses,
            certificates,
            recent_attempts,
        })
    }
}

// ============================================================================
// Instructor
// ============================================================================

#[derive(Debug, Clone)]
pub struct InstructorCourseStats {
    pub summary: CourseSummary,
    pub completion_count: i64,
    pub average_best_percentage: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct InstructorDashboard {
    pub courses: Vec<InstructorCourseStats>,
    pub total_courses: usize,
    pub published_courses: usize,
    pub total_enrollments: i64,
    pub total_completions: i64,
}

pub struct InstructorDashboardUseCase<R>
where
    R: CourseRepository + EnrollmentRepository + AttemptRepository,
{
    repo: Arc<R>,
}

impl<R> InstructorDashboardUseCase<R>
where
    R: CourseRepository + EnrollmentRepository + AttemptRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, caller: &CurrentUser) -> LearningResult<InstructorDashboard> {
        caller.require_instructor()?;

        let summaries = self.repo.list_by_instructor(&caller.user_id).await?;
        let mut courses = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let course_id = summary.course.course_id;
            let completion_count = self.repo.count_completions(&course_id).await?;
            let average_best_percentage = self.repo.average_best_percentage(&course_id).await?;
            courses.push(InstructorCourseStats {
                summary,
                completion_count,
                average_best_percentage,
            });
        }

        let published_courses = courses
            .iter()
            .filter(|c| c.summary.course.status == CourseStatus::Published)
            .count();
        let total_enrollments = courses.iter().map(|c| c.summary.enrollment_count).sum();
        let total_completions = courses.iter().map(|c| c.completion_count).sum();

        Ok(InstructorDashboard {
            total_courses: courses.len(),
            published_courses,
            total_enrollments,
            total_completions,
            courses,
        })
    }
}
