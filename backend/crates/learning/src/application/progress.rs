//! Progress Use Cases
//!
//! Lesson completion and the derived course progress. Reaching 100 % of
//! lessons with every quiz passed completes the enrollment.

use chrono::{DateTime, Utc};
use kernel::auth::CurrentUser;
use kernel::clock::Clock;
use kernel::id::{CourseId, LessonId, UserId};
use std::collections::HashSet;
use std::sync::Arc;

use crate::application::access::require_enrollment;
use crate::domain::entity::{
    enrollment::Enrollment,
    progress::{CourseProgress, LessonProgress},
};
use crate::domain::repository::{
    AttemptRepository, EnrollmentRepository, LessonRepository, ProgressRepository, QuizRepository,
};
use crate::error::{LearningError, LearningResult};

/// Progress of `user_id` through `course_id`.
///
/// Quizzes without questions cannot be passed and are left out of the
/// quiz total.
pub(crate) async fn course_progress<R>(
    repo: &R,
    user_id: &UserId,
    course_id: &CourseId,
) -> LearningResult<CourseProgress>
where
    R: LessonRepository + QuizRepository + AttemptRepository + ProgressRepository,
{
    let lessons = repo.list_lessons(course_id).await?;
    let lesson_ids: HashSet<LessonId> = lessons.iter().map(|l| l.lesson_id).collect();
    let completed = repo
        .completed_lesson_ids(user_id, course_id)
        .await?
        .into_iter()
        .filter(|id| lesson_ids.contains(id))
        .count();

    let quizzes = repo.list_quizzes(course_id).await?;
    let gradable: HashSet<_> = quizzes
        .iter()
        .filter(|q| !q.is_empty())
        .map(|q| q.quiz_id)
        .collect();
    let passed = repo
        .passed_quiz_ids(user_id, course_id)
        .await?
        .into_iter()
        .filter(|id| gradable.contains(id))
        .count();

    Ok(CourseProgress::new(
        completed as i64,
        lessons.len() as i64,
        passed as i64,
        gradable.len() as i64,
    ))
}

/// Stamp `completed_at` the first time the course is complete
pub(crate) async fn sync_completion<R>(
    repo: &R,
    enrollment: &mut Enrollment,
    progress: &CourseProgress,
    now: DateTime<Utc>,
) -> LearningResult<bool>
where
    R: EnrollmentRepository,
{
    if !progress.is_complete() || !enrollment.mark_completed(now) {
        return Ok(false);
    }
    repo.update_enrollment(enrollment).await?;

    tracing::info!(
        user_id = %enrollment.user_id,
        course_id = %enrollment.course_id,
        "Course completed"
    );

    Ok(true)
}

#[derive(Debug, Clone)]
pub struct ProgressView {
    pub course_id: CourseId,
    pub progress: CourseProgress,
    pub completed_lesson_ids: Vec<LessonId>,
    pub completed_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Complete lesson
// ============================================================================

pub struct CompleteLessonUseCase<R>
where
    R: LessonRepository
        + QuizRepository
        + AttemptRepository
        + ProgressRepository
        + EnrollmentRepository,
{
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> CompleteLessonUseCase<R>
where
    R: LessonRepository
        + QuizRepository
        + AttemptRepository
        + ProgressRepository
        + EnrollmentRepository,
{
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Idempotent: completing a lesson twice changes nothing
    pub async fn execute(
        &self,
        caller: &CurrentUser,
        lesson_id: LessonId,
    ) -> LearningResult<ProgressView> {
        let lesson = self
            .repo
            .find_lesson(&lesson_id)
            .await?
            .ok_or(LearningError::LessonNotFound)?;
        let mut enrollment =
            require_enrollment(&*self.repo, &caller.user_id, &lesson.course_id).await?;

        let now = self.clock.now();
        let recorded = self
            .repo
            .record_completion(&LessonProgress::new(
                caller.user_id,
                lesson_id,
                lesson.course_id,
                now,
            ))
            .await?;

        if recorded {
            tracing::info!(user_id = %caller.user_id, lesson_id = %lesson_id, "Lesson completed");
        }

        let progress = course_progress(&*self.repo, &caller.user_id, &lesson.course_id).await?;
        sync_completion(&*self.repo, &mut enrollment, &progress, now).await?;

        let completed_lesson_ids = self
            .repo
            .completed_lesson_ids(&caller.user_id, &lesson.course_id)
            .await?;

        Ok(ProgressView {
            course_id: lesson.course_id,
            progress,
            completed_lesson_ids,
            completed_at: enrollment.completed_at,
        })
    }
}

// ============================================================================
// Course progress
// ============================================================================

pub struct CourseProgressUseCase<R>
where
    R: LessonRepository
        + QuizRepository
        + AttemptRepository
        + ProgressRepository
        + EnrollmentRepository,
{
    repo: Arc<R>,
}

impl<R> CourseProgressUseCase<R>
where
    R: LessonRepository
        + QuizRepository
        + AttemptRepository
        + ProgressRepository
        + EnrollmentRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(
        &self,
        caller: &CurrentUser,
        course_id: CourseId,
    ) -> LearningResult<ProgressView> {
        let enrollment = require_enrollment(&*self.repo, &caller.user_id, &course_id).await?;
        let progress = course_progress(&*self.repo, &caller.user_id, &course_id).await?;
        let completed_lesson_ids = self
            .repo
            .completed_lesson_ids(&caller.user_id, &course_id)
            .await?;

        Ok(ProgressView {
            course_id,
            progress,
            completed_lesson_ids,
            completed_at: enrollment.completed_at,
        })
    }
}
