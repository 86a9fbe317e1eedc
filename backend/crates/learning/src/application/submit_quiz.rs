//! Quiz Submission Use Cases

use kernel::auth::CurrentUser;
use kernel::clock::Clock;
use kernel::id::QuizId;
use std::sync::Arc;

use crate::application::access::require_enrollment;
use crate::application::progress::{course_progress, sync_completion};
use crate::domain::entity::quiz_attempt::QuizAttempt;
use crate::domain::grading::{Grade, SubmittedAnswer, grade};
use crate::domain::repository::{
    AttemptRepository, EnrollmentRepository, LessonRepository, ProgressRepository, QuizRepository,
};
use crate::error::{LearningError, LearningResult};

#[derive(Debug, Clone)]
pub struct SubmissionResult {
    pub attempt: QuizAttempt,
    pub grade: Grade,
    /// Set when this submission completed the course
    pub course_completed: bool,
}

pub struct SubmitQuizUseCase<R>
where
    R: QuizRepository
        + AttemptRepository
        + EnrollmentRepository
        + LessonRepository
        + ProgressRepository,
{
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> SubmitQuizUseCase<R>
where
    R: QuizRepository
        + AttemptRepository
        + EnrollmentRepository
        + LessonRepository
        + ProgressRepository,
{
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    pub async fn execute(
        &self,
        caller: &CurrentUser,
        quiz_id: QuizId,
        answers: Vec<SubmittedAnswer>,
    ) -> LearningResult<SubmissionResult> {
        let quiz = self
            .repo
            .find_quiz(&quiz_id)
            .await?
            .ok_or(LearningError::QuizNotFound)?;
        let mut enrollment =
            require_enrollment(&*self.repo, &caller.user_id, &quiz.course_id).await?;

        let grade = grade(&quiz, &answers)?;
        let now = self.clock.now();
        let attempt = QuizAttempt::record(quiz_id, caller.user_id, &grade, now);
        self.repo.create_attempt(&attempt).await?;

        tracing::info!(
            user_id = %caller.user_id,
            quiz_id = %quiz_id,
            score = grade.score,
            total = grade.total,
            percentage = grade.percentage,
            passed = grade.passed,
            "Quiz submitted"
        );

        let course_completed = if grade.passed && !enrollment.is_completed() {
            let progress = course_progress(&*self.repo, &caller.user_id, &quiz.course_id).await?;
            sync_completion(&*self.repo, &mut enrollment, &progress, now).await?
        } else {
            false
        };

        Ok(SubmissionResult {
            attempt,
            grade,
            course_completed,
        })
    }
}

// ============================================================================
// Attempt history
// ============================================================================

pub struct ListAttemptsUseCase<R>
where
    R: QuizRepository + AttemptRepository,
{
    repo: Arc<R>,
}

impl<R> ListAttemptsUseCase<R>
where
    R: QuizRepository + AttemptRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Newest first
    pub async fn execute(
        &self,
        caller: &CurrentUser,
        quiz_id: QuizId,
    ) -> LearningResult<Vec<QuizAttempt>> {
        if self.repo.find_quiz(&quiz_id).await?.is_none() {
            return Err(LearningError::QuizNotFound);
        }
        self.repo.list_attempts(&caller.user_id, &quiz_id).await
    }
}
