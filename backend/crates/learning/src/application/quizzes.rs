//! Quiz Use Cases
//!
//! Authoring (owner only) and reading. Students see the questions without
//! the correct answers; owners and admins see everything.

use kernel::auth::CurrentUser;
use kernel::clock::Clock;
use kernel::id::{CourseId, QuizId};
use std::sync::Arc;

use crate::application::access::{load_course, load_managed_course, require_enrollment};
use crate::application::config::LearningConfig;
use crate::domain::entity::{course::Course, quiz::{Quiz, QuizDraft}};
use crate::domain::repository::{
    CourseRepository, EnrollmentRepository, LessonRepository, QuizRepository,
};
use crate::error::{LearningError, LearningResult};

pub struct QuizAuthoringUseCase<R>
where
    R: CourseRepository + LessonRepository + QuizRepository,
{
    repo: Arc<R>,
    config: Arc<LearningConfig>,
    clock: Arc<dyn Clock>,
}

impl<R> QuizAuthoringUseCase<R>
where
    R: CourseRepository + LessonRepository + QuizRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<LearningConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            config,
            clock,
        }
    }

    pub async fn create(
        &self,
        caller: &CurrentUser,
        course_id: CourseId,
        draft: QuizDraft,
    ) -> LearningResult<Quiz> {
        let course = load_managed_course(&*self.repo, &course_id, caller).await?;
        course.ensure_content_editable()?;
        self.check_lesson(&course, &draft).await?;

        let quiz = Quiz::new(
            course_id,
            draft,
            self.config.default_pass_percentage,
            self.clock.now(),
        )?;
        self.repo.save_quiz(&quiz).await?;

        tracing::info!(
            course_id = %course_id,
            quiz_id = %quiz.quiz_id,
            questions = quiz.questions.len(),
            "Quiz created"
        );

        Ok(quiz)
    }

    /// Replaces title, threshold and every question
    pub async fn replace(
        &self,
        caller: &CurrentUser,
        quiz_id: QuizId,
        draft: QuizDraft,
    ) -> LearningResult<Quiz> {
        let mut quiz = self.load(&quiz_id).await?;
        let course = load_managed_course(&*self.repo, &quiz.course_id, caller).await?;
        course.ensure_content_editable()?;
        self.check_lesson(&course, &draft).await?;

        quiz.replace(draft, self.config.default_pass_percentage, self.clock.now())?;
        self.repo.save_quiz(&quiz).await?;

        tracing::info!(
            quiz_id = %quiz_id,
            questions = quiz.questions.len(),
            "Quiz replaced"
        );

        Ok(quiz)
    }

    pub async fn delete(&self, caller: &CurrentUser, quiz_id: QuizId) -> LearningResult<()> {
        let quiz = self.load(&quiz_id).await?;
        let course = load_managed_course(&*self.repo, &quiz.course_id, caller).await?;
        course.ensure_content_editable()?;

        self.repo.delete_quiz(&quiz_id).await?;

        tracing::info!(course_id = %quiz.course_id, quiz_id = %quiz_id, "Quiz deleted");

        Ok(())
    }

    async fn load(&self, quiz_id: &QuizId) -> LearningResult<Quiz> {
        self.repo
            .find_quiz(quiz_id)
            .await?
            .ok_or(LearningError::QuizNotFound)
    }

    /// An attached lesson must belong to the same course
    async fn check_lesson(&self, course: &Course, draft: &QuizDraft) -> LearningResult<()> {
        let Some(lesson_id) = draft.lesson_id else {
            return Ok(());
        };
        match self.repo.find_lesson(&lesson_id).await? {
            Some(lesson) if lesson.course_id == course.course_id => Ok(()),
            _ => Err(LearningError::Validation(
                "Lesson does not belong to this course".to_string(),
            )),
        }
    }
}

// ============================================================================
// Reading
// ============================================================================

#[derive(Debug, Clone)]
pub struct QuizView {
    pub quiz: Quiz,
    /// True for owners and admins
    pub reveal_answers: bool,
}

pub struct GetQuizUseCase<R>
where
    R: CourseRepository + QuizRepository + EnrollmentRepository,
{
    repo: Arc<R>,
}

impl<R> GetQuizUseCase<R>
where
    R: CourseRepository + QuizRepository + EnrollmentRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, caller: &CurrentUser, quiz_id: QuizId) -> LearningResult<QuizView> {
        let quiz = self
            .repo
            .find_quiz(&quiz_id)
            .await?
            .ok_or(LearningError::QuizNotFound)?;
        let course = load_course(&*self.repo, &quiz.course_id).await?;

        if course.can_manage(caller) {
            return Ok(QuizView {
                quiz,
                reveal_answers: true,
            });
        }

        require_enrollment(&*self.repo, &caller.user_id, &course.course_id).await?;

        Ok(QuizView {
            quiz,
            reveal_answers: false,
        })
    }
}
