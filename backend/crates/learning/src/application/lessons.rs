//! Lesson Use Cases

use kernel::auth::CurrentUser;
use kernel::clock::Clock;
use kernel::id::{CourseId, LessonId};
use std::collections::HashSet;
use std::sync::Arc;

use crate::application::access::{can_read_content, load_course, load_managed_course};
use crate::domain::entity::lesson::{Lesson, LessonDraft};
use crate::domain::repository::{CourseRepository, EnrollmentRepository, LessonRepository};
use crate::error::{LearningError, LearningResult};

// ============================================================================
// Authoring
// ============================================================================

pub struct LessonAuthoringUseCase<R>
where
    R: CourseRepository + LessonRepository,
{
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> LessonAuthoringUseCase<R>
where
    R: CourseRepository + LessonRepository,
{
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Appends after the current last lesson
    pub async fn add(
        &self,
        caller: &CurrentUser,
        course_id: CourseId,
        draft: LessonDraft,
    ) -> LearningResult<Lesson> {
        let course = load_managed_course(&*self.repo, &course_id, caller).await?;
        course.ensure_content_editable()?;

        let existing = self.repo.list_lessons(&course_id).await?;
        let position = existing.iter().map(|l| l.position).max().unwrap_or(0) + 1;

        let lesson = Lesson::new(course_id, draft, position, self.clock.now())?;
        self.repo.create_lesson(&lesson).await?;

        tracing::info!(
            course_id = %course_id,
            lesson_id = %lesson.lesson_id,
            position,
            "Lesson added"
        );

        Ok(lesson)
    }

    pub async fn update(
        &self,
        caller: &CurrentUser,
        lesson_id: LessonId,
        draft: LessonDraft,
    ) -> LearningResult<Lesson> {
        let mut lesson = self.load(&lesson_id).await?;
        let course = load_managed_course(&*self.repo, &lesson.course_id, caller).await?;
        course.ensure_content_editable()?;

        lesson.update(draft, self.clock.now())?;
        self.repo.update_lesson(&lesson).await?;

        tracing::info!(lesson_id = %lesson_id, "Lesson updated");

        Ok(lesson)
    }

    pub async fn delete(&self, caller: &CurrentUser, lesson_id: LessonId) -> LearningResult<()> {
        let lesson = self.load(&lesson_id).await?;
        let course = load_managed_course(&*self.repo, &lesson.course_id, caller).await?;
        course.ensure_content_editable()?;

        self.repo.delete_lesson(&lesson).await?;

        tracing::info!(
            course_id = %lesson.course_id,
            lesson_id = %lesson_id,
            "Lesson deleted"
        );

        Ok(())
    }

    /// `ordered` must name every lesson of the course exactly once
    pub async fn reorder(
        &self,
        caller: &CurrentUser,
        course_id: CourseId,
        ordered: Vec<LessonId>,
    ) -> LearningResult<Vec<Lesson>> {
        let course = load_managed_course(&*self.repo, &course_id, caller).await?;
        course.ensure_content_editable()?;

        let existing = self.repo.list_lessons(&course_id).await?;
        let expected: HashSet<LessonId> = existing.iter().map(|l| l.lesson_id).collect();
        let given: HashSet<LessonId> = ordered.iter().copied().collect();

        if given.len() != ordered.len() || given != expected {
            return Err(LearningError::Validation(
                "Lesson order must list every lesson of the course exactly once".to_string(),
            ));
        }

        self.repo
            .reorder_lessons(&course_id, &ordered, self.clock.now())
            .await?;

        tracing::info!(course_id = %course_id, lessons = ordered.len(), "Lessons reordered");

        self.repo.list_lessons(&course_id).await
    }

    async fn load(&self, lesson_id: &LessonId) -> LearningResult<Lesson> {
        self.repo
            .find_lesson(lesson_id)
            .await?
            .ok_or(LearningError::LessonNotFound)
    }
}

// ============================================================================
// Reading
// ============================================================================

pub struct ReadLessonUseCase<R>
where
    R: CourseRepository + LessonRepository + EnrollmentRepository,
{
    repo: Arc<R>,
}

impl<R> ReadLessonUseCase<R>
where
    R: CourseRepository + LessonRepository + EnrollmentRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(
        &self,
        caller: &CurrentUser,
        lesson_id: LessonId,
    ) -> LearningResult<Lesson> {
        let lesson = self
            .repo
            .find_lesson(&lesson_id)
            .await?
            .ok_or(LearningError::LessonNotFound)?;
        let course = load_course(&*self.repo, &lesson.course_id).await?;
        let enrollment = self
            .repo
            .find_enrollment(&caller.user_id, &course.course_id)
            .await?;

        if !can_read_content(&course, lesson.is_preview, caller, enrollment.as_ref()) {
            return Err(LearningError::LessonLocked);
        }

        Ok(lesson)
    }
}
