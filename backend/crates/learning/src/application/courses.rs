//! Instructor Course Use Cases
//!
//! Authoring of the course record itself: create, edit, delete, the
//! review submission, archiving and the thumbnail image.

use kernel::auth::CurrentUser;
use kernel::clock::Clock;
use kernel::id::CourseId;
use platform::storage::{ImageUpload, ObjectStore};
use std::sync::Arc;

use crate::application::access::load_managed_course;
use crate::application::config::LearningConfig;
use crate::domain::entity::course::{Course, CourseDetails};
use crate::domain::repository::{CourseRepository, CourseSummary, LessonRepository};
use crate::error::{LearningError, LearningResult};

pub const THUMBNAIL_PREFIX: &str = "thumbnails";

pub struct CourseAuthoringUseCase<R, S>
where
    R: CourseRepository + LessonRepository,
    S: ObjectStore,
{
    repo: Arc<R>,
    storage: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<R, S> CourseAuthoringUseCase<R, S>
where
    R: CourseRepository + LessonRepository,
    S: ObjectStore,
{
    pub fn new(repo: Arc<R>, storage: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            storage,
            clock,
        }
    }

    pub async fn create(
        &self,
        caller: &CurrentUser,
        details: CourseDetails,
    ) -> LearningResult<Course> {
        caller.require_instructor()?;

        let course = Course::new(caller.user_id, details, self.clock.now())?;
        self.repo.create_course(&course).await?;

        tracing::info!(
            course_id = %course.course_id,
            instructor_id = %caller.user_id,
            "Course created"
        );

        Ok(course)
    }

    pub async fn list_own(&self, caller: &CurrentUser) -> LearningResult<Vec<CourseSummary>> {
        caller.require_instructor()?;
        self.repo.list_by_instructor(&caller.user_id).await
    }

    pub async fn update(
        &self,
        caller: &CurrentUser,
        course_id: CourseId,
        details: CourseDetails,
    ) -> LearningResult<Course> {
        let mut course = load_managed_course(&*self.repo, &course_id, caller).await?;
        course.update_details(details, self.clock.now())?;
        self.repo.update_course(&course).await?;

        tracing::info!(course_id = %course_id, user_id = %caller.user_id, "Course updated");

        Ok(course)
    }

    pub async fn delete(&self, caller: &CurrentUser, course_id: CourseId) -> LearningResult<()> {
        let summary = self
            .repo
            .course_summary(&course_id)
            .await?
            .ok_or(LearningError::CourseNotFound)?;
        summary.course.ensure_manageable_by(caller)?;

        if summary.enrollment_count > 0 {
            return Err(LearningError::CourseInUse);
        }

        self.repo.delete_course(&course_id).await?;

        if let Some(key) = &summary.course.thumbnail_key
            && let Err(e) = self.storage.delete(key).await
        {
            tracing::warn!(key = %key, error = %e, "Failed to delete course thumbnail");
        }

        tracing::info!(course_id = %course_id, user_id = %caller.user_id, "Course deleted");

        Ok(())
    }

    pub async fn submit_for_review(
        &self,
        caller: &CurrentUser,
        course_id: CourseId,
    ) -> LearningResult<Course> {
        let mut course = load_managed_course(&*self.repo, &course_id, caller).await?;
        let lessons = self.repo.list_lessons(&course_id).await?;

        course.submit_for_review(lessons.len(), self.clock.now())?;
        self.repo.update_course(&course).await?;

        tracing::info!(
            course_id = %course_id,
            lessons = lessons.len(),
            "Course submitted for review"
        );

        Ok(course)
    }

    pub async fn archive(
        &self,
        caller: &CurrentUser,
        course_id: CourseId,
    ) -> LearningResult<Course> {
        let mut course = load_managed_course(&*self.repo, &course_id, caller).await?;
        course.archive(self.clock.now())?;
        self.repo.update_course(&course).await?;

        tracing::info!(course_id = %course_id, user_id = %caller.user_id, "Course archived");

        Ok(course)
    }
}

// ============================================================================
// Thumbnail
// ============================================================================

pub struct UploadThumbnailUseCase<R, S>
where
    R: CourseRepository,
    S: ObjectStore,
{
    repo: Arc<R>,
    storage: Arc<S>,
    config: Arc<LearningConfig>,
    clock: Arc<dyn Clock>,
}

impl<R, S> UploadThumbnailUseCase<R, S>
where
    R: CourseRepository,
    S: ObjectStore,
{
    pub fn new(
        repo: Arc<R>,
        storage: Arc<S>,
        config: Arc<LearningConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            storage,
            config,
            clock,
        }
    }

    /// Returns the updated course
    pub async fn execute(
        &self,
        caller: &CurrentUser,
        course_id: CourseId,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> LearningResult<Course> {
        let mut course = load_managed_course(&*self.repo, &course_id, caller).await?;

        let upload = ImageUpload::new(content_type, bytes, self.config.max_thumbnail_bytes)?;
        let key = upload.new_key(THUMBNAIL_PREFIX);
        self.storage.put(&key, upload.into_bytes()).await?;

        let previous = course.replace_thumbnail(key.clone(), self.clock.now());
        if let Err(e) = self.repo.update_course(&course).await {
            if let Err(cleanup) = self.storage.delete(&key).await {
                tracing::warn!(key = %key, error = %cleanup, "Failed to remove orphaned thumbnail");
            }
            return Err(e);
        }

        if let Some(previous) = previous
            && let Err(e) = self.storage.delete(&previous).await
        {
            tracing::warn!(key = %previous, error = %e, "Failed to delete previous thumbnail");
        }

        tracing::info!(course_id = %course_id, key = %key, "Course thumbnail uploaded");

        Ok(course)
    }
}
