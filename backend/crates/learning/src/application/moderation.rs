//! Course Moderation Use Cases (admin)

use kernel::auth::CurrentUser;
use kernel::clock::Clock;
use kernel::id::CourseId;
use kernel::page::{Page, PageRequest};
use std::sync::Arc;

use crate::application::access::load_course;
use crate::domain::entity::course::Course;
use crate::domain::repository::{CourseRepository, CourseSummary};
use crate::domain::value_object::course_status::CourseStatus;
use crate::error::LearningResult;

pub struct ModerationUseCase<R>
where
    R: CourseRepository,
{
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> ModerationUseCase<R>
where
    R: CourseRepository,
{
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Defaults to the review queue
    pub async fn list(
        &self,
        caller: &CurrentUser,
        status: Option<CourseStatus>,
        page: PageRequest,
    ) -> LearningResult<Page<CourseSummary>> {
        caller.require_admin()?;
        self.repo
            .list_by_status(status.unwrap_or(CourseStatus::PendingReview), page.normalized())
            .await
    }

    pub async fn approve(
        &self,
        caller: &CurrentUser,
        course_id: CourseId,
    ) -> LearningResult<Course> {
        caller.require_admin()?;
        let mut course = load_course(&*self.repo, &course_id).await?;
        course.approve(self.clock.now())?;
        self.repo.update_course(&course).await?;

        tracing::info!(course_id = %course_id, admin_id = %caller.user_id, "Course approved");

        Ok(course)
    }

    pub async fn reject(
        &self,
        caller: &CurrentUser,
        course_id: CourseId,
        reason: &str,
    ) -> LearningResult<Course> {
        caller.require_admin()?;
        let mut course = load_course(&*self.repo, &course_id).await?;
        course.reject(reason, self.clock.now())?;
        self.repo.update_course(&course).await?;

        tracing::info!(course_id = %course_id, admin_id = %caller.user_id, "Course rejected");

        Ok(course)
    }
}
