//! Course Roster Use Case

use kernel::auth::CurrentUser;
use kernel::id::CourseId;
use std::sync::Arc;

use crate::application::access::load_managed_course;
use crate::domain::entity::progress::CourseProgress;
use crate::domain::repository::{
    CourseRepository, EnrollmentRepository, LessonRepository, RosterEntry,
};
use crate::error::LearningResult;

#[derive(Debug, Clone)]
pub struct RosterStudent {
    pub entry: RosterEntry,
    pub progress: CourseProgress,
}

#[derive(Debug, Clone)]
pub struct CourseRoster {
    pub course_id: CourseId,
    pub lessons_total: i64,
    pub students: Vec<RosterStudent>,
}

pub struct CourseRosterUseCase<R>
where
    R: CourseRepository + EnrollmentRepository + LessonRepository,
{
    repo: Arc<R>,
}

impl<R> CourseRosterUseCase<R>
where
    R: CourseRepository + EnrollmentRepository + LessonRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Owner or admin only; quiz figures are left out of the roster
    pub async fn execute(
        &self,
        caller: &CurrentUser,
        course_id: CourseId,
    ) -> LearningResult<CourseRoster> {
        load_managed_course(&*self.repo, &course_id, caller).await?;

        let lessons_total = self.repo.list_lessons(&course_id).await?.len() as i64;
        let students = self
            .repo
            .roster(&course_id)
            .await?
            .into_iter()
            .map(|entry| RosterStudent {
                progress: CourseProgress::new(entry.lessons_completed, lessons_total, 0, 0),
                entry,
            })
            .collect();

        Ok(CourseRoster {
            course_id,
            lessons_total,
            students,
        })
    }
}
