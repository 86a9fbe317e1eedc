//! Course Catalog Use Cases
//!
//! Public listing of published courses and the course detail page.

use kernel::auth::CurrentUser;
use kernel::id::CourseId;
use kernel::page::{Page, PageRequest};
use std::sync::Arc;

use crate::application::access::is_visible;
use crate::domain::entity::{enrollment::Enrollment, lesson::Lesson, quiz::Quiz};
use crate::domain::repository::{
    CatalogFilter, CourseRepository, CourseSummary, EnrollmentRepository, LessonRepository,
    QuizRepository,
};
use crate::error::{LearningError, LearningResult};

// ============================================================================
// List
// ============================================================================

pub struct ListCatalogUseCase<R>
where
    R: CourseRepository,
{
    repo: Arc<R>,
}

impl<R> ListCatalogUseCase<R>
where
    R: CourseRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(
        &self,
        filter: CatalogFilter,
        page: PageRequest,
    ) -> LearningResult<Page<CourseSummary>> {
        let filter = CatalogFilter {
            search: normalize(filter.search),
            category: normalize(filter.category),
            level: filter.level,
        };
        self.repo.list_published(&filter, page.normalized()).await
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

// ============================================================================
// Detail
// ============================================================================

/// Course page: summary plus outline, never lesson content
#[derive(Debug, Clone)]
pub struct CourseOutline {
    pub summary: CourseSummary,
    pub lessons: Vec<Lesson>,
    pub quizzes: Vec<Quiz>,
    pub enrollment: Option<Enrollment>,
    pub can_manage: bool,
}

pub struct CourseDetailUseCase<R>
where
    R: CourseRepository + EnrollmentRepository + LessonRepository + QuizRepository,
{
    repo: Arc<R>,
}

impl<R> CourseDetailUseCase<R>
where
    R: CourseRepository + EnrollmentRepository + LessonRepository + QuizRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(
        &self,
        course_id: CourseId,
        caller: Option<CurrentUser>,
    ) -> LearningResult<CourseOutline> {
        let summary = self
            .repo
            .course_summary(&course_id)
            .await?
            .ok_or(LearningError::CourseNotFound)?;

        let enrollment = match &caller {
            Some(c) => self.repo.find_enrollment(&c.user_id, &course_id).await?,
            None => None,
        };

        // Hidden courses are indistinguishable from missing ones
        if !is_visible(&summary.course, caller.as_ref(), enrollment.as_ref()) {
            return Err(LearningError::CourseNotFound);
        }

        let lessons = self.repo.list_lessons(&course_id).await?;
        let quizzes = self.repo.list_quizzes(&course_id).await?;
        let can_manage = caller.is_some_and(|c| summary.course.can_manage(&c));

        Ok(CourseOutline {
            summary,
            lessons,
            quizzes,
            enrollment,
            can_manage,
        })
    }
}
