//! Enrollment Use Cases
//!
//! Self-enrollment covers free courses only; paid courses are enrolled by
//! a successful checkout in the billing context.

use kernel::auth::CurrentUser;
use kernel::clock::Clock;
use kernel::id::CourseId;
use std::sync::Arc;

use crate::domain::entity::enrollment::Enrollment;
use crate::domain::repository::{CourseRepository, EnrolledCourse, EnrollmentRepository};
use crate::domain::value_object::enrollment_source::EnrollmentSource;
use crate::error::{LearningError, LearningResult};

pub struct EnrollUseCase<R>
where
    R: CourseRepository + EnrollmentRepository,
{
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> EnrollUseCase<R>
where
    R: CourseRepository + EnrollmentRepository,
{
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    pub async fn execute(
        &self,
        caller: &CurrentUser,
        course_id: CourseId,
    ) -> LearningResult<Enrollment> {
        let course = self
            .repo
            .find_course(&course_id)
            .await?
            .filter(|c| c.is_published())
            .ok_or(LearningError::CourseNotFound)?;

        if course.is_owned_by(&caller.user_id) {
            return Err(LearningError::OwnCourse);
        }

        if self
            .repo
            .find_enrollment(&caller.user_id, &course_id)
            .await?
            .is_some()
        {
            return Err(LearningError::AlreadyEnrolled);
        }

        if !course.is_free() {
            return Err(LearningError::PaymentRequired);
        }

        let enrollment = Enrollment::new(
            caller.user_id,
            course_id,
            EnrollmentSource::Free,
            self.clock.now(),
        );
        // The unique index still catches a concurrent duplicate
        self.repo.create_enrollment(&enrollment).await?;

        tracing::info!(
            user_id = %caller.user_id,
            course_id = %course_id,
            enrollment_id = %enrollment.enrollment_id,
            "Enrolled in free course"
        );

        Ok(enrollment)
    }
}

pub struct ListEnrollmentsUseCase<R>
where
    R: EnrollmentRepository,
{
    repo: Arc<R>,
}

impl<R> ListEnrollmentsUseCase<R>
where
    R: EnrollmentRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, caller: &CurrentUser) -> LearningResult<Vec<EnrolledCourse>> {
        self.repo.list_enrollments(&caller.user_id).await
    }
}
