//! Shared lookups and access checks used by several use cases

use kernel::auth::CurrentUser;
use kernel::id::{CourseId, UserId};

use crate::domain::entity::{course::Course, enrollment::Enrollment};
use crate::domain::repository::{CourseRepository, EnrollmentRepository};
use crate::domain::value_object::course_status::CourseStatus;
use crate::error::{LearningError, LearningResult};

pub(crate) async fn load_course<R: CourseRepository>(
    repo: &R,
    course_id: &CourseId,
) -> LearningResult<Course> {
    repo.find_course(course_id)
        .await?
        .ok_or(LearningError::CourseNotFound)
}

/// Course the caller owns (or any course for an admin)
pub(crate) async fn load_managed_course<R: CourseRepository>(
    repo: &R,
    course_id: &CourseId,
    caller: &CurrentUser,
) -> LearningResult<Course> {
    let course = load_course(repo, course_id).await?;
    course.ensure_manageable_by(caller)?;
    Ok(course)
}

pub(crate) async fn require_enrollment<R: EnrollmentRepository>(
    repo: &R,
    user_id: &UserId,
    course_id: &CourseId,
) -> LearningResult<Enrollment> {
    repo.find_enrollment(user_id, course_id)
        .await?
        .ok_or(LearningError::NotEnrolled)
}

/// Published courses are public. Archived courses stay visible to their
/// students; everything else only to the owner and admins.
pub(crate) fn is_visible(
    course: &Course,
    caller: Option<&CurrentUser>,
    enrollment: Option<&Enrollment>,
) -> bool {
    match course.status {
        CourseStatus::Published => true,
        CourseStatus::Archived if enrollment.is_some() => true,
        _ => caller.is_some_and(|c| course.can_manage(c)),
    }
}

/// Content of non-preview lessons needs an enrollment
pub(crate) fn can_read_content(
    course: &Course,
    is_preview: bool,
    caller: &CurrentUser,
    enrollment: Option<&Enrollment>,
) -> bool {
    course.can_manage(caller)
        || (enrollment.is_some()
            && matches!(course.status, CourseStatus::Published | CourseStatus::Archived))
        || (is_preview && course.is_published())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::course::CourseDetails;
    use crate::domain::value_object::{
        course_level::CourseLevel, enrollment_source::EnrollmentSource,
    };
    use chrono::Utc;
    use kernel::role::Role;

    fn course(owner: UserId, status: CourseStatus) -> Course {
        let mut course = Course::new(
            owner,
            CourseDetails {
                title: "Async Rust".to_string(),
                summary: String::new(),
                description: String::new(),
                category: "programming".to_string(),
                level: CourseLevel::Advanced,
                price_cents: 0,
            },
            Utc::now(),
        )
        .unwrap();
        course.status = status;
        course
    }

    #[test]
    fn test_visibility() {
        let owner = CurrentUser::new(UserId::new(), Role::Instructor);
        let student = CurrentUser::new(UserId::new(), Role::Student);
        let admin = CurrentUser::new(UserId::new(), Role::Admin);

        let draft = course(owner.user_id, CourseStatus::Draft);
        assert!(!is_visible(&draft, None, None));
        assert!(!is_visible(&draft, Some(&student), None));
        assert!(is_visible(&draft, Some(&owner), None));
        assert!(is_visible(&draft, Some(&admin), None));

        let published = course(owner.user_id, CourseStatus::Published);
        assert!(is_visible(&published, None, None));

        let archived = course(owner.user_id, CourseStatus::Archived);
        let enrollment = Enrollment::new(
            student.user_id,
            archived.course_id,
            EnrollmentSource::Free,
            Utc::now(),
        );
        assert!(!is_visible(&archived, Some(&student), None));
        assert!(is_visible(&archived, Some(&student), Some(&enrollment)));
    }

    #[test]
    fn test_content_access() {
        let owner = CurrentUser::new(UserId::new(), Role::Instructor);
        let student = CurrentUser::new(UserId::new(), Role::Student);
        let published = course(owner.user_id, CourseStatus::Published);
        let enrollment = Enrollment::new(
            student.user_id,
            published.course_id,
            EnrollmentSource::Free,
            Utc::now(),
        );

        assert!(can_read_content(&published, false, &owner, None));
        assert!(can_read_content(&published, true, &student, None));
        assert!(!can_read_content(&published, false, &student, None));
        assert!(can_read_content(&published, false, &student, Some(&enrollment)));

        let draft = course(owner.user_id, CourseStatus::Draft);
        assert!(!can_read_content(&draft, true, &student, None));
    }
}
