//! Enrollment Entity
//!
//! At most one per (user, course). `completed_at` is set once, when all
//! lessons are done and all quizzes are passed.

use chrono::{DateTime, Utc};
use kernel::id::{CourseId, EnrollmentId, UserId};

use crate::domain::value_object::enrollment_source::EnrollmentSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    pub enrollment_id: EnrollmentId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub source: EnrollmentSource,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Enrollment {
    pub fn new(
        user_id: UserId,
        course_id: CourseId,
        source: EnrollmentSource,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            enrollment_id: EnrollmentId::new(),
            user_id,
            course_id,
            source,
            enrolled_at: now,
            completed_at: None,
        }
    }

    #[inline]
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Returns false when already completed
    pub fn mark_completed(&mut self, now: DateTime<Utc>) -> bool {
        if self.completed_at.is_some() {
            return false;
        }
        self.completed_at = Some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_completion_is_set_once() {
        let now = Utc::now();
        let mut enrollment =
            Enrollment::new(UserId::new(), CourseId::new(), EnrollmentSource::Free, now);
        assert!(!enrollment.is_completed());

        assert!(enrollment.mark_completed(now));
        assert!(!enrollment.mark_completed(now + Duration::days(1)));
        assert_eq!(enrollment.completed_at, Some(now));
    }
}
