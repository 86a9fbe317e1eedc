//! Lesson Progress and Course Progress

use chrono::{DateTime, Utc};
use kernel::id::{CourseId, LessonId, UserId};

/// A lesson marked complete by a student
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonProgress {
    pub user_id: UserId,
    pub lesson_id: LessonId,
    pub course_id: CourseId,
    pub completed_at: DateTime<Utc>,
}

impl LessonProgress {
    pub fn new(
        user_id: UserId,
        lesson_id: LessonId,
        course_id: CourseId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            lesson_id,
            course_id,
            completed_at: now,
        }
    }
}

/// Derived progress of one student through one course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CourseProgress {
    pub lessons_completed: i64,
    pub lessons_total: i64,
    pub quizzes_passed: i64,
    pub quizzes_total: i64,
}

impl CourseProgress {
    pub fn new(
        lessons_completed: i64,
        lessons_total: i64,
        quizzes_passed: i64,
        quizzes_total: i64,
    ) -> Self {
        Self {
            lessons_completed: lessons_completed.min(lessons_total),
            lessons_total,
            quizzes_passed: quizzes_passed.min(quizzes_total),
            quizzes_total,
        }
    }

    /// Completed lessons over total, rounded down
    pub fn lesson_percentage(&self) -> i64 {
        if self.lessons_total == 0 {
            return 0;
        }
        self.lessons_completed * 100 / self.lessons_total
    }

    /// A course without lessons is never complete
    pub fn is_complete(&self) -> bool {
        self.lessons_total > 0
            && self.lessons_completed >= self.lessons_total
            && self.quizzes_passed >= self.quizzes_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_rounds_down() {
        assert_eq!(CourseProgress::new(1, 3, 0, 0).lesson_percentage(), 33);
        assert_eq!(CourseProgress::new(2, 3, 0, 0).lesson_percentage(), 66);
        assert_eq!(CourseProgress::new(3, 3, 0, 0).lesson_percentage(), 100);
        assert_eq!(CourseProgress::new(0, 0, 0, 0).lesson_percentage(), 0);
    }

    #[test]
    fn test_completion_needs_lessons_and_quizzes() {
        assert!(CourseProgress::new(3, 3, 2, 2).is_complete());
        assert!(!CourseProgress::new(3, 3, 1, 2).is_complete());
        assert!(!CourseProgress::new(2, 3, 2, 2).is_complete());
        assert!(!CourseProgress::new(0, 0, 0, 0).is_complete());
        assert!(CourseProgress::new(1, 1, 0, 0).is_complete());
    }
}
