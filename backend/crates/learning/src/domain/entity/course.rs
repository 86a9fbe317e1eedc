//! Course Entity
//!
//! Owned by one instructor. Status changes go through the review workflow
//! in [`CourseStatus`]; the thumbnail is an object-store key.

use chrono::{DateTime, Utc};
use kernel::auth::CurrentUser;
use kernel::id::{CourseId, UserId};

use crate::domain::value_object::{course_level::CourseLevel, course_status::CourseStatus};
use crate::error::{LearningError, LearningResult};

pub const TITLE_MIN_LENGTH: usize = 3;
pub const TITLE_MAX_LENGTH: usize = 200;
pub const SUMMARY_MAX_LENGTH: usize = 500;
pub const CATEGORY_MAX_LENGTH: usize = 60;
pub const REJECTION_REASON_MAX_LENGTH: usize = 1000;

/// Editable fields of a course
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseDetails {
    pub title: String,
    pub summary: String,
    pub description: String,
    pub category: String,
    pub level: CourseLevel,
    pub price_cents: i64,
}

impl CourseDetails {
    /// Trim text fields and check limits
    pub fn normalized(self) -> LearningResult<Self> {
        let title = self.title.trim().to_string();
        let title_len = title.chars().count();
        if !(TITLE_MIN_LENGTH..=TITLE_MAX_LENGTH).contains(&title_len) {
            return Err(LearningError::Validation(format!(
                "Title must be {}..={} characters",
                TITLE_MIN_LENGTH, TITLE_MAX_LENGTH
            )));
        }

        let summary = self.summary.trim().to_string();
        if summary.chars().count() > SUMMARY_MAX_LENGTH {
            return Err(LearningError::Validation(format!(
                "Summary must be at most {} characters",
                SUMMARY_MAX_LENGTH
            )));
        }

        let category = self.category.trim().to_lowercase();
        if category.is_empty() || category.chars().count() > CATEGORY_MAX_LENGTH {
            return Err(LearningError::Validation(format!(
                "Category must be 1..={} characters",
                CATEGORY_MAX_LENGTH
            )));
        }

        if self.price_cents < 0 {
            return Err(LearningError::Validation(
                "Price cannot be negative".to_string(),
            ));
        }

        Ok(Self {
            title,
            summary,
            description: self.description.trim().to_string(),
            category,
            level: self.level,
            price_cents: self.price_cents,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub course_id: CourseId,
    pub instructor_id: UserId,
    pub title: String,
    pub summary: String,
    pub description: String,
    pub category: String,
    pub level: CourseLevel,
    /// Zero means free
    pub price_cents: i64,
    pub thumbnail_key: Option<String>,
    pub status: CourseStatus,
    pub rejection_reason: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// New courses start as drafts
    pub fn new(
        instructor_id: UserId,
        details: CourseDetails,
        now: DateTime<Utc>,
    ) -> LearningResult<Self> {
        let details = details.normalized()?;
        Ok(Self {
            course_id: CourseId::new(),
            instructor_id,
            title: details.title,
            summary: details.summary,
            description: details.description,
            category: details.category,
            level: details.level,
            price_cents: details.price_cents,
            thumbnail_key: None,
            status: CourseStatus::Draft,
            rejection_reason: None,
            published_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.price_cents == 0
    }

    #[inline]
    pub fn is_published(&self) -> bool {
        self.status == CourseStatus::Published
    }

    #[inline]
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.instructor_id == user_id
    }

    /// Owner or admin
    pub fn can_manage(&self, caller: &CurrentUser) -> bool {
        caller.owns_or_admin(&self.instructor_id)
    }

    pub fn ensure_manageable_by(&self, caller: &CurrentUser) -> LearningResult<()> {
        if self.can_manage(caller) {
            Ok(())
        } else {
            Err(LearningError::NotCourseOwner)
        }
    }

    pub fn update_details(
        &mut self,
        details: CourseDetails,
        now: DateTime<Utc>,
    ) -> LearningResult<()> {
        if !self.status.is_editable() {
            return Err(LearningError::CourseUnderReview);
        }
        let details = details.normalized()?;
        self.title = details.title;
        self.summary = details.summary;
        self.description = details.description;
        self.category = details.category;
        self.level = details.level;
        self.price_cents = details.price_cents;
        self.updated_at = now;
        Ok(())
    }

    /// Lessons and quizzes follow the same freeze as the course itself
    pub fn ensure_content_editable(&self) -> LearningResult<()> {
        if self.status.is_editable() {
            Ok(())
        } else {
            Err(LearningError::CourseUnderReview)
        }
    }

    fn transition(&mut self, next: CourseStatus, now: DateTime<Utc>) -> LearningResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(LearningError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    pub fn submit_for_review(
        &mut self,
        lesson_count: usize,
        now: DateTime<Utc>,
    ) -> LearningResult<()> {
        if !self.status.can_transition_to(CourseStatus::PendingReview) {
            return Err(LearningError::InvalidTransition {
                from: self.status,
                to: CourseStatus::PendingReview,
            });
        }
        if lesson_count == 0 {
            return Err(LearningError::NoLessons);
        }
        self.transition(CourseStatus::PendingReview, now)?;
        self.rejection_reason = None;
        Ok(())
    }

    pub fn approve(&mut self, now: DateTime<Utc>) -> LearningResult<()> {
        self.transition(CourseStatus::Published, now)?;
        self.published_at = Some(now);
        Ok(())
    }

    pub fn reject(&mut self, reason: &str, now: DateTime<Utc>) -> LearningResult<()> {
        let reason = reason.trim();
        if reason.is_empty() || reason.chars().count() > REJECTION_REASON_MAX_LENGTH {
            return Err(LearningError::Validation(format!(
                "Rejection reason must be 1..={} characters",
                REJECTION_REASON_MAX_LENGTH
            )));
        }
        self.transition(CourseStatus::Rejected, now)?;
        self.rejection_reason = Some(reason.to_string());
        Ok(())
    }

    pub fn archive(&mut self, now: DateTime<Utc>) -> LearningResult<()> {
        self.transition(CourseStatus::Archived, now)
    }

    /// Returns the replaced key, which the caller deletes from storage
    pub fn replace_thumbnail(&mut self, key: String, now: DateTime<Utc>) -> Option<String> {
        self.updated_at = now;
        self.thumbnail_key.replace(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::role::Role;

    fn details() -> CourseDetails {
        CourseDetails {
            title: "  Rust for Beginners ".to_string(),
            summary: "Ownership without tears".to_string(),
            description: String::new(),
            category: " Programming ".to_string(),
            level: CourseLevel::Beginner,
            price_cents: 0,
        }
    }

    #[test]
    fn test_new_course_is_normalized_draft() {
        let course = Course::new(UserId::new(), details(), Utc::now()).unwrap();
        assert_eq!(course.status, CourseStatus::Draft);
        assert_eq!(course.title, "Rust for Beginners");
        assert_eq!(course.category, "programming");
        assert!(course.is_free());
        assert!(course.published_at.is_none());
    }

    #[test]
    fn test_details_validation() {
        let short = CourseDetails {
            title: "Rs".to_string(),
            ..details()
        };
        assert!(matches!(short.normalized(), Err(LearningError::Validation(_))));

        let negative = CourseDetails {
            price_cents: -1,
            ..details()
        };
        assert!(negative.normalized().is_err());

        let no_category = CourseDetails {
            category: "   ".to_string(),
            ..details()
        };
        assert!(no_category.normalized().is_err());
    }

    #[test]
    fn test_review_workflow() {
        let now = Utc::now();
        let mut course = Course::new(UserId::new(), details(), now).unwrap();

        assert!(matches!(
            course.submit_for_review(0, now),
            Err(LearningError::NoLessons)
        ));
        course.submit_for_review(1, now).unwrap();
        assert_eq!(course.status, CourseStatus::PendingReview);

        assert!(matches!(
            course.update_details(details(), now),
            Err(LearningError::CourseUnderReview)
        ));

        course.reject("Needs more lessons", now).unwrap();
        assert_eq!(course.status, CourseStatus::Rejected);
        assert_eq!(course.rejection_reason.as_deref(), Some("Needs more lessons"));

        course.submit_for_review(2, now).unwrap();
        assert!(course.rejection_reason.is_none());
        course.approve(now).unwrap();
        assert!(course.is_published());
        assert_eq!(course.published_at, Some(now));

        course.archive(now).unwrap();
        assert!(matches!(
            course.approve(now),
            Err(LearningError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_archive_requires_published() {
        let now = Utc::now();
        let mut course = Course::new(UserId::new(), details(), now).unwrap();
        assert!(matches!(
            course.archive(now),
            Err(LearningError::InvalidTransition {
                from: CourseStatus::Draft,
                to: CourseStatus::Archived
            })
        ));
    }

    #[test]
    fn test_reject_requires_reason() {
        let now = Utc::now();
        let mut course = Course::new(UserId::new(), details(), now).unwrap();
        course.submit_for_review(1, now).unwrap();
        assert!(matches!(
            course.reject("   ", now),
            Err(LearningError::Validation(_))
        ));
        assert_eq!(course.status, CourseStatus::PendingReview);
    }

    #[test]
    fn test_manage_permissions() {
        let owner = CurrentUser::new(UserId::new(), Role::Instructor);
        let other = CurrentUser::new(UserId::new(), Role::Instructor);
        let admin = CurrentUser::new(UserId::new(), Role::Admin);
        let course = Course::new(owner.user_id, details(), Utc::now()).unwrap();

        assert!(course.ensure_manageable_by(&owner).is_ok());
        assert!(course.ensure_manageable_by(&admin).is_ok());
        assert!(matches!(
            course.ensure_manageable_by(&other),
            Err(LearningError::NotCourseOwner)
        ));
    }
}
