//! Platform Statistics
//!
//! Counters gathered by the repository plus the revenue math, which reuses
//! the per-course floored fee instructors see in their earnings.

use billing::domain::earnings::platform_fee;
use billing::domain::value_object::currency::Currency;
use chrono::{DateTime, Utc};
use kernel::id::{CourseId, UserId};
use kernel::role::Role;
use learning::domain::value_object::course_status::CourseStatus;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserCounts {
    pub students: i64,
    pub instructors: i64,
    pub admins: i64,
    pub suspended: i64,
}

impl UserCounts {
    pub fn total(&self) -> i64 {
        self.students + self.instructors + self.admins
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CourseCounts {
    pub draft: i64,
    pub pending_review: i64,
    pub published: i64,
    pub rejected: i64,
    pub archived: i64,
}

impl CourseCounts {
    pub fn total(&self) -> i64 {
        self.draft + self.pending_review + self.published + self.rejected + self.archived
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LearningTotals {
    pub enrollments: i64,
    pub completions: i64,
    pub certificates: i64,
}

/// Raw payment sums; the fee is applied in [`Revenue::compute`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentTotals {
    /// Succeeded gross per course
    pub course_gross_cents: Vec<i64>,
    pub succeeded_count: i64,
    pub refunded_cents: i64,
    pub refunded_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revenue {
    pub currency: Currency,
    pub gross_cents: i64,
    pub platform_fee_cents: i64,
    pub refunded_cents: i64,
    pub succeeded_count: i64,
    pub refunded_count: i64,
}

impl Revenue {
    pub fn compute(currency: Currency, totals: &PaymentTotals, fee_bps: i64) -> Self {
        Self {
            currency,
            gross_cents: totals.course_gross_cents.iter().sum(),
            platform_fee_cents: totals
                .course_gross_cents
                .iter()
                .map(|gross| platform_fee(*gross, fee_bps))
                .sum(),
            refunded_cents: totals.refunded_cents,
            succeeded_count: totals.succeeded_count,
            refunded_count: totals.refunded_count,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PayoutTotals {
    pub requested_count: i64,
    pub requested_cents: i64,
    pub paid_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentUser {
    pub user_id: UserId,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub is_suspended: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentCourse {
    pub course_id: CourseId,
    pub title: String,
    pub instructor_name: String,
    pub status: CourseStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformStats {
    pub users: UserCounts,
    pub courses: CourseCounts,
    pub learning: LearningTotals,
    pub revenue: Revenue,
    pub payouts: PayoutTotals,
    pub recent_users: Vec<RecentUser>,
    pub recent_courses: Vec<RecentCourse>,
    pub generated_at: DateTime<Utc>,
}
