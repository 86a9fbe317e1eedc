//! API DTOs (Data Transfer Objects)

use billing::domain::value_object::currency::Currency;
use chrono::{DateTime, Utc};
use kernel::id::{CourseId, UserId};
use kernel::role::Role;
use learning::domain::value_object::course_status::CourseStatus;
use serde::Serialize;

use crate::domain::stats::{
    CourseCounts, LearningTotals, PayoutTotals, PlatformStats, RecentCourse, RecentUser, Revenue,
    UserCounts,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCountsResponse {
    pub total: i64,
    pub students: i64,
    pub instructors: i64,
    pub admins: i64,
    pub suspended: i64,
}

impl From<&UserCounts> for UserCountsResponse {
    fn from(c: &UserCounts) -> Self {
        Self {
            total: c.total(),
            students: c.students,
            instructors: c.instructors,
            admins: c.admins,
            suspended: c.suspended,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseCountsResponse {
    pub total: i64,
    pub draft: i64,
    pub pending_review: i64,
    pub published: i64,
    pub rejected: i64,
    pub archived: i64,
}

impl From<&CourseCounts> for CourseCountsResponse {
    fn from(c: &CourseCounts) -> Self {
        Self {
            total: c.total(),
            draft: c.draft,
            pending_review: c.pending_review,
            published: c.published,
            rejected: c.rejected,
            archived: c.archived,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningTotalsResponse {
    pub enrollments: i64,
    pub completions: i64,
    pub certificates: i64,
}

impl From<&LearningTotals> for LearningTotalsResponse {
    fn from(t: &LearningTotals) -> Self {
        Self {
            enrollments: t.enrollments,
            completions: t.completions,
            certificates: t.certificates,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueResponse {
    pub currency: Currency,
    pub gross_cents: i64,
    pub platform_fee_cents: i64,
    pub refunded_cents: i64,
    pub succeeded_payments: i64,
    pub refunded_payments: i64,
}

impl From<&Revenue> for RevenueResponse {
    fn from(r: &Revenue) -> Self {
        Self {
            currency: r.currency,
            gross_cents: r.gross_cents,
            platform_fee_cents: r.platform_fee_cents,
            refunded_cents: r.refunded_cents,
            succeeded_payments: r.succeeded_count,
            refunded_payments: r.refunded_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutTotalsResponse {
    pub requested_count: i64,
    pub requested_cents: i64,
    pub paid_cents: i64,
}

impl From<&PayoutTotals> for PayoutTotalsResponse {
    fn from(p: &PayoutTotals) -> Self {
        Self {
            requested_count: p.requested_count,
            requested_cents: p.requested_cents,
            paid_cents: p.paid_cents,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentUserResponse {
    pub user_id: UserId,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub is_suspended: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&RecentUser> for RecentUserResponse {
    fn from(u: &RecentUser) -> Self {
        Self {
            user_id: u.user_id,
            full_name: u.full_name.clone(),
            email: u.email.clone(),
            role: u.role,
            is_suspended: u.is_suspended,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentCourseResponse {
    pub course_id: CourseId,
    pub title: String,
    pub instructor_name: String,
    pub status: CourseStatus,
    pub created_at: DateTime<Utc>,
}

impl From<&RecentCourse> for RecentCourseResponse {
    fn from(c: &RecentCourse) -> Self {
        Self {
            course_id: c.course_id,
            title: c.title.clone(),
            instructor_name: c.instructor_name.clone(),
            status: c.status,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformDashboardResponse {
    pub users: UserCountsResponse,
    pub courses: CourseCountsResponse,
    pub learning: LearningTotalsResponse,
    pub revenue: RevenueResponse,
    pub payouts: PayoutTotalsResponse,
    pub recent_users: Vec<RecentUserResponse>,
    pub recent_courses: Vec<RecentCourseResponse>,
    pub generated_at: DateTime<Utc>,
}

impl From<&PlatformStats> for PlatformDashboardResponse {
    fn from(s: &PlatformStats) -> Self {
        Self {
            users: UserCountsResponse::from(&s.users),
            courses: CourseCountsResponse::from(&s.courses),
            learning: LearningTotalsResponse::from(&s.learning),
            revenue: RevenueResponse::from(&s.revenue),
            payouts: PayoutTotalsResponse::from(&s.payouts),
            recent_users: s.recent_users.iter().map(RecentUserResponse::from).collect(),
            recent_courses: s.recent_courses.iter().map(RecentCourseResponse::from).collect(),
            generated_at: s.generated_at,
        }
    }
}
