//! PostgreSQL Statistics Queries

use chrono::{DateTime, Utc};
use kernel::id::{CourseId, UserId};
use kernel::role::Role;
use learning::domain::value_object::course_status::CourseStatus;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::repository::StatsRepository;
use crate::domain::stats::{
    CourseCounts, LearningTotals, PaymentTotals, PayoutTotals, RecentCourse, RecentUser,
    UserCounts,
};
use crate::error::{AdminError, AdminResult};

/// `users.user_status` of a suspended account
const USER_STATUS_SUSPENDED: i16 = 1;

const PAYMENT_SUCCEEDED: i16 = 1;
const PAYMENT_REFUNDED: i16 = 3;
const PAYOUT_REQUESTED: i16 = 0;
const PAYOUT_PAID: i16 = 1;

#[derive(Clone)]
pub struct PgStatsRepository {
    pool: PgPool,
}

impl PgStatsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl StatsRepository for PgStatsRepository {
    async fn user_counts(&self) -> AdminResult<UserCounts> {
        let (students, instructors, admins, suspended) =
            sqlx::query_as::<_, (i64, i64, i64, i64)>(
                r#"
                SELECT
                    COUNT(*) FILTER (WHERE user_role = $1),
                    COUNT(*) FILTER (WHERE user_role = $2),
                    COUNT(*) FILTER (WHERE user_role = $3),
                    COUNT(*) FILTER (WHERE user_status = $4)
                FROM users
                "#,
            )
            .bind(Role::Student.id())
            .bind(Role::Instructor.id())
            .bind(Role::Admin.id())
            .bind(USER_STATUS_SUSPENDED)
            .fetch_one(&self.pool)
            .await?;

        Ok(UserCounts {
            students,
            instructors,
            admins,
            suspended,
        })
    }

    async fn course_counts(&self) -> AdminResult<CourseCounts> {
        let rows = sqlx::query_as::<_, (i16, i64)>(
            "SELECT course_status, COUNT(*) FROM courses GROUP BY course_status",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = CourseCounts::default();
        for (status, count) in rows {
            match CourseStatus::from_id(status) {
                Some(CourseStatus::Draft) => counts.draft = count,
                Some(CourseStatus::PendingReview) => counts.pending_review = count,
                Some(CourseStatus::Published) => counts.published = count,
                Some(CourseStatus::Rejected) => counts.rejected = count,
                Some(CourseStatus::Archived) => counts.archived = count,
                None => {
                    return Err(AdminError::Internal(format!("Invalid course_status: {status}")));
                }
            }
        }
        Ok(counts)
    }

    async fn learning_totals(&self) -> AdminResult<LearningTotals> {
        let (enrollments, completions, certificates) = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM enrollments),
                (SELECT COUNT(*) FROM enrollments WHERE completed_at IS NOT NULL),
                (SELECT COUNT(*) FROM certificates)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(LearningTotals {
            enrollments,
            completions,
            certificates,
        })
    }

    async fn payment_totals(&self) -> AdminResult<PaymentTotals> {
        let course_gross = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT SUM(amount_cents)::BIGINT, COUNT(*)
            FROM payments
            WHERE payment_status = $1
            GROUP BY course_id
            "#,
        )
        .bind(PAYMENT_SUCCEEDED)
        .fetch_all(&self.pool)
        .await?;

        let (refunded_cents, refunded_count) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0)::BIGINT, COUNT(*)
            FROM payments
            WHERE payment_status = $1
            "#,
        )
        .bind(PAYMENT_REFUNDED)
        .fetch_one(&self.pool)
        .await?;

        Ok(PaymentTotals {
            succeeded_count: course_gross.iter().map(|(_, n)| n).sum(),
            course_gross_cents: course_gross.into_iter().map(|(gross, _)| gross).collect(),
            refunded_cents,
            refunded_count,
        })
    }

    async fn payout_totals(&self) -> AdminResult<PayoutTotals> {
        let (requested_count, requested_cents, paid_cents) =
            sqlx::query_as::<_, (i64, i64, i64)>(
                r#"
                SELECT
                    COUNT(*) FILTER (WHERE payout_status = $1),
                    COALESCE(SUM(amount_cents) FILTER (WHERE payout_status = $1), 0)::BIGINT,
                    COALESCE(SUM(amount_cents) FILTER (WHERE payout_status = $2), 0)::BIGINT
                FROM payouts
                "#,
            )
            .bind(PAYOUT_REQUESTED)
            .bind(PAYOUT_PAID)
            .fetch_one(&self.pool)
            .await?;

        Ok(PayoutTotals {
            requested_count,
            requested_cents,
            paid_cents,
        })
    }

    async fn recent_users(&self, limit: i64) -> AdminResult<Vec<RecentUser>> {
        let rows = sqlx::query_as::<_, RecentUserRow>(
            r#"
            SELECT user_id, full_name, email, user_role, user_status, created_at
            FROM users
            ORDER BY created_at DESC, user_id
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_user()).collect()
    }

    async fn recent_courses(&self, limit: i64) -> AdminResult<Vec<RecentCourse>> {
        let rows = sqlx::query_as::<_, RecentCourseRow>(
            r#"
            SELECT
                c.course_id,
                c.title,
                u.full_name AS instructor_name,
                c.course_status,
                c.created_at
            FROM courses c
            JOIN users u ON u.user_id = c.instructor_id
            ORDER BY c.created_at DESC, c.course_id
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_course()).collect()
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct RecentUserRow {
    user_id: Uuid,
    full_name: String,
    email: String,
    user_role: i16,
    user_status: i16,
    created_at: DateTime<Utc>,
}

impl RecentUserRow {
    fn into_user(self) -> AdminResult<RecentUser> {
        let role = Role::from_id(self.user_role).ok_or_else(|| {
            AdminError::Internal(format!("Invalid user_role: {}", self.user_role))
        })?;

        Ok(RecentUser {
            user_id: UserId::from_uuid(self.user_id),
            full_name: self.full_name,
            email: self.email,
            role,
            is_suspended: self.user_status == USER_STATUS_SUSPENDED,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RecentCourseRow {
    course_id: Uuid,
    title: String,
    instructor_name: String,
    course_status: i16,
    created_at: DateTime<Utc>,
}

impl RecentCourseRow {
    fn into_course(self) -> AdminResult<RecentCourse> {
        let status = CourseStatus::from_id(self.course_status).ok_or_else(|| {
            AdminError::Internal(format!("Invalid course_status: {}", self.course_status))
        })?;

        Ok(RecentCourse {
            course_id: CourseId::from_uuid(self.course_id),
            title: self.title,
            instructor_name: self.instructor_name,
            status,
            created_at: self.created_at,
        })
    }
}
