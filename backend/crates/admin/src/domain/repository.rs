//! Repository Traits

use crate::domain::stats::{
    CourseCounts, LearningTotals, PaymentTotals, PayoutTotals, RecentCourse, RecentUser,
    UserCounts,
};
use crate::error::AdminResult;

/// Read-only aggregate queries over the whole platform
#[trait_variant::make(StatsRepository: Send)]
pub trait LocalStatsRepository {
    async fn user_counts(&self) -> AdminResult<UserCounts>;

    async fn course_counts(&self) -> AdminResult<CourseCounts>;

    async fn learning_totals(&self) -> AdminResult<LearningTotals>;

    async fn payment_totals(&self) -> AdminResult<PaymentTotals>;

    async fn payout_totals(&self) -> AdminResult<PayoutTotals>;

    /// Newest first
    async fn recent_users(&self, limit: i64) -> AdminResult<Vec<RecentUser>>;

    /// Newest first, any status
    async fn recent_courses(&self, limit: i64) -> AdminResult<Vec<RecentCourse>>;
}
