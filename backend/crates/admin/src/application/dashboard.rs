//! Platform Dashboard Use Case

use billing::BillingConfig;
use kernel::auth::CurrentUser;
use kernel::clock::Clock;
use std::sync::Arc;

use crate::domain::repository::StatsRepository;
use crate::domain::stats::{PlatformStats, Revenue};
use crate::error::AdminResult;

/// Users and courses listed under "newest"
pub const RECENT_LIMIT: i64 = 5;

pub struct PlatformDashboardUseCase<R>
where
    R: StatsRepository,
{
    repo: Arc<R>,
    billing: Arc<BillingConfig>,
    clock: Arc<dyn Clock>,
}

impl<R> PlatformDashboardUseCase<R>
where
    R: StatsRepository,
{
    pub fn new(repo: Arc<R>, billing: Arc<BillingConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            billing,
            clock,
        }
    }

    pub async fn execute(&self, caller: &CurrentUser) -> AdminResult<PlatformStats> {
        caller.require_admin()?;

        let users = self.repo.user_counts().await?;
        let courses = self.repo.course_counts().await?;
        let learning = self.repo.learning_totals().await?;
        let payments = self.repo.payment_totals().await?;
        let payouts = self.repo.payout_totals().await?;
        let recent_users = self.repo.recent_users(RECENT_LIMIT).await?;
        let recent_courses = self.repo.recent_courses(RECENT_LIMIT).await?;

        Ok(PlatformStats {
            users,
            courses,
            learning,
            revenue: Revenue::compute(
                self.billing.currency,
                &payments,
                self.billing.platform_fee_bps,
            ),
            payouts,
            recent_users,
            recent_courses,
            generated_at: self.clock.now(),
        })
    }
}
