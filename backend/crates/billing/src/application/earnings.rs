//! Instructor Earnings Use Case

use kernel::auth::CurrentUser;
use std::sync::Arc;

use crate::application::config::BillingConfig;
use crate::domain::earnings::EarningsSummary;
use crate::domain::repository::{PaymentRepository, PayoutRepository};
use crate::error::BillingResult;

/// Earnings of `instructor_id` under the configured fee
pub(crate) async fn earnings_of<R>(
    repo: &R,
    config: &BillingConfig,
    instructor_id: &kernel::id::UserId,
) -> BillingResult<EarningsSummary>
where
    R: PaymentRepository + PayoutRepository,
{
    let sales = repo.course_sales(instructor_id).await?;
    let payouts = repo.payout_totals(instructor_id).await?;
    Ok(EarningsSummary::compute(
        config.currency,
        sales,
        config.platform_fee_bps,
        payouts,
    ))
}

pub struct EarningsUseCase<R>
where
    R: PaymentRepository + PayoutRepository,
{
    repo: Arc<R>,
    config: Arc<BillingConfig>,
}

impl<R> EarningsUseCase<R>
where
    R: PaymentRepository + PayoutRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<BillingConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, caller: &CurrentUser) -> BillingResult<EarningsSummary> {
        caller.require_instructor()?;
        earnings_of(&*self.repo, &self.config, &caller.user_id).await
    }
}
