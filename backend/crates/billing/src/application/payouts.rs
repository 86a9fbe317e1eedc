//! Payout Use Cases
//!
//! Instructors request payouts from their available balance; admins pay
//! or reject them.

use kernel::auth::CurrentUser;
use kernel::clock::Clock;
use kernel::id::PayoutId;
use kernel::page::{Page, PageRequest};
use std::sync::Arc;

use crate::application::config::BillingConfig;
use crate::application::earnings::earnings_of;
use crate::domain::entity::payout::Payout;
use crate::domain::repository::{PaymentRepository, PayoutRepository, PayoutView};
use crate::domain::value_object::payout_status::PayoutStatus;
use crate::error::{BillingError, BillingResult};

// ============================================================================
// Instructor side
// ============================================================================

pub struct RequestPayoutUseCase<R>
where
    R: PaymentRepository + PayoutRepository,
{
    repo: Arc<R>,
    config: Arc<BillingConfig>,
    clock: Arc<dyn Clock>,
}

impl<R> RequestPayoutUseCase<R>
where
    R: PaymentRepository + PayoutRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<BillingConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            config,
            clock,
        }
    }

    pub async fn execute(&self, caller: &CurrentUser, amount_cents: i64) -> BillingResult<Payout> {
        caller.require_instructor()?;

        if amount_cents < self.config.min_payout_cents {
            return Err(BillingError::PayoutBelowMinimum {
                min_cents: self.config.min_payout_cents,
            });
        }
        if self.repo.find_open_payout(&caller.user_id).await?.is_some() {
            return Err(BillingError::PayoutAlreadyOpen);
        }

        let earnings = earnings_of(&*self.repo, &self.config, &caller.user_id).await?;
        if amount_cents > earnings.available_cents {
            return Err(BillingError::InsufficientBalance {
                available_cents: earnings.available_cents.max(0),
            });
        }

        let payout = Payout::request(
            caller.user_id,
            amount_cents,
            self.config.currency,
            self.clock.now(),
        );
        // The partial unique index settles concurrent requests
        self.repo.create_payout(&payout).await?;

        tracing::info!(
            payout_id = %payout.payout_id,
            instructor_id = %caller.user_id,
            amount_cents,
            "Payout requested"
        );

        Ok(payout)
    }
}

pub struct PayoutHistoryUseCase<R>
where
    R: PayoutRepository,
{
    repo: Arc<R>,
}

impl<R> PayoutHistoryUseCase<R>
where
    R: PayoutRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, caller: &CurrentUser) -> BillingResult<Vec<Payout>> {
        caller.require_instructor()?;
        self.repo.list_payouts_by_instructor(&caller.user_id).await
    }
}

// ============================================================================
// Admin side
// ============================================================================

pub struct ProcessPayoutUseCase<R>
where
    R: PayoutRepository,
{
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> ProcessPayoutUseCase<R>
where
    R: PayoutRepository,
{
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Defaults to open requests
    pub async fn list(
        &self,
        caller: &CurrentUser,
        status: Option<PayoutStatus>,
        page: PageRequest,
    ) -> BillingResult<Page<PayoutView>> {
        caller.require_admin()?;
        self.repo
            .list_payouts(status.unwrap_or(PayoutStatus::Requested), page.normalized())
            .await
    }

    pub async fn approve(
        &self,
        caller: &CurrentUser,
        payout_id: PayoutId,
        note: Option<&str>,
    ) -> BillingResult<Payout> {
        caller.require_admin()?;
        let mut payout = self.load(&payout_id).await?;
        payout.approve(note, self.clock.now())?;
        self.repo.update_payout(&payout).await?;

        tracing::info!(
            payout_id = %payout_id,
            admin_id = %caller.user_id,
            instructor_id = %payout.instructor_id,
            amount_cents = payout.amount_cents,
            "Payout paid"
        );

        Ok(payout)
    }

    pub async fn reject(
        &self,
        caller: &CurrentUser,
        payout_id: PayoutId,
        note: &str,
    ) -> BillingResult<Payout> {
        caller.require_admin()?;
        let mut payout = self.load(&payout_id).await?;
        payout.reject(note, self.clock.now())?;
        self.repo.update_payout(&payout).await?;

        tracing::info!(
            payout_id = %payout_id,
            admin_id = %caller.user_id,
            instructor_id = %payout.instructor_id,
            "Payout rejected"
        );

        Ok(payout)
    }

    async fn load(&self, payout_id: &PayoutId) -> BillingResult<Payout> {
        self.repo
            .find_payout(payout_id)
            .await?
            .ok_or(BillingError::PayoutNotFound)
    }
}
