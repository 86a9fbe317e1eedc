//! Payment history and refunds

use kernel::auth::CurrentUser;
use kernel::clock::Clock;
use kernel::id::PaymentId;
use kernel::page::{Page, PageRequest};
use std::sync::Arc;

use crate::domain::entity::payment::Payment;
use crate::domain::gateway::{PaymentGateway, RefundRequest};
use crate::domain::repository::{PaymentRepository, PaymentView};
use crate::domain::value_object::payment_status::PaymentStatus;
use crate::error::{BillingError, BillingResult};

/// The caller's own payments, newest first
pub struct PaymentHistoryUseCase<R>
where
    R: PaymentRepository,
{
    repo: Arc<R>,
}

impl<R> PaymentHistoryUseCase<R>
where
    R: PaymentRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, caller: &CurrentUser) -> BillingResult<Vec<PaymentView>> {
        self.repo.list_payments_by_user(&caller.user_id).await
    }
}

// ============================================================================
// Admin
// ============================================================================

pub struct ManagePaymentsUseCase<R, G>
where
    R: PaymentRepository,
    G: PaymentGateway,
{
    repo: Arc<R>,
    gateway: Arc<G>,
    clock: Arc<dyn Clock>,
}

impl<R, G> ManagePaymentsUseCase<R, G>
where
    R: PaymentRepository,
    G: PaymentGateway,
{
    pub fn new(repo: Arc<R>, gateway: Arc<G>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            gateway,
            clock,
        }
    }

    pub async fn list(
        &self,
        caller: &CurrentUser,
        status: Option<PaymentStatus>,
        page: PageRequest,
    ) -> BillingResult<Page<PaymentView>> {
        caller.require_admin()?;
        self.repo.list_payments(status, page.normalized()).await
    }

    /// Succeeded payments only. The gateway returns the money before the
    /// payment is marked refunded and the purchase enrollment is removed.
    pub async fn refund(
        &self,
        caller: &CurrentUser,
        payment_id: PaymentId,
    ) -> BillingResult<Payment> {
        caller.require_admin()?;

        let mut payment = self
            .repo
            .find_payment(&payment_id)
            .await?
            .ok_or(BillingError::PaymentNotFound)?;
        payment.refund(self.clock.now())?;

        let request = RefundRequest::for_payment(&payment).ok_or_else(|| {
            BillingError::Internal(format!("Payment {payment_id} has no provider reference"))
        })?;
        self.gateway.refund(&request).await?;
        self.repo.refund_purchase(&payment).await?;

        tracing::info!(
            payment_id = %payment_id,
            admin_id = %caller.user_id,
            user_id = %payment.user_id,
            course_id = %payment.course_id,
            amount_cents = payment.amount_cents,
            reference = %request.reference,
            "Payment refunded"
        );

        Ok(payment)
    }
}
