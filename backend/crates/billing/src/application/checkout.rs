//! Checkout Use Case
//!
//! Buys a paid course: record a pending payment, charge the gateway, then
//! mark the payment succeeded and enroll the buyer in one transaction.
//! A charge that cannot be turned into an enrollment is refunded.

use kernel::auth::CurrentUser;
use kernel::clock::Clock;
use kernel::id::{CourseId, EnrollmentId};
use std::sync::Arc;

use crate::application::config::BillingConfig;
use crate::domain::entity::payment::Payment;
use crate::domain::gateway::{ChargeOutcome, ChargeRequest, PaymentGateway, RefundRequest};
use crate::domain::repository::PaymentRepository;
use crate::error::{BillingError, BillingResult};

#[derive(Debug, Clone)]
pub struct CheckoutReceipt {
    pub payment: Payment,
    pub enrollment_id: EnrollmentId,
}

pub struct CheckoutUseCase<R, G>
where
    R: PaymentRepository,
    G: PaymentGateway,
{
    repo: Arc<R>,
    gateway: Arc<G>,
    config: Arc<BillingConfig>,
    clock: Arc<dyn Clock>,
}

impl<R, G> CheckoutUseCase<R, G>
where
    R: PaymentRepository,
    G: PaymentGateway,
{
    pub fn new(
        repo: Arc<R>,
        gateway: Arc<G>,
        config: Arc<BillingConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            gateway,
            config,
            clock,
        }
    }

    pub async fn execute(
        &self,
        caller: &CurrentUser,
        course_id: CourseId,
        payment_token: String,
    ) -> BillingResult<CheckoutReceipt> {
        let course = self
            .repo
            .find_course_for_sale(&course_id)
            .await?
            .filter(|c| c.is_published)
            .ok_or(BillingError::CourseNotFound)?;

        if course.is_free() {
            return Err(BillingError::FreeCourse);
        }
        if course.instructor_id == caller.user_id {
            return Err(BillingError::OwnCourse);
        }
        if self.repo.is_enrolled(&caller.user_id, &course_id).await? {
            return Err(BillingError::AlreadyEnrolled);
        }

        let mut payment = Payment::pending(
            caller.user_id,
            &course,
            self.config.currency,
            self.clock.now(),
        );
        self.repo.create_payment(&payment).await?;

        let request = ChargeRequest {
            payment_id: payment.payment_id,
            amount_cents: payment.amount_cents,
            currency: payment.currency,
            payment_token,
        };

        let outcome = match self.gateway.charge(&request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                payment.fail("Payment provider unavailable", self.clock.now())?;
                self.repo.update_payment(&payment).await?;
                return Err(e);
            }
        };

        match outcome {
            ChargeOutcome::Declined { reason } => {
                payment.fail(&reason, self.clock.now())?;
                self.repo.update_payment(&payment).await?;

                tracing::info!(
                    payment_id = %payment.payment_id,
                    user_id = %caller.user_id,
                    course_id = %course_id,
                    reason = %reason,
                    "Payment declined"
                );

                Err(BillingError::PaymentDeclined(reason))
            }
            ChargeOutcome::Approved { reference } => {
                payment.succeed(reference, self.clock.now())?;
                let enrollment_id = EnrollmentId::new();

                match self.repo.complete_purchase(&payment, enrollment_id).await {
                    Ok(()) => {}
                    Err(BillingError::AlreadyEnrolled) => {
                        // A concurrent checkout or free enrollment won
                        if self.reverse_charge(&mut payment).await {
                            tracing::warn!(
                                payment_id = %payment.payment_id,
                                user_id = %caller.user_id,
                                course_id = %course_id,
                                "Duplicate purchase refunded"
                            );
                        }
                        return Err(BillingError::AlreadyEnrolled);
                    }
                    Err(e) => {
                        tracing::error!(
                            payment_id = %payment.payment_id,
                            user_id = %caller.user_id,
                            course_id = %course_id,
                            error = %e,
                            "Charged purchase could not be recorded"
                        );
                        self.reverse_charge(&mut payment).await;
                        return Err(e);
                    }
                }

                tracing::info!(
                    payment_id = %payment.payment_id,
                    user_id = %caller.user_id,
                    course_id = %course_id,
                    amount_cents = payment.amount_cents,
                    enrollment_id = %enrollment_id,
                    "Course purchased"
                );

                Ok(CheckoutReceipt {
                    payment,
                    enrollment_id,
                })
            }
        }
    }

    /// Give back a charge that did not turn into an enrollment
    ///
    /// The payment row is always written: refunded when the gateway took
    /// the money back, otherwise succeeded with its provider reference so
    /// an admin can refund it. Returns whether the refund went through.
    async fn reverse_charge(&self, payment: &mut Payment) -> bool {
        let refunded = match RefundRequest::for_payment(payment) {
            Some(request) => match self.gateway.refund(&request).await {
                Ok(()) => payment.refund(self.clock.now()).is_ok(),
                Err(e) => {
                    tracing::error!(
                        payment_id = %payment.payment_id,
                        reference = %request.reference,
                        error = %e,
                        "Refund of unrecorded charge failed"
                    );
                    false
                }
            },
            None => false,
        };

        if let Err(e) = self.repo.update_payment(payment).await {
            tracing::error!(
                payment_id = %payment.payment_id,
                status = %payment.status,
                reference = ?payment.provider_reference,
                error = %e,
                "Payment state could not be stored"
            );
        }

        refunded
    }
}
