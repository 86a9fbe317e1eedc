//! Payment Entity
//!
//! One checkout attempt for one course. The amount, currency and
//! instructor are copied at checkout so later price changes do not touch
//! history.

use chrono::{DateTime, Utc};
use kernel::id::{CourseId, PaymentId, UserId};

use crate::domain::value_object::{currency::Currency, payment_status::PaymentStatus};
use crate::error::{BillingError, BillingResult};

/// Longest failure reason kept
const FAILURE_REASON_MAX_LENGTH: usize = 255;

/// What checkout needs to know about a course
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseForSale {
    pub course_id: CourseId,
    pub instructor_id: UserId,
    pub title: String,
    pub price_cents: i64,
    pub is_published: bool,
}

impl CourseForSale {
    #[inline]
    pub fn is_free(&self) -> bool {
        self.price_cents == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    pub payment_id: PaymentId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub instructor_id: UserId,
    pub amount_cents: i64,
    pub currency: Currency,
    pub status: PaymentStatus,
    pub provider_reference: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Set when the gateway answered
    pub completed_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn pending(
        buyer_id: UserId,
        course: &CourseForSale,
        currency: Currency,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            payment_id: PaymentId::new(),
            user_id: buyer_id,
            course_id: course.course_id,
            instructor_id: course.instructor_id,
            amount_cents: course.price_cents,
            currency,
            status: PaymentStatus::Pending,
            provider_reference: None,
            failure_reason: None,
            created_at: now,
            completed_at: None,
            refunded_at: None,
        }
    }

    fn transition(&mut self, next: PaymentStatus) -> BillingResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(BillingError::InvalidPaymentTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn succeed(&mut self, reference: String, now: DateTime<Utc>) -> BillingResult<()> {
        self.transition(PaymentStatus::Succeeded)?;
        self.provider_reference = Some(reference);
        self.completed_at = Some(now);
        Ok(())
    }

    pub fn fail(&mut self, reason: &str, now: DateTime<Utc>) -> BillingResult<()> {
        self.transition(PaymentStatus::Failed)?;
        self.failure_reason = Some(reason.trim().chars().take(FAILURE_REASON_MAX_LENGTH).collect());
        self.completed_at = Some(now);
        Ok(())
    }

    /// `completed_at` keeps the time of the original charge
    pub fn refund(&mut self, now: DateTime<Utc>) -> BillingResult<()> {
        self.transition(PaymentStatus::Refunded)?;
        self.refunded_at = Some(now);
        Ok(())
    }
}
