//! Payment gateway port
//!
//! Checkout talks to the card processor only through [`PaymentGateway`].

use kernel::id::PaymentId;

use crate::domain::entity::payment::Payment;
use crate::domain::value_object::currency::Currency;
use crate::error::BillingResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    pub payment_id: PaymentId,
    pub amount_cents: i64,
    pub currency: Currency,
    /// Opaque token produced by the client-side card form
    pub payment_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeOutcome {
    Approved { reference: String },
    Declined { reason: String },
}

/// Full refund of an approved charge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundRequest {
    pub payment_id: PaymentId,
    /// Reference the processor returned on approval
    pub reference: String,
    pub amount_cents: i64,
    pub currency: Currency,
}

impl RefundRequest {
    /// `None` for payments that were never approved
    pub fn for_payment(payment: &Payment) -> Option<Self> {
        Some(Self {
            payment_id: payment.payment_id,
            reference: payment.provider_reference.clone()?,
            amount_cents: payment.amount_cents,
            currency: payment.currency,
        })
    }
}

/// An unreachable processor is an `Err`; a refused card is
/// [`ChargeOutcome::Declined`].
#[trait_variant::make(PaymentGateway: Send)]
pub trait LocalPaymentGateway {
    async fn charge(&self, request: &ChargeRequest) -> BillingResult<ChargeOutcome>;

    /// Return the money of an approved charge
    async fn refund(&self, request: &RefundRequest) -> BillingResult<()>;
}
