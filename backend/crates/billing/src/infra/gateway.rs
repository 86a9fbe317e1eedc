//! Simulated Payment Gateway
//!
//! Stands in for a card processor. The payment token picks the outcome:
//! - `tok_decline...`: declined with a reason
//! - `tok_unavailable`: the provider cannot be reached
//! - anything else: approved with a `sim_` reference
//!
//! Refunds succeed for any reference this gateway issued.

use uuid::Uuid;

use crate::domain::gateway::{ChargeOutcome, ChargeRequest, PaymentGateway, RefundRequest};
use crate::error::{BillingError, BillingResult};

const DECLINE_PREFIX: &str = "tok_decline";
const UNAVAILABLE_TOKEN: &str = "tok_unavailable";
const REFERENCE_PREFIX: &str = "sim_";

#[derive(Debug, Clone, Default)]
pub struct SimulatedGateway;

impl SimulatedGateway {
    pub fn new() -> Self {
        Self
    }
}

impl PaymentGateway for SimulatedGateway {
    async fn charge(&self, request: &ChargeRequest) -> BillingResult<ChargeOutcome> {
        let token = request.payment_token.trim();

        if token == UNAVAILABLE_TOKEN {
            return Err(BillingError::GatewayUnavailable);
        }

        if let Some(code) = token.strip_prefix(DECLINE_PREFIX) {
            let reason = match code.trim_start_matches('_') {
                "funds" => "Insufficient funds",
                "expired" => "Card expired",
                _ => "Card declined",
            };
            return Ok(ChargeOutcome::Declined {
                reason: reason.to_string(),
            });
        }

        tracing::debug!(
            payment_id = %request.payment_id,
            amount_cents = request.amount_cents,
            currency = %request.currency,
            "Simulated charge approved"
        );

        Ok(ChargeOutcome::Approved {
            reference: format!("{REFERENCE_PREFIX}{}", Uuid::new_v4().simple()),
        })
    }

    async fn refund(&self, request: &RefundRequest) -> BillingResult<()> {
        if !request.reference.starts_with(REFERENCE_PREFIX) {
            return Err(BillingError::Internal(format!(
                "Unknown charge reference {}",
                request.reference
            )));
        }

        tracing::debug!(
            payment_id = %request.payment_id,
            reference = %request.reference,
            amount_cents = request.amount_cents,
            "Simulated refund issued"
        );
        Ok(())
    }
}
