//! Application Configuration
//!
//! Configuration for the Billing application layer.

use crate::domain::value_object::currency::Currency;

/// Billing application configuration
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Currency of every price and payout
    pub currency: Currency,
    /// Platform share of each sale in basis points (2000 = 20 %)
    pub platform_fee_bps: i64,
    /// Smallest payout an instructor can request
    pub min_payout_cents: i64,
}

impl BillingConfig {
    pub fn new() -> Self {
        Self {
            currency: Currency::USD,
            platform_fee_bps: 2000,
            min_payout_cents: 1000,
        }
    }

    /// Low payout threshold for local testing
    pub fn development() -> Self {
        Self {
            min_payout_cents: 100,
            ..Self::new()
        }
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self::new()
    }
}
