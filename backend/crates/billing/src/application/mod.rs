//! Application Layer
//!
//! Use cases of the billing context, generic over the repository traits
//! and the payment gateway.

pub mod checkout;
pub mod config;
pub mod earnings;
pub mod payments;
pub mod payouts;

pub use checkout::{CheckoutReceipt, CheckoutUseCase};
pub use config::BillingConfig;
pub use earnings::EarningsUseCase;
pub use payments::{ManagePaymentsUseCase, PaymentHistoryUseCase};
pub use payouts::{PayoutHistoryUseCase, ProcessPayoutUseCase, RequestPayoutUseCase};
