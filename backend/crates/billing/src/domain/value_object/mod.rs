//! Value Objects

pub mod currency;
pub mod payment_status;
pub mod payout_status;

pub use currency::Currency;
pub use payment_status::PaymentStatus;
pub use payout_status::PayoutStatus;
