//! Domain Entities

pub mod payment;
pub mod payout;
