//! Billing Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Payments, payouts, earnings math, repository and gateway traits
//! - `application/` - Use cases
//! - `infra/` - PostgreSQL repository, simulated payment gateway
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - Checkout of paid courses with automatic enrollment
//! - Payment history and admin refunds
//! - Instructor earnings after the platform fee
//! - Payout requests and the admin payout queue

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::BillingConfig;
pub use error::{BillingError, BillingResult};
pub use infra::{gateway::SimulatedGateway, postgres::PgBillingRepository};
pub use presentation::router::{billing_router, billing_router_generic};
