//! Presentation Layer
//!
//! HTTP handlers, DTOs and the router.

pub mod dto;
pub mod handlers;
pub mod router;

pub use handlers::{BillingAppState, BillingRepositories};
pub use router::{billing_router, billing_router_generic};
