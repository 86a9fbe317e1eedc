//! Admin Backend Module
//!
//! Platform-wide statistics for administrators: users, courses, learning
//! activity, revenue and payouts.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


pub use error::{AdminError, AdminResult};
pub use infra::postgres::PgStatsRepository;
pub use presentation::router::{admin_router, admin_router_generic};
