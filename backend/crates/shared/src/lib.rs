//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of vocabulary shared by every
//! bounded context of the learning platform:
//! - Common error types and result aliases
//! - Typed ID wrappers
//! - Platform roles and the authenticated caller
//! - The clock every timestamp is taken from
//! - Pagination primitives
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all domains.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod auth;
pub mod clock;
pub mod id;
pub mod page;
pub mod role;
