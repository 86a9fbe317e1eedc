//! Presentation Layer
//!
//! HTTP handlers, DTOs and the router.

pub mod dto;
pub mod handlers;
pub mod router;

pub use handlers::{LearningAppState, LearningRepositories};
pub use router::{learning_router, learning_router_generic};
