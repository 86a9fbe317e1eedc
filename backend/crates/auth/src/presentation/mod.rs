//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and middleware.

pub mod dto;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use extract::Client;
pub use handlers::{AuthAppState, AuthRepositories};
pub use middleware::{attach_access_token, require_access_token};
pub use router::{
    admin_users_router, admin_users_router_generic, auth_router, auth_router_generic,
    profile_router, profile_router_generic, users_router, users_router_generic,
};
