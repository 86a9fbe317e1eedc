//! Auth (Accounts) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Business logic, entities, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - Sign up as student or instructor, sign in with email + password
//! - Short-lived JWT access tokens, rotating refresh tokens in an
//!   HttpOnly cookie with reuse detection
//! - Password reset by email, password change
//! - Profiles with avatars in the object store
//! - Admin user management (role, suspension)
//!
//! ## Security Model
//! - Passwords hashed with Argon2id, optional pepper
//! - Refresh and reset tokens stored as SHA-256 hashes only
//! - Temporary lockout after repeated failed sign-ins
//! - Suspension and password changes revoke every refresh token

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::postgres::PgAuthRepository;
pub use presentation::router::{admin_users_router, auth_router, profile_router, users_router};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod store {
    pub use crate::infra::postgres::PgAuthRepository as AuthStore;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
