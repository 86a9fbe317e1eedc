//! Domain Layer
//!
//! Contains entities, value objects, and repository traits.

pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{
    credentials::Credentials, password_reset::PasswordReset, profile::Profile,
    refresh_token::RefreshToken, user::User,
};
pub use repository::{
    CredentialsRepository, PasswordResetRepository, ProfileRepository, RefreshTokenRepository,
    UserFilter, UserRepository,
};
