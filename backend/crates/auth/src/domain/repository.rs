//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use chrono::{DateTime, Utc};
use kernel::id::{RefreshTokenId, UserId};
use kernel::page::{Page, PageRequest};
use kernel::role::Role;
use uuid::Uuid;

use crate::domain::entity::{
    credentials::Credentials, password_reset::PasswordReset, profile::Profile,
    refresh_token::RefreshToken, user::User,
};
use crate::domain::value_object::{email::Email, user_status::UserStatus};
use crate::error::AuthResult;

/// Admin user listing filter
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    /// Case-insensitive substring of email or full name
    pub search: Option<String>,
}

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert user, credentials and profile atomically
    ///
    /// Fails with `AuthError::EmailTaken` on a duplicate email.
    async fn create_account(
        &self,
        user: &User,
        credentials: &Credentials,
        profile: &Profile,
    ) -> AuthResult<()>;

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    async fn update(&self, user: &User) -> AuthResult<()>;

    /// Newest first
    async fn list(&self, filter: &UserFilter, page: PageRequest) -> AuthResult<Page<User>>;
}

/// Credentials repository trait
#[trait_variant::make(CredentialsRepository: Send)]
pub trait LocalCredentialsRepository {
    async fn find_by_user_id(&self, user_id: &UserId) -> AuthResult<Option<Credentials>>;

    async fn update(&self, credentials: &Credentials) -> AuthResult<()>;
}

/// Refresh token repository trait
#[trait_variant::make(RefreshTokenRepository: Send)]
pub trait LocalRefreshTokenRepository {
    async fn create(&self, token: &RefreshToken) -> AuthResult<()>;

    async fn find_by_hash(&self, token_hash: &[u8]) -> AuthResult<Option<RefreshToken>>;

    /// Revoke `old` and insert `successor` in one step
    ///
    /// Returns `false` when `old` was already revoked (lost a race with a
    /// concurrent rotation); nothing is inserted in that case.
    async fn rotate(
        &self,
        old: &RefreshTokenId,
        successor: &RefreshToken,
        now: DateTime<Utc>,
    ) -> AuthResult<bool>;

    async fn revoke(&self, token_id: &RefreshTokenId, now: DateTime<Utc>) -> AuthResult<()>;

    async fn revoke_family(&self, family_id: Uuid, now: DateTime<Utc>) -> AuthResult<u64>;

    async fn revoke_all_for_user(&self, user_id: &UserId, now: DateTime<Utc>) -> AuthResult<u64>;

    async fn delete_expired(&self, now: DateTime<Utc>) -> AuthResult<u64>;
}

/// Password reset repository trait
#[trait_variant::make(PasswordResetRepository: Send)]
pub trait LocalPasswordResetRepository {
    async fn create(&self, reset: &PasswordReset) -> AuthResult<()>;

    async fn find_by_hash(&self, token_hash: &[u8]) -> AuthResult<Option<PasswordReset>>;

    /// Returns `false` if the token was already used
    async fn mark_used(&self, token_hash: &[u8], now: DateTime<Utc>) -> AuthResult<bool>;

    async fn delete_expired(&self, now: DateTime<Utc>) -> AuthResult<u64>;
}

/// Profile repository trait
#[trait_variant::make(ProfileRepository: Send)]
pub trait LocalProfileRepository {
    async fn find_by_user_id(&self, user_id: &UserId) -> AuthResult<Option<Profile>>;

    async fn upsert(&self, profile: &Profile) -> AuthResult<()>;
}
