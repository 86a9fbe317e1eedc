//! Change Password Use Case
//!
//! Requires the current password. Other sessions are signed out; the
//! caller keeps its access token until it expires.

use std::sync::Arc;

use kernel::clock::Clock;
use kernel::id::UserId;

use crate::application::config::AuthConfig;
use crate::domain::repository::{CredentialsRepository, RefreshTokenRepository};
use crate::domain::value_object::user_password::{RawPassword, UserPassword};
use crate::error::{AuthError, AuthResult};

pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
}

pub struct ChangePasswordUseCase<C, T>
where
    C: CredentialsRepository,
    T: RefreshTokenRepository,
{
    credentials_repo: Arc<C>,
    token_repo: Arc<T>,
    config: Arc<AuthConfig>,
    clock: Arc<dyn Clock>,
}

impl<C, T> ChangePasswordUseCase<C, T>
where
    C: CredentialsRepository,
    T: RefreshTokenRepository,
{
    pub fn new(
        credentials_repo: Arc<C>,
        token_repo: Arc<T>,
        config: Arc<AuthConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            credentials_repo,
            token_repo,
            config,
            clock,
        }
    }

    pub async fn execute(&self, user_id: UserId, input: ChangePasswordInput) -> AuthResult<()> {
        let mut credentials = self
            .credentials_repo
            .find_by_user_id(&user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let current_ok = match RawPassword::new(input.current_password) {
            Ok(raw) => credentials.password_hash.verify(&raw, self.config.pepper()),
            Err(_) => false,
        };
        if !current_ok {
            return Err(AuthError::CurrentPasswordMismatch);
        }

        let raw_password = RawPassword::new(input.new_password)?;
        let password_hash = UserPassword::from_raw(&raw_password, self.config.pepper())?;

        let now = self.clock.now();
        credentials.change_password(password_hash, now);
        self.credentials_repo.update(&credentials).await?;

        let revoked = self.token_repo.revoke_all_for_user(&user_id, now).await?;

        tracing::info!(user_id = %user_id, revoked_sessions = revoked, "Password changed");

        Ok(())
    }
}
