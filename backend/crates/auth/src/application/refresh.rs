//! Refresh Use Case
//!
//! Exchanges a refresh token for a new token pair. The presented token is
//! revoked and replaced by a successor in the same family; presenting a
//! revoked token revokes the whole family.

use std::sync::Arc;

use kernel::clock::Clock;
use platform::client::ClientInfo;
use platform::crypto::token_hash;

use crate::application::config::AuthConfig;
use crate::application::tokens::{TokenPair, issue_access_token};
use crate::domain::entity::user::User;
use crate::domain::repository::{RefreshTokenRepository, UserRepository};
use crate::error::{AuthError, AuthResult};

#[derive(Debug)]
pub struct RefreshOutput {
    pub user: User,
    pub tokens: TokenPair,
}

pub struct RefreshUseCase<U, T>
where
    U: UserRepository,
    T: RefreshTokenRepository,
{
    user_repo: Arc<U>,
    token_repo: Arc<T>,
    config: Arc<AuthConfig>,
    clock: Arc<dyn Clock>,
}

impl<U, T> RefreshUseCase<U, T>
where
    U: UserRepository,
    T: RefreshTokenRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        token_repo: Arc<T>,
        config: Arc<AuthConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repo,
            token_repo,
            config,
            clock,
        }
    }

    pub async fn execute(&self, raw_token: &str, client: ClientInfo) -> AuthResult<RefreshOutput> {
        let now = self.clock.now();

        let current = self
            .token_repo
            .find_by_hash(&token_hash(raw_token))
            .await?
            .ok_or(AuthError::RefreshTokenInvalid)?;

        if current.is_revoked() {
            let revoked = self.token_repo.revoke_family(current.family_id, now).await?;
            tracing::warn!(
                user_id = %current.user_id,
                family_id = %current.family_id,
                revoked,
                "Revoked refresh token presented, family revoked"
            );
            return Err(AuthError::RefreshTokenReused);
        }

        if current.is_expired(now) {
            return Err(AuthError::RefreshTokenInvalid);
        }

        let user = self
            .user_repo
            .find_by_id(&current.user_id)
            .await?
            .ok_or(AuthError::RefreshTokenInvalid)?;

        if !user.can_sign_in() {
            self.token_repo.revoke_family(current.family_id, now).await?;
            return Err(AuthError::AccountSuspended);
        }

        let successor = current.rotate(&client, now, self.config.refresh_token_ttl);
        let rotated = self
            .token_repo
            .rotate(&current.token_id, &successor.token, now)
            .await?;

        if !rotated {
            // Another request rotated this token first
            self.token_repo.revoke_family(current.family_id, now).await?;
            tracing::warn!(
                user_id = %current.user_id,
                family_id = %current.family_id,
                "Concurrent refresh token use, family revoked"
            );
            return Err(AuthError::RefreshTokenReused);
        }

        let (access_token, access_expires_at) = issue_access_token(&self.config, &user, now)?;

        tracing::debug!(user_id = %user.user_id, "Access token refreshed");

        Ok(RefreshOutput {
            tokens: TokenPair {
                access_token,
                access_expires_at,
                refresh_token: successor.raw,
                refresh_expires_at: successor.token.expires_at,
            },
            user,
        })
    }
}
