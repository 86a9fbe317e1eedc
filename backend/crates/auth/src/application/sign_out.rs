//! Sign Out Use Case
//!
//! Revokes the presented refresh token. Missing or unknown tokens are not
//! an error: the client ends up signed out either way.

use std::sync::Arc;

use kernel::clock::Clock;
use platform::crypto::token_hash;

use crate::domain::repository::RefreshTokenRepository;
use crate::error::AuthResult;

pub struct SignOutUseCase<T>
where
    T: RefreshTokenRepository,
{
    token_repo: Arc<T>,
    clock: Arc<dyn Clock>,
}

impl<T> SignOutUseCase<T>
where
    T: RefreshTokenRepository,
{
    pub fn new(token_repo: Arc<T>, clock: Arc<dyn Clock>) -> Self {
        Self { token_repo, clock }
    }

    pub async fn execute(&self, raw_token: Option<&str>) -> AuthResult<()> {
        let Some(raw_token) = raw_token else {
            return Ok(());
        };

        if let Some(token) = self.token_repo.find_by_hash(&token_hash(raw_token)).await? {
            if !token.is_revoked() {
                self.token_repo
                    .revoke(&token.token_id, self.clock.now())
                    .await?;
                tracing::info!(user_id = %token.user_id, "User signed out");
            }
        }

        Ok(())
    }
}
