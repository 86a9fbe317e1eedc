//! Sign In Use Case
//!
//! Verifies email and password, then starts a refresh-token family and
//! issues an access token.

use std::sync::Arc;

use kernel::clock::Clock;
use platform::client::ClientInfo;

use crate::application::config::AuthConfig;
use crate::application::tokens::{TokenPair, issue_access_token};
use crate::domain::entity::{refresh_token::RefreshToken, user::User};
use crate::domain::repository::{CredentialsRepository, RefreshTokenRepository, UserRepository};
use crate::domain::value_object::{email::Email, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

pub struct SignInInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct SignInOutput {
    pub user: User,
    pub tokens: TokenPair,
}

pub struct SignInUseCase<U, C, T>
where
    U: UserRepository,
    C: CredentialsRepository,
    T: RefreshTokenRepository,
{
    user_repo: Arc<U>,
    credentials_repo: Arc<C>,
    token_repo: Arc<T>,
    config: Arc<AuthConfig>,
    clock: Arc<dyn Clock>,
}

impl<U, C, T> SignInUseCase<U, C, T>
where
    U: UserRepository,
    C: CredentialsRepository,
    T: RefreshTokenRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        credentials_repo: Arc<C>,
        token_repo: Arc<T>,
        config: Arc<AuthConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repo,
            credentials_repo,
            token_repo,
            config,
            clock,
        }
    }

    pub async fn execute(
        &self,
        input: SignInInput,
        client: ClientInfo,
    ) -> AuthResult<SignInOutput> {
        let now = self.clock.now();

        // Malformed email is indistinguishable from an unknown one
        let email = Email::new(input.email).map_err(|_| AuthError::InvalidCredentials)?;

        let mut user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let mut credentials = self
            .credentials_repo
            .find_by_user_id(&user.user_id)
            .await?
            .ok_or_else(|| AuthError::Internal("Credentials not found".to_string()))?;

        if credentials.is_locked(now) {
            return Err(AuthError::AccountLocked);
        }

        // A password that fails the policy cannot match a stored hash
        let password_valid = match RawPassword::new(input.password) {
            Ok(raw) => credentials
                .password_hash
                .verify(&raw, self.config.pepper()),
            Err(_) => false,
        };

        if !password_valid {
            credentials.record_failure(
                now,
                self.config.max_login_failures,
                self.config.lockout_duration,
            );
            self.credentials_repo.update(&credentials).await?;

            if credentials.is_locked(now) {
                tracing::warn!(
                    user_id = %user.user_id,
                    failures = credentials.login_failed_count,
                    "Account locked after repeated failures"
                );
            }
            return Err(AuthError::InvalidCredentials);
        }

        if !user.can_sign_in() {
            return Err(AuthError::AccountSuspended);
        }

        if credentials.login_failed_count > 0 {
            credentials.reset_failures(now);
            self.credentials_repo.update(&credentials).await?;
        }

        user.record_login(now);
        self.user_repo.update(&user).await?;

        let refresh =
            RefreshToken::issue(user.user_id, &client, now, self.config.refresh_token_ttl);
        self.token_repo.create(&refresh.token).await?;

        let (access_token, access_expires_at) = issue_access_token(&self.config, &user, now)?;

        tracing::info!(
            user_id = %user.user_id,
            family_id = %refresh.token.family_id,
            client_ip = ?client.ip,
            "User signed in"
        );

        Ok(SignInOutput {
            tokens: TokenPair {
                access_token,
                access_expires_at,
                refresh_token: refresh.raw,
                refresh_expires_at: refresh.token.expires_at,
            },
            user,
        })
    }
}
