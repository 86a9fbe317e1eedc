//! Password Reset Use Cases
//!
//! `ForgotPasswordUseCase` mails a single-use link and never reveals
//! whether the address is registered. `ResetPasswordUseCase` consumes the
//! link, replaces the password and signs the account out everywhere.

use std::sync::Arc;

use kernel::clock::Clock;
use platform::crypto::token_hash;
use platform::mail::{EmailMessage, EmailSender};

use crate::application::config::AuthConfig;
use crate::domain::entity::password_reset::PasswordReset;
use crate::domain::repository::{
    CredentialsRepository, PasswordResetRepository, RefreshTokenRepository, UserRepository,
};
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

// ============================================================================
// Forgot Password
// ============================================================================

pub struct ForgotPasswordUseCase<U, P, M>
where
    U: UserRepository,
    P: PasswordResetRepository,
    M: EmailSender,
{
    user_repo: Arc<U>,
    reset_repo: Arc<P>,
    mailer: Arc<M>,
    config: Arc<AuthConfig>,
    clock: Arc<dyn Clock>,
}

impl<U, P, M> ForgotPasswordUseCase<U, P, M>
where
    U: UserRepository,
    P: PasswordResetRepository,
    M: EmailSender,
{
    pub fn new(
        user_repo: Arc<U>,
        reset_repo: Arc<P>,
        mailer: Arc<M>,
        config: Arc<AuthConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repo,
            reset_repo,
            mailer,
            config,
            clock,
        }
    }

    /// Succeeds for unknown and malformed addresses alike
    pub async fn execute(&self, email: String) -> AuthResult<()> {
        let Ok(email) = Email::new(email) else {
            return Ok(());
        };

        let Some(user) = self.user_repo.find_by_email(&email).await? else {
            tracing::debug!(email = %email.masked(), "Password reset for unknown email");
            return Ok(());
        };

        if !user.can_sign_in() {
            tracing::debug!(user_id = %user.user_id, "Password reset for suspended account");
            return Ok(());
        }

        let now = self.clock.now();
        let (reset, raw) = PasswordReset::issue(user.user_id, now, self.config.reset_token_ttl);
        self.reset_repo.create(&reset).await?;

        let message = EmailMessage::new(
            user.email.as_str(),
            "Reset your password",
            format!(
                "Hello {},\n\nUse the link below to choose a new password. \
                 It expires in {} minutes and works once.\n\n{}\n\n\
                 If you did not ask for this, you can ignore this email.\n",
                user.full_name,
                self.config.reset_token_ttl.num_minutes(),
                self.config.reset_link(&raw),
            ),
        );

        // Delivery problems must not change the response
        if let Err(e) = self.mailer.send(message).await {
            tracing::error!(
                user_id = %user.user_id,
                error = %e,
                "Failed to send password reset email"
            );
        } else {
            tracing::info!(user_id = %user.user_id, "Password reset email sent");
        }

        Ok(())
    }
}

// ============================================================================
// Reset Password
// ============================================================================

pub struct ResetPasswordUseCase<C, P, T>
where
    C: CredentialsRepository,
    P: PasswordResetRepository,
    T: RefreshTokenRepository,
{
    credentials_repo: Arc<C>,
    reset_repo: Arc<P>,
    token_repo: Arc<T>,
    config: Arc<AuthConfig>,
    clock: Arc<dyn Clock>,
}

impl<C, P, T> ResetPasswordUseCase<C, P, T>
where
    C: CredentialsRepository,
    P: PasswordResetRepository,
    T: RefreshTokenRepository,
{
    pub fn new(
        credentials_repo: Arc<C>,
        reset_repo: Arc<P>,
        token_repo: Arc<T>,
        config: Arc<AuthConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            credentials_repo,
            reset_repo,
            token_repo,
            config,
            clock,
        }
    }

    pub async fn execute(&self, raw_token: &str, new_password: String) -> AuthResult<()> {
        let now = self.clock.now();
        let hash = token_hash(raw_token);

        let reset = self
            .reset_repo
            .find_by_hash(&hash)
            .await?
            .filter(|r| r.is_usable(now))
            .ok_or(AuthError::ResetTokenInvalid)?;

        // Validate before consuming the link so a weak password can be retried
        let raw_password = RawPassword::new(new_password)?;
        let password_hash = UserPassword::from_raw(&raw_password, self.config.pepper())?;

        if !self.reset_repo.mark_used(&hash, now).await? {
            return Err(AuthError::ResetTokenInvalid);
        }

        let mut credentials = self
            .credentials_repo
            .find_by_user_id(&reset.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        credentials.change_password(password_hash, now);
        self.credentials_repo.update(&credentials).await?;

        let revoked = self.token_repo.revoke_all_for_user(&reset.user_id, now).await?;

        tracing::info!(
            user_id = %reset.user_id,
            revoked_sessions = revoked,
            "Password reset completed"
        );

        Ok(())
    }
}
