//! Sign Up Use Case
//!
//! Registers a student or instructor account.

use std::sync::Arc;

use kernel::clock::Clock;
use kernel::id::UserId;
use kernel::role::Role;

use crate::application::config::AuthConfig;
use crate::domain::entity::{credentials::Credentials, profile::Profile, user::User};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    email::Email,
    full_name::FullName,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

pub struct SignUpInput {
    pub email: String,
    pub password: String,
    pub full_name: String,
    /// `student` (default) or `instructor`
    pub role: Option<String>,
}

#[derive(Debug)]
pub struct SignUpOutput {
    pub user_id: UserId,
    pub role: Role,
}

pub struct SignUpUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    config: Arc<AuthConfig>,
    clock: Arc<dyn Clock>,
}

impl<U> SignUpUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, config: Arc<AuthConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            user_repo,
            config,
            clock,
        }
    }

    pub async fn execute(&self, input: SignUpInput) -> AuthResult<SignUpOutput> {
        let role = match input.role.as_deref() {
            None => Role::Student,
            Some(code) => Role::from_code(code)
                .filter(Role::is_self_assignable)
                .ok_or_else(|| AuthError::RoleNotSelfAssignable(code.to_string()))?,
        };

        let email = Email::new(input.email)?;
        let full_name = FullName::new(&input.full_name)?;
        let raw_password = RawPassword::for_account(input.password, &email, &full_name)?;

        if self.user_repo.exists_by_email(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = UserPassword::from_raw(&raw_password, self.config.pepper())?;

        let now = self.clock.now();
        let user = User::new(email, full_name, role, now);
        let credentials = Credentials::new(user.user_id, password_hash, now);
        let profile = Profile::empty(user.user_id, now);

        self.user_repo
            .create_account(&user, &credentials, &profile)
            .await?;

        tracing::info!(
            user_id = %user.user_id,
            role = %role,
            "User signed up"
        );

        Ok(SignUpOutput {
            user_id: user.user_id,
            role,
        })
    }
}
