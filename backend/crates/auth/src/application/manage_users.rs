//! Admin User Management Use Cases

use std::sync::Arc;

use kernel::auth::CurrentUser;
use kernel::clock::Clock;
use kernel::id::UserId;
use kernel::page::{Page, PageRequest};
use kernel::role::Role;

use crate::domain::entity::user::User;
use crate::domain::repository::{RefreshTokenRepository, UserFilter, UserRepository};
use crate::domain::value_object::user_status::UserStatus;
use crate::error::{AuthError, AuthResult};

// ============================================================================
// List
// ============================================================================

pub struct ListUsersUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> ListUsersUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn execute(
        &self,
        caller: CurrentUser,
        filter: UserFilter,
        page: PageRequest,
    ) -> AuthResult<Page<User>> {
        caller.require_admin()?;
        let filter = UserFilter {
            search: filter
                .search
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty()),
            ..filter
        };
        self.user_repo.list(&filter, page.normalized()).await
    }
}

// ============================================================================
// Change role / status
// ============================================================================

pub struct ManageUserUseCase<U, T>
where
    U: UserRepository,
    T: RefreshTokenRepository,
{
    user_repo: Arc<U>,
    token_repo: Arc<T>,
    clock: Arc<dyn Clock>,
}

impl<U, T> ManageUserUseCase<U, T>
where
    U: UserRepository,
    T: RefreshTokenRepository,
{
    pub fn new(user_repo: Arc<U>, token_repo: Arc<T>, clock: Arc<dyn Clock>) -> Self {
        Self {
            user_repo,
            token_repo,
            clock,
        }
    }

    async fn load_target(&self, caller: &CurrentUser, target: UserId) -> AuthResult<User> {
        caller.require_admin()?;
        if caller.user_id == target {
            return Err(AuthError::CannotModifySelf);
        }
        self.user_repo
            .find_by_id(&target)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    pub async fn change_role(
        &self,
        caller: CurrentUser,
        target: UserId,
        role: Role,
    ) -> AuthResult<User> {
        let mut user = self.load_target(&caller, target).await?;
        if user.role == role {
            return Ok(user);
        }

        let previous = user.role;
        user.change_role(role, self.clock.now());
        self.user_repo.update(&user).await?;

        tracing::info!(
            admin_id = %caller.user_id,
            user_id = %target,
            from = %previous,
            to = %role,
            "User role changed"
        );

        Ok(user)
    }

    /// Suspending signs the user out everywhere
    pub async fn change_status(
        &self,
        caller: CurrentUser,
        target: UserId,
        status: UserStatus,
    ) -> AuthResult<User> {
        let mut user = self.load_target(&caller, target).await?;
        if user.status == status {
            return Ok(user);
        }

        let now = self.clock.now();
        user.change_status(status, now);
        self.user_repo.update(&user).await?;

        let revoked = if status.can_sign_in() {
            0
        } else {
            self.token_repo.revoke_all_for_user(&target, now).await?
        };

        tracing::info!(
            admin_id = %caller.user_id,
            user_id = %target,
            status = %status,
            revoked_sessions = revoked,
            "User status changed"
        );

        Ok(user)
    }
}
