//! Authenticated caller
//!
//! The auth middleware verifies the access token and stores a
//! [`CurrentUser`] in the request extensions; handlers in every context
//! extract it from there.

use crate::error::app_error::{AppError, AppResult};
use crate::id::UserId;
use crate::role::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: UserId,
    pub role: Role,
}

impl CurrentUser {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// True for the owner of a resource or any admin
    pub fn owns_or_admin(&self, owner: &UserId) -> bool {
        &self.user_id == owner || self.is_admin()
    }

    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden("Administrator role required"))
        }
    }

    pub fn require_instructor(&self) -> AppResult<()> {
        if self.role.can_teach() {
            Ok(())
        } else {
            Err(AppError::forbidden("Instructor role required")
                .with_action("Ask an administrator to grant the instructor role"))
        }
    }
}

#[cfg(feature = "axum")]
mod extract {
    use super::CurrentUser;
    use crate::error::app_error::AppError;
    use axum::extract::{FromRequestParts, OptionalFromRequestParts};
    use http::request::Parts;
    use std::convert::Infallible;

    impl<S> FromRequestParts<S> for CurrentUser
    where
        S: Send + Sync,
    {
        type Rejection = AppError;

        async fn from_request_parts(
            parts: &mut Parts,
            _state: &S,
        ) -> Result<Self, Self::Rejection> {
            parts
                .extensions
                .get::<CurrentUser>()
                .copied()
                .ok_or_else(|| {
                    AppError::unauthorized("Authentication required")
                        .with_action("Sign in and retry with a bearer token")
                })
        }
    }

    impl<S> OptionalFromRequestParts<S> for CurrentUser
    where
        S: Send + Sync,
    {
        type Rejection = Infallible;

        async fn from_request_parts(
            parts: &mut Parts,
            _state: &S,
        ) -> Result<Option<Self>, Self::Rejection> {
            Ok(parts.extensions.get::<CurrentUser>().copied())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_guards() {
        let student = CurrentUser::new(UserId::new(), Role::Student);
        let instructor = CurrentUser::new(UserId::new(), Role::Instructor);
        let admin = CurrentUser::new(UserId::new(), Role::Admin);

        assert_eq!(student.require_instructor().unwrap_err().status_code(), 403);
        assert!(instructor.require_instructor().is_ok());
        assert!(admin.require_instructor().is_ok());

        assert!(student.require_admin().is_err());
        assert!(instructor.require_admin().is_err());
        assert!(admin.require_admin().is_ok());
    }

    #[test]
    fn test_owns_or_admin() {
        let owner = CurrentUser::new(UserId::new(), Role::Instructor);
        let other = CurrentUser::new(UserId::new(), Role::Instructor);
        let admin = CurrentUser::new(UserId::new(), Role::Admin);

        assert!(owner.owns_or_admin(&owner.user_id));
        assert!(!other.owns_or_admin(&owner.user_id));
        assert!(admin.owns_or_admin(&owner.user_id));
    }
}
