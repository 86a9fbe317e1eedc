//! User Entity
//!
//! Account identity and authorization data. Secrets live in
//! [`Credentials`](super::credentials::Credentials).

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use kernel::role::Role;

use crate::domain::value_object::{email::Email, full_name::FullName, user_status::UserStatus};

#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    /// Unique, also the sign-in identifier
    pub email: Email,
    pub full_name: FullName,
    pub role: Role,
    pub status: UserStatus,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: Email, full_name: FullName, role: Role, now: DateTime<Utc>) -> Self {
        Self {
            user_id: UserId::new(),
            email,
            full_name,
            role,
            status: UserStatus::Active,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn can_sign_in(&self) -> bool {
        self.status.can_sign_in()
    }

    pub fn record_login(&mut self, now: DateTime<Utc>) {
        self.last_login_at = Some(now);
        self.updated_at = now;
    }

    pub fn rename(&mut self, full_name: FullName, now: DateTime<Utc>) {
        self.full_name = full_name;
        self.updated_at = now;
    }

    pub fn change_role(&mut self, role: Role, now: DateTime<Utc>) {
        self.role = role;
        self.updated_at = now;
    }

    pub fn change_status(&mut self, status: UserStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(now: DateTime<Utc>) -> User {
        User::new(
            Email::new("ada@example.com").unwrap(),
            FullName::new("Ada Lovelace").unwrap(),
            Role::Student,
            now,
        )
    }

    #[test]
    fn test_new_user_is_active() {
        let now = Utc::now();
        let user = user(now);
        assert!(user.can_sign_in());
        assert_eq!(user.created_at, now);
        assert!(user.last_login_at.is_none());
    }

    #[test]
    fn test_suspend_blocks_sign_in() {
        let now = Utc::now();
        let mut user = user(now);
        user.change_status(UserStatus::Suspended, now);
        assert!(!user.can_sign_in());
    }
}
