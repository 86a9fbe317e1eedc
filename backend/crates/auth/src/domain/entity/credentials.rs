//! Credentials Entity
//!
//! Password hash and lockout bookkeeping, one row per user.

use chrono::{DateTime, Duration, Utc};
use kernel::id::UserId;

use crate::domain::value_object::user_password::UserPassword;

#[derive(Debug, Clone)]
pub struct Credentials {
    pub user_id: UserId,
    pub password_hash: UserPassword,
    /// Consecutive failed sign-ins
    pub login_failed_count: u16,
    pub locked_until: Option<DateTime<Utc>>,
    pub password_changed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Credentials {
    pub fn new(user_id: UserId, password_hash: UserPassword, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            password_hash,
            login_failed_count: 0,
            locked_until: None,
            password_changed_at: now,
            updated_at: now,
        }
    }

    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }

    /// Count a failure; lock once `max_failures` is reached
    pub fn record_failure(&mut self, now: DateTime<Utc>, max_failures: u16, lockout: Duration) {
        // A lock that has already expired starts a fresh window
        if self.locked_until.is_some_and(|until| now >= until) {
            self.login_failed_count = 0;
            self.locked_until = None;
        }

        self.login_failed_count = self.login_failed_count.saturating_add(1);
        self.updated_at = now;

        if self.login_failed_count >= max_failures {
            self.locked_until = Some(now + lockout);
        }
    }

    pub fn reset_failures(&mut self, now: DateTime<Utc>) {
        self.login_failed_count = 0;
        self.locked_until = None;
        self.updated_at = now;
    }

    /// Replace the hash; also clears any lockout
    pub fn change_password(&mut self, password_hash: UserPassword, now: DateTime<Utc>) {
        self.password_hash = password_hash;
        self.password_changed_at = now;
        self.reset_failures(now);
    }
}
