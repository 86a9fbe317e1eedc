//! Password Reset Entity
//!
//! Single-use token mailed to the account owner; only its hash is stored.

use chrono::{DateTime, Duration, Utc};
use kernel::id::UserId;
use platform::crypto::{random_token, token_hash};

#[derive(Debug, Clone)]
pub struct PasswordReset {
    pub token_hash: Vec<u8>,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PasswordReset {
    /// Returns the entity and the clear-text token for the email link
    pub fn issue(user_id: UserId, now: DateTime<Utc>, ttl: Duration) -> (Self, String) {
        let raw = random_token();
        let reset = Self {
            token_hash: token_hash(&raw),
            user_id,
            expires_at: now + ttl,
            used_at: None,
            created_at: now,
        };
        (reset, raw)
    }

    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && now < self.expires_at
    }
}
