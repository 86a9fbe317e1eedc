//! Refresh Token Entity
//!
//! Opaque, long-lived token stored as a SHA-256 hash. Tokens rotate on
//! every use; all tokens descending from one sign-in share a `family_id`,
//! so presenting a rotated token again revokes the whole family.

use chrono::{DateTime, Duration, Utc};
use kernel::id::{RefreshTokenId, UserId};
use platform::client::ClientInfo;
use platform::crypto::{random_token, token_hash};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RefreshToken {
    pub token_id: RefreshTokenId,
    pub user_id: UserId,
    pub token_hash: Vec<u8>,
    pub family_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    /// Successor after rotation
    pub replaced_by: Option<RefreshTokenId>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A token together with its clear-text value (only ever sent to the client)
#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    pub token: RefreshToken,
    pub raw: String,
}

impl RefreshToken {
    /// Start a new family (sign-in)
    pub fn issue(
        user_id: UserId,
        client: &ClientInfo,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> IssuedRefreshToken {
        Self::issue_in_family(user_id, Uuid::new_v4(), client, now, ttl)
    }

    /// Successor of `self` in the same family (rotation)
    pub fn rotate(
        &self,
        client: &ClientInfo,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> IssuedRefreshToken {
        Self::issue_in_family(self.user_id, self.family_id, client, now, ttl)
    }

    fn issue_in_family(
        user_id: UserId,
        family_id: Uuid,
        client: &ClientInfo,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> IssuedRefreshToken {
        let raw = random_token();
        let token = Self {
            token_id: RefreshTokenId::new(),
            user_id,
            token_hash: token_hash(&raw),
            family_id,
            expires_at: now + ttl,
            revoked_at: None,
            replaced_by: None,
            client_ip: client.ip_string(),
            user_agent: client.user_agent.clone(),
            created_at: now,
        };
        IssuedRefreshToken { token, raw }
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
