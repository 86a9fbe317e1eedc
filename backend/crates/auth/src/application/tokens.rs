//! Token pair handed out on sign-in and refresh

use chrono::{DateTime, Utc};
use platform::jwt::AccessClaims;

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::error::AuthResult;

/// Access JWT plus the clear-text refresh token for the cookie
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
}

pub(crate) fn issue_access_token(
    config: &AuthConfig,
    user: &User,
    now: DateTime<Utc>,
) -> AuthResult<(String, DateTime<Utc>)> {
    let issued = config
        .jwt_keys
        .issue(user.user_id, user.role, now, config.access_token_ttl)?;
    Ok((issued.token, now + config.access_token_ttl))
}

/// Verify a bearer token
pub fn verify_access_token(config: &AuthConfig, token: &str) -> AuthResult<AccessClaims> {
    Ok(config.jwt_keys.verify(token)?)
}
