//! Access Tokens (JWT, HS256)
//!
//! Short-lived bearer tokens carrying the caller's id and role. Long-lived
//! sessions are represented by opaque refresh tokens (see `crypto`), never
//! by JWTs.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use kernel::id::UserId;
use kernel::role::Role;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::crypto::random_bytes;

/// Minimum HMAC key size accepted for signing
pub const MIN_SECRET_BYTES: usize = 32;

/// Issuer claim stamped into every token
pub const ISSUER: &str = "lms-api";

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Signing secret must be at least {MIN_SECRET_BYTES} bytes")]
    WeakSecret,

    #[error("Access token expired")]
    Expired,

    #[error("Access token invalid")]
    Invalid,

    #[error("Access token encoding failed: {0}")]
    Encoding(String),
}

/// Claims of an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user id)
    pub sub: Uuid,
    pub role: Role,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    /// Unique token id, only used for log correlation
    pub jti: Uuid,
}

impl AccessClaims {
    pub fn user_id(&self) -> UserId {
        UserId::from_uuid(self.sub)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Token freshly minted by [`JwtKeys::issue`]
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: AccessClaims,
}

/// HS256 signing and verification keys
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8]) -> Result<Self, JwtError> {
        if secret.len() < MIN_SECRET_BYTES {
            return Err(JwtError::WeakSecret);
        }
        Ok(Self::build(secret))
    }

    /// Keys from a fresh random secret (development, tests)
    pub fn generate() -> Self {
        Self::build(&random_bytes(MIN_SECRET_BYTES))
    }

    fn build(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 5;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Sign a token for `user_id` valid from `now` for `ttl`
    pub fn issue(
        &self,
        user_id: UserId,
        role: Role,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<IssuedToken, JwtError> {
        let claims = AccessClaims {
            sub: user_id.into_uuid(),
            role,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| JwtError::Encoding(e.to_string()))?;

        Ok(IssuedToken { token, claims })
    }

    /// Verify signature, issuer and expiry
    pub fn verify(&self, token: &str) -> Result<AccessClaims, JwtError> {
        decode::<AccessClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid,
            })
    }
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys").field("secret", &"[REDACTED]").finish()
    }
}
