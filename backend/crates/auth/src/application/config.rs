//! Application Configuration
//!
//! Configuration for the Auth application layer.

use chrono::Duration;
use platform::cookie::CookieConfig;
use platform::jwt::JwtKeys;
use platform::storage::DEFAULT_MAX_IMAGE_BYTES;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 keys for access tokens
    pub jwt_keys: JwtKeys,
    /// Access token lifetime (15 minutes)
    pub access_token_ttl: Duration,
    /// Refresh token lifetime (30 days)
    pub refresh_token_ttl: Duration,
    /// Password reset link lifetime (1 hour)
    pub reset_token_ttl: Duration,
    /// Consecutive failures before lockout
    pub max_login_failures: u16,
    /// Lockout duration
    pub lockout_duration: Duration,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy of the refresh cookie
    pub cookie_same_site: SameSite,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Origin of the web client, used in emailed links
    pub public_base_url: String,
    /// Avatar upload limit
    pub max_avatar_bytes: usize,
}

impl AuthConfig {
    pub fn new(jwt_keys: JwtKeys) -> Self {
        Self {
            jwt_keys,
            access_token_ttl: Duration::minutes(15),
            refresh_token_ttl: Duration::days(30),
            reset_token_ttl: Duration::hours(1),
            max_login_failures: 5,
            lockout_duration: Duration::minutes(15),
            cookie_secure: true,
            cookie_same_site: SameSite::Strict,
            password_pepper: None,
            public_base_url: "http://localhost:40922".to_string(),
            max_avatar_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }

    /// Create config with a random signing secret
    pub fn with_random_secret() -> Self {
        Self::new(JwtKeys::generate())
    }

    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secret()
        }
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    /// Cookie carrying the refresh token
    pub fn refresh_cookie(&self) -> CookieConfig {
        CookieConfig {
            same_site: self.cookie_same_site,
            ..CookieConfig::refresh_token(self.cookie_secure, self.refresh_token_ttl.num_seconds())
        }
    }

    /// Link mailed for a password reset
    pub fn reset_link(&self, token: &str) -> String {
        format!(
            "{}/reset-password?token={}",
            self.public_base_url.trim_end_matches('/'),
            token
        )
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::with_random_secret()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.access_token_ttl, Duration::minutes(15));
        assert_eq!(config.refresh_token_ttl, Duration::days(30));
        assert_eq!(config.max_login_failures, 5);
        assert!(config.cookie_secure);
        assert!(config.pepper().is_none());
    }

    #[test]
    fn test_development_cookie() {
        let config = AuthConfig::development();
        let cookie = config.refresh_cookie().build_set_cookie("t");
        assert!(!cookie.contains("Secure"));
        assert!(cookie.contains("Path=/api/auth"));
        assert!(cookie.contains(&format!("Max-Age={}", 30 * 24 * 3600)));
    }

    #[test]
    fn test_reset_link() {
        let config = AuthConfig {
            public_base_url: "https://learn.example.com/".to_string(),
            ..AuthConfig::default()
        };
        assert_eq!(
            config.reset_link("abc"),
            "https://learn.example.com/reset-password?token=abc"
        );
    }
}
