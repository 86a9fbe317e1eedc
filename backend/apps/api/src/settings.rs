//! Runtime Settings
//!
//! Read once at start-up from the environment (after `.env` is loaded).

use anyhow::{Context, bail};
use auth::AuthConfig;
use base64::Engine;
use base64::engine::general_purpose;
use billing::BillingConfig;
use platform::jwt::JwtKeys;
use platform::mail::SmtpConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";
const MIN_JWT_SECRET_BYTES: usize = 32;

/// Not `Debug`: holds the signing secret and SMTP password
#[derive(Clone)]
pub struct Settings {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub frontend_origins: Vec<String>,
    /// `None` only in debug builds, where a random key is generated
    pub jwt_secret: Option<Vec<u8>>,
    pub password_pepper: Option<Vec<u8>>,
    pub cookie_secure: bool,
    pub media_root: PathBuf,
    pub public_base_url: String,
    pub smtp: Option<SmtpConfig>,
    pub billing: BillingConfig,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from any variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let database_url = var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let jwt_secret = match var("JWT_SECRET") {
            Some(encoded) => {
                let bytes = general_purpose::STANDARD
                    .decode(&encoded)
                    .context("JWT_SECRET must be base64")?;
                if bytes.len() < MIN_JWT_SECRET_BYTES {
                    bail!("JWT_SECRET must decode to at least {MIN_JWT_SECRET_BYTES} bytes");
                }
                Some(bytes)
            }
            None if cfg!(debug_assertions) => None,
            None => bail!("JWT_SECRET must be set in production"),
        };

        let smtp = match var("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: parse_or(var("SMTP_PORT"), "SMTP_PORT", 587)?,
                username: var("SMTP_USERNAME"),
                password: var("SMTP_PASSWORD"),
                from: var("MAIL_FROM").unwrap_or_else(|| "no-reply@localhost".to_string()),
            }),
            None => None,
        };

        let defaults = BillingConfig::new();
        let currency = match var("CURRENCY") {
            Some(raw) => raw
                .parse()
                .map_err(|e| anyhow::anyhow!("CURRENCY: {e}"))?,
            None => defaults.currency,
        };
        let platform_fee_bps = parse_or(
            var("PLATFORM_FEE_BPS"),
            "PLATFORM_FEE_BPS",
            defaults.platform_fee_bps,
        )?;
        if !(0..=10_000).contains(&platform_fee_bps) {
            bail!("PLATFORM_FEE_BPS must be between 0 and 10000");
        }

        Ok(Self {
            database_url,
            database_max_connections: parse_or(
                var("DATABASE_MAX_CONNECTIONS"),
                "DATABASE_MAX_CONNECTIONS",
                5,
            )?,
            bind_addr: parse_or(
                var("BIND_ADDR"),
                "BIND_ADDR",
                SocketAddr::from_str(DEFAULT_BIND_ADDR)?,
            )?,
            frontend_origins: var("FRONTEND_ORIGINS")
                .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGINS.to_string())
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            jwt_secret,
            password_pepper: var("PASSWORD_PEPPER").map(String::into_bytes),
            cookie_secure: parse_or(var("COOKIE_SECURE"), "COOKIE_SECURE", true)?,
            media_root: var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./media")),
            public_base_url: var("PUBLIC_BASE_URL")
                .unwrap_or_else(|| "http://localhost:40922".to_string()),
            smtp,
            billing: BillingConfig {
                currency,
                platform_fee_bps,
                min_payout_cents: parse_or(
                    var("MIN_PAYOUT_CENTS"),
                    "MIN_PAYOUT_CENTS",
                    defaults.min_payout_cents,
                )?,
            },
        })
    }

    pub fn auth_config(&self) -> anyhow::Result<AuthConfig> {
        let jwt_keys = match &self.jwt_secret {
            Some(secret) => JwtKeys::from_secret(secret)?,
            None => {
                tracing::warn!(
                    "JWT_SECRET not set, using a random key; tokens end with the process"
                );
                JwtKeys::generate()
            }
        };

        Ok(AuthConfig {
            cookie_secure: self.cookie_secure,
            password_pepper: self.password_pepper.clone(),
            public_base_url: self.public_base_url.clone(),
            ..AuthConfig::new(jwt_keys)
        })
    }
}

fn parse_or<T>(raw: Option<String>, name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{name} is invalid: {e}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> anyhow::Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[("DATABASE_URL", "postgres://localhost/lms")]).unwrap();
        assert_eq!(s.database_max_connections, 5);
        assert_eq!(s.bind_addr.port(), 31113);
        assert_eq!(s.frontend_origins.len(), 2);
        assert!(s.cookie_secure);
        assert!(s.smtp.is_none());
        assert_eq!(s.billing.platform_fee_bps, 2000);
        assert_eq!(s.billing.min_payout_cents, 1000);
        assert_eq!(s.billing.currency.as_str(), "USD");
    }

    #[test]
    fn test_database_url_is_required() {
        assert!(settings(&[]).is_err());
        assert!(settings(&[("DATABASE_URL", "  ")]).is_err());
    }

    #[test]
    fn test_overrides() {
        let s = settings(&[
            ("DATABASE_URL", "postgres://db/lms"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("FRONTEND_ORIGINS", "https://learn.example.com, "),
            ("COOKIE_SECURE", "false"),
            ("SMTP_HOST", "smtp.example.com"),
            ("CURRENCY", "eur"),
            ("PLATFORM_FEE_BPS", "1500"),
        ])
        .unwrap();

        assert_eq!(s.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(s.frontend_origins, vec!["https://learn.example.com"]);
        assert!(!s.cookie_secure);
        let smtp = s.smtp.unwrap();
        assert_eq!(smtp.port, 587);
        assert_eq!(s.billing.currency.as_str(), "EUR");
        assert_eq!(s.billing.platform_fee_bps, 1500);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let base = ("DATABASE_URL", "postgres://db/lms");
        assert!(settings(&[base, ("PLATFORM_FEE_BPS", "12000")]).is_err());
        assert!(settings(&[base, ("DATABASE_MAX_CONNECTIONS", "many")]).is_err());
        assert!(settings(&[base, ("JWT_SECRET", "c2hvcnQ=")]).is_err());
    }

    #[test]
    fn test_jwt_secret_decodes() {
        let secret = general_purpose::STANDARD.encode([7u8; 32]);
        let s = settings(&[
            ("DATABASE_URL", "postgres://db/lms"),
            ("JWT_SECRET", &secret),
        ])
        .unwrap();
        assert_eq!(s.jwt_secret.as_deref(), Some(&[7u8; 32][..]));
        assert!(s.auth_config().is_ok());
    }
}
