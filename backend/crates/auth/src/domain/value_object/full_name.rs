//! Full Name Value Object

use kernel::error::app_error::{AppError, AppResult};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

pub const FULL_NAME_MAX_LENGTH: usize = 100;

/// Display name of a person, NFKC-normalized and trimmed, 1..=100 chars
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullName(String);

impl FullName {
    pub fn new(raw: impl AsRef<str>) -> AppResult<Self> {
        let normalized: String = raw.as_ref().nfkc().collect();
        // Collapse runs of whitespace
        let name = normalized.split_whitespace().collect::<Vec<_>>().join(" ");

        if name.is_empty() {
            return Err(AppError::bad_request("Full name cannot be empty"));
        }

        let len = name.chars().count();
        if len > FULL_NAME_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "Full name must be at most {} characters (got {})",
                FULL_NAME_MAX_LENGTH, len
            )));
        }

        if name.chars().any(char::is_control) {
            return Err(AppError::bad_request("Full name contains invalid characters"));
        }

        Ok(Self(name))
    }

    pub fn from_db(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FullName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
