//! User Status Value Object
//!
//! - **Active**: normal account
//! - **Suspended**: set by an administrator; cannot sign in or refresh

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum UserStatus {
    #[default]
    #[display("active")]
    Active = 0,

    #[display("suspended")]
    Suspended = 1,
}

impl UserStatus {
    /// Numeric ID for database storage
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
        }
    }

    #[inline]
    pub const fn can_sign_in(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Unknown ids fall back to `Suspended`
    pub fn from_id(id: i16) -> Self {
        match id {
            0 => Self::Active,
            _ => Self::Suspended,
        }
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            other => Err(format!("Unknown user status: {}", other)),
        }
    }
}
