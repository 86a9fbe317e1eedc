//! Payout Status Value Object
//!
//! - **Requested**: waiting for an administrator
//! - **Paid**: approved and transferred
//! - **Rejected**: declined with a note

use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum PayoutStatus {
    #[display("requested")]
    Requested = 0,

    #[display("paid")]
    Paid = 1,

    #[display("rejected")]
    Rejected = 2,
}

impl PayoutStatus {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    /// Only open requests can be processed
    #[inline]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Requested)
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(Self::Requested),
            1 => Some(Self::Paid),
            2 => Some(Self::Rejected),
            _ => None,
        }
    }
}
