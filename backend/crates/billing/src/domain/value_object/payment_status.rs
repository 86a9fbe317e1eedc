//! Payment Status Value Object
//!
//! ```text
//! pending ──► succeeded ──► refunded
//!    │
//!    └──────► failed
//! ```

use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum PaymentStatus {
    /// Recorded, gateway not answered yet
    #[display("pending")]
    Pending = 0,

    #[display("succeeded")]
    Succeeded = 1,

    /// Declined or the gateway was unreachable
    #[display("failed")]
    Failed = 2,

    #[display("refunded")]
    Refunded = 3,
}

impl PaymentStatus {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Succeeded) | (Pending, Failed) | (Succeeded, Refunded)
        )
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(Self::Pending),
            1 => Some(Self::Succeeded),
            2 => Some(Self::Failed),
            3 => Some(Self::Refunded),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        use PaymentStatus::*;
        assert!(Pending.can_transition_to(Succeeded));
        assert!(Pending.can_transition_to(Failed));
        assert!(Succeeded.can_transition_to(Refunded));
        assert!(!Failed.can_transition_to(Refunded));
        assert!(!Refunded.can_transition_to(Succeeded));
        assert!(!Pending.can_transition_to(Refunded));
    }

    #[test]
    fn test_id_roundtrip() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Succeeded,
            PaymentStatus::Failed,
            PaymentStatus::Refunded,
        ] {
            assert_eq!(PaymentStatus::from_id(status.id()), Some(status));
        }
        assert_eq!(PaymentStatus::from_id(9), None);
    }
}
