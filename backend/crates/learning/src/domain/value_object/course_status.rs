//! Course Status Value Object
//!
//! ```text
//! Draft ──submit──▶ PendingReview ──approve──▶ Published ──archive──▶ Archived
//!                        ▲    │
//!                 submit │    └──reject──▶ Rejected
//!                        └───────────────────┘
//! ```

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum CourseStatus {
    #[default]
    #[display("draft")]
    Draft = 0,

    #[display("pending_review")]
    PendingReview = 1,

    #[display("published")]
    Published = 2,

    #[display("rejected")]
    Rejected = 3,

    #[display("archived")]
    Archived = 4,
}

impl CourseStatus {
    pub const ALL: [CourseStatus; 5] = [
        CourseStatus::Draft,
        CourseStatus::PendingReview,
        CourseStatus::Published,
        CourseStatus::Rejected,
        CourseStatus::Archived,
    ];

    /// Numeric ID for database storage
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingReview => "pending_review",
            Self::Published => "published",
            Self::Rejected => "rejected",
            Self::Archived => "archived",
        }
    }

    #[inline]
    pub const fn can_transition_to(&self, next: CourseStatus) -> bool {
        use CourseStatus::*;
        matches!(
            (self, next),
            (Draft, PendingReview)
                | (Rejected, PendingReview)
                | (PendingReview, Published)
                | (PendingReview, Rejected)
                | (Published, Archived)
        )
    }

    /// Content is frozen while a moderator looks at it
    #[inline]
    pub const fn is_editable(&self) -> bool {
        !matches!(self, Self::PendingReview)
    }

    pub fn from_id(id: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }
}

impl FromStr for CourseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.code() == s)
            .ok_or_else(|| format!("Unknown course status: {}", s))
    }
}
