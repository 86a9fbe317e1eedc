//! Enrollment Source Value Object
//!
//! - **Free**: self-enrollment in a free course
//! - **Purchase**: created by a successful checkout
//! - **Admin**: granted by an administrator

use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum EnrollmentSource {
    #[display("free")]
    Free = 0,

    #[display("purchase")]
    Purchase = 1,

    #[display("admin")]
    Admin = 2,
}

impl EnrollmentSource {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(Self::Free),
            1 => Some(Self::Purchase),
            2 => Some(Self::Admin),
            _ => None,
        }
    }
}
