//! Certificate Entity
//!
//! One per (user, course), identified publicly by its code.

use chrono::{DateTime, Utc};
use kernel::id::{CertificateId, CourseId, UserId};

use crate::domain::value_object::certificate_code::CertificateCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub certificate_id: CertificateId,
    pub code: CertificateCode,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub issued_at: DateTime<Utc>,
}

impl Certificate {
    pub fn issue(user_id: UserId, course_id: CourseId, now: DateTime<Utc>) -> Self {
        Self {
            certificate_id: CertificateId::new(),
            code: CertificateCode::generate(),
            user_id,
            course_id,
            issued_at: now,
        }
    }
}
