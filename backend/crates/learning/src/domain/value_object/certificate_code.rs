//! Certificate Code Value Object
//!
//! Public, URL-safe verification code printed on a certificate. Wraps a
//! 21-character Nanoid.

use nid::Nanoid;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CertificateCode(Nanoid);

impl CertificateCode {
    #[inline]
    pub fn generate() -> Self {
        Self(Nanoid::new())
    }

    /// `None` for anything that is not a well-formed code
    pub fn parse(s: &str) -> Option<Self> {
        Nanoid::from_str(s.trim()).ok().map(Self)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for CertificateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes() {
        let a = CertificateCode::generate();
        let b = CertificateCode::generate();
        assert_eq!(a.as_str().len(), 21);
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse() {
        let code = CertificateCode::parse("0123456789abcdefghi01").unwrap();
        assert_eq!(code.to_string(), "0123456789abcdefghi01");
        assert!(CertificateCode::parse("not a code!").is_none());
        assert!(CertificateCode::parse("").is_none());
    }
}
