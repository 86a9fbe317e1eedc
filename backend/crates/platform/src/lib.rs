//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, random tokens, Base64)
//! - Password hashing (Argon2id, NIST SP 800-63B compliant)
//! - Access tokens (HS256 JWT)
//! - Cookie management
//! - Client identification from request headers
//! - Outbound email (SMTP or log-only)
//! - Object storage for uploaded images

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod jwt;
pub mod mail;
pub mod password;
pub mod storage;
