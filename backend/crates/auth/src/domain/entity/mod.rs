//! Domain Entities

pub mod credentials;
pub mod password_reset;
pub mod profile;
pub mod refresh_token;
pub mod user;
