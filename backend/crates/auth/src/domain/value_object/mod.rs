//! Value Objects

pub mod email;
pub mod full_name;
pub mod user_password;
pub mod user_status;
