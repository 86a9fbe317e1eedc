//! Application Layer
//!
//! Use cases and application services.

pub mod change_password;
pub mod config;
pub mod manage_users;
pub mod me;
pub mod password_reset;
pub mod profile;
pub mod refresh;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;
pub mod tokens;

// Re-exports
pub use change_password::{ChangePasswordInput, ChangePasswordUseCase};
pub use config::AuthConfig;
pub use manage_users::{ListUsersUseCase, ManageUserUseCase};
pub use me::MeUseCase;
pub use password_reset::{ForgotPasswordUseCase, ResetPasswordUseCase};
pub use profile::{
    GetProfileUseCase, ProfileView, UpdateProfileInput, UpdateProfileUseCase, UploadAvatarUseCase,
};
pub use refresh::{RefreshOutput, RefreshUseCase};
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use sign_up::{SignUpInput, SignUpOutput, SignUpUseCase};
pub use tokens::{TokenPair, verify_access_token};
