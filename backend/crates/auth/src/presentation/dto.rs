//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use kernel::role::Role;
use platform::storage::media_url;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::{ProfileView, TokenPair};
use crate::domain::entity::user::User;
use crate::domain::value_object::user_status::UserStatus;

// ============================================================================
// Sign Up
// ============================================================================

/// Sign up request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 512))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
    /// `student` (default) or `instructor`
    pub role: Option<String>,
}

/// Sign up response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpResponse {
    pub user_id: UserId,
    pub role: Role,
}

// ============================================================================
// Sign In / Refresh
// ============================================================================

/// Sign in request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 512))]
    pub password: String,
}

/// Access token response (sign in and refresh)
///
/// The refresh token travels only in the HttpOnly cookie.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

impl TokenResponse {
    pub fn new(tokens: &TokenPair, user: &User) -> Self {
        Self {
            access_token: tokens.access_token.clone(),
            token_type: "Bearer",
            expires_at: tokens.access_expires_at,
            user: UserResponse::from(user),
        }
    }
}

// ============================================================================
// Passwords
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, max = 128))]
    pub token: String,
    #[validate(length(min = 1, max = 512))]
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, max = 512))]
    pub current_password: String,
    #[validate(length(min = 1, max = 512))]
    pub new_password: String,
}

// ============================================================================
// Users
// ============================================================================

/// Account info
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: UserId,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub status: UserStatus,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email.as_str().to_string(),
            full_name: user.full_name.as_str().to_string(),
            role: user.role,
            status: user.status,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

/// Admin user listing query (`?page=1&perPage=20&role=instructor&search=ada`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRoleRequest {
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStatusRequest {
    pub status: UserStatus,
}

// ============================================================================
// Profiles
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub full_name: Option<String>,
    #[validate(length(max = 120))]
    pub headline: Option<String>,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    #[validate(length(max = 255))]
    pub website_url: Option<String>,
}

/// Profile view; `email` only appears on the owner's own profile
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user_id: UserId,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: Role,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub website_url: Option<String>,
    pub avatar_url: Option<String>,
    pub member_since: DateTime<Utc>,
}

impl ProfileResponse {
    pub fn own(view: &ProfileView) -> Self {
        Self {
            email: Some(view.user.email.as_str().to_string()),
            ..Self::public(view)
        }
    }

    pub fn public(view: &ProfileView) -> Self {
        Self {
            user_id: view.user.user_id,
            full_name: view.user.full_name.as_str().to_string(),
            email: None,
            role: view.user.role,
            headline: view.profile.headline.clone(),
            bio: view.profile.bio.clone(),
            website_url: view.profile.website_url.clone(),
            avatar_url: view.profile.avatar_key.as_deref().map(media_url),
            member_since: view.user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarResponse {
    pub avatar_key: String,
    pub avatar_url: String,
}
