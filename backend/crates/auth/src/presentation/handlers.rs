//! HTTP Handlers

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use kernel::auth::CurrentUser;
use kernel::clock::Clock;
use kernel::id::UserId;
use kernel::page::{Page, PageRequest};
use platform::cookie::extract_cookie;
use platform::mail::Mailer;
use platform::storage::{ObjectStorage, media_url};
use std::sync::Arc;
use validator::Validate;

use crate::application::config::AuthConfig;
use crate::application::{
    ChangePasswordInput, ChangePasswordUseCase, ForgotPasswordUseCase, GetProfileUseCase,
    ListUsersUseCase, ManageUserUseCase, MeUseCase, RefreshUseCase, ResetPasswordUseCase,
    SignInInput, SignInUseCase, SignOutUseCase, SignUpInput, SignUpUseCase, UpdateProfileInput,
    UpdateProfileUseCase, UploadAvatarUseCase,
};
use crate::domain::repository::{
    CredentialsRepository, PasswordResetRepository, ProfileRepository, RefreshTokenRepository,
    UserFilter, UserRepository,
};
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    AvatarResponse, ChangePasswordRequest, ChangeRoleRequest, ChangeStatusRequest,
    ForgotPasswordRequest, ProfileResponse, ResetPasswordRequest, SignInRequest, SignUpRequest,
    SignUpResponse, TokenResponse, UpdateProfileRequest, UserListQuery, UserResponse,
};
use crate::presentation::extract::Client;

/// Every repository the auth handlers need, implemented by one store
pub trait AuthRepositories:
    UserRepository
    + CredentialsRepository
    + RefreshTokenRepository
    + PasswordResetRepository
    + ProfileRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> AuthRepositories for T where
    T: UserRepository
        + CredentialsRepository
        + RefreshTokenRepository
        + PasswordResetRepository
        + ProfileRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<R>
where
    R: AuthRepositories,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
    pub clock: Arc<dyn Clock>,
    pub mailer: Arc<Mailer>,
    pub storage: Arc<ObjectStorage>,
}

// ============================================================================
// Sign Up
// ============================================================================

/// POST /api/auth/signup
pub async fn sign_up<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<SignUpRequest>,
) -> AuthResult<(StatusCode, Json<SignUpResponse>)>
where
    R: AuthRepositories,
{
    req.validate()?;

    let use_case = SignUpUseCase::new(
        state.repo.clone(),
        state.config.clone(),
        state.clock.clone(),
    );

    let output = use_case
        .execute(SignUpInput {
            email: req.email,
            password: req.password,
            full_name: req.full_name,
            role: req.role,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            user_id: output.user_id,
            role: output.role,
        }),
    ))
}

// ============================================================================
// Sign In / Refresh / Sign Out
// ============================================================================

/// POST /api/auth/signin
pub async fn sign_in<R>(
    State(state): State<AuthAppState<R>>,
    Client(client): Client,
    Json(req): Json<SignInRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthRepositories,
{
    req.validate()?;

    let use_case = SignInUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
        state.clock.clone(),
    );

    let output = use_case
        .execute(
            SignInInput {
                email: req.email,
                password: req.password,
            },
            client,
        )
        .await?;

    let cookie = state
        .config
        .refresh_cookie()
        .set_header(&output.tokens.refresh_token);

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(TokenResponse::new(&output.tokens, &output.user)),
    ))
}

/// POST /api/auth/refresh
///
/// A rejected refresh token is also cleared from the browser.
pub async fn refresh<R>(
    State(state): State<AuthAppState<R>>,
    Client(client): Client,
    headers: HeaderMap,
) -> Response
where
    R: AuthRepositories,
{
    let cookie_config = state.config.refresh_cookie();

    let result = match extract_cookie(&headers, &cookie_config.name) {
        Some(raw) => {
            let use_case = RefreshUseCase::new(
                state.repo.clone(),
                state.repo.clone(),
                state.config.clone(),
                state.clock.clone(),
            );
            use_case.execute(&raw, client).await
        }
        None => Err(AuthError::RefreshTokenInvalid),
    };

    match result {
        Ok(output) => (
            [(header::SET_COOKIE, cookie_config.set_header(&output.tokens.refresh_token))],
            Json(TokenResponse::new(&output.tokens, &output.user)),
        )
            .into_response(),
        Err(e) => ([(header::SET_COOKIE, cookie_config.delete_header())], e).into_response(),
    }
}

/// POST /api/auth/signout
pub async fn sign_out<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse>
where
    R: AuthRepositories,
{
    let cookie_config = state.config.refresh_cookie();
    let token = extract_cookie(&headers, &cookie_config.name);

    let use_case = SignOutUseCase::new(state.repo.clone(), state.clock.clone());
    use_case.execute(token.as_deref()).await?;

    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, cookie_config.delete_header())],
    ))
}

// ============================================================================
// Passwords
// ============================================================================

/// POST /api/auth/password/forgot
pub async fn forgot_password<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> AuthResult<StatusCode>
where
    R: AuthRepositories,
{
    req.validate()?;

    let use_case = ForgotPasswordUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
        state.clock.clone(),
    );
    use_case.execute(req.email).await?;

    Ok(StatusCode::ACCEPTED)
}

/// POST /api/auth/password/reset
pub async fn reset_password<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<ResetPasswordRequest>,
) -> AuthResult<StatusCode>
where
    R: AuthRepositories,
{
    req.validate()?;

    let use_case = ResetPasswordUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
        state.clock.clone(),
    );
    use_case.execute(&req.token, req.new_password).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/auth/password/change
pub async fn change_password<R>(
    State(state): State<AuthAppState<R>>,
    user: CurrentUser,
    Json(req): Json<ChangePasswordRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthRepositories,
{
    req.validate()?;

    let use_case = ChangePasswordUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
        state.clock.clone(),
    );
    use_case
        .execute(
            user.user_id,
            ChangePasswordInput {
                current_password: req.current_password,
                new_password: req.new_password,
            },
        )
        .await?;

    // Every refresh token was revoked, including this browser's
    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, state.config.refresh_cookie().delete_header())],
    ))
}

/// GET /api/auth/me
pub async fn me<R>(
    State(state): State<AuthAppState<R>>,
    user: CurrentUser,
) -> AuthResult<Json<UserResponse>>
where
    R: AuthRepositories,
{
    let use_case = MeUseCase::new(state.repo.clone());
    let account = use_case.execute(user.user_id).await?;

    Ok(Json(UserResponse::from(&account)))
}

// ============================================================================
// Profiles
// ============================================================================

/// GET /api/profile
pub async fn get_own_profile<R>(
    State(state): State<AuthAppState<R>>,
    user: CurrentUser,
) -> AuthResult<Json<ProfileResponse>>
where
    R: AuthRepositories,
{
    let use_case =
        GetProfileUseCase::new(state.repo.clone(), state.repo.clone(), state.clock.clone());
    let view = use_case.execute(user.user_id, false).await?;

    Ok(Json(ProfileResponse::own(&view)))
}

/// PUT /api/profile
pub async fn update_own_profile<R>(
    State(state): State<AuthAppState<R>>,
    user: CurrentUser,
    Json(req): Json<UpdateProfileRequest>,
) -> AuthResult<Json<ProfileResponse>>
where
    R: AuthRepositories,
{
    req.validate()?;

    let use_case =
        UpdateProfileUseCase::new(state.repo.clone(), state.repo.clone(), state.clock.clone());
    let view = use_case
        .execute(
            user.user_id,
            UpdateProfileInput {
                full_name: req.full_name,
                headline: req.headline,
                bio: req.bio,
                website_url: req.website_url,
            },
        )
        .await?;

    Ok(Json(ProfileResponse::own(&view)))
}

/// PUT /api/profile/avatar (raw image body)
pub async fn upload_avatar<R>(
    State(state): State<AuthAppState<R>>,
    user: CurrentUser,
    headers: HeaderMap,
    body: Bytes,
) -> AuthResult<Json<AvatarResponse>>
where
    R: AuthRepositories,
{
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let use_case = UploadAvatarUseCase::new(
        state.repo.clone(),
        state.storage.clone(),
        state.config.clone(),
        state.clock.clone(),
    );
    let key = use_case
        .execute(user.user_id, content_type, body.to_vec())
        .await?;

    Ok(Json(AvatarResponse {
        avatar_url: media_url(&key),
        avatar_key: key,
    }))
}

/// GET /api/users/{user_id}/profile
pub async fn get_public_profile<R>(
    State(state): State<AuthAppState<R>>,
    Path(user_id): Path<UserId>,
) -> AuthResult<Json<ProfileResponse>>
where
    R: AuthRepositories,
{
    let use_case =
        GetProfileUseCase::new(state.repo.clone(), state.repo.clone(), state.clock.clone());
    let view = use_case.execute(user_id, true).await?;

    Ok(Json(ProfileResponse::public(&view)))
}

// ============================================================================
// Admin: users
// ============================================================================

/// GET /api/admin/users
pub async fn list_users<R>(
    State(state): State<AuthAppState<R>>,
    user: CurrentUser,
    Query(query): Query<UserListQuery>,
) -> AuthResult<Json<Page<UserResponse>>>
where
    R: AuthRepositories,
{
    let page = PageRequest::new(
        query.page.unwrap_or(1),
        query.per_page.unwrap_or(kernel::page::DEFAULT_PER_PAGE),
    );
    let filter = UserFilter {
        role: query.role,
        status: query.status,
        search: query.search,
    };

    let use_case = ListUsersUseCase::new(state.repo.clone());
    let users = use_case.execute(user, filter, page).await?;

    Ok(Json(users.map(|u| UserResponse::from(&u))))
}

/// PUT /api/admin/users/{user_id}/role
pub async fn change_user_role<R>(
    State(state): State<AuthAppState<R>>,
    user: CurrentUser,
    Path(user_id): Path<UserId>,
    Json(req): Json<ChangeRoleRequest>,
) -> AuthResult<Json<UserResponse>>
where
    R: AuthRepositories,
{
    let use_case =
        ManageUserUseCase::new(state.repo.clone(), state.repo.clone(), state.clock.clone());
    let updated = use_case.change_role(user, user_id, req.role).await?;

    Ok(Json(UserResponse::from(&updated)))
}

/// PUT /api/admin/users/{user_id}/status
pub async fn change_user_status<R>(
    State(state): State<AuthAppState<R>>,
    user: CurrentUser,
    Path(user_id): Path<UserId>,
    Json(req): Json<ChangeStatusRequest>,
) -> AuthResult<Json<UserResponse>>
where
    R: AuthRepositories,
{
    let use_case =
        ManageUserUseCase::new(state.repo.clone(), state.repo.clone(), state.clock.clone());
    let updated = use_case.change_status(user, user_id, req.status).await?;

    Ok(Json(UserResponse::from(&updated)))
}
