//! Auth Routers
//!
//! - `auth_router`: `/api/auth`
//! - `profile_router`: `/api/profile`
//! - `users_router`: `/api/users`
//! - `admin_users_router`: `/api/admin/users`

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
};

use crate::infra::postgres::PgAuthRepository;
use crate::presentation::handlers::{self, AuthAppState, AuthRepositories};
use crate::presentation::middleware::require_access_token;

/// Slack on top of the image limit for the raw body extractor
const UPLOAD_BODY_SLACK: usize = 1024;

/// Create the Auth router with PostgreSQL repository
pub fn auth_router(state: AuthAppState<PgAuthRepository>) -> Router {
    auth_router_generic(state)
}

/// Create a generic Auth router for any repository implementation
pub fn auth_router_generic<R>(state: AuthAppState<R>) -> Router
where
    R: AuthRepositories,
{
    Router::new()
        .route("/signup", post(handlers::sign_up::<R>))
        .route("/signin", post(handlers::sign_in::<R>))
        .route("/refresh", post(handlers::refresh::<R>))
        .route("/signout", post(handlers::sign_out::<R>))
        .route("/password/forgot", post(handlers::forgot_password::<R>))
        .route("/password/reset", post(handlers::reset_password::<R>))
        .route("/password/change", post(handlers::change_password::<R>))
        .route("/me", get(handlers::me::<R>))
        .with_state(state)
}

/// Own profile (authenticated)
pub fn profile_router_generic<R>(state: AuthAppState<R>) -> Router
where
    R: AuthRepositories,
{
    let body_limit = state.config.max_avatar_bytes + UPLOAD_BODY_SLACK;
    let config = state.config.clone();

    Router::new()
        .route(
            "/",
            get(handlers::get_own_profile::<R>).put(handlers::update_own_profile::<R>),
        )
        .route(
            "/avatar",
            put(handlers::upload_avatar::<R>).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route_layer(middleware::from_fn_with_state(config, require_access_token))
        .with_state(state)
}

pub fn profile_router(state: AuthAppState<PgAuthRepository>) -> Router {
    profile_router_generic(state)
}

/// Public profiles
pub fn users_router_generic<R>(state: AuthAppState<R>) -> Router
where
    R: AuthRepositories,
{
    Router::new()
        .route("/{user_id}/profile", get(handlers::get_public_profile::<R>))
        .with_state(state)
}

pub fn users_router(state: AuthAppState<PgAuthRepository>) -> Router {
    users_router_generic(state)
}

/// User management (admin)
pub fn admin_users_router_generic<R>(state: AuthAppState<R>) -> Router
where
    R: AuthRepositories,
{
    let config = state.config.clone();

    Router::new()
        .route("/", get(handlers::list_users::<R>))
        .route("/{user_id}/role", put(handlers::change_user_role::<R>))
        .route("/{user_id}/status", put(handlers::change_user_status::<R>))
        .route_layer(middleware::from_fn_with_state(config, require_access_token))
        .with_state(state)
}

pub fn admin_users_router(state: AuthAppState<PgAuthRepository>) -> Router {
    admin_users_router_generic(state)
}
