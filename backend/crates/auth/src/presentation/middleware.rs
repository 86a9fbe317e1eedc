//! Auth Middleware
//!
//! Bearer access-token verification. `attach_access_token` runs on every
//! route and inserts [`CurrentUser`] when a valid token is present;
//! `require_access_token` additionally rejects anonymous requests.

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use kernel::auth::CurrentUser;
use kernel::error::app_error::AppError;
use platform::client::extract_bearer_token;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::verify_access_token;
use crate::error::{AuthError, AuthResult};

fn authenticate(config: &AuthConfig, req: &Request<Body>) -> AuthResult<Option<CurrentUser>> {
    if let Some(user) = req.extensions().get::<CurrentUser>() {
        return Ok(Some(*user));
    }

    let Some(token) = extract_bearer_token(req.headers()) else {
        return Ok(None);
    };

    let claims = verify_access_token(config, token)?;
    Ok(Some(CurrentUser::new(claims.user_id(), claims.role)))
}

/// Insert the caller when a valid bearer token is sent
///
/// An invalid or expired token leaves the request anonymous, so public
/// routes and `/auth/refresh` still work for a client holding a stale
/// header. Protected handlers reject through the `CurrentUser` extractor.
pub async fn attach_access_token(
    State(config): State<Arc<AuthConfig>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match authenticate(&config, &req) {
        Ok(Some(user)) => {
            req.extensions_mut().insert(user);
        }
        Ok(None) => {}
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring unusable bearer token");
        }
    }

    next.run(req).await
}

/// Reject requests without a valid bearer token
pub async fn require_access_token(
    State(config): State<Arc<AuthConfig>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let user = authenticate(&config, &req)?.ok_or_else(|| {
        AuthError::App(
            AppError::unauthorized("Authentication required")
                .with_action("Sign in and retry with a bearer token"),
        )
    })?;
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
