//! Admin Router
//!
//! `/admin/dashboard`, relative to `/api`. User management and moderation
//! live with the auth and learning routers.

use axum::{Router, routing::get};

use crate::domain::repository::StatsRepository;
use crate::infra::postgres::PgStatsRepository;
use crate::presentation::handlers::{self, AdminAppState};

pub fn admin_router(state: AdminAppState<PgStatsRepository>) -> Router {
    admin_router_generic(state)
}

pub fn admin_router_generic<R>(state: AdminAppState<R>) -> Router
where
    R: StatsRepository + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/admin/dashboard", get(handlers::platform_dashboard::<R>))
        .with_state(state)
}
