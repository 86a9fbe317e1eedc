//! HTTP Handlers

use axum::Json;
use axum::extract::State;
use billing::BillingConfig;
use kernel::auth::CurrentUser;
use kernel::clock::Clock;
use std::sync::Arc;

use crate::application::PlatformDashboardUseCase;
use crate::domain::repository::StatsRepository;
use crate::error::AdminResult;
use crate::presentation::dto::PlatformDashboardResponse;

#[derive(Clone)]
pub struct AdminAppState<R>
where
    R: StatsRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    /// Currency and fee rate for the revenue figures
    pub billing: Arc<BillingConfig>,
    pub clock: Arc<dyn Clock>,
}

/// GET /api/admin/dashboard
pub async fn platform_dashboard<R>(
    State(state): State<AdminAppState<R>>,
    user: CurrentUser,
) -> AdminResult<Json<PlatformDashboardResponse>>
where
    R: StatsRepository + Clone + Send + Sync + 'static,
{
    let use_case = PlatformDashboardUseCase::new(
        state.repo.clone(),
        state.billing.clone(),
        state.clock.clone(),
    );
    let stats = use_case.execute(&user).await?;

    Ok(Json(PlatformDashboardResponse::from(&stats)))
}
