//! HTTP Handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use kernel::auth::CurrentUser;
use kernel::clock::Clock;
use kernel::id::{PaymentId, PayoutId};
use kernel::page::{DEFAULT_PER_PAGE, Page, PageRequest};
use std::sync::Arc;
use validator::Validate;

use crate::application::{
    BillingConfig, CheckoutUseCase, EarningsUseCase, ManagePaymentsUseCase, PaymentHistoryUseCase,
    PayoutHistoryUseCase, ProcessPayoutUseCase, RequestPayoutUseCase,
};
use crate::domain::gateway::PaymentGateway;
use crate::domain::repository::{PaymentRepository, PayoutRepository};
use crate::error::BillingResult;
use crate::presentation::dto::{
    ApprovePayoutRequest, CheckoutRequest, CheckoutResponse, EarningsResponse, PaymentListItem,
    PaymentListQuery, PaymentResponse, PayoutListItem, PayoutListQuery, PayoutRequest,
    PayoutResponse, RejectPayoutRequest,
};

/// Payment and payout persistence, implemented by one store
pub trait BillingRepositories:
    PaymentRepository + PayoutRepository + Clone + Send + Sync + 'static
{
}

impl<T> BillingRepositories for T where
    T: PaymentRepository + PayoutRepository + Clone + Send + Sync + 'static
{
}

/// Shared state for billing handlers
pub struct BillingAppState<R, G>
where
    R: BillingRepositories,
    G: PaymentGateway + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub gateway: Arc<G>,
    pub config: Arc<BillingConfig>,
    pub clock: Arc<dyn Clock>,
}

// Manual impl: only the `Arc`s are cloned, `G` itself need not be `Clone`
impl<R, G> Clone for BillingAppState<R, G>
where
    R: BillingRepositories,
    G: PaymentGateway + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            gateway: self.gateway.clone(),
            config: self.config.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<R, G> BillingAppState<R, G>
where
    R: BillingRepositories,
    G: PaymentGateway + Send + Sync + 'static,
{
    fn payouts(&self) -> ProcessPayoutUseCase<R> {
        ProcessPayoutUseCase::new(self.repo.clone(), self.clock.clone())
    }

    fn payments(&self) -> ManagePaymentsUseCase<R, G> {
        ManagePaymentsUseCase::new(self.repo.clone(), self.gateway.clone(), self.clock.clone())
    }
}

fn page_request(page: Option<u32>, per_page: Option<u32>) -> PageRequest {
    PageRequest::new(page.unwrap_or(1), per_page.unwrap_or(DEFAULT_PER_PAGE))
}

// ============================================================================
// Checkout and payment history
// ============================================================================

/// POST /api/checkout
pub async fn checkout<R, G>(
    State(state): State<BillingAppState<R, G>>,
    user: CurrentUser,
    Json(req): Json<CheckoutRequest>,
) -> BillingResult<(StatusCode, Json<CheckoutResponse>)>
where
    R: BillingRepositories,
    G: PaymentGateway + Send + Sync + 'static,
{
    req.validate()?;

    let use_case = CheckoutUseCase::new(
        state.repo.clone(),
        state.gateway.clone(),
        state.config.clone(),
        state.clock.clone(),
    );
    let receipt = use_case.execute(&user, req.course_id, req.payment_token).await?;

    Ok((StatusCode::CREATED, Json(CheckoutResponse::from(&receipt))))
}

/// GET /api/payments
pub async fn payment_history<R, G>(
    State(state): State<BillingAppState<R, G>>,
    user: CurrentUser,
) -> BillingResult<Json<Vec<PaymentListItem>>>
where
    R: BillingRepositories,
    G: PaymentGateway + Send + Sync + 'static,
{
    let use_case = PaymentHistoryUseCase::new(state.repo.clone());
    let payments = use_case.execute(&user).await?;

    Ok(Json(payments.iter().map(PaymentListItem::from).collect()))
}

// ============================================================================
// Instructor earnings and payouts
// ============================================================================

/// GET /api/instructor/earnings
pub async fn earnings<R, G>(
    State(state): State<BillingAppState<R, G>>,
    user: CurrentUser,
) -> BillingResult<Json<EarningsResponse>>
where
    R: BillingRepositories,
    G: PaymentGateway + Send + Sync + 'static,
{
    let use_case = EarningsUseCase::new(state.repo.clone(), state.config.clone());
    let summary = use_case.execute(&user).await?;

    Ok(Json(EarningsResponse::from(&summary)))
}

/// GET /api/instructor/payouts
pub async fn payout_history<R, G>(
    State(state): State<BillingAppState<R, G>>,
    user: CurrentUser,
) -> BillingResult<Json<Vec<PayoutResponse>>>
where
    R: BillingRepositories,
    G: PaymentGateway + Send + Sync + 'static,
{
    let use_case = PayoutHistoryUseCase::new(state.repo.clone());
    let payouts = use_case.execute(&user).await?;

    Ok(Json(payouts.iter().map(PayoutResponse::from).collect()))
}

/// POST /api/instructor/payouts
pub async fn request_payout<R, G>(
    State(state): State<BillingAppState<R, G>>,
    user: CurrentUser,
    Json(req): Json<PayoutRequest>,
) -> BillingResult<(StatusCode, Json<PayoutResponse>)>
where
    R: BillingRepositories,
    G: PaymentGateway + Send + Sync + 'static,
{
    req.validate()?;

    let use_case =
        RequestPayoutUseCase::new(state.repo.clone(), state.config.clone(), state.clock.clone());
    let payout = use_case.execute(&user, req.amount_cents).await?;

    Ok((StatusCode::CREATED, Json(PayoutResponse::from(&payout))))
}

// ============================================================================
// Admin
// ============================================================================

/// GET /api/admin/payments
pub async fn list_payments<R, G>(
    State(state): State<BillingAppState<R, G>>,
    user: CurrentUser,
    Query(query): Query<PaymentListQuery>,
) -> BillingResult<Json<Page<PaymentListItem>>>
where
    R: BillingRepositories,
    G: PaymentGateway + Send + Sync + 'static,
{
    let page = page_request(query.page, query.per_page);
    let payments = state.payments().list(&user, query.status, page).await?;

    Ok(Json(payments.map(|p| PaymentListItem::from(&p))))
}

/// POST /api/admin/payments/{payment_id}/refund
pub async fn refund_payment<R, G>(
    State(state): State<BillingAppState<R, G>>,
    user: CurrentUser,
    Path(payment_id): Path<PaymentId>,
) -> BillingResult<Json<PaymentResponse>>
where
    R: BillingRepositories,
    G: PaymentGateway + Send + Sync + 'static,
{
    let payment = state.payments().refund(&user, payment_id).await?;

    Ok(Json(PaymentResponse::from(&payment)))
}

/// GET /api/admin/payouts
///
/// Open requests unless `status` says otherwise.
pub async fn list_payouts<R, G>(
    State(state): State<BillingAppState<R, G>>,
    user: CurrentUser,
    Query(query): Query<PayoutListQuery>,
) -> BillingResult<Json<Page<PayoutListItem>>>
where
    R: BillingRepositories,
    G: PaymentGateway + Send + Sync + 'static,
{
    let page = page_request(query.page, query.per_page);
    let payouts = state.payouts().list(&user, query.status, page).await?;

    Ok(Json(payouts.map(|p| PayoutListItem::from(&p))))
}

/// POST /api/admin/payouts/{payout_id}/approve
pub async fn approve_payout<R, G>(
    State(state): State<BillingAppState<R, G>>,
    user: CurrentUser,
    Path(payout_id): Path<PayoutId>,
    Json(req): Json<ApprovePayoutRequest>,
) -> BillingResult<Json<PayoutResponse>>
where
    R: BillingRepositories,
    G: PaymentGateway + Send + Sync + 'static,
{
    req.validate()?;

    let payout = state
        .payouts()
        .approve(&user, payout_id, req.note.as_deref())
        .await?;

    Ok(Json(PayoutResponse::from(&payout)))
}

/// POST /api/admin/payouts/{payout_id}/reject
pub async fn reject_payout<R, G>(
    State(state): State<BillingAppState<R, G>>,
    user: CurrentUser,
    Path(payout_id): Path<PayoutId>,
    Json(req): Json<RejectPayoutRequest>,
) -> BillingResult<Json<PayoutResponse>>
where
    R: BillingRepositories,
    G: PaymentGateway + Send + Sync + 'static,
{
    req.validate()?;

    let payout = state.payouts().reject(&user, payout_id, &req.note).await?;

    Ok(Json(PayoutResponse::from(&payout)))
}
