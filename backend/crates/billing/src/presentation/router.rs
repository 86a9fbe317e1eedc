//! Billing Router
//!
//! Paths are relative to `/api`:
//! - `/checkout`, `/payments`: buying courses
//! - `/instructor/earnings`, `/instructor/payouts`: instructor revenue
//! - `/admin/payments`, `/admin/payouts`: refunds and the payout queue

use axum::{
    Router,
    routing::{get, post},
};

use crate::domain::gateway::PaymentGateway;
use crate::infra::{gateway::SimulatedGateway, postgres::PgBillingRepository};
use crate::presentation::handlers::{self, BillingAppState, BillingRepositories};

/// Create the Billing router with PostgreSQL repository and the simulated gateway
pub fn billing_router(state: BillingAppState<PgBillingRepository, SimulatedGateway>) -> Router {
    billing_router_generic(state)
}

/// Create a generic Billing router for any repository and gateway
pub fn billing_router_generic<R, G>(state: BillingAppState<R, G>) -> Router
where
    R: BillingRepositories,
    G: PaymentGateway + Send + Sync + 'static,
{
    Router::new()
        .route("/checkout", post(handlers::checkout::<R, G>))
        .route("/payments", get(handlers::payment_history::<R, G>))
        .route("/instructor/earnings", get(handlers::earnings::<R, G>))
        .route(
            "/instructor/payouts",
            get(handlers::payout_history::<R, G>).post(handlers::request_payout::<R, G>),
        )
        .route("/admin/payments", get(handlers::list_payments::<R, G>))
        .route(
            "/admin/payments/{payment_id}/refund",
            post(handlers::refund_payment::<R, G>),
        )
        .route("/admin/payouts", get(handlers::list_payouts::<R, G>))
        .route(
            "/admin/payouts/{payout_id}/approve",
            post(handlers::approve_payout::<R, G>),
        )
        .route(
            "/admin/payouts/{payout_id}/reject",
            post(handlers::reject_payout::<R, G>),
        )
        .with_state(state)
}
