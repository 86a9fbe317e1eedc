//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use kernel::id::{CourseId, EnrollmentId, PaymentId, PayoutId, UserId};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::CheckoutReceipt;
use crate::domain::earnings::{CourseEarnings, EarningsSummary};
use crate::domain::entity::{payment::Payment, payout::Payout};
use crate::domain::repository::{PaymentView, PayoutView};
use crate::domain::value_object::{
    currency::Currency, payment_status::PaymentStatus, payout_status::PayoutStatus,
};

// ============================================================================
// Checkout and payments
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub course_id: CourseId,
    #[validate(length(min = 1, max = 200))]
    pub payment_token: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub payment_id: PaymentId,
    pub course_id: CourseId,
    pub amount_cents: i64,
    pub currency: Currency,
    pub status: PaymentStatus,
    pub provider_reference: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
}

impl From<&Payment> for PaymentResponse {
    fn from(payment: &Payment) -> Self {
        Self {
            payment_id: payment.payment_id,
            course_id: payment.course_id,
            amount_cents: payment.amount_cents,
            currency: payment.currency,
            status: payment.status,
            provider_reference: payment.provider_reference.clone(),
            failure_reason: payment.failure_reason.clone(),
            created_at: payment.created_at,
            completed_at: payment.completed_at,
            refunded_at: payment.refunded_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub payment: PaymentResponse,
    pub enrollment_id: EnrollmentId,
}

impl From<&CheckoutReceipt> for CheckoutResponse {
    fn from(receipt: &CheckoutReceipt) -> Self {
        Self {
            payment: PaymentResponse::from(&receipt.payment),
            enrollment_id: receipt.enrollment_id,
        }
    }
}

/// Payment row in listings, with course and buyer names
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentListItem {
    #[serde(flatten)]
    pub payment: PaymentResponse,
    pub course_title: String,
    pub buyer_id: UserId,
    pub buyer_name: String,
    pub buyer_email: String,
}

impl From<&PaymentView> for PaymentListItem {
    fn from(view: &PaymentView) -> Self {
        Self {
            payment: PaymentResponse::from(&view.payment),
            course_title: view.course_title.clone(),
            buyer_id: view.payment.user_id,
            buyer_name: view.buyer_name.clone(),
            buyer_email: view.buyer_email.clone(),
        }
    }
}

/// `?status=succeeded&page=1&perPage=20`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<PaymentStatus>,
}

// ============================================================================
// Earnings
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseEarningsResponse {
    pub course_id: CourseId,
    pub title: String,
    pub sales: i64,
    pub gross_cents: i64,
    pub fee_cents: i64,
    pub net_cents: i64,
}

impl From<&CourseEarnings> for CourseEarningsResponse {
    fn from(c: &CourseEarnings) -> Self {
        Self {
            course_id: c.course_id,
            title: c.title.clone(),
            sales: c.sales,
            gross_cents: c.gross_cents,
            fee_cents: c.fee_cents,
            net_cents: c.net_cents,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsResponse {
    pub currency: Currency,
    pub courses: Vec<CourseEarningsResponse>,
    pub gross_cents: i64,
    pub fee_cents: i64,
    pub net_cents: i64,
    pub paid_out_cents: i64,
    pub pending_cents: i64,
    pub available_cents: i64,
}

impl From<&EarningsSummary> for EarningsResponse {
    fn from(s: &EarningsSummary) -> Self {
        Self {
            currency: s.currency,
            courses: s.courses.iter().map(CourseEarningsResponse::from).collect(),
            gross_cents: s.gross_cents,
            fee_cents: s.fee_cents,
            net_cents: s.net_cents,
            paid_out_cents: s.paid_out_cents,
            pending_cents: s.pending_cents,
            available_cents: s.available_cents,
        }
    }
}

// ============================================================================
// Payouts
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PayoutRequest {
    #[validate(range(min = 1))]
    pub amount_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutResponse {
    pub payout_id: PayoutId,
    pub instructor_id: UserId,
    pub amount_cents: i64,
    pub currency: Currency,
    pub status: PayoutStatus,
    pub note: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl From<&Payout> for PayoutResponse {
    fn from(payout: &Payout) -> Self {
        Self {
            payout_id: payout.payout_id,
            instructor_id: payout.instructor_id,
            amount_cents: payout.amount_cents,
            currency: payout.currency,
            status: payout.status,
            note: payout.note.clone(),
            requested_at: payout.requested_at,
            processed_at: payout.processed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutListItem {
    #[serde(flatten)]
    pub payout: PayoutResponse,
    pub instructor_name: String,
    pub instructor_email: String,
}

impl From<&PayoutView> for PayoutListItem {
    fn from(view: &PayoutView) -> Self {
        Self {
            payout: PayoutResponse::from(&view.payout),
            instructor_name: view.instructor_name.clone(),
            instructor_email: view.instructor_email.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<PayoutStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApprovePayoutRequest {
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RejectPayoutRequest {
    #[validate(length(min = 1, max = 500))]
    pub note: String,
}
