//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use kernel::id::{CourseId, EnrollmentId, PaymentId, PayoutId, UserId};
use kernel::page::{Page, PageRequest};

use crate::domain::earnings::{CourseSales, PayoutTotals};
use crate::domain::entity::{
    payment::{CourseForSale, Payment},
    payout::Payout,
};
use crate::domain::value_object::{payment_status::PaymentStatus, payout_status::PayoutStatus};
use crate::error::BillingResult;

/// Payment with the names shown in listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentView {
    pub payment: Payment,
    pub course_title: String,
    pub buyer_name: String,
    pub buyer_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutView {
    pub payout: Payout,
    pub instructor_name: String,
    pub instructor_email: String,
}

#[trait_variant::make(PaymentRepository: Send)]
pub trait LocalPaymentRepository {
    /// Any status; the caller decides what is purchasable
    async fn find_course_for_sale(
        &self,
        course_id: &CourseId,
    ) -> BillingResult<Option<CourseForSale>>;

    async fn is_enrolled(&self, user_id: &UserId, course_id: &CourseId) -> BillingResult<bool>;

    async fn create_payment(&self, payment: &Payment) -> BillingResult<()>;

    async fn update_payment(&self, payment: &Payment) -> BillingResult<()>;

    /// Store the succeeded payment and create the purchase enrollment in one
    /// transaction. `AlreadyEnrolled` leaves both untouched.
    async fn complete_purchase(
        &self,
        payment: &Payment,
        enrollment_id: EnrollmentId,
    ) -> BillingResult<()>;

    /// Store the refunded payment and drop the purchase enrollment in one
    /// transaction
    async fn refund_purchase(&self, payment: &Payment) -> BillingResult<()>;

    async fn find_payment(&self, payment_id: &PaymentId) -> BillingResult<Option<Payment>>;

    /// Newest first
    async fn list_payments_by_user(&self, user_id: &UserId) -> BillingResult<Vec<PaymentView>>;

    async fn list_payments(
        &self,
        status: Option<PaymentStatus>,
        page: PageRequest,
    ) -> BillingResult<Page<PaymentView>>;

    /// Every course of the instructor, including ones without sales
    async fn course_sales(&self, instructor_id: &UserId) -> BillingResult<Vec<CourseSales>>;
}

#[trait_variant::make(PayoutRepository: Send)]
pub trait LocalPayoutRepository {
    /// `PayoutAlreadyOpen` when the instructor has a requested payout
    async fn create_payout(&self, payout: &Payout) -> BillingResult<()>;

    async fn find_payout(&self, payout_id: &PayoutId) -> BillingResult<Option<Payout>>;

    async fn find_open_payout(&self, instructor_id: &UserId) -> BillingResult<Option<Payout>>;

    async fn update_payout(&self, payout: &Payout) -> BillingResult<()>;

    /// Newest first
    async fn list_payouts_by_instructor(
        &self,
        instructor_id: &UserId,
    ) -> BillingResult<Vec<Payout>>;

    /// Oldest first, so the queue is worked in order
    async fn list_payouts(
        &self,
        status: PayoutStatus,
        page: PageRequest,
    ) -> BillingResult<Page<PayoutView>>;

    async fn payout_totals(&self, instructor_id: &UserId) -> BillingResult<PayoutTotals>;
}
