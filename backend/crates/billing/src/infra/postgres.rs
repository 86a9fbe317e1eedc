//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::{CourseId, EnrollmentId, PaymentId, PayoutId, UserId};
use kernel::page::{Page, PageRequest};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::earnings::{CourseSales, PayoutTotals};
use crate::domain::entity::{
    payment::{CourseForSale, Payment},
    payout::Payout,
};
use crate::domain::repository::{PaymentRepository, PaymentView, PayoutRepository, PayoutView};
use crate::domain::value_object::{
    currency::Currency, payment_status::PaymentStatus, payout_status::PayoutStatus,
};
use crate::error::{BillingError, BillingResult};

/// `courses.course_status` of a published course
const COURSE_STATUS_PUBLISHED: i16 = 2;

/// `enrollments.source` of a purchase
const ENROLLMENT_SOURCE_PURCHASE: i16 = 1;

/// PostgreSQL-backed billing repository
#[derive(Clone)]
pub struct PgBillingRepository {
    pool: PgPool,
}

impl PgBillingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PAYMENT_COLUMNS: &str = r#"
    p.payment_id,
    p.user_id,
    p.course_id,
    p.instructor_id,
    p.amount_cents,
    p.currency,
    p.payment_status,
    p.provider_reference,
    p.failure_reason,
    p.created_at,
    p.completed_at,
    p.refunded_at
"#;

const PAYMENT_VIEW_SELECT: &str = r#"
    SELECT
        p.payment_id,
        p.user_id,
        p.course_id,
        p.instructor_id,
        p.amount_cents,
        p.currency,
        p.payment_status,
        p.provider_reference,
        p.failure_reason,
        p.created_at,
        p.completed_at,
        p.refunded_at,
        c.title AS course_title,
        u.full_name AS buyer_name,
        u.email AS buyer_email
    FROM payments p
    JOIN courses c ON c.course_id = p.course_id
    JOIN users u ON u.user_id = p.user_id
"#;

const PAYOUT_COLUMNS: &str = r#"
    po.payout_id,
    po.instructor_id,
    po.amount_cents,
    po.currency,
    po.payout_status,
    po.note,
    po.requested_at,
    po.processed_at
"#;

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

// ============================================================================
// Payment Repository Implementation
// ============================================================================

impl PaymentRepository for PgBillingRepository {
    async fn find_course_for_sale(
        &self,
        course_id: &CourseId,
    ) -> BillingResult<Option<CourseForSale>> {
        let row = sqlx::query_as::<_, CourseForSaleRow>(
            r#"
            SELECT course_id, instructor_id, title, price_cents, course_status
            FROM courses
            WHERE course_id = $1
            "#,
        )
        .bind(course_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_course()))
    }

    async fn is_enrolled(&self, user_id: &UserId, course_id: &CourseId) -> BillingResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM enrollments WHERE user_id = $1 AND course_id = $2)",
        )
        .bind(user_id.as_uuid())
        .bind(course_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create_payment(&self, payment: &Payment) -> BillingResult<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                payment_id,
                user_id,
                course_id,
                instructor_id,
                amount_cents,
                currency,
                payment_status,
                provider_reference,
                failure_reason,
                created_at,
                completed_at,
                refunded_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(payment.payment_id.as_uuid())
        .bind(payment.user_id.as_uuid())
        .bind(payment.course_id.as_uuid())
        .bind(payment.instructor_id.as_uuid())
        .bind(payment.amount_cents)
        .bind(payment.currency.as_str())
        .bind(payment.status.id())
        .bind(&payment.provider_reference)
        .bind(&payment.failure_reason)
        .bind(payment.created_at)
        .bind(payment.completed_at)
        .bind(payment.refunded_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_payment(&self, payment: &Payment) -> BillingResult<()> {
        sqlx::query(UPDATE_PAYMENT)
            .bind(payment.payment_id.as_uuid())
            .bind(payment.status.id())
            .bind(&payment.provider_reference)
            .bind(&payment.failure_reason)
            .bind(payment.completed_at)
            .bind(payment.refunded_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn complete_purchase(
        &self,
        payment: &Payment,
        enrollment_id: EnrollmentId,
    ) -> BillingResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO enrollments (enrollment_id, user_id, course_id, source, enrolled_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(enrollment_id.as_uuid())
        .bind(payment.user_id.as_uuid())
        .bind(payment.course_id.as_uuid())
        .bind(ENROLLMENT_SOURCE_PURCHASE)
        .bind(payment.completed_at.unwrap_or(payment.created_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                BillingError::AlreadyEnrolled
            } else {
                BillingError::Database(e)
            }
        })?;

        sqlx::query(UPDATE_PAYMENT)
            .bind(payment.payment_id.as_uuid())
            .bind(payment.status.id())
            .bind(&payment.provider_reference)
            .bind(&payment.failure_reason)
            .bind(payment.completed_at)
            .bind(payment.refunded_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn refund_purchase(&self, payment: &Payment) -> BillingResult<()> {
        let mut tx = self.pool.begin().await?;

        // Lock the row so two refunds of one payment cannot both pass
        let current = sqlx::query_scalar::<_, i16>(
            "SELECT payment_status FROM payments WHERE payment_id = $1 FOR UPDATE",
        )
        .bind(payment.payment_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(BillingError::PaymentNotFound)?;

        let current = PaymentStatus::from_id(current).ok_or_else(|| {
            BillingError::Internal(format!("Invalid payment_status: {current}"))
        })?;
        if current != PaymentStatus::Succeeded {
            return Err(BillingError::InvalidPaymentTransition {
                from: current,
                to: PaymentStatus::Refunded,
            });
        }

        sqlx::query(
            r#"
            UPDATE payments SET payment_status = $2, refunded_at = $3
            WHERE payment_id = $1 AND payment_status = $4
            "#,
        )
        .bind(payment.payment_id.as_uuid())
        .bind(PaymentStatus::Refunded.id())
        .bind(payment.refunded_at)
        .bind(PaymentStatus::Succeeded.id())
        .execute(&mut *tx)
        .await?;

        // Progress and attempts stay, so a repurchase resumes where it left off
        sqlx::query(
            "DELETE FROM enrollments WHERE user_id = $1 AND course_id = $2 AND source = $3",
        )
        .bind(payment.user_id.as_uuid())
        .bind(payment.course_id.as_uuid())
        .bind(ENROLLMENT_SOURCE_PURCHASE)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_payment(&self, payment_id: &PaymentId) -> BillingResult<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments p WHERE p.payment_id = $1"
        ))
        .bind(payment_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_payment()).transpose()
    }

    async fn list_payments_by_user(&self, user_id: &UserId) -> BillingResult<Vec<PaymentView>> {
        let rows = sqlx::query_as::<_, PaymentViewRow>(&format!(
            "{PAYMENT_VIEW_SELECT} WHERE p.user_id = $1 ORDER BY p.created_at DESC, p.payment_id"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_view()).collect()
    }

    async fn list_payments(
        &self,
        status: Option<PaymentStatus>,
        page: PageRequest,
    ) -> BillingResult<Page<PaymentView>> {
        let status = status.map(|s| s.id());

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM payments WHERE ($1::SMALLINT IS NULL OR payment_status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, PaymentViewRow>(&format!(
            "{PAYMENT_VIEW_SELECT} WHERE ($1::SMALLINT IS NULL OR p.payment_status = $1) \
             ORDER BY p.created_at DESC, p.payment_id LIMIT $2 OFFSET $3"
        ))
        .bind(status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(|r| r.into_view())
            .collect::<BillingResult<Vec<_>>>()?;

        Ok(Page::new(items, total, page))
    }

    async fn course_sales(&self, instructor_id: &UserId) -> BillingResult<Vec<CourseSales>> {
        let rows = sqlx::query_as::<_, CourseSalesRow>(
            r#"
            SELECT
                c.course_id,
                c.title,
                COUNT(p.payment_id) AS sales,
                COALESCE(SUM(p.amount_cents), 0)::BIGINT AS gross_cents
            FROM courses c
            LEFT JOIN payments p
                ON p.course_id = c.course_id
               AND p.payment_status = $2
            WHERE c.instructor_id = $1
            GROUP BY c.course_id, c.title, c.created_at
            ORDER BY c.created_at, c.course_id
            "#,
        )
        .bind(instructor_id.as_uuid())
        .bind(PaymentStatus::Succeeded.id())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| CourseSales {
                course_id: CourseId::from_uuid(r.course_id),
                title: r.title,
                sales: r.sales,
                gross_cents: r.gross_cents,
            })
            .collect())
    }
}

const UPDATE_PAYMENT: &str = r#"
    UPDATE payments SET
        payment_status = $2,
        provider_reference = $3,
        failure_reason = $4,
        completed_at = $5,
        refunded_at = $6
    WHERE payment_id = $1
"#;

// ============================================================================
// Payout Repository Implementation
// ============================================================================

impl PayoutRepository for PgBillingRepository {
    async fn create_payout(&self, payout: &Payout) -> BillingResult<()> {
        sqlx::query(
            r#"
            INSERT INTO payouts (
                payout_id,
                instructor_id,
                amount_cents,
                currency,
                payout_status,
                note,
                requested_at,
                processed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(payout.payout_id.as_uuid())
        .bind(payout.instructor_id.as_uuid())
        .bind(payout.amount_cents)
        .bind(payout.currency.as_str())
        .bind(payout.status.id())
        .bind(&payout.note)
        .bind(payout.requested_at)
        .bind(payout.processed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                BillingError::PayoutAlreadyOpen
            } else {
                BillingError::Database(e)
            }
        })?;

        Ok(())
    }

    async fn find_payout(&self, payout_id: &PayoutId) -> BillingResult<Option<Payout>> {
        let row = sqlx::query_as::<_, PayoutRow>(&format!(
            "SELECT {PAYOUT_COLUMNS} FROM payouts po WHERE po.payout_id = $1"
        ))
        .bind(payout_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_payout()).transpose()
    }

    async fn find_open_payout(&self, instructor_id: &UserId) -> BillingResult<Option<Payout>> {
        let row = sqlx::query_as::<_, PayoutRow>(&format!(
            "SELECT {PAYOUT_COLUMNS} FROM payouts po \
             WHERE po.instructor_id = $1 AND po.payout_status = $2"
        ))
        .bind(instructor_id.as_uuid())
        .bind(PayoutStatus::Requested.id())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_payout()).transpose()
    }

    async fn update_payout(&self, payout: &Payout) -> BillingResult<()> {
        sqlx::query(
            r#"
            UPDATE payouts SET
                payout_status = $2,
                note = $3,
                processed_at = $4
            WHERE payout_id = $1
            "#,
        )
        .bind(payout.payout_id.as_uuid())
        .bind(payout.status.id())
        .bind(&payout.note)
        .bind(payout.processed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_payouts_by_instructor(
        &self,
        instructor_id: &UserId,
    ) -> BillingResult<Vec<Payout>> {
        let rows = sqlx::query_as::<_, PayoutRow>(&format!(
            "SELECT {PAYOUT_COLUMNS} FROM payouts po WHERE po.instructor_id = $1 \
             ORDER BY po.requested_at DESC, po.payout_id"
        ))
        .bind(instructor_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_payout()).collect()
    }

    async fn list_payouts(
        &self,
        status: PayoutStatus,
        page: PageRequest,
    ) -> BillingResult<Page<PayoutView>> {
        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM payouts WHERE payout_status = $1")
                .bind(status.id())
                .fetch_one(&self.pool)
                .await?;

        let rows = sqlx::query_as::<_, PayoutViewRow>(&format!(
            r#"
            SELECT {PAYOUT_COLUMNS}, u.full_name AS instructor_name, u.email AS instructor_email
            FROM payouts po
            JOIN users u ON u.user_id = po.instructor_id
            WHERE po.payout_status = $1
            ORDER BY po.requested_at, po.payout_id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(status.id())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(|r| r.into_view())
            .collect::<BillingResult<Vec<_>>>()?;

        Ok(Page::new(items, total, page))
    }

    async fn payout_totals(&self, instructor_id: &UserId) -> BillingResult<PayoutTotals> {
        let (paid_cents, requested_cents) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                COALESCE(SUM(amount_cents) FILTER (WHERE payout_status = $2), 0)::BIGINT,
                COALESCE(SUM(amount_cents) FILTER (WHERE payout_status = $3), 0)::BIGINT
            FROM payouts
            WHERE instructor_id = $1
            "#,
        )
        .bind(instructor_id.as_uuid())
        .bind(PayoutStatus::Paid.id())
        .bind(PayoutStatus::Requested.id())
        .fetch_one(&self.pool)
        .await?;

        Ok(PayoutTotals {
            paid_cents,
            requested_cents,
        })
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

fn parse_currency(raw: &str) -> BillingResult<Currency> {
    raw.parse()
        .map_err(|_| BillingError::Internal(format!("Invalid currency: {raw}")))
}

#[derive(sqlx::FromRow)]
struct CourseForSaleRow {
    course_id: Uuid,
    instructor_id: Uuid,
    title: String,
    price_cents: i64,
    course_status: i16,
}

impl CourseForSaleRow {
    fn into_course(self) -> CourseForSale {
        CourseForSale {
            course_id: CourseId::from_uuid(self.course_id),
            instructor_id: UserId::from_uuid(self.instructor_id),
            title: self.title,
            price_cents: self.price_cents,
            is_published: self.course_status == COURSE_STATUS_PUBLISHED,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    payment_id: Uuid,
    user_id: Uuid,
    course_id: Uuid,
    instructor_id: Uuid,
    amount_cents: i64,
    currency: String,
    payment_status: i16,
    provider_reference: Option<String>,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    refunded_at: Option<DateTime<Utc>>,
}

impl PaymentRow {
    fn into_payment(self) -> BillingResult<Payment> {
        let status = PaymentStatus::from_id(self.payment_status).ok_or_else(|| {
            BillingError::Internal(format!("Invalid payment_status: {}", self.payment_status))
        })?;

        Ok(Payment {
            payment_id: PaymentId::from_uuid(self.payment_id),
            user_id: UserId::from_uuid(self.user_id),
            course_id: CourseId::from_uuid(self.course_id),
            instructor_id: UserId::from_uuid(self.instructor_id),
            amount_cents: self.amount_cents,
            currency: parse_currency(&self.currency)?,
            status,
            provider_reference: self.provider_reference,
            failure_reason: self.failure_reason,
            created_at: self.created_at,
            completed_at: self.completed_at,
            refunded_at: self.refunded_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PaymentViewRow {
    #[sqlx(flatten)]
    payment: PaymentRow,
    course_title: String,
    buyer_name: String,
    buyer_email: String,
}

impl PaymentViewRow {
    fn into_view(self) -> BillingResult<PaymentView> {
        Ok(PaymentView {
            payment: self.payment.into_payment()?,
            course_title: self.course_title,
            buyer_name: self.buyer_name,
            buyer_email: self.buyer_email,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CourseSalesRow {
    course_id: Uuid,
    title: String,
    sales: i64,
    gross_cents: i64,
}

#[derive(sqlx::FromRow)]
struct PayoutRow {
    payout_id: Uuid,
    instructor_id: Uuid,
    amount_cents: i64,
    currency: String,
    payout_status: i16,
    note: Option<String>,
    requested_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
}

impl PayoutRow {
    fn into_payout(self) -> BillingResult<Payout> {
        let status = PayoutStatus::from_id(self.payout_status).ok_or_else(|| {
            BillingError::Internal(format!("Invalid payout_status: {}", self.payout_status))
        })?;

        Ok(Payout {
            payout_id: PayoutId::from_uuid(self.payout_id),
            instructor_id: UserId::from_uuid(self.instructor_id),
            amount_cents: self.amount_cents,
            currency: parse_currency(&self.currency)?,
            status,
            note: self.note,
            requested_at: self.requested_at,
            processed_at: self.processed_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PayoutViewRow {
    #[sqlx(flatten)]
    payout: PayoutRow,
    instructor_name: String,
    instructor_email: String,
}

impl PayoutViewRow {
    fn into_view(self) -> BillingResult<PayoutView> {
        Ok(PayoutView {
            payout: self.payout.into_payout()?,
            instructor_name: self.instructor_name,
            instructor_email: self.instructor_email,
        })
    }
}
