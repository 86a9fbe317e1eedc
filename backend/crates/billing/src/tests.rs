//! Use-case and router tests for the billing crate
//!
//! Everything runs against [`memory::MemoryBillingRepository`] and the
//! token-driven [`SimulatedGateway`](crate::infra::SimulatedGateway).

mod memory {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex, MutexGuard};

    use kernel::id::{CourseId, EnrollmentId, PaymentId, PayoutId, UserId};
    use kernel::page::{Page, PageRequest};

    use crate::domain::earnings::{CourseSales, PayoutTotals};
    use crate::domain::entity::{
        payment::{CourseForSale, Payment},
        payout::Payout,
    };
    use crate::domain::repository::{
        PaymentRepository, PaymentView, PayoutRepository, PayoutView,
    };
    use crate::domain::value_object::{payment_status::PaymentStatus, payout_status::PayoutStatus};
    use crate::error::{BillingError, BillingResult};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum EnrollmentSource {
        Free,
        Purchase,
    }

    #[derive(Default)]
    struct Tables {
        /// user_id -> (full name, email)
        users: HashMap<UserId, (String, String)>,
        /// Creation order, for stable earnings listings
        courses: Vec<CourseForSale>,
        enrollments: Vec<(EnrollmentId, UserId, CourseId, EnrollmentSource)>,
        payments: Vec<Payment>,
        payouts: Vec<Payout>,
        /// Makes `complete_purchase` fail like a dropped connection
        purchases_fail: bool,
    }

    impl Tables {
        fn enrolled(&self, user_id: &UserId, course_id: &CourseId) -> bool {
            self.enrollments
                .iter()
                .any(|(_, u, c, _)| u == user_id && c == course_id)
        }

        fn user(&self, user_id: &UserId) -> (String, String) {
            self.users.get(user_id).cloned().unwrap_or_default()
        }

        fn payment_view(&self, payment: &Payment) -> PaymentView {
            let (buyer_name, buyer_email) = self.user(&payment.user_id);
            PaymentView {
                payment: payment.clone(),
                course_title: self
                    .courses
                    .iter()
                    .find(|c| c.course_id == payment.course_id)
                    .map(|c| c.title.clone())
                    .unwrap_or_default(),
                buyer_name,
                buyer_email,
            }
        }

        fn replace_payment(&mut self, payment: &Payment) {
            if let Some(slot) = self
                .payments
                .iter_mut()
                .find(|p| p.payment_id == payment.payment_id)
            {
                *slot = payment.clone();
            }
        }
    }

    fn paginate<T>(items: Vec<T>, page: PageRequest) -> Page<T> {
        let total = items.len() as i64;
        let items = items
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Page::new(items, total, page)
    }

    #[derive(Clone, Default)]
    pub struct MemoryBillingRepository {
        tables: Arc<Mutex<Tables>>,
    }

    impl MemoryBillingRepository {
        pub fn new() -> Self {
            Self::default()
        }

        fn lock(&self) -> MutexGuard<'_, Tables> {
            self.tables.lock().unwrap()
        }

        pub fn add_user(&self, user_id: UserId, name: &str, email: &str) {
            self.lock()
                .users
                .insert(user_id, (name.to_string(), email.to_string()));
        }

        pub fn add_course(
            &self,
            instructor_id: UserId,
            price_cents: i64,
            is_published: bool,
        ) -> CourseId {
            let course_id = CourseId::new();
            let mut tables = self.lock();
            let title = format!("Course {}", tables.courses.len() + 1);
            tables.courses.push(CourseForSale {
                course_id,
                instructor_id,
                title,
                price_cents,
                is_published,
            });
            course_id
        }

        pub fn enroll(&self, user_id: UserId, course_id: CourseId, source: EnrollmentSource) {
            self.lock()
                .enrollments
                .push((EnrollmentId::new(), user_id, course_id, source));
        }

        pub fn enrollment(
            &self,
            user_id: &UserId,
            course_id: &CourseId,
        ) -> Option<EnrollmentSource> {
            self.lock()
                .enrollments
                .iter()
                .find(|(_, u, c, _)| u == user_id && c == course_id)
                .map(|(_, _, _, source)| *source)
        }

        pub fn payments(&self) -> Vec<Payment> {
            self.lock().payments.clone()
        }

        pub fn fail_purchases(&self) {
            self.lock().purchases_fail = true;
        }
    }

    impl PaymentRepository for MemoryBillingRepository {
        async fn find_course_for_sale(
            &self,
            course_id: &CourseId,
        ) -> BillingResult<Option<CourseForSale>> {
            Ok(self
                .lock()
                .courses
                .iter()
                .find(|c| &c.course_id == course_id)
                .cloned())
        }

        async fn is_enrolled(&self, user_id: &UserId, course_id: &CourseId) -> BillingResult<bool> {
            Ok(self.lock().enrolled(user_id, course_id))
        }

        async fn create_payment(&self, payment: &Payment) -> BillingResult<()> {
            self.lock().payments.push(payment.clone());
            Ok(())
        }

        async fn update_payment(&self, payment: &Payment) -> BillingResult<()> {
            self.lock().replace_payment(payment);
            Ok(())
        }

        async fn complete_purchase(
            &self,
            payment: &Payment,
            enrollment_id: EnrollmentId,
        ) -> BillingResult<()> {
            let mut tables = self.lock();
            if tables.purchases_fail {
                return Err(BillingError::Database(sqlx::Error::PoolTimedOut));
            }
            if tables.enrolled(&payment.user_id, &payment.course_id) {
                return Err(BillingError::AlreadyEnrolled);
            }
            tables.enrollments.push((
                enrollment_id,
                payment.user_id,
                payment.course_id,
                EnrollmentSource::Purchase,
            ));
            tables.replace_payment(payment);
            Ok(())
        }

        async fn refund_purchase(&self, payment: &Payment) -> BillingResult<()> {
            let mut tables = self.lock();
            let stored = tables
                .payments
                .iter()
                .find(|p| p.payment_id == payment.payment_id)
                .map(|p| p.status)
                .ok_or(BillingError::PaymentNotFound)?;
            if stored != PaymentStatus::Succeeded {
                return Err(BillingError::InvalidPaymentTransition {
                    from: stored,
                    to: PaymentStatus::Refunded,
                });
            }
            tables.replace_payment(payment);
            tables.enrollments.retain(|(_, u, c, source)| {
                !(u == &payment.user_id
                    && c == &payment.course_id
                    && *source == EnrollmentSource::Purchase)
            });
            Ok(())
        }

        async fn find_payment(&self, payment_id: &PaymentId) -> BillingResult<Option<Payment>> {
            Ok(self
                .lock()
                .payments
                .iter()
                .find(|p| &p.payment_id == payment_id)
                .cloned())
        }

        async fn list_payments_by_user(&self, user_id: &UserId) -> BillingResult<Vec<PaymentView>> {
            let tables = self.lock();
            let mut payments: Vec<&Payment> = tables
                .payments
                .iter()
                .filter(|p| &p.user_id == user_id)
                .collect();
            payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(payments.into_iter().map(|p| tables.payment_view(p)).collect())
        }

        async fn list_payments(
            &self,
            status: Option<PaymentStatus>,
            page: PageRequest,
        ) -> BillingResult<Page<PaymentView>> {
            let tables = self.lock();
            let mut payments: Vec<&Payment> = tables
                .payments
                .iter()
                .filter(|p| status.is_none_or(|s| p.status == s))
                .collect();
            payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            let views = payments.into_iter().map(|p| tables.payment_view(p)).collect();
            Ok(paginate(views, page))
        }

        async fn course_sales(&self, instructor_id: &UserId) -> BillingResult<Vec<CourseSales>> {
            let tables = self.lock();
            Ok(tables
                .courses
                .iter()
                .filter(|c| &c.instructor_id == instructor_id)
                .map(|c| {
                    let succeeded = tables.payments.iter().filter(|p| {
                        p.course_id == c.course_id && p.status == PaymentStatus::Succeeded
                    });
                    CourseSales {
                        course_id: c.course_id,
                        title: c.title.clone(),
                        sales: succeeded.clone().count() as i64,
                        gross_cents: succeeded.map(|p| p.amount_cents).sum(),
                    }
                })
                .collect())
        }
    }

    impl PayoutRepository for MemoryBillingRepository {
        async fn create_payout(&self, payout: &Payout) -> BillingResult<()> {
            let mut tables = self.lock();
            if tables
                .payouts
                .iter()
                .any(|p| p.instructor_id == payout.instructor_id && p.status.is_open())
            {
                return Err(BillingError::PayoutAlreadyOpen);
            }
            tables.payouts.push(payout.clone());
            Ok(())
        }

        async fn find_payout(&self, payout_id: &PayoutId) -> BillingResult<Option<Payout>> {
            Ok(self
                .lock()
                .payouts
                .iter()
                .find(|p| &p.payout_id == payout_id)
                .cloned())
        }

        async fn find_open_payout(&self, instructor_id: &UserId) -> BillingResult<Option<Payout>> {
            Ok(self
                .lock()
                .payouts
                .iter()
                .find(|p| &p.instructor_id == instructor_id && p.status.is_open())
                .cloned())
        }

        async fn update_payout(&self, payout: &Payout) -> BillingResult<()> {
            let mut tables = self.lock();
            if let Some(slot) = tables
                .payouts
                .iter_mut()
                .find(|p| p.payout_id == payout.payout_id)
            {
                *slot = payout.clone();
            }
            Ok(())
        }

        async fn list_payouts_by_instructor(
            &self,
            instructor_id: &UserId,
        ) -> BillingResult<Vec<Payout>> {
            let mut payouts: Vec<Payout> = self
                .lock()
                .payouts
                .iter()
                .filter(|p| &p.instructor_id == instructor_id)
                .cloned()
                .collect();
            payouts.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
            Ok(payouts)
        }

        async fn list_payouts(
            &self,
            status: PayoutStatus,
            page: PageRequest,
        ) -> BillingResult<Page<PayoutView>> {
            let tables = self.lock();
            let mut payouts: Vec<&Payout> =
                tables.payouts.iter().filter(|p| p.status == status).collect();
            payouts.sort_by(|a, b| a.requested_at.cmp(&b.requested_at));
            let views = payouts
                .into_iter()
                .map(|p| {
                    let (instructor_name, instructor_email) = tables.user(&p.instructor_id);
                    PayoutView {
                        payout: p.clone(),
                        instructor_name,
                        instructor_email,
                    }
                })
                .collect();
            Ok(paginate(views, page))
        }

        async fn payout_totals(&self, instructor_id: &UserId) -> BillingResult<PayoutTotals> {
            let tables = self.lock();
            let mut totals = PayoutTotals::default();
            for p in tables.payouts.iter().filter(|p| &p.instructor_id == instructor_id) {
                match p.status {
                    PayoutStatus::Paid => totals.paid_cents += p.amount_cents,
                    PayoutStatus::Requested => totals.requested_cents += p.amount_cents,
                    PayoutStatus::Rejected => {}
                }
            }
            Ok(totals)
        }
    }
}

mod use_case_tests {
    use std::sync::{Arc, Mutex};

    use axum::http::StatusCode;
    use chrono::{Duration, Utc};
    use kernel::auth::CurrentUser;
    use kernel::clock::{Clock, FixedClock};
    use kernel::id::{CourseId, PaymentId, UserId};
    use kernel::page::PageRequest;
    use kernel::role::Role;

    use super::memory::{EnrollmentSource, MemoryBillingRepository};
    use crate::application::{
        BillingConfig, CheckoutUseCase, EarningsUseCase, ManagePaymentsUseCase,
        PaymentHistoryUseCase, PayoutHistoryUseCase, ProcessPayoutUseCase, RequestPayoutUseCase,
    };
    use crate::domain::gateway::{ChargeOutcome, ChargeRequest, PaymentGateway, RefundRequest};
    use crate::domain::repository::PaymentRepository;
    use crate::domain::value_object::{payment_status::PaymentStatus, payout_status::PayoutStatus};
    use crate::error::{BillingError, BillingResult};
    use crate::infra::SimulatedGateway;

    struct Fixture {
        repo: Arc<MemoryBillingRepository>,
        config: Arc<BillingConfig>,
        clock: Arc<FixedClock>,
    }

    fn fixture() -> Fixture {
        Fixture {
            repo: Arc::new(MemoryBillingRepository::new()),
            config: Arc::new(BillingConfig::new()),
            clock: Arc::new(FixedClock::new(Utc::now())),
        }
    }

    impl Fixture {
        fn user(&self, role: Role, name: &str) -> CurrentUser {
            let user = CurrentUser::new(UserId::new(), role);
            self.repo
                .add_user(user.user_id, name, &format!("{}@example.com", name.to_lowercase()));
            user
        }

        fn checkout(&self) -> CheckoutUseCase<MemoryBillingRepository, SimulatedGateway> {
            self.checkout_with(Arc::new(SimulatedGateway::new()))
        }

        fn checkout_with<G: PaymentGateway>(
            &self,
            gateway: Arc<G>,
        ) -> CheckoutUseCase<MemoryBillingRepository, G> {
            CheckoutUseCase::new(
                self.repo.clone(),
                gateway,
                self.config.clone(),
                self.clock.clone(),
            )
        }

        fn payments(&self) -> ManagePaymentsUseCase<MemoryBillingRepository, SimulatedGateway> {
            self.payments_with(Arc::new(SimulatedGateway::new()))
        }

        fn payments_with<G: PaymentGateway>(
            &self,
            gateway: Arc<G>,
        ) -> ManagePaymentsUseCase<MemoryBillingRepository, G> {
            ManagePaymentsUseCase::new(self.repo.clone(), gateway, self.clock.clone())
        }

        fn request_payout(&self) -> RequestPayoutUseCase<MemoryBillingRepository> {
            RequestPayoutUseCase::new(self.repo.clone(), self.config.clone(), self.clock.clone())
        }

        fn process_payout(&self) -> ProcessPayoutUseCase<MemoryBillingRepository> {
            ProcessPayoutUseCase::new(self.repo.clone(), self.clock.clone())
        }

        fn earnings(&self) -> EarningsUseCase<MemoryBillingRepository> {
            EarningsUseCase::new(self.repo.clone(), self.config.clone())
        }

        /// `count` students each buy the course
        async fn sell(&self, course_id: CourseId, count: usize) {
            for i in 0..count {
                let buyer = self.user(Role::Student, &format!("Buyer{i}"));
                self.checkout()
                    .execute(&buyer, course_id, "tok_visa".to_string())
                    .await
                    .unwrap();
                self.clock.advance(Duration::seconds(1));
            }
        }
    }

    /// Charges through the simulator and remembers every refund
    #[derive(Default)]
    struct RecordingGateway {
        refunds: Mutex<Vec<String>>,
        refunds_unavailable: bool,
    }

    impl RecordingGateway {
        fn unavailable_for_refunds() -> Self {
            Self {
                refunds_unavailable: true,
                ..Self::default()
            }
        }

        fn refunds(&self) -> Vec<String> {
            self.refunds.lock().unwrap().clone()
        }
    }

    impl PaymentGateway for RecordingGateway {
        async fn charge(&self, request: &ChargeRequest) -> BillingResult<ChargeOutcome> {
            SimulatedGateway::new().charge(request).await
        }

        async fn refund(&self, request: &RefundRequest) -> BillingResult<()> {
            if self.refunds_unavailable {
                return Err(BillingError::GatewayUnavailable);
            }
            self.refunds.lock().unwrap().push(request.reference.clone());
            Ok(())
        }
    }

    /// Enrolls the buyer while the charge is in flight, like a concurrent
    /// checkout finishing first
    struct RacingGateway {
        repo: Arc<MemoryBillingRepository>,
        user_id: UserId,
        course_id: CourseId,
        refunds: Mutex<Vec<String>>,
    }

    impl PaymentGateway for RacingGateway {
        async fn charge(&self, _request: &ChargeRequest) -> BillingResult<ChargeOutcome> {
            self.repo
                .enroll(self.user_id, self.course_id, EnrollmentSource::Purchase);
            Ok(ChargeOutcome::Approved {
                reference: "sim_race".to_string(),
            })
        }

        async fn refund(&self, request: &RefundRequest) -> BillingResult<()> {
            self.refunds.lock().unwrap().push(request.reference.clone());
            Ok(())
        }
    }

    // ------------------------------------------------------------------
    // Checkout
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_checkout_enrolls_buyer() {
        let f = fixture();
        let instructor = f.user(Role::Instructor, "Grace");
        let student = f.user(Role::Student, "Alan");
        let course_id = f.repo.add_course(instructor.user_id, 4900, true);

        let receipt = f
            .checkout()
            .execute(&student, course_id, "tok_visa".to_string())
            .await
            .unwrap();

        assert_eq!(receipt.payment.status, PaymentStatus::Succeeded);
        assert_eq!(receipt.payment.amount_cents, 4900);
        assert_eq!(receipt.payment.instructor_id, instructor.user_id);
        assert!(
            receipt
                .payment
                .provider_reference
                .as_deref()
                .is_some_and(|r| r.starts_with("sim_"))
        );
        assert_eq!(
            f.repo.enrollment(&student.user_id, &course_id),
            Some(EnrollmentSource::Purchase)
        );
        assert_eq!(f.repo.payments()[0].status, PaymentStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_checkout_rejects_unpurchasable_courses() {
        let f = fixture();
        let instructor = f.user(Role::Instructor, "Grace");
        let student = f.user(Role::Student, "Alan");

        let draft = f.repo.add_course(instructor.user_id, 4900, false);
        let free = f.repo.add_course(instructor.user_id, 0, true);
        let paid = f.repo.add_course(instructor.user_id, 4900, true);

        let checkout = f.checkout();
        assert!(matches!(
            checkout.execute(&student, draft, "tok_visa".into()).await,
            Err(BillingError::CourseNotFound)
        ));
        assert!(matches!(
            checkout.execute(&student, CourseId::new(), "tok_visa".into()).await,
            Err(BillingError::CourseNotFound)
        ));
        assert!(matches!(
            checkout.execute(&student, free, "tok_visa".into()).await,
            Err(BillingError::FreeCourse)
        ));
        assert!(matches!(
            checkout.execute(&instructor, paid, "tok_visa".into()).await,
            Err(BillingError::OwnCourse)
        ));

        f.repo.enroll(student.user_id, paid, EnrollmentSource::Free);
        assert!(matches!(
            checkout.execute(&student, paid, "tok_visa".into()).await,
            Err(BillingError::AlreadyEnrolled)
        ));

        assert!(f.repo.payments().is_empty());
    }

    #[tokio::test]
    async fn test_declined_charge_is_recorded() {
        let f = fixture();
        let instructor = f.user(Role::Instructor, "Grace");
        let student = f.user(Role::Student, "Alan");
        let course_id = f.repo.add_course(instructor.user_id, 4900, true);

        let err = f
            .checkout()
            .execute(&student, course_id, "tok_decline_funds".to_string())
            .await
            .unwrap_err();

        assert!(
            matches!(&err, BillingError::PaymentDeclined(reason) if reason == "Insufficient funds")
        );
        assert_eq!(err.status_code(), StatusCode::PAYMENT_REQUIRED);

        let payments = f.repo.payments();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].status, PaymentStatus::Failed);
        assert_eq!(payments[0].failure_reason.as_deref(), Some("Insufficient funds"));
        assert!(payments[0].completed_at.is_some());
        assert_eq!(f.repo.enrollment(&student.user_id, &course_id), None);
    }

    #[tokio::test]
    async fn test_unreachable_gateway_fails_payment() {
        let f = fixture();
        let instructor = f.user(Role::Instructor, "Grace");
        let student = f.user(Role::Student, "Alan");
        let course_id = f.repo.add_course(instructor.user_id, 4900, true);

        let err = f
            .checkout()
            .execute(&student, course_id, "tok_unavailable".to_string())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let payments = f.repo.payments();
        assert_eq!(payments[0].status, PaymentStatus::Failed);
        assert_eq!(
            payments[0].failure_reason.as_deref(),
            Some("Payment provider unavailable")
        );

        // A failed attempt does not block a retry
        f.checkout()
            .execute(&student, course_id, "tok_visa".to_string())
            .await
            .unwrap();
        assert_eq!(f.repo.payments().len(), 2);
    }

    #[tokio::test]
    async fn test_lost_enrollment_race_refunds_charge() {
        let f = fixture();
        let instructor = f.user(Role::Instructor, "Grace");
        let student = f.user(Role::Student, "Alan");
        let course_id = f.repo.add_course(instructor.user_id, 4900, true);

        let gateway = Arc::new(RacingGateway {
            repo: f.repo.clone(),
            user_id: student.user_id,
            course_id,
            refunds: Mutex::new(Vec::new()),
        });
        let result = f
            .checkout_with(gateway.clone())
            .execute(&student, course_id, "tok_visa".to_string())
            .await;

        assert!(matches!(result, Err(BillingError::AlreadyEnrolled)));
        let payments = f.repo.payments();
        assert_eq!(payments[0].status, PaymentStatus::Refunded);
        assert_eq!(payments[0].provider_reference.as_deref(), Some("sim_race"));
        assert_eq!(payments[0].refunded_at, Some(f.clock.now()));
        assert_eq!(*gateway.refunds.lock().unwrap(), vec!["sim_race".to_string()]);
    }

    #[tokio::test]
    async fn test_unrecorded_purchase_is_refunded() {
        let f = fixture();
        let instructor = f.user(Role::Instructor, "Grace");
        let student = f.user(Role::Student, "Alan");
        let course_id = f.repo.add_course(instructor.user_id, 4900, true);
        f.repo.fail_purchases();

        let gateway = Arc::new(RecordingGateway::default());
        let err = f
            .checkout_with(gateway.clone())
            .execute(&student, course_id, "tok_visa".to_string())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let payments = f.repo.payments();
        assert_eq!(payments[0].status, PaymentStatus::Refunded);
        let reference = payments[0].provider_reference.clone().unwrap();
        assert!(reference.starts_with("sim_"));
        assert_eq!(gateway.refunds(), vec![reference]);
        assert_eq!(f.repo.enrollment(&student.user_id, &course_id), None);
    }

    #[tokio::test]
    async fn test_unrecorded_purchase_keeps_reference_when_refund_fails() {
        let f = fixture();
        let admin = f.user(Role::Admin, "Root");
        let instructor = f.user(Role::Instructor, "Grace");
        let student = f.user(Role::Student, "Alan");
        let course_id = f.repo.add_course(instructor.user_id, 4900, true);
        f.repo.fail_purchases();

        let gateway = Arc::new(RecordingGateway::unavailable_for_refunds());
        assert!(
            f.checkout_with(gateway)
                .execute(&student, course_id, "tok_visa".to_string())
                .await
                .is_err()
        );

        // Stored as charged, not left pending, so it can be refunded later
        let payment = f.repo.payments()[0].clone();
        assert_eq!(payment.status, PaymentStatus::Succeeded);
        assert!(payment.provider_reference.is_some());
        assert!(payment.refunded_at.is_none());

        let refunded = f
            .payments()
            .refund(&admin, payment.payment_id)
            .await
            .unwrap();
        assert_eq!(refunded.status, PaymentStatus::Refunded);
    }

    // ------------------------------------------------------------------
    // Payment history and refunds
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_payment_history_is_per_user_newest_first() {
        let f = fixture();
        let instructor = f.user(Role::Instructor, "Grace");
        let student = f.user(Role::Student, "Alan");
        let other = f.user(Role::Student, "Ada");
        let first = f.repo.add_course(instructor.user_id, 1900, true);
        let second = f.repo.add_course(instructor.user_id, 2900, true);

        f.checkout().execute(&student, first, "tok_visa".into()).await.unwrap();
        f.clock.advance(Duration::minutes(1));
        let _ = f.checkout().execute(&student, second, "tok_decline".into()).await;
        f.checkout().execute(&other, first, "tok_visa".into()).await.unwrap();

        let history = PaymentHistoryUseCase::new(f.repo.clone())
            .execute(&student)
            .await
            .unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].payment.course_id, second);
        assert_eq!(history[0].payment.status, PaymentStatus::Failed);
        assert_eq!(history[1].course_title, "Course 1");
        assert_eq!(history[1].buyer_name, "Alan");
    }

    #[tokio::test]
    async fn test_admin_refund_removes_enrollment() {
        let f = fixture();
        let admin = f.user(Role::Admin, "Root");
        let instructor = f.user(Role::Instructor, "Grace");
        let student = f.user(Role::Student, "Alan");
        let course_id = f.repo.add_course(instructor.user_id, 4900, true);

        let receipt = f
            .checkout()
            .execute(&student, course_id, "tok_visa".into())
            .await
            .unwrap();
        let payment_id = receipt.payment.payment_id;

        let err = f.payments().refund(&student, payment_id).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        f.clock.advance(Duration::days(2));
        let gateway = Arc::new(RecordingGateway::default());
        let refunded = f
            .payments_with(gateway.clone())
            .refund(&admin, payment_id)
            .await
            .unwrap();
        assert_eq!(refunded.status, PaymentStatus::Refunded);
        assert_eq!(refunded.refunded_at, Some(f.clock.now()));
        let reference = receipt.payment.provider_reference.clone().unwrap();
        assert_eq!(gateway.refunds(), vec![reference]);
        assert_eq!(f.repo.enrollment(&student.user_id, &course_id), None);

        assert!(matches!(
            f.payments().refund(&admin, payment_id).await,
            Err(BillingError::InvalidPaymentTransition { .. })
        ));
        assert!(matches!(
            f.payments().refund(&admin, PaymentId::new()).await,
            Err(BillingError::PaymentNotFound)
        ));

        // The course can be bought again after a refund
        f.checkout()
            .execute(&student, course_id, "tok_visa".into())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_admin_refund_stops_when_gateway_fails() {
        let f = fixture();
        let admin = f.user(Role::Admin, "Root");
        let instructor = f.user(Role::Instructor, "Grace");
        let student = f.user(Role::Student, "Alan");
        let course_id = f.repo.add_course(instructor.user_id, 4900, true);
        let receipt = f
            .checkout()
            .execute(&student, course_id, "tok_visa".into())
            .await
            .unwrap();

        let err = f
            .payments_with(Arc::new(RecordingGateway::unavailable_for_refunds()))
            .refund(&admin, receipt.payment.payment_id)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let stored = f.repo.payments()[0].clone();
        assert_eq!(stored.status, PaymentStatus::Succeeded);
        assert!(stored.refunded_at.is_none());
        assert_eq!(
            f.repo.enrollment(&student.user_id, &course_id),
            Some(EnrollmentSource::Purchase)
        );
    }

    #[tokio::test]
    async fn test_refund_from_stale_copy_is_rejected() {
        let f = fixture();
        let instructor = f.user(Role::Instructor, "Grace");
        let student = f.user(Role::Student, "Alan");
        let course_id = f.repo.add_course(instructor.user_id, 4900, true);
        let receipt = f
            .checkout()
            .execute(&student, course_id, "tok_visa".into())
            .await
            .unwrap();

        // Two admins loaded the same succeeded payment
        let mut first = receipt.payment.clone();
        let mut second = receipt.payment;
        first.refund(f.clock.now()).unwrap();
        second.refund(f.clock.now()).unwrap();

        f.repo.refund_purchase(&first).await.unwrap();
        assert!(matches!(
            f.repo.refund_purchase(&second).await,
            Err(BillingError::InvalidPaymentTransition {
                from: PaymentStatus::Refunded,
                to: PaymentStatus::Refunded,
            })
        ));
    }

    #[tokio::test]
    async fn test_admin_lists_payments_by_status() {
        let f = fixture();
        let admin = f.user(Role::Admin, "Root");
        let instructor = f.user(Role::Instructor, "Grace");
        let course_id = f.repo.add_course(instructor.user_id, 4900, true);
        f.sell(course_id, 3).await;
        let student = f.user(Role::Student, "Alan");
        let _ = f.checkout().execute(&student, course_id, "tok_decline".into()).await;

        let all = f
            .payments()
            .list(&admin, None, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(all.total, 4);

        let failed = f
            .payments()
            .list(&admin, Some(PaymentStatus::Failed), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(failed.total, 1);
        assert_eq!(failed.items[0].buyer_name, "Alan");

        assert!(
            f.payments()
                .list(&instructor, None, PageRequest::default())
                .await
                .is_err()
        );
    }

    // ------------------------------------------------------------------
    // Earnings
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_earnings_apply_platform_fee_per_course() {
        let f = fixture();
        let instructor = f.user(Role::Instructor, "Grace");
        let sold = f.repo.add_course(instructor.user_id, 4999, true);
        let unsold = f.repo.add_course(instructor.user_id, 1500, true);
        f.sell(sold, 2).await;

        let summary = f.earnings().execute(&instructor).await.unwrap();

        assert_eq!(summary.courses.len(), 2);
        let course = summary.courses.iter().find(|c| c.course_id == sold).unwrap();
        assert_eq!(course.sales, 2);
        assert_eq!(course.gross_cents, 9998);
        // 20 % of 9998 floors to 1999
        assert_eq!(course.fee_cents, 1999);
        assert_eq!(course.net_cents, 7999);
        let empty = summary.courses.iter().find(|c| c.course_id == unsold).unwrap();
        assert_eq!(empty.sales, 0);
        assert_eq!(empty.net_cents, 0);

        assert_eq!(summary.gross_cents, 9998);
        assert_eq!(summary.available_cents, 7999);
    }

    #[tokio::test]
    async fn test_refunded_sales_leave_earnings() {
        let f = fixture();
        let admin = f.user(Role::Admin, "Root");
        let instructor = f.user(Role::Instructor, "Grace");
        let student = f.user(Role::Student, "Alan");
        let course_id = f.repo.add_course(instructor.user_id, 5000, true);

        let receipt = f
            .checkout()
            .execute(&student, course_id, "tok_visa".into())
            .await
            .unwrap();
        f.payments()
            .refund(&admin, receipt.payment.payment_id)
            .await
            .unwrap();

        let summary = f.earnings().execute(&instructor).await.unwrap();
        assert_eq!(summary.gross_cents, 0);
        assert_eq!(summary.available_cents, 0);
    }

    #[tokio::test]
    async fn test_students_have_no_earnings() {
        let f = fixture();
        let student = f.user(Role::Student, "Alan");

        let err = f.earnings().execute(&student).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    // ------------------------------------------------------------------
    // Payouts
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_payout_request_rules() {
        let f = fixture();
        let instructor = f.user(Role::Instructor, "Grace");
        let course_id = f.repo.add_course(instructor.user_id, 5000, true);
        f.sell(course_id, 2).await;
        // net = 10000 - 2000

        let request = f.request_payout();
        assert!(matches!(
            request.execute(&instructor, 999).await,
            Err(BillingError::PayoutBelowMinimum { min_cents: 1000 })
        ));
        assert!(matches!(
            request.execute(&instructor, 8001).await,
            Err(BillingError::InsufficientBalance {
                available_cents: 8000
            })
        ));

        let payout = request.execute(&instructor, 3000).await.unwrap();
        assert_eq!(payout.status, PayoutStatus::Requested);

        assert!(matches!(
            request.execute(&instructor, 1000).await,
            Err(BillingError::PayoutAlreadyOpen)
        ));

        let summary = f.earnings().execute(&instructor).await.unwrap();
        assert_eq!(summary.pending_cents, 3000);
        assert_eq!(summary.available_cents, 5000);
    }

    #[tokio::test]
    async fn test_admin_processes_payout_queue() {
        let f = fixture();
        let admin = f.user(Role::Admin, "Root");
        let grace = f.user(Role::Instructor, "Grace");
        let linus = f.user(Role::Instructor, "Linus");
        for instructor in [&grace, &linus] {
            let course_id = f.repo.add_course(instructor.user_id, 5000, true);
            f.sell(course_id, 1).await;
        }

        let first = f.request_payout().execute(&grace, 2000).await.unwrap();
        f.clock.advance(Duration::minutes(5));
        let second = f.request_payout().execute(&linus, 1500).await.unwrap();

        let queue = f
            .process_payout()
            .list(&admin, None, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(queue.total, 2);
        assert_eq!(queue.items[0].payout.payout_id, first.payout_id);
        assert_eq!(queue.items[0].instructor_name, "Grace");

        let paid = f
            .process_payout()
            .approve(&admin, first.payout_id, Some("  Wire sent  "))
            .await
            .unwrap();
        assert_eq!(paid.status, PayoutStatus::Paid);
        assert_eq!(paid.note.as_deref(), Some("Wire sent"));
        assert!(paid.processed_at.is_some());

        assert!(matches!(
            f.process_payout().approve(&admin, first.payout_id, None).await,
            Err(BillingError::PayoutAlreadyProcessed(PayoutStatus::Paid))
        ));
        assert!(matches!(
            f.process_payout().reject(&admin, second.payout_id, "   ").await,
            Err(BillingError::Validation(_))
        ));

        let rejected = f
            .process_payout()
            .reject(&admin, second.payout_id, "Bank details missing")
            .await
            .unwrap();
        assert_eq!(rejected.status, PayoutStatus::Rejected);

        // Paid money is gone, rejected money is available again
        let grace_summary = f.earnings().execute(&grace).await.unwrap();
        assert_eq!(grace_summary.paid_out_cents, 2000);
        assert_eq!(grace_summary.available_cents, 2000);
        let linus_summary = f.earnings().execute(&linus).await.unwrap();
        assert_eq!(linus_summary.pending_cents, 0);
        assert_eq!(linus_summary.available_cents, 4000);

        let history = PayoutHistoryUseCase::new(f.repo.clone())
            .execute(&grace)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);

        let err = f
            .process_payout()
            .approve(&grace, second.payout_id, None)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }
}

mod router_tests {
    use std::sync::Arc;

    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use chrono::Utc;
    use kernel::auth::CurrentUser;
    use kernel::clock::FixedClock;
    use kernel::id::{CourseId, UserId};
    use kernel::role::Role;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::memory::MemoryBillingRepository;
    use crate::application::BillingConfig;
    use crate::infra::SimulatedGateway;
    use crate::presentation::{BillingAppState, billing_router_generic};

    struct TestApp {
        router: Router,
        repo: Arc<MemoryBillingRepository>,
    }

    fn app() -> TestApp {
        let repo = Arc::new(MemoryBillingRepository::new());
        let state = BillingAppState {
            repo: repo.clone(),
            gateway: Arc::new(SimulatedGateway::new()),
            config: Arc::new(BillingConfig::new()),
            clock: Arc::new(FixedClock::new(Utc::now())),
        };

        TestApp {
            router: Router::new().nest("/api", billing_router_generic(state)),
            repo,
        }
    }

    impl TestApp {
        fn user(&self, role: Role, name: &str) -> CurrentUser {
            let user = CurrentUser::new(UserId::new(), role);
            self.repo.add_user(user.user_id, name, "someone@example.com");
            user
        }

        /// The caller is injected as the access-token middleware would
        async fn send(
            &self,
            method: &str,
            uri: &str,
            user: Option<CurrentUser>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(user) = user {
                builder = builder.extension(user);
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, json)
        }

        async fn checkout(
            &self,
            user: CurrentUser,
            course_id: CourseId,
            token: &str) -> (StatusCode, Value,
        ) {
            self.send(
                "POST",
                "/api/checkout",
                Some(user),
                Some(json!({"courseId": course_id.to_string(), "paymentToken": token})),
            )
            .await
        }
    }

    #[tokio::test]
    async fn test_checkout_requires_authentication() {
        let app = app();
        let (status, _) = app
            .send(
                "POST",
                "/api/checkout",
                None,
                Some(json!({"courseId": CourseId::new().to_string(), "paymentToken": "tok_visa"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_checkout_validates_token() {
        let app = app();
        let student = app.user(Role::Student, "Alan");
        let (status, body) = app.checkout(student, CourseId::new(), "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn test_purchase_and_history() {
        let app = app();
        let instructor = app.user(Role::Instructor, "Grace");
        let student = app.user(Role::Student, "Alan");
        let course_id = app.repo.add_course(instructor.user_id, 4900, true);

        let (status, receipt) = app.checkout(student, course_id, "tok_visa").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(receipt["payment"]["status"], "succeeded");
        assert_eq!(receipt["payment"]["amountCents"], 4900);
        assert_eq!(receipt["payment"]["currency"], "USD");
        assert!(receipt["enrollmentId"].is_string());

        let (status, history) = app.send("GET", "/api/payments", Some(student), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history.as_array().unwrap().len(), 1);
        assert_eq!(history[0]["courseTitle"], "Course 1");

        let (status, body) = app.checkout(student, course_id, "tok_visa").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["status"], 409);
    }

    #[tokio::test]
    async fn test_declined_checkout_returns_402() {
        let app = app();
        let instructor = app.user(Role::Instructor, "Grace");
        let student = app.user(Role::Student, "Alan");
        let course_id = app.repo.add_course(instructor.user_id, 4900, true);

        let (status, body) = app.checkout(student, course_id, "tok_decline_expired").await;
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert!(body["detail"].as_str().unwrap().contains("Card expired"));
        assert!(body["action"].is_string());
    }

    #[tokio::test]
    async fn test_instructor_payout_flow() {
        let app = app();
        let admin = app.user(Role::Admin, "Root");
        let instructor = app.user(Role::Instructor, "Grace");
        let student = app.user(Role::Student, "Alan");
        let course_id = app.repo.add_course(instructor.user_id, 10000, true);
        app.checkout(student, course_id, "tok_visa").await;

        let (status, earnings) = app
            .send("GET", "/api/instructor/earnings", Some(instructor), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(earnings["grossCents"], 10000);
        assert_eq!(earnings["feeCents"], 2000);
        assert_eq!(earnings["availableCents"], 8000);

        let (status, body) = app
            .send(
                "POST",
                "/api/instructor/payouts",
                Some(instructor),
                Some(json!({"amountCents": 9000})),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["status"], 422);

        let (status, payout) = app
            .send(
                "POST",
                "/api/instructor/payouts",
                Some(instructor),
                Some(json!({"amountCents": 8000})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(payout["status"], "requested");
        let payout_id = payout["payoutId"].as_str().unwrap().to_string();

        let (status, queue) = app.send("GET", "/api/admin/payouts", Some(admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(queue["total"], 1);
        assert_eq!(queue["items"][0]["instructorName"], "Grace");

        let (status, paid) = app
            .send(
                "POST",
                &format!("/api/admin/payouts/{payout_id}/approve"),
                Some(admin),
                Some(json!({})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(paid["status"], "paid");

        let (_, history) = app
            .send("GET", "/api/instructor/payouts", Some(instructor), None)
            .await;
        assert_eq!(history[0]["status"], "paid");
    }

    #[tokio::test]
    async fn test_admin_routes_reject_non_admins() {
        let app = app();
        let instructor = app.user(Role::Instructor, "Grace");

        let (status, _) = app
            .send("GET", "/api/admin/payments", Some(instructor), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .send("GET", "/api/instructor/earnings", Some(app.user(Role::Student, "Alan")), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_refund_over_http() {
        let app = app();
        let admin = app.user(Role::Admin, "Root");
        let instructor = app.user(Role::Instructor, "Grace");
        let student = app.user(Role::Student, "Alan");
        let course_id = app.repo.add_course(instructor.user_id, 4900, true);
        let (_, receipt) = app.checkout(student, course_id, "tok_visa").await;
        let payment_id = receipt["payment"]["paymentId"].as_str().unwrap().to_string();

        let (status, refunded) = app
            .send(
                "POST",
                &format!("/api/admin/payments/{payment_id}/refund"),
                Some(admin),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(refunded["status"], "refunded");

        let (_, listing) = app
            .send("GET", "/api/admin/payments?status=refunded", Some(admin), None)
            .await;
        assert_eq!(listing["total"], 1);
        assert_eq!(listing["items"][0]["buyerName"], "Alan");
    }
}
