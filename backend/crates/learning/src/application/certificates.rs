//! Certificate Use Cases
//!
//! Issuing is an existence check followed by an insert that does nothing on
//! conflict, so two concurrent requests still end with a single row.

use kernel::auth::CurrentUser;
use kernel::clock::Clock;
use kernel::id::CourseId;
use std::sync::Arc;

use crate::application::access::require_enrollment;
use crate::application::progress::{course_progress, sync_completion};
use crate::domain::entity::certificate::Certificate;
use crate::domain::repository::{
    AttemptRepository, CertificateRepository, CertificateView, EnrollmentRepository,
    LessonRepository, ProgressRepository, QuizRepository,
};
use crate::domain::value_object::certificate_code::CertificateCode;
use crate::error::{LearningError, LearningResult};

#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    pub certificate: Certificate,
    /// False when the certificate already existed
    pub created: bool,
}

pub struct IssueCertificateUseCase<R>
where
    R: CertificateRepository
        + EnrollmentRepository
        + LessonRepository
        + QuizRepository
        + AttemptRepository
        + ProgressRepository,
{
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> IssueCertificateUseCase<R>
where
    R: CertificateRepository
        + EnrollmentRepository
        + LessonRepository
        + QuizRepository
        + AttemptRepository
        + ProgressRepository,
{
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    pub async fn execute(
        &self,
        caller: &CurrentUser,
        course_id: CourseId,
    ) -> LearningResult<IssuedCertificate> {
        let mut enrollment = require_enrollment(&*self.repo, &caller.user_id, &course_id).await?;

        if let Some(certificate) = self.repo.find_certificate(&caller.user_id, &course_id).await? {
            return Ok(IssuedCertificate {
                certificate,
                created: false,
            });
        }

        let now = self.clock.now();
        let progress = course_progress(&*self.repo, &caller.user_id, &course_id).await?;
        if !progress.is_complete() {
            return Err(LearningError::CourseIncomplete);
        }
        sync_completion(&*self.repo, &mut enrollment, &progress, now).await?;

        let candidate = Certificate::issue(caller.user_id, course_id, now);
        if self.repo.insert_certificate(&candidate).await? {
            tracing::info!(
                user_id = %caller.user_id,
                course_id = %course_id,
                code = %candidate.code,
                "Certificate issued"
            );
            return Ok(IssuedCertificate {
                certificate: candidate,
                created: true,
            });
        }

        // Lost a race with a concurrent request
        let certificate = self
            .repo
            .find_certificate(&caller.user_id, &course_id)
            .await?
            .ok_or_else(|| {
                LearningError::Internal("Certificate missing after conflicting insert".to_string())
            })?;

        Ok(IssuedCertificate {
            certificate,
            created: false,
        })
    }
}

pub struct ListCertificatesUseCase<R>
where
    R: CertificateRepository,
{
    repo: Arc<R>,
}

impl<R> ListCertificatesUseCase<R>
where
    R: CertificateRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, caller: &CurrentUser) -> LearningResult<Vec<CertificateView>> {
        self.repo.list_certificates(&caller.user_id).await
    }
}

/// Public verification by code
pub struct VerifyCertificateUseCase<R>
where
    R: CertificateRepository,
{
    repo: Arc<R>,
}

impl<R> VerifyCertificateUseCase<R>
where
    R: CertificateRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, code: &str) -> LearningResult<CertificateView> {
        let code = CertificateCode::parse(code).ok_or(LearningError::CertificateNotFound)?;
        self.repo
            .find_certificate_by_code(&code)
            .await?
            .ok_or(LearningError::CertificateNotFound)
    }
}
