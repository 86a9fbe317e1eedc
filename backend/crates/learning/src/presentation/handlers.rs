//! HTTP Handlers

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use kernel::auth::CurrentUser;
use kernel::clock::Clock;
use kernel::id::{CourseId, LessonId, QuizId};
use kernel::page::{DEFAULT_PER_PAGE, Page, PageRequest};
use platform::storage::ObjectStorage;
use std::sync::Arc;
use validator::Validate;

use crate::application::config::LearningConfig;
use crate::application::{
    CompleteLessonUseCase, CourseAuthoringUseCase, CourseDetailUseCase, CourseProgressUseCase,
    CourseRosterUseCase, EnrollUseCase, GetQuizUseCase, InstructorDashboardUseCase,
    IssueCertificateUseCase, LessonAuthoringUseCase, ListAttemptsUseCase, ListCatalogUseCase,
    ListCertificatesUseCase, ListEnrollmentsUseCase, ModerationUseCase, QuizAuthoringUseCase,
    ReadLessonUseCase, StudentDashboardUseCase, SubmitQuizUseCase, UploadThumbnailUseCase,
    VerifyCertificateUseCase,
};
use crate::domain::repository::{
    AttemptRepository, CatalogFilter, CertificateRepository, CourseRepository,
    EnrollmentRepository, LessonRepository, ProgressRepository, QuizRepository,
};
use crate::error::LearningResult;
use crate::presentation::dto::{
    AttemptResponse, CatalogQuery, CertificateResponse, CourseDetailResponse, CourseRequest,
    CourseResponse, CourseSummaryResponse, EnrolledCourseResponse, EnrollmentResponse,
    InstructorDashboardResponse, IssuedCertificateResponse, LessonRequest, LessonResponse,
    ModerationQuery, ProgressResponse, QuizRequest, QuizResponse, RejectCourseRequest,
    ReorderLessonsRequest, RosterResponse, StudentDashboardResponse, SubmissionResponse,
    SubmitQuizRequest,
};

/// Every repository the learning handlers need, implemented by one store
pub trait LearningRepositories:
    CourseRepository
    + LessonRepository
    + QuizRepository
    + AttemptRepository
    + EnrollmentRepository
    + ProgressRepository
    + CertificateRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> LearningRepositories for T where
    T: CourseRepository
        + LessonRepository
        + QuizRepository
        + AttemptRepository
        + EnrollmentRepository
        + ProgressRepository
        + CertificateRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}

/// Shared state for learning handlers
#[derive(Clone)]
pub struct LearningAppState<R>
where
    R: LearningRepositories,
{
    pub repo: Arc<R>,
    pub config: Arc<LearningConfig>,
    pub clock: Arc<dyn Clock>,
    pub storage: Arc<ObjectStorage>,
}

impl<R> LearningAppState<R>
where
    R: LearningRepositories,
{
    fn authoring(&self) -> CourseAuthoringUseCase<R, ObjectStorage> {
        CourseAuthoringUseCase::new(self.repo.clone(), self.storage.clone(), self.clock.clone())
    }

    fn lessons(&self) -> LessonAuthoringUseCase<R> {
        LessonAuthoringUseCase::new(self.repo.clone(), self.clock.clone())
    }

    fn quizzes(&self) -> QuizAuthoringUseCase<R> {
        QuizAuthoringUseCase::new(self.repo.clone(), self.config.clone(), self.clock.clone())
    }

    fn moderation(&self) -> ModerationUseCase<R> {
        ModerationUseCase::new(self.repo.clone(), self.clock.clone())
    }
}

fn page_request(page: Option<u32>, per_page: Option<u32>) -> PageRequest {
    PageRequest::new(page.unwrap_or(1), per_page.unwrap_or(DEFAULT_PER_PAGE))
}

// ============================================================================
// Catalog
// ============================================================================

/// GET /api/courses
pub async fn list_catalog<R>(
    State(state): State<LearningAppState<R>>,
    Query(query): Query<CatalogQuery>,
) -> LearningResult<Json<Page<CourseSummaryResponse>>>
where
    R: LearningRepositories,
{
    let page = page_request(query.page, query.per_page);
    let filter = CatalogFilter {
        search: query.search,
        category: query.category,
        level: query.level,
    };

    let use_case = ListCatalogUseCase::new(state.repo.clone());
    let courses = use_case.execute(filter, page).await?;

    Ok(Json(courses.map(|c| CourseSummaryResponse::from(&c))))
}

/// GET /api/courses/{course_id}
///
/// Anonymous callers see published courses only.
pub async fn get_course<R>(
    State(state): State<LearningAppState<R>>,
    user: Option<CurrentUser>,
    Path(course_id): Path<CourseId>,
) -> LearningResult<Json<CourseDetailResponse>>
where
    R: LearningRepositories,
{
    let use_case = CourseDetailUseCase::new(state.repo.clone());
    let outline = use_case.execute(course_id, user).await?;

    Ok(Json(CourseDetailResponse::from(&outline)))
}

// ============================================================================
// Course authoring
// ============================================================================

/// POST /api/courses
pub async fn create_course<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
    Json(req): Json<CourseRequest>,
) -> LearningResult<(StatusCode, Json<CourseResponse>)>
where
    R: LearningRepositories,
{
    req.validate()?;

    let course = state.authoring().create(&user, req.into()).await?;

    Ok((StatusCode::CREATED, Json(CourseResponse::from(&course))))
}

/// PUT /api/courses/{course_id}
pub async fn update_course<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
    Path(course_id): Path<CourseId>,
    Json(req): Json<CourseRequest>,
) -> LearningResult<Json<CourseResponse>>
where
    R: LearningRepositories,
{
    req.validate()?;

    let course = state.authoring().update(&user, course_id, req.into()).await?;

    Ok(Json(CourseResponse::from(&course)))
}

/// DELETE /api/courses/{course_id}
pub async fn delete_course<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
    Path(course_id): Path<CourseId>,
) -> LearningResult<StatusCode>
where
    R: LearningRepositories,
{
    state.authoring().delete(&user, course_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/courses/{course_id}/submit
pub async fn submit_course<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
    Path(course_id): Path<CourseId>,
) -> LearningResult<Json<CourseResponse>>
where
    R: LearningRepositories,
{
    let course = state.authoring().submit_for_review(&user, course_id).await?;

    Ok(Json(CourseResponse::from(&course)))
}

/// POST /api/courses/{course_id}/archive
pub async fn archive_course<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
    Path(course_id): Path<CourseId>,
) -> LearningResult<Json<CourseResponse>>
where
    R: LearningRepositories,
{
    let course = state.authoring().archive(&user, course_id).await?;

    Ok(Json(CourseResponse::from(&course)))
}

/// PUT /api/courses/{course_id}/thumbnail (raw image body)
pub async fn upload_thumbnail<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
    Path(course_id): Path<CourseId>,
    headers: HeaderMap,
    body: Bytes,
) -> LearningResult<Json<CourseResponse>>
where
    R: LearningRepositories,
{
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let use_case = UploadThumbnailUseCase::new(
        state.repo.clone(),
        state.storage.clone(),
        state.config.clone(),
        state.clock.clone(),
    );
    let course = use_case
        .execute(&user, course_id, content_type, body.to_vec())
        .await?;

    Ok(Json(CourseResponse::from(&course)))
}

/// GET /api/instructor/courses
pub async fn list_own_courses<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
) -> LearningResult<Json<Vec<CourseSummaryResponse>>>
where
    R: LearningRepositories,
{
    let courses = state.authoring().list_own(&user).await?;

    Ok(Json(courses.iter().map(CourseSummaryResponse::from).collect()))
}

/// GET /api/courses/{course_id}/roster
pub async fn course_roster<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
    Path(course_id): Path<CourseId>,
) -> LearningResult<Json<RosterResponse>>
where
    R: LearningRepositories,
{
    let use_case = CourseRosterUseCase::new(state.repo.clone());
    let roster = use_case.execute(&user, course_id).await?;

    Ok(Json(RosterResponse::from(&roster)))
}

// ============================================================================
// Lessons
// ============================================================================

/// POST /api/courses/{course_id}/lessons
pub async fn add_lesson<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
    Path(course_id): Path<CourseId>,
    Json(req): Json<LessonRequest>,
) -> LearningResult<(StatusCode, Json<LessonResponse>)>
where
    R: LearningRepositories,
{
    req.validate()?;

    let lesson = state.lessons().add(&user, course_id, req.into()).await?;

    Ok((StatusCode::CREATED, Json(LessonResponse::from(&lesson))))
}

/// PUT /api/courses/{course_id}/lessons/order
pub async fn reorder_lessons<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
    Path(course_id): Path<CourseId>,
    Json(req): Json<ReorderLessonsRequest>,
) -> LearningResult<Json<Vec<LessonResponse>>>
where
    R: LearningRepositories,
{
    let lessons = state
        .lessons()
        .reorder(&user, course_id, req.lesson_ids)
        .await?;

    Ok(Json(lessons.iter().map(LessonResponse::from).collect()))
}

/// GET /api/lessons/{lesson_id}
pub async fn get_lesson<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
    Path(lesson_id): Path<LessonId>,
) -> LearningResult<Json<LessonResponse>>
where
    R: LearningRepositories,
{
    let use_case = ReadLessonUseCase::new(state.repo.clone());
    let lesson = use_case.execute(&user, lesson_id).await?;

    Ok(Json(LessonResponse::from(&lesson)))
}

/// PUT /api/lessons/{lesson_id}
pub async fn update_lesson<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
    Path(lesson_id): Path<LessonId>,
    Json(req): Json<LessonRequest>,
) -> LearningResult<Json<LessonResponse>>
where
    R: LearningRepositories,
{
    req.validate()?;

    let lesson = state.lessons().update(&user, lesson_id, req.into()).await?;

    Ok(Json(LessonResponse::from(&lesson)))
}

/// DELETE /api/lessons/{lesson_id}
pub async fn delete_lesson<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
    Path(lesson_id): Path<LessonId>,
) -> LearningResult<StatusCode>
where
    R: LearningRepositories,
{
    state.lessons().delete(&user, lesson_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/lessons/{lesson_id}/complete
pub async fn complete_lesson<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
    Path(lesson_id): Path<LessonId>,
) -> LearningResult<Json<ProgressResponse>>
where
    R: LearningRepositories,
{
    let use_case = CompleteLessonUseCase::new(state.repo.clone(), state.clock.clone());
    let view = use_case.execute(&user, lesson_id).await?;

    Ok(Json(ProgressResponse::from(&view)))
}

// ============================================================================
// Quizzes
// ============================================================================

/// POST /api/courses/{course_id}/quizzes
pub async fn create_quiz<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
    Path(course_id): Path<CourseId>,
    Json(req): Json<QuizRequest>,
) -> LearningResult<(StatusCode, Json<QuizResponse>)>
where
    R: LearningRepositories,
{
    req.validate()?;

    let quiz = state.quizzes().create(&user, course_id, req.into()).await?;

    Ok((StatusCode::CREATED, Json(QuizResponse::new(&quiz, true))))
}

/// GET /api/quizzes/{quiz_id}
pub async fn get_quiz<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
    Path(quiz_id): Path<QuizId>,
) -> LearningResult<Json<QuizResponse>>
where
    R: LearningRepositories,
{
    let use_case = GetQuizUseCase::new(state.repo.clone());
    let view = use_case.execute(&user, quiz_id).await?;

    Ok(Json(QuizResponse::from(&view)))
}

/// PUT /api/quizzes/{quiz_id}
pub async fn replace_quiz<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
    Path(quiz_id): Path<QuizId>,
    Json(req): Json<QuizRequest>,
) -> LearningResult<Json<QuizResponse>>
where
    R: LearningRepositories,
{
    req.validate()?;

    let quiz = state.quizzes().replace(&user, quiz_id, req.into()).await?;

    Ok(Json(QuizResponse::new(&quiz, true)))
}

/// DELETE /api/quizzes/{quiz_id}
pub async fn delete_quiz<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
    Path(quiz_id): Path<QuizId>,
) -> LearningResult<StatusCode>
where
    R: LearningRepositories,
{
    state.quizzes().delete(&user, quiz_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/quizzes/{quiz_id}/submit
pub async fn submit_quiz<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
    Path(quiz_id): Path<QuizId>,
    Json(req): Json<SubmitQuizRequest>,
) -> LearningResult<Json<SubmissionResponse>>
where
    R: LearningRepositories,
{
    let answers = req.answers.into_iter().map(Into::into).collect();

    let use_case = SubmitQuizUseCase::new(state.repo.clone(), state.clock.clone());
    let result = use_case.execute(&user, quiz_id, answers).await?;

    Ok(Json(SubmissionResponse::from(&result)))
}

/// GET /api/quizzes/{quiz_id}/attempts
pub async fn list_attempts<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
    Path(quiz_id): Path<QuizId>,
) -> LearningResult<Json<Vec<AttemptResponse>>>
where
    R: LearningRepositories,
{
    let use_case = ListAttemptsUseCase::new(state.repo.clone());
    let attempts = use_case.execute(&user, quiz_id).await?;

    Ok(Json(attempts.iter().map(AttemptResponse::from).collect()))
}

// ============================================================================
// Enrollment / Progress / Certificates
// ============================================================================

/// POST /api/courses/{course_id}/enroll
pub async fn enroll<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
    Path(course_id): Path<CourseId>,
) -> LearningResult<(StatusCode, Json<EnrollmentResponse>)>
where
    R: LearningRepositories,
{
    let use_case = EnrollUseCase::new(state.repo.clone(), state.clock.clone());
    let enrollment = use_case.execute(&user, course_id).await?;

    Ok((StatusCode::CREATED, Json(EnrollmentResponse::from(&enrollment))))
}

/// GET /api/me/enrollments
pub async fn list_enrollments<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
) -> LearningResult<Json<Vec<EnrolledCourseResponse>>>
where
    R: LearningRepositories,
{
    let use_case = ListEnrollmentsUseCase::new(state.repo.clone());
    let enrollments = use_case.execute(&user).await?;

    Ok(Json(enrollments.iter().map(EnrolledCourseResponse::from).collect()))
}

/// GET /api/courses/{course_id}/progress
pub async fn course_progress<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
    Path(course_id): Path<CourseId>,
) -> LearningResult<Json<ProgressResponse>>
where
    R: LearningRepositories,
{
    let use_case = CourseProgressUseCase::new(state.repo.clone());
    let view = use_case.execute(&user, course_id).await?;

    Ok(Json(ProgressResponse::from(&view)))
}

/// POST /api/courses/{course_id}/certificate
///
/// 201 when issued now, 200 when it already existed.
pub async fn issue_certificate<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
    Path(course_id): Path<CourseId>,
) -> LearningResult<(StatusCode, Json<IssuedCertificateResponse>)>
where
    R: LearningRepositories,
{
    let use_case = IssueCertificateUseCase::new(state.repo.clone(), state.clock.clone());
    let issued = use_case.execute(&user, course_id).await?;

    let status = if issued.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(IssuedCertificateResponse::from(&issued))))
}

/// GET /api/me/certificates
pub async fn list_certificates<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
) -> LearningResult<Json<Vec<CertificateResponse>>>
where
    R: LearningRepositories,
{
    let use_case = ListCertificatesUseCase::new(state.repo.clone());
    let certificates = use_case.execute(&user).await?;

    Ok(Json(certificates.iter().map(CertificateResponse::from).collect()))
}

/// GET /api/certificates/{code}
pub async fn verify_certificate<R>(
    State(state): State<LearningAppState<R>>,
    Path(code): Path<String>,
) -> LearningResult<Json<CertificateResponse>>
where
    R: LearningRepositories,
{
    let use_case = VerifyCertificateUseCase::new(state.repo.clone());
    let view = use_case.execute(&code).await?;

    Ok(Json(CertificateResponse::from(&view)))
}

// ============================================================================
// Dashboards
// ============================================================================

/// GET /api/dashboard/student
pub async fn student_dashboard<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
) -> LearningResult<Json<StudentDashboardResponse>>
where
    R: LearningRepositories,
{
    let use_case = StudentDashboardUseCase::new(state.repo.clone(), state.config.clone());
    let dashboard = use_case.execute(&user).await?;

    Ok(Json(StudentDashboardResponse::from(&dashboard)))
}

/// GET /api/dashboard/instructor
pub async fn instructor_dashboard<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
) -> LearningResult<Json<InstructorDashboardResponse>>
where
    R: LearningRepositories,
{
    let use_case = InstructorDashboardUseCase::new(state.repo.clone());
    let dashboard = use_case.execute(&user).await?;

    Ok(Json(InstructorDashboardResponse::from(&dashboard)))
}

// ============================================================================
// Admin: moderation
// ============================================================================

/// GET /api/admin/courses
pub async fn list_courses_for_review<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
    Query(query): Query<ModerationQuery>,
) -> LearningResult<Json<Page<CourseSummaryResponse>>>
where
    R: LearningRepositories,
{
    let page = page_request(query.page, query.per_page);
    let courses = state.moderation().list(&user, query.status, page).await?;

    Ok(Json(courses.map(|c| CourseSummaryResponse::from(&c))))
}

/// POST /api/admin/courses/{course_id}/approve
pub async fn approve_course<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
    Path(course_id): Path<CourseId>,
) -> LearningResult<Json<CourseResponse>>
where
    R: LearningRepositories,
{
    let course = state.moderation().approve(&user, course_id).await?;

    Ok(Json(CourseResponse::from(&course)))
}

/// POST /api/admin/courses/{course_id}/reject
pub async fn reject_course<R>(
    State(state): State<LearningAppState<R>>,
    user: CurrentUser,
    Path(course_id): Path<CourseId>,
    Json(req): Json<RejectCourseRequest>,
) -> LearningResult<Json<CourseResponse>>
where
    R: LearningRepositories,
{
    req.validate()?;

    let course = state.moderation().reject(&user, course_id, &req.reason).await?;

    Ok(Json(CourseResponse::from(&course)))
}
