//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use kernel::id::{
    AnswerOptionId, CertificateId, CourseId, EnrollmentId, LessonId, QuestionId, QuizAttemptId,
    QuizId, UserId,
};
use platform::storage::media_url;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::{
    CourseOutline, CourseRoster, EnrolledCourseProgress, InstructorCourseStats,
    InstructorDashboard, IssuedCertificate, ProgressView, QuizView, StudentDashboard,
    SubmissionResult,
};
use crate::domain::entity::{
    course::{Course, CourseDetails},
    enrollment::Enrollment,
    lesson::{Lesson, LessonDraft},
    progress::CourseProgress,
    quiz::{OptionDraft, QuestionDraft, Quiz, QuizDraft},
    quiz_attempt::QuizAttempt,
};
use crate::domain::grading::SubmittedAnswer;
use crate::domain::repository::{AttemptSummary, CertificateView, CourseSummary, EnrolledCourse};
use crate::domain::value_object::{
    course_level::CourseLevel, course_status::CourseStatus, enrollment_source::EnrollmentSource,
};

// ============================================================================
// Courses
// ============================================================================

/// Catalog query (`?search=rust&category=programming&level=beginner&page=1`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub level: Option<CourseLevel>,
}

/// Create or update a course
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CourseRequest {
    #[validate(length(min = 3, max = 200))]
    pub title: String,
    #[validate(length(max = 500))]
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, max = 60))]
    pub category: String,
    #[serde(default)]
    pub level: CourseLevel,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub price_cents: i64,
}

impl From<CourseRequest> for CourseDetails {
    fn from(req: CourseRequest) -> Self {
        Self {
            title: req.title,
            summary: req.summary,
            description: req.description,
            category: req.category,
            level: req.level,
            price_cents: req.price_cents,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    pub course_id: CourseId,
    pub instructor_id: UserId,
    pub title: String,
    pub summary: String,
    pub description: String,
    pub category: String,
    pub level: CourseLevel,
    pub price_cents: i64,
    pub is_free: bool,
    pub thumbnail_url: Option<String>,
    pub status: CourseStatus,
    pub rejection_reason: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Course> for CourseResponse {
    fn from(course: &Course) -> Self {
        Self {
            course_id: course.course_id,
            instructor_id: course.instructor_id,
            title: course.title.clone(),
            summary: course.summary.clone(),
            description: course.description.clone(),
            category: course.category.clone(),
            level: course.level,
            price_cents: course.price_cents,
            is_free: course.is_free(),
            thumbnail_url: course.thumbnail_key.as_deref().map(media_url),
            status: course.status,
            rejection_reason: course.rejection_reason.clone(),
            published_at: course.published_at,
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

/// Catalog card
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummaryResponse {
    #[serde(flatten)]
    pub course: CourseResponse,
    pub instructor_name: String,
    pub lesson_count: i64,
    pub enrollment_count: i64,
}

impl From<&CourseSummary> for CourseSummaryResponse {
    fn from(summary: &CourseSummary) -> Self {
        Self {
            course: CourseResponse::from(&summary.course),
            instructor_name: summary.instructor_name.clone(),
            lesson_count: summary.lesson_count,
            enrollment_count: summary.enrollment_count,
        }
    }
}

/// Lesson entry of a course outline; content is never included
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonOutlineResponse {
    pub lesson_id: LessonId,
    pub title: String,
    pub position: i32,
    pub duration_minutes: i32,
    pub is_preview: bool,
}

impl From<&Lesson> for LessonOutlineResponse {
    fn from(lesson: &Lesson) -> Self {
        Self {
            lesson_id: lesson.lesson_id,
            title: lesson.title.clone(),
            position: lesson.position,
            duration_minutes: lesson.duration_minutes,
            is_preview: lesson.is_preview,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOutlineResponse {
    pub quiz_id: QuizId,
    pub lesson_id: Option<LessonId>,
    pub title: String,
    pub pass_percentage: i16,
    pub question_count: usize,
}

impl From<&Quiz> for QuizOutlineResponse {
    fn from(quiz: &Quiz) -> Self {
        Self {
            quiz_id: quiz.quiz_id,
            lesson_id: quiz.lesson_id,
            title: quiz.title.clone(),
            pass_percentage: quiz.pass_percentage,
            question_count: quiz.questions.len(),
        }
    }
}

/// Course page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetailResponse {
    #[serde(flatten)]
    pub course: CourseSummaryResponse,
    pub lessons: Vec<LessonOutlineResponse>,
    pub quizzes: Vec<QuizOutlineResponse>,
    pub is_enrolled: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub can_manage: bool,
}

impl From<&CourseOutline> for CourseDetailResponse {
    fn from(outline: &CourseOutline) -> Self {
        Self {
            course: CourseSummaryResponse::from(&outline.summary),
            lessons: outline.lessons.iter().map(LessonOutlineResponse::from).collect(),
            quizzes: outline.quizzes.iter().map(QuizOutlineResponse::from).collect(),
            is_enrolled: outline.enrollment.is_some(),
            completed_at: outline.enrollment.as_ref().and_then(|e| e.completed_at),
            can_manage: outline.can_manage,
        }
    }
}

// ============================================================================
// Lessons
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LessonRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[validate(length(max = 500))]
    pub video_url: Option<String>,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub duration_minutes: i32,
    #[serde(default)]
    pub is_preview: bool,
}

impl From<LessonRequest> for LessonDraft {
    fn from(req: LessonRequest) -> Self {
        Self {
            title: req.title,
            content: req.content,
            video_url: req.video_url,
            duration_minutes: req.duration_minutes,
            is_preview: req.is_preview,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderLessonsRequest {
    pub lesson_ids: Vec<LessonId>,
}

/// Full lesson including content
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonResponse {
    pub lesson_id: LessonId,
    pub course_id: CourseId,
    pub title: String,
    pub content: String,
    pub video_url: Option<String>,
    pub position: i32,
    pub duration_minutes: i32,
    pub is_preview: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Lesson> for LessonResponse {
    fn from(lesson: &Lesson) -> Self {
        Self {
            lesson_id: lesson.lesson_id,
            course_id: lesson.course_id,
            title: lesson.title.clone(),
            content: lesson.content.clone(),
            video_url: lesson.video_url.clone(),
            position: lesson.position,
            duration_minutes: lesson.duration_minutes,
            is_preview: lesson.is_preview,
            created_at: lesson.created_at,
            updated_at: lesson.updated_at,
        }
    }
}

// ============================================================================
// Quizzes
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub lesson_id: Option<LessonId>,
    #[validate(range(min = 1, max = 100))]
    pub pass_percentage: Option<i16>,
    /// Count and shape are checked by `Quiz::replace`
    #[serde(default)]
    pub questions: Vec<QuestionRequest>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRequest {
    pub prompt: String,
    pub options: Vec<OptionRequest>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionRequest {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

impl From<QuizRequest> for QuizDraft {
    fn from(req: QuizRequest) -> Self {
        Self {
            title: req.title,
            lesson_id: req.lesson_id,
            pass_percentage: req.pass_percentage,
            questions: req
                .questions
                .into_iter()
                .map(|q| QuestionDraft {
                    prompt: q.prompt,
                    options: q
                        .options
                        .into_iter()
                        .map(|o| OptionDraft {
                            text: o.text,
                            is_correct: o.is_correct,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// `isCorrect` is only present in the owner's view
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionResponse {
    pub option_id: AnswerOptionId,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub question_id: QuestionId,
    pub prompt: String,
    pub position: i32,
    pub options: Vec<OptionResponse>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResponse {
    pub quiz_id: QuizId,
    pub course_id: CourseId,
    pub lesson_id: Option<LessonId>,
    pub title: String,
    pub pass_percentage: i16,
    pub questions: Vec<QuestionResponse>,
    pub updated_at: DateTime<Utc>,
}

impl QuizResponse {
    pub fn new(quiz: &Quiz, reveal_answers: bool) -> Self {
        Self {
            quiz_id: quiz.quiz_id,
            course_id: quiz.course_id,
            lesson_id: quiz.lesson_id,
            title: quiz.title.clone(),
            pass_percentage: quiz.pass_percentage,
            questions: quiz
                .questions
                .iter()
                .map(|q| QuestionResponse {
                    question_id: q.question_id,
                    prompt: q.prompt.clone(),
                    position: q.position,
                    options: q
                        .options
                        .iter()
                        .map(|o| OptionResponse {
                            option_id: o.option_id,
                            text: o.text.clone(),
                            is_correct: reveal_answers.then_some(o.is_correct),
                        })
                        .collect(),
                })
                .collect(),
            updated_at: quiz.updated_at,
        }
    }
}

impl From<&QuizView> for QuizResponse {
    fn from(view: &QuizView) -> Self {
        Self::new(&view.quiz, view.reveal_answers)
    }
}

// ============================================================================
// Submissions
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizRequest {
    #[serde(default)]
    pub answers: Vec<AnswerRequest>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub question_id: QuestionId,
    pub option_id: AnswerOptionId,
}

impl From<AnswerRequest> for SubmittedAnswer {
    fn from(req: AnswerRequest) -> Self {
        Self {
            question_id: req.question_id,
            option_id: req.option_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResultResponse {
    pub question_id: QuestionId,
    pub selected_option_id: Option<AnswerOptionId>,
    pub correct_option_id: Option<AnswerOptionId>,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub attempt_id: QuizAttemptId,
    pub quiz_id: QuizId,
    pub score: i32,
    pub total: i32,
    pub percentage: i16,
    pub passed: bool,
    pub course_completed: bool,
    pub results: Vec<QuestionResultResponse>,
    pub submitted_at: DateTime<Utc>,
}

impl From<&SubmissionResult> for SubmissionResponse {
    fn from(result: &SubmissionResult) -> Self {
        Self {
            attempt_id: result.attempt.attempt_id,
            quiz_id: result.attempt.quiz_id,
            score: result.grade.score,
            total: result.grade.total,
            percentage: result.grade.percentage,
            passed: result.grade.passed,
            course_completed: result.course_completed,
            results: result
                .grade
                .results
                .iter()
                .map(|r| QuestionResultResponse {
                    question_id: r.question_id,
                    selected_option_id: r.selected_option_id,
                    correct_option_id: r.correct_option_id,
                    is_correct: r.is_correct,
                })
                .collect(),
            submitted_at: result.attempt.submitted_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptAnswerResponse {
    pub question_id: QuestionId,
    pub option_id: AnswerOptionId,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptResponse {
    pub attempt_id: QuizAttemptId,
    pub quiz_id: QuizId,
    pub score: i32,
    pub total: i32,
    pub percentage: i16,
    pub passed: bool,
    pub answers: Vec<AttemptAnswerResponse>,
    pub submitted_at: DateTime<Utc>,
}

impl From<&QuizAttempt> for AttemptResponse {
    fn from(attempt: &QuizAttempt) -> Self {
        Self {
            attempt_id: attempt.attempt_id,
            quiz_id: attempt.quiz_id,
            score: attempt.score,
            total: attempt.total,
            percentage: attempt.percentage,
            passed: attempt.passed,
            answers: attempt
                .answers
                .iter()
                .map(|a| AttemptAnswerResponse {
                    question_id: a.question_id,
                    option_id: a.option_id,
                    is_correct: a.is_correct,
                })
                .collect(),
            submitted_at: attempt.submitted_at,
        }
    }
}

/// Dashboard row: an attempt with its quiz and course titles
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentAttemptResponse {
    pub attempt_id: QuizAttemptId,
    pub quiz_id: QuizId,
    pub quiz_title: String,
    pub course_id: CourseId,
    pub course_title: String,
    pub score: i32,
    pub total: i32,
    pub percentage: i16,
    pub passed: bool,
    pub submitted_at: DateTime<Utc>,
}

impl From<&AttemptSummary> for RecentAttemptResponse {
    fn from(summary: &AttemptSummary) -> Self {
        Self {
            attempt_id: summary.attempt.attempt_id,
            quiz_id: summary.attempt.quiz_id,
            quiz_title: summary.quiz_title.clone(),
            course_id: summary.course_id,
            course_title: summary.course_title.clone(),
            score: summary.attempt.score,
            total: summary.attempt.total,
            percentage: summary.attempt.percentage,
            passed: summary.attempt.passed,
            submitted_at: summary.attempt.submitted_at,
        }
    }
}

// ============================================================================
// Enrollment / Progress
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentResponse {
    pub enrollment_id: EnrollmentId,
    pub course_id: CourseId,
    pub source: EnrollmentSource,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Enrollment> for EnrollmentResponse {
    fn from(enrollment: &Enrollment) -> Self {
        Self {
            enrollment_id: enrollment.enrollment_id,
            course_id: enrollment.course_id,
            source: enrollment.source,
            enrolled_at: enrollment.enrolled_at,
            completed_at: enrollment.completed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCourseResponse {
    pub enrollment: EnrollmentResponse,
    pub course: CourseSummaryResponse,
}

impl From<&EnrolledCourse> for EnrolledCourseResponse {
    fn from(enrolled: &EnrolledCourse) -> Self {
        Self {
            enrollment: EnrollmentResponse::from(&enrolled.enrollment),
            course: CourseSummaryResponse::from(&enrolled.course),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgressResponse {
    pub lessons_completed: i64,
    pub lessons_total: i64,
    pub lesson_percentage: i64,
    pub quizzes_passed: i64,
    pub quizzes_total: i64,
    pub is_complete: bool,
}

impl From<&CourseProgress> for CourseProgressResponse {
    fn from(progress: &CourseProgress) -> Self {
        Self {
            lessons_completed: progress.lessons_completed,
            lessons_total: progress.lessons_total,
            lesson_percentage: progress.lesson_percentage(),
            quizzes_passed: progress.quizzes_passed,
            quizzes_total: progress.quizzes_total,
            is_complete: progress.is_complete(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub course_id: CourseId,
    #[serde(flatten)]
    pub progress: CourseProgressResponse,
    pub completed_lesson_ids: Vec<LessonId>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&ProgressView> for ProgressResponse {
    fn from(view: &ProgressView) -> Self {
        Self {
            course_id: view.course_id,
            progress: CourseProgressResponse::from(&view.progress),
            completed_lesson_ids: view.completed_lesson_ids.clone(),
            completed_at: view.completed_at,
        }
    }
}

// ============================================================================
// Certificates
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCertificateResponse {
    pub certificate_id: CertificateId,
    pub code: String,
    pub course_id: CourseId,
    pub issued_at: DateTime<Utc>,
    pub created: bool,
}

impl From<&IssuedCertificate> for IssuedCertificateResponse {
    fn from(issued: &IssuedCertificate) -> Self {
        Self {
            certificate_id: issued.certificate.certificate_id,
            code: issued.certificate.code.as_str().to_string(),
            course_id: issued.certificate.course_id,
            issued_at: issued.certificate.issued_at,
            created: issued.created,
        }
    }
}

/// Certificate as shown to its holder and on the public verification page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateResponse {
    pub certificate_id: CertificateId,
    pub code: String,
    pub course_id: CourseId,
    pub course_title: String,
    pub student_name: String,
    pub issued_at: DateTime<Utc>,
}

impl From<&CertificateView> for CertificateResponse {
    fn from(view: &CertificateView) -> Self {
        Self {
            certificate_id: view.certificate.certificate_id,
            code: view.certificate.code.as_str().to_string(),
            course_id: view.certificate.course_id,
            course_title: view.course_title.clone(),
            student_name: view.student_name.clone(),
            issued_at: view.certificate.issued_at,
        }
    }
}

// ============================================================================
// Dashboards
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCourseResponse {
    #[serde(flatten)]
    pub enrolled: EnrolledCourseResponse,
    pub progress: CourseProgressResponse,
}

impl From<&EnrolledCourseProgress> for DashboardCourseResponse {
    fn from(course: &EnrolledCourseProgress) -> Self {
        Self {
            enrolled: EnrolledCourseResponse::from(&course.enrolled),
            progress: CourseProgressResponse::from(&course.progress),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDashboardResponse {
    pub enrolled_count: usize,
    pub completed_count: usize,
    pub certificate_count: usize,
    pub courses: Vec<DashboardCourseResponse>,
    pub certificates: Vec<CertificateResponse>,
    pub recent_attempts: Vec<RecentAttemptResponse>,
}

impl From<&StudentDashboard> for StudentDashboardResponse {
    fn from(dashboard: &StudentDashboard) -> Self {
        Self {
            enrolled_count: dashboard.enrolled_count,
            completed_count: dashboard.completed_count,
            certificate_count: dashboard.certificate_count,
            courses: dashboard.courses.iter().map(DashboardCourseResponse::from).collect(),
            certificates: dashboard.certificates.iter().map(CertificateResponse::from).collect(),
            recent_attempts: dashboard
                .recent_attempts
                .iter()
                .map(RecentAttemptResponse::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructorCourseResponse {
    #[serde(flatten)]
    pub course: CourseSummaryResponse,
    pub completion_count: i64,
    pub average_best_percentage: Option<f64>,
}

impl From<&InstructorCourseStats> for InstructorCourseResponse {
    fn from(stats: &InstructorCourseStats) -> Self {
        Self {
            course: CourseSummaryResponse::from(&stats.summary),
            completion_count: stats.completion_count,
            average_best_percentage: stats.average_best_percentage,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructorDashboardResponse {
    pub total_courses: usize,
    pub published_courses: usize,
    pub total_enrollments: i64,
    pub total_completions: i64,
    pub courses: Vec<InstructorCourseResponse>,
}

impl From<&InstructorDashboard> for InstructorDashboardResponse {
    fn from(dashboard: &InstructorDashboard) -> Self {
        Self {
            total_courses: dashboard.total_courses,
            published_courses: dashboard.published_courses,
            total_enrollments: dashboard.total_enrollments,
            total_completions: dashboard.total_completions,
            courses: dashboard.courses.iter().map(InstructorCourseResponse::from).collect(),
        }
    }
}

// ============================================================================
// Roster
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterStudentResponse {
    pub user_id: UserId,
    pub full_name: String,
    pub email: String,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub lessons_completed: i64,
    pub lesson_percentage: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterResponse {
    pub course_id: CourseId,
    pub lessons_total: i64,
    pub students: Vec<RosterStudentResponse>,
}

impl From<&CourseRoster> for RosterResponse {
    fn from(roster: &CourseRoster) -> Self {
        Self {
            course_id: roster.course_id,
            lessons_total: roster.lessons_total,
            students: roster
                .students
                .iter()
                .map(|s| RosterStudentResponse {
                    user_id: s.entry.user_id,
                    full_name: s.entry.full_name.clone(),
                    email: s.entry.email.clone(),
                    enrolled_at: s.entry.enrolled_at,
                    completed_at: s.entry.completed_at,
                    lessons_completed: s.progress.lessons_completed,
                    lesson_percentage: s.progress.lesson_percentage(),
                })
                .collect(),
        }
    }
}

// ============================================================================
// Moderation
// ============================================================================

/// Admin course listing (`?status=pending_review&page=1`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<CourseStatus>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RejectCourseRequest {
    #[validate(length(min = 1, max = 1000))]
    pub reason: String,
}
