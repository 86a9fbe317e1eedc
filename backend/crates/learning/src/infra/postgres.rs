//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::{
    AnswerOptionId, CertificateId, CourseId, EnrollmentId, LessonId, QuestionId, QuizAttemptId,
    QuizId, UserId,
};
use kernel::page::{Page, PageRequest};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::entity::{
    certificate::Certificate,
    course::Course,
    enrollment::Enrollment,
    lesson::Lesson,
    progress::LessonProgress,
    quiz::{AnswerOption, Question, Quiz},
    quiz_attempt::{AttemptAnswer, QuizAttempt},
};
use crate::domain::repository::{
    AttemptRepository, AttemptSummary, CatalogFilter, CertificateRepository, CertificateView,
    CourseRepository, CourseSummary, EnrolledCourse, EnrollmentRepository, LessonRepository,
    ProgressRepository, QuizRepository, RosterEntry,
};
use crate::domain::value_object::{
    certificate_code::CertificateCode, course_level::CourseLevel, course_status::CourseStatus,
    enrollment_source::EnrollmentSource,
};
use crate::error::{LearningError, LearningResult};

/// PostgreSQL-backed learning repository
#[derive(Clone)]
pub struct PgLearningRepository {
    pool: PgPool,
}

impl PgLearningRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn summaries_by_ids(&self, ids: &[Uuid]) -> LearningResult<HashMap<Uuid, CourseSummary>> {
        let rows = sqlx::query_as::<_, CourseSummaryRow>(&format!(
            "{SUMMARY_SELECT} WHERE c.course_id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| r.into_summary().map(|s| (*s.course.course_id.as_uuid(), s)))
            .collect()
    }
}

const COURSE_COLUMNS: &str = r#"
    c.course_id,
    c.instructor_id,
    c.title,
    c.summary,
    c.description,
    c.category,
    c.course_level,
    c.price_cents,
    c.thumbnail_key,
    c.course_status,
    c.rejection_reason,
    c.published_at,
    c.created_at,
    c.updated_at
"#;

const SUMMARY_SELECT: &str = r#"
    SELECT
        c.course_id,
        c.instructor_id,
        c.title,
        c.summary,
        c.description,
        c.category,
        c.course_level,
        c.price_cents,
        c.thumbnail_key,
        c.course_status,
        c.rejection_reason,
        c.published_at,
        c.created_at,
        c.updated_at,
        u.full_name AS instructor_name,
        (SELECT COUNT(*) FROM lessons l WHERE l.course_id = c.course_id) AS lesson_count,
        (SELECT COUNT(*) FROM enrollments e WHERE e.course_id = c.course_id) AS enrollment_count
    FROM courses c
    JOIN users u ON u.user_id = c.instructor_id
"#;

const LESSON_COLUMNS: &str = r#"
    lesson_id,
    course_id,
    title,
    content,
    video_url,
    position,
    duration_minutes,
    is_preview,
    created_at,
    updated_at
"#;

const CERTIFICATE_VIEW_SELECT: &str = r#"
    SELECT
        ct.certificate_id,
        ct.code,
        ct.user_id,
        ct.course_id,
        ct.issued_at,
        c.title AS course_title,
        u.full_name AS student_name
    FROM certificates ct
    JOIN courses c ON c.course_id = ct.course_id
    JOIN users u ON u.user_id = ct.user_id
"#;

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// ============================================================================
// Course Repository Implementation
// ============================================================================

impl CourseRepository for PgLearningRepository {
    async fn create_course(&self, course: &Course) -> LearningResult<()> {
        sqlx::query(
            r#"
            INSERT INTO courses (
                course_id,
                instructor_id,
                title,
                summary,
                description,
                category,
                course_level,
                price_cents,
                thumbnail_key,
                course_status,
                rejection_reason,
                published_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(course.course_id.as_uuid())
        .bind(course.instructor_id.as_uuid())
        .bind(&course.title)
        .bind(&course.summary)
        .bind(&course.description)
        .bind(&course.category)
        .bind(course.level.id())
        .bind(course.price_cents)
        .bind(&course.thumbnail_key)
        .bind(course.status.id())
        .bind(&course.rejection_reason)
        .bind(course.published_at)
        .bind(course.created_at)
        .bind(course.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_course(&self, course_id: &CourseId) -> LearningResult<Option<Course>> {
        let row = sqlx::query_as::<_, CourseRow>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses c WHERE c.course_id = $1"
        ))
        .bind(course_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_course()).transpose()
    }

    async fn update_course(&self, course: &Course) -> LearningResult<()> {
        sqlx::query(
            r#"
            UPDATE courses SET
                title = $2,
                summary = $3,
                description = $4,
                category = $5,
                course_level = $6,
                price_cents = $7,
                thumbnail_key = $8,
                course_status = $9,
                rejection_reason = $10,
                published_at = $11,
                updated_at = $12
            WHERE course_id = $1
            "#,
        )
        .bind(course.course_id.as_uuid())
        .bind(&course.title)
        .bind(&course.summary)
        .bind(&course.description)
        .bind(&course.category)
        .bind(course.level.id())
        .bind(course.price_cents)
        .bind(&course.thumbnail_key)
        .bind(course.status.id())
        .bind(&course.rejection_reason)
        .bind(course.published_at)
        .bind(course.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_course(&self, course_id: &CourseId) -> LearningResult<()> {
        sqlx::query("DELETE FROM courses WHERE course_id = $1")
            .bind(course_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    LearningError::CourseInUse
                } else {
                    LearningError::Database(e)
                }
            })?;

        Ok(())
    }

    async fn course_summary(&self, course_id: &CourseId) -> LearningResult<Option<CourseSummary>> {
        let row = sqlx::query_as::<_, CourseSummaryRow>(&format!(
            "{SUMMARY_SELECT} WHERE c.course_id = $1"
        ))
        .bind(course_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_summary()).transpose()
    }

    async fn list_published(
        &self,
        filter: &CatalogFilter,
        page: PageRequest,
    ) -> LearningResult<Page<CourseSummary>> {
        const WHERE: &str = r#"
            WHERE c.course_status = 2
              AND ($1::TEXT IS NULL
                   OR LOWER(c.title) LIKE '%' || $1 || '%'
                   OR LOWER(c.summary) LIKE '%' || $1 || '%')
              AND ($2::TEXT IS NULL OR c.category = $2)
              AND ($3::SMALLINT IS NULL OR c.course_level = $3)
        "#;

        let search = filter.search.as_deref().map(escape_like);
        let level = filter.level.map(|l| l.id());

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM courses c {WHERE}"
        ))
        .bind(search.as_deref())
        .bind(filter.category.as_deref())
        .bind(level)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, CourseSummaryRow>(&format!(
            "{SUMMARY_SELECT} {WHERE} \
             ORDER BY c.published_at DESC NULLS LAST, c.created_at DESC, c.course_id \
             LIMIT $4 OFFSET $5"
        ))
        .bind(search.as_deref())
        .bind(filter.category.as_deref())
        .bind(level)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(|r| r.into_summary())
            .collect::<LearningResult<Vec<_>>>()?;

        Ok(Page::new(items, total, page))
    }

    async fn list_by_instructor(
        &self,
        instructor_id: &UserId,
    ) -> LearningResult<Vec<CourseSummary>> {
        let rows = sqlx::query_as::<_, CourseSummaryRow>(&format!(
            "{SUMMARY_SELECT} WHERE c.instructor_id = $1 ORDER BY c.created_at DESC, c.course_id"
        ))
        .bind(instructor_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_summary()).collect()
    }

    async fn list_by_status(
        &self,
        status: CourseStatus,
        page: PageRequest,
    ) -> LearningResult<Page<CourseSummary>> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM courses WHERE course_status = $1",
        )
        .bind(status.id())
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, CourseSummaryRow>(&format!(
            "{SUMMARY_SELECT} WHERE c.course_status = $1 \
             ORDER BY c.updated_at, c.course_id LIMIT $2 OFFSET $3"
        ))
        .bind(status.id())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(|r| r.into_summary())
            .collect::<LearningResult<Vec<_>>>()?;

        Ok(Page::new(items, total, page))
    }
}

// ============================================================================
// Lesson Repository Implementation
// ============================================================================

impl LessonRepository for PgLearningRepository {
    async fn create_lesson(&self, lesson: &Lesson) -> LearningResult<()> {
        sqlx::query(
            r#"
            INSERT INTO lessons (
                lesson_id,
                course_id,
                title,
                content,
                video_url,
                position,
                duration_minutes,
                is_preview,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(lesson.lesson_id.as_uuid())
        .bind(lesson.course_id.as_uuid())
        .bind(&lesson.title)
        .bind(&lesson.content)
        .bind(&lesson.video_url)
        .bind(lesson.position)
        .bind(lesson.duration_minutes)
        .bind(lesson.is_preview)
        .bind(lesson.created_at)
        .bind(lesson.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_lesson(&self, lesson_id: &LessonId) -> LearningResult<Option<Lesson>> {
        let row = sqlx::query_as::<_, LessonRow>(&format!(
            "SELECT {LESSON_COLUMNS} FROM lessons WHERE lesson_id = $1"
        ))
        .bind(lesson_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_lesson()))
    }

    async fn update_lesson(&self, lesson: &Lesson) -> LearningResult<()> {
        sqlx::query(
            r#"
            UPDATE lessons SET
                title = $2,
                content = $3,
                video_url = $4,
                duration_minutes = $5,
                is_preview = $6,
                updated_at = $7
            WHERE lesson_id = $1
            "#,
        )
        .bind(lesson.lesson_id.as_uuid())
        .bind(&lesson.title)
        .bind(&lesson.content)
        .bind(&lesson.video_url)
        .bind(lesson.duration_minutes)
        .bind(lesson.is_preview)
        .bind(lesson.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_lesson(&self, lesson: &Lesson) -> LearningResult<()> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM lessons WHERE lesson_id = $1")
            .bind(lesson.lesson_id.as_uuid())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted > 0 {
            sqlx::query(
                r#"
                UPDATE lessons SET position = position - 1
                WHERE course_id = $1 AND position > $2
                "#,
            )
            .bind(lesson.course_id.as_uuid())
            .bind(lesson.position)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn list_lessons(&self, course_id: &CourseId) -> LearningResult<Vec<Lesson>> {
        let rows = sqlx::query_as::<_, LessonRow>(&format!(
            "SELECT {LESSON_COLUMNS} FROM lessons \
             WHERE course_id = $1 ORDER BY position, created_at"
        ))
        .bind(course_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_lesson()).collect())
    }

    async fn reorder_lessons(
        &self,
        course_id: &CourseId,
        ordered: &[LessonId],
        now: DateTime<Utc>,
    ) -> LearningResult<()> {
        let mut tx = self.pool.begin().await?;

        for (index, lesson_id) in ordered.iter().enumerate() {
            sqlx::query(
                r#"
                UPDATE lessons SET position = $3, updated_at = $4
                WHERE lesson_id = $1 AND course_id = $2
                "#,
            )
            .bind(lesson_id.as_uuid())
            .bind(course_id.as_uuid())
            .bind(index as i32 + 1)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }
}

// ============================================================================
// Quiz Repository Implementation
// ============================================================================

impl PgLearningRepository {
    /// Questions with options for the given quizzes, grouped by quiz
    async fn load_questions(
        &self,
        quiz_ids: &[Uuid],
    ) -> LearningResult<HashMap<Uuid, Vec<Question>>> {
        let questions = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT question_id, quiz_id, prompt, position
            FROM questions
            WHERE quiz_id = ANY($1)
            ORDER BY quiz_id, position
            "#,
        )
        .bind(quiz_ids)
        .fetch_all(&self.pool)
        .await?;

        let question_ids: Vec<Uuid> = questions.iter().map(|q| q.question_id).collect();
        let options = sqlx::query_as::<_, AnswerOptionRow>(
            r#"
            SELECT option_id, question_id, option_text, is_correct, position
            FROM answer_options
            WHERE question_id = ANY($1)
            ORDER BY question_id, position
            "#,
        )
        .bind(&question_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut options_by_question: HashMap<Uuid, Vec<AnswerOption>> = HashMap::new();
        for row in options {
            options_by_question
                .entry(row.question_id)
                .or_default()
                .push(row.into_option());
        }

        let mut grouped: HashMap<Uuid, Vec<Question>> = HashMap::new();
        for row in questions {
            let options = options_by_question
                .remove(&row.question_id)
                .unwrap_or_default();
            grouped.entry(row.quiz_id).or_default().push(Question {
                question_id: QuestionId::from_uuid(row.question_id),
                prompt: row.prompt,
                position: row.position,
                options,
            });
        }

        Ok(grouped)
    }
}

impl QuizRepository for PgLearningRepository {
    async fn save_quiz(&self, quiz: &Quiz) -> LearningResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO quizzes (
                quiz_id,
                course_id,
                lesson_id,
                title,
                pass_percentage,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (quiz_id) DO UPDATE SET
                lesson_id = EXCLUDED.lesson_id,
                title = EXCLUDED.title,
                pass_percentage = EXCLUDED.pass_percentage,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(quiz.quiz_id.as_uuid())
        .bind(quiz.course_id.as_uuid())
        .bind(quiz.lesson_id.map(LessonId::into_uuid))
        .bind(&quiz.title)
        .bind(quiz.pass_percentage)
        .bind(quiz.created_at)
        .bind(quiz.updated_at)
        .execute(&mut *tx)
        .await?;

        // Options go with their questions (ON DELETE CASCADE)
        sqlx::query("DELETE FROM questions WHERE quiz_id = $1")
            .bind(quiz.quiz_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        for question in &quiz.questions {
            sqlx::query(
                "INSERT INTO questions (question_id, quiz_id, prompt, position) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(question.question_id.as_uuid())
            .bind(quiz.quiz_id.as_uuid())
            .bind(&question.prompt)
            .bind(question.position)
            .execute(&mut *tx)
            .await?;

            for option in &question.options {
                sqlx::query(
                    r#"
                    INSERT INTO answer_options
                        (option_id, question_id, option_text, is_correct, position)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(option.option_id.as_uuid())
                .bind(question.question_id.as_uuid())
                .bind(&option.text)
                .bind(option.is_correct)
                .bind(option.position)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        Ok(())
    }

    async fn find_quiz(&self, quiz_id: &QuizId) -> LearningResult<Option<Quiz>> {
        let row = sqlx::query_as::<_, QuizRow>(
            r#"
            SELECT quiz_id, course_id, lesson_id, title, pass_percentage, created_at, updated_at
            FROM quizzes
            WHERE quiz_id = $1
            "#,
        )
        .bind(quiz_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut questions = self.load_questions(&[row.quiz_id]).await?;
        let quiz_questions = questions.remove(&row.quiz_id).unwrap_or_default();
        Ok(Some(row.into_quiz(quiz_questions)))
    }

    async fn list_quizzes(&self, course_id: &CourseId) -> LearningResult<Vec<Quiz>> {
        let rows = sqlx::query_as::<_, QuizRow>(
            r#"
            SELECT quiz_id, course_id, lesson_id, title, pass_percentage, created_at, updated_at
            FROM quizzes
            WHERE course_id = $1
            ORDER BY created_at, quiz_id
            "#,
        )
        .bind(course_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.quiz_id).collect();
        let mut questions = self.load_questions(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let quiz_questions = questions.remove(&row.quiz_id).unwrap_or_default();
                row.into_quiz(quiz_questions)
            })
            .collect())
    }

    async fn delete_quiz(&self, quiz_id: &QuizId) -> LearningResult<()> {
        sqlx::query("DELETE FROM quizzes WHERE quiz_id = $1")
            .bind(quiz_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// ============================================================================
// Attempt Repository Implementation
// ============================================================================

impl AttemptRepository for PgLearningRepository {
    async fn create_attempt(&self, attempt: &QuizAttempt) -> LearningResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO quiz_attempts (
                attempt_id,
                quiz_id,
                user_id,
                score,
                total,
                percentage,
                passed,
                submitted_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(attempt.attempt_id.as_uuid())
        .bind(attempt.quiz_id.as_uuid())
        .bind(attempt.user_id.as_uuid())
        .bind(attempt.score)
        .bind(attempt.total)
        .bind(attempt.percentage)
        .bind(attempt.passed)
        .bind(attempt.submitted_at)
        .execute(&mut *tx)
        .await?;

        for answer in &attempt.answers {
            sqlx::query(
                r#"
                INSERT INTO quiz_attempt_answers (attempt_id, question_id, option_id, is_correct)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(attempt.attempt_id.as_uuid())
            .bind(answer.question_id.as_uuid())
            .bind(answer.option_id.as_uuid())
            .bind(answer.is_correct)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn list_attempts(
        &self,
        user_id: &UserId,
        quiz_id: &QuizId,
    ) -> LearningResult<Vec<QuizAttempt>> {
        let rows = sqlx::query_as::<_, AttemptRow>(
            r#"
            SELECT attempt_id, quiz_id, user_id, score, total, percentage, passed, submitted_at
            FROM quiz_attempts
            WHERE user_id = $1 AND quiz_id = $2
            ORDER BY submitted_at DESC, attempt_id
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(quiz_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.attempt_id).collect();
        let answers = sqlx::query_as::<_, AttemptAnswerRow>(
            r#"
            SELECT attempt_id, question_id, option_id, is_correct
            FROM quiz_attempt_answers
            WHERE attempt_id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_attempt: HashMap<Uuid, Vec<AttemptAnswer>> = HashMap::new();
        for row in answers {
            by_attempt
                .entry(row.attempt_id)
                .or_default()
                .push(row.into_answer());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let answers = by_attempt.remove(&row.attempt_id).unwrap_or_default();
                row.into_attempt(answers)
            })
            .collect())
    }

    /// Answers are not loaded for summaries
    async fn recent_attempts(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> LearningResult<Vec<AttemptSummary>> {
        let rows = sqlx::query_as::<_, AttemptSummaryRow>(
            r#"
            SELECT
                a.attempt_id,
                a.quiz_id,
                a.user_id,
                a.score,
                a.total,
                a.percentage,
                a.passed,
                a.submitted_at,
                q.title AS quiz_title,
                c.course_id,
                c.title AS course_title
            FROM quiz_attempts a
            JOIN quizzes q ON q.quiz_id = a.quiz_id
            JOIN courses c ON c.course_id = q.course_id
            WHERE a.user_id = $1
            ORDER BY a.submitted_at DESC, a.attempt_id
            LIMIT $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_summary()).collect())
    }

    async fn passed_quiz_ids(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> LearningResult<Vec<QuizId>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT DISTINCT a.quiz_id
            FROM quiz_attempts a
            JOIN quizzes q ON q.quiz_id = a.quiz_id
            WHERE a.user_id = $1 AND q.course_id = $2 AND a.passed
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(course_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(QuizId::from_uuid).collect())
    }

    async fn average_best_percentage(&self, course_id: &CourseId) -> LearningResult<Option<f64>> {
        let average = sqlx::query_scalar::<_, Option<f64>>(
            r#"
            SELECT AVG(best)::FLOAT8
            FROM (
                SELECT MAX(a.percentage) AS best
                FROM quiz_attempts a
                JOIN quizzes q ON q.quiz_id = a.quiz_id
                WHERE q.course_id = $1
                GROUP BY a.user_id, a.quiz_id
            ) best_attempts
            "#,
        )
        .bind(course_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(average)
    }
}

// ============================================================================
// Enrollment Repository Implementation
// ============================================================================

impl EnrollmentRepository for PgLearningRepository {
    async fn create_enrollment(&self, enrollment: &Enrollment) -> LearningResult<()> {
        sqlx::query(
            r#"
            INSERT INTO enrollments (
                enrollment_id,
                user_id,
                course_id,
                source,
                enrolled_at,
                completed_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(enrollment.enrollment_id.as_uuid())
        .bind(enrollment.user_id.as_uuid())
        .bind(enrollment.course_id.as_uuid())
        .bind(enrollment.source.id())
        .bind(enrollment.enrolled_at)
        .bind(enrollment.completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                LearningError::AlreadyEnrolled
            } else {
                LearningError::Database(e)
            }
        })?;

        Ok(())
    }

    async fn find_enrollment(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> LearningResult<Option<Enrollment>> {
        let row = sqlx::query_as::<_, EnrollmentRow>(
            r#"
            SELECT enrollment_id, user_id, course_id, source, enrolled_at, completed_at
            FROM enrollments
            WHERE user_id = $1 AND course_id = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(course_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_enrollment()).transpose()
    }

    async fn update_enrollment(&self, enrollment: &Enrollment) -> LearningResult<()> {
        sqlx::query("UPDATE enrollments SET completed_at = $2 WHERE enrollment_id = $1")
            .bind(enrollment.enrollment_id.as_uuid())
            .bind(enrollment.completed_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_enrollments(&self, user_id: &UserId) -> LearningResult<Vec<EnrolledCourse>> {
        let rows = sqlx::query_as::<_, EnrollmentRow>(
            r#"
            SELECT enrollment_id, user_id, course_id, source, enrolled_at, completed_at
            FROM enrollments
            WHERE user_id = $1
            ORDER BY enrolled_at DESC, enrollment_id
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let course_ids: Vec<Uuid> = rows.iter().map(|r| r.course_id).collect();
        let mut summaries = self.summaries_by_ids(&course_ids).await?;

        rows.into_iter()
            .map(|row| {
                let course = summaries.remove(&row.course_id).ok_or_else(|| {
                    LearningError::Internal(format!("Enrollment without course: {}", row.course_id))
                })?;
                Ok(EnrolledCourse {
                    enrollment: row.into_enrollment()?,
                    course,
                })
            })
            .collect()
    }

    async fn count_completions(&self, course_id: &CourseId) -> LearningResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM enrollments WHERE course_id = $1 AND completed_at IS NOT NULL",
        )
        .bind(course_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn roster(&self, course_id: &CourseId) -> LearningResult<Vec<RosterEntry>> {
        let rows = sqlx::query_as::<_, RosterRow>(
            r#"
            SELECT
                e.user_id,
                u.full_name,
                u.email,
                e.enrolled_at,
                e.completed_at,
                (
                    SELECT COUNT(*)
                    FROM lesson_progress p
                    WHERE p.user_id = e.user_id AND p.course_id = e.course_id
                ) AS lessons_completed
            FROM enrollments e
            JOIN users u ON u.user_id = e.user_id
            WHERE e.course_id = $1
            ORDER BY e.enrolled_at, e.user_id
            "#,
        )
        .bind(course_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_entry()).collect())
    }
}

// ============================================================================
// Progress Repository Implementation
// ============================================================================

impl ProgressRepository for PgLearningRepository {
    async fn record_completion(&self, progress: &LessonProgress) -> LearningResult<bool> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO lesson_progress (user_id, lesson_id, course_id, completed_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, lesson_id) DO NOTHING
            "#,
        )
        .bind(progress.user_id.as_uuid())
        .bind(progress.lesson_id.as_uuid())
        .bind(progress.course_id.as_uuid())
        .bind(progress.completed_at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(inserted > 0)
    }

    async fn completed_lesson_ids(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> LearningResult<Vec<LessonId>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT lesson_id
            FROM lesson_progress
            WHERE user_id = $1 AND course_id = $2
            ORDER BY completed_at
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(course_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(LessonId::from_uuid).collect())
    }
}

// ============================================================================
// Certificate Repository Implementation
// ============================================================================

impl CertificateRepository for PgLearningRepository {
    async fn insert_certificate(&self, certificate: &Certificate) -> LearningResult<bool> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO certificates (certificate_id, code, user_id, course_id, issued_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, course_id) DO NOTHING
            "#,
        )
        .bind(certificate.certificate_id.as_uuid())
        .bind(certificate.code.as_str())
        .bind(certificate.user_id.as_uuid())
        .bind(certificate.course_id.as_uuid())
        .bind(certificate.issued_at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(inserted > 0)
    }

    async fn find_certificate(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> LearningResult<Option<Certificate>> {
        let row = sqlx::query_as::<_, CertificateRow>(
            r#"
            SELECT certificate_id, code, user_id, course_id, issued_at
            FROM certificates
            WHERE user_id = $1 AND course_id = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(course_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_certificate()).transpose()
    }

    async fn find_certificate_by_code(
        &self,
        code: &CertificateCode,
    ) -> LearningResult<Option<CertificateView>> {
        let row = sqlx::query_as::<_, CertificateViewRow>(&format!(
            "{CERTIFICATE_VIEW_SELECT} WHERE ct.code = $1"
        ))
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_view()).transpose()
    }

    async fn list_certificates(&self, user_id: &UserId) -> LearningResult<Vec<CertificateView>> {
        let rows = sqlx::query_as::<_, CertificateViewRow>(&format!(
            "{CERTIFICATE_VIEW_SELECT} WHERE ct.user_id = $1 \
             ORDER BY ct.issued_at DESC, ct.certificate_id"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_view()).collect()
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct CourseRow {
    course_id: Uuid,
    instructor_id: Uuid,
    title: String,
    summary: String,
    description: String,
    category: String,
    course_level: i16,
    price_cents: i64,
    thumbnail_key: Option<String>,
    course_status: i16,
    rejection_reason: Option<String>,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CourseRow {
    fn into_course(self) -> LearningResult<Course> {
        let level = CourseLevel::from_id(self.course_level).ok_or_else(|| {
            LearningError::Internal(format!("Invalid course_level: {}", self.course_level))
        })?;
        let status = CourseStatus::from_id(self.course_status).ok_or_else(|| {
            LearningError::Internal(format!("Invalid course_status: {}", self.course_status))
        })?;

        Ok(Course {
            course_id: CourseId::from_uuid(self.course_id),
            instructor_id: UserId::from_uuid(self.instructor_id),
            title: self.title,
            summary: self.summary,
            description: self.description,
            category: self.category,
            level,
            price_cents: self.price_cents,
            thumbnail_key: self.thumbnail_key,
            status,
            rejection_reason: self.rejection_reason,
            published_at: self.published_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CourseSummaryRow {
    #[sqlx(flatten)]
    course: CourseRow,
    instructor_name: String,
    lesson_count: i64,
    enrollment_count: i64,
}

impl CourseSummaryRow {
    fn into_summary(self) -> LearningResult<CourseSummary> {
        Ok(CourseSummary {
            course: self.course.into_course()?,
            instructor_name: self.instructor_name,
            lesson_count: self.lesson_count,
            enrollment_count: self.enrollment_count,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LessonRow {
    lesson_id: Uuid,
    course_id: Uuid,
    title: String,
    content: String,
    video_url: Option<String>,
    position: i32,
    duration_minutes: i32,
    is_preview: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LessonRow {
    fn into_lesson(self) -> Lesson {
        Lesson {
            lesson_id: LessonId::from_uuid(self.lesson_id),
            course_id: CourseId::from_uuid(self.course_id),
            title: self.title,
            content: self.content,
            video_url: self.video_url,
            position: self.position,
            duration_minutes: self.duration_minutes,
            is_preview: self.is_preview,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct QuizRow {
    quiz_id: Uuid,
    course_id: Uuid,
    lesson_id: Option<Uuid>,
    title: String,
    pass_percentage: i16,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl QuizRow {
    fn into_quiz(self, questions: Vec<Question>) -> Quiz {
        Quiz {
            quiz_id: QuizId::from_uuid(self.quiz_id),
            course_id: CourseId::from_uuid(self.course_id),
            lesson_id: self.lesson_id.map(LessonId::from_uuid),
            title: self.title,
            pass_percentage: self.pass_percentage,
            questions,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct QuestionRow {
    question_id: Uuid,
    quiz_id: Uuid,
    prompt: String,
    position: i32,
}

#[derive(sqlx::FromRow)]
struct AnswerOptionRow {
    option_id: Uuid,
    question_id: Uuid,
    option_text: String,
    is_correct: bool,
    position: i32,
}

impl AnswerOptionRow {
    fn into_option(self) -> AnswerOption {
        AnswerOption {
            option_id: AnswerOptionId::from_uuid(self.option_id),
            text: self.option_text,
            is_correct: self.is_correct,
            position: self.position,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AttemptRow {
    attempt_id: Uuid,
    quiz_id: Uuid,
    user_id: Uuid,
    score: i32,
    total: i32,
    percentage: i16,
    passed: bool,
    submitted_at: DateTime<Utc>,
}

impl AttemptRow {
    fn into_attempt(self, answers: Vec<AttemptAnswer>) -> QuizAttempt {
        QuizAttempt {
            attempt_id: QuizAttemptId::from_uuid(self.attempt_id),
            quiz_id: QuizId::from_uuid(self.quiz_id),
            user_id: UserId::from_uuid(self.user_id),
            score: self.score,
            total: self.total,
            percentage: self.percentage,
            passed: self.passed,
            answers,
            submitted_at: self.submitted_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AttemptAnswerRow {
    attempt_id: Uuid,
    question_id: Uuid,
    option_id: Uuid,
    is_correct: bool,
}

impl AttemptAnswerRow {
    fn into_answer(self) -> AttemptAnswer {
        AttemptAnswer {
            question_id: QuestionId::from_uuid(self.question_id),
            option_id: AnswerOptionId::from_uuid(self.option_id),
            is_correct: self.is_correct,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AttemptSummaryRow {
    #[sqlx(flatten)]
    attempt: AttemptRow,
    quiz_title: String,
    course_id: Uuid,
    course_title: String,
}

impl AttemptSummaryRow {
    fn into_summary(self) -> AttemptSummary {
        AttemptSummary {
            attempt: self.attempt.into_attempt(Vec::new()),
            quiz_title: self.quiz_title,
            course_id: CourseId::from_uuid(self.course_id),
            course_title: self.course_title,
        }
    }
}

#[derive(sqlx::FromRow)]
struct EnrollmentRow {
    enrollment_id: Uuid,
    user_id: Uuid,
    course_id: Uuid,
    source: i16,
    enrolled_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl EnrollmentRow {
    fn into_enrollment(self) -> LearningResult<Enrollment> {
        let source = EnrollmentSource::from_id(self.source).ok_or_else(|| {
            LearningError::Internal(format!("Invalid enrollment source: {}", self.source))
        })?;

        Ok(Enrollment {
            enrollment_id: EnrollmentId::from_uuid(self.enrollment_id),
            user_id: UserId::from_uuid(self.user_id),
            course_id: CourseId::from_uuid(self.course_id),
            source,
            enrolled_at: self.enrolled_at,
            completed_at: self.completed_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RosterRow {
    user_id: Uuid,
    full_name: String,
    email: String,
    enrolled_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    lessons_completed: i64,
}

impl RosterRow {
    fn into_entry(self) -> RosterEntry {
        RosterEntry {
            user_id: UserId::from_uuid(self.user_id),
            full_name: self.full_name,
            email: self.email,
            enrolled_at: self.enrolled_at,
            completed_at: self.completed_at,
            lessons_completed: self.lessons_completed,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CertificateRow {
    certificate_id: Uuid,
    code: String,
    user_id: Uuid,
    course_id: Uuid,
    issued_at: DateTime<Utc>,
}

impl CertificateRow {
    fn into_certificate(self) -> LearningResult<Certificate> {
        let code = CertificateCode::parse(&self.code).ok_or_else(|| {
            LearningError::Internal(format!("Invalid certificate code: {}", self.code))
        })?;

        Ok(Certificate {
            certificate_id: CertificateId::from_uuid(self.certificate_id),
            code,
            user_id: UserId::from_uuid(self.user_id),
            course_id: CourseId::from_uuid(self.course_id),
            issued_at: self.issued_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CertificateViewRow {
    #[sqlx(flatten)]
    certificate: CertificateRow,
    course_title: String,
    student_name: String,
}

impl CertificateViewRow {
    fn into_view(self) -> LearningResult<CertificateView> {
        Ok(CertificateView {
            certificate: self.certificate.into_certificate()?,
            course_title: self.course_title,
            student_name: self.student_name,
        })
    }
}
