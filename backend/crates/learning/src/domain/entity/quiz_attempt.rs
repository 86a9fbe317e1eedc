//! Quiz Attempt Entity
//!
//! Immutable record of one graded submission.

use chrono::{DateTime, Utc};
use kernel::id::{AnswerOptionId, QuestionId, QuizAttemptId, QuizId, UserId};

use crate::domain::grading::Grade;

/// Answer as stored with the attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptAnswer {
    pub question_id: QuestionId,
    pub option_id: AnswerOptionId,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAttempt {
    pub attempt_id: QuizAttemptId,
    pub quiz_id: QuizId,
    pub user_id: UserId,
    pub score: i32,
    pub total: i32,
    pub percentage: i16,
    pub passed: bool,
    /// Answered questions only
    pub answers: Vec<AttemptAnswer>,
    pub submitted_at: DateTime<Utc>,
}

impl QuizAttempt {
    pub fn record(quiz_id: QuizId, user_id: UserId, grade: &Grade, now: DateTime<Utc>) -> Self {
        let answers = grade
            .results
            .iter()
            .filter_map(|r| {
                r.selected_option_id.map(|option_id| AttemptAnswer {
                    question_id: r.question_id,
                    option_id,
                    is_correct: r.is_correct,
                })
            })
            .collect();

        Self {
            attempt_id: QuizAttemptId::new(),
            quiz_id,
            user_id,
            score: grade.score,
            total: grade.total,
            percentage: grade.percentage,
            passed: grade.passed,
            answers,
            submitted_at: now,
        }
    }
}
