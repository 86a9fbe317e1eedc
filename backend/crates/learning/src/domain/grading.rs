//! Quiz Grading
//!
//! Pure scoring of a submission against a quiz. Unanswered questions score
//! zero; malformed submissions are rejected before anything is counted.

use kernel::id::{AnswerOptionId, QuestionId};
use std::collections::HashSet;

use crate::domain::entity::quiz::Quiz;
use crate::error::{LearningError, LearningResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmittedAnswer {
    pub question_id: QuestionId,
    pub option_id: AnswerOptionId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionResult {
    pub question_id: QuestionId,
    pub selected_option_id: Option<AnswerOptionId>,
    pub correct_option_id: Option<AnswerOptionId>,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grade {
    pub score: i32,
    pub total: i32,
    pub percentage: i16,
    pub passed: bool,
    /// One entry per question, in quiz order
    pub results: Vec<QuestionResult>,
}

/// `score * 100 / total`, rounded half-up
pub fn percentage(score: i32, total: i32) -> i16 {
    if total <= 0 {
        return 0;
    }
    let score = i64::from(score.clamp(0, total));
    let total = i64::from(total);
    ((score * 200 + total) / (2 * total)) as i16
}

pub fn grade(quiz: &Quiz, answers: &[SubmittedAnswer]) -> LearningResult<Grade> {
    if quiz.is_empty() {
        return Err(LearningError::EmptyQuiz);
    }

    let mut seen = HashSet::with_capacity(answers.len());
    for answer in answers {
        let question = quiz.question(&answer.question_id).ok_or_else(|| {
            LearningError::InvalidAnswer(format!(
                "question {} is not part of this quiz",
                answer.question_id
            ))
        })?;
        if !question.has_option(&answer.option_id) {
            return Err(LearningError::InvalidAnswer(format!(
                "option {} does not belong to question {}",
                answer.option_id, answer.question_id
            )));
        }
        if !seen.insert(answer.question_id) {
            return Err(LearningError::InvalidAnswer(format!(
                "question {} answered more than once",
                answer.question_id
            )));
        }
    }

    let results: Vec<QuestionResult> = quiz
        .questions
        .iter()
        .map(|question| {
            let selected = answers
                .iter()
                .find(|a| a.question_id == question.question_id)
                .map(|a| a.option_id);
            let correct = question.correct_option().map(|o| o.option_id);
            QuestionResult {
                question_id: question.question_id,
                selected_option_id: selected,
                correct_option_id: correct,
                is_correct: selected.is_some() && selected == correct,
            }
        })
        .collect();

    let score = results.iter().filter(|r| r.is_correct).count() as i32;
    let total = results.len() as i32;
    let percentage = percentage(score, total);

    Ok(Grade {
        score,
        total,
        percentage,
        passed: percentage >= quiz.pass_percentage,
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::quiz::{OptionDraft, QuestionDraft, QuizDraft};
    use chrono::Utc;
    use kernel::id::CourseId;

    fn quiz(questions: usize, pass_percentage: i16) -> Quiz {
        let questions = (0..questions)
            .map(|i| QuestionDraft {
                prompt: format!("Question {}", i + 1),
                options: vec![
                    OptionDraft {
                        text: "right".to_string(),
                        is_correct: true,
                    },
                    OptionDraft {
                        text: "wrong".to_string(),
                        is_correct: false,
                    },
                ],
            })
            .collect();
        Quiz::new(
            CourseId::new(),
            QuizDraft {
                title: "Checkpoint".to_string(),
                lesson_id: None,
                pass_percentage: Some(pass_percentage),
                questions,
            },
            70,
            Utc::now(),
        )
        .unwrap()
    }

    fn answer(quiz: &Quiz, question: usize, correct: bool) -> SubmittedAnswer {
        let q = &quiz.questions[question];
        let option = q.options.iter().find(|o| o.is_correct == correct).unwrap();
        SubmittedAnswer {
            question_id: q.question_id,
            option_id: option.option_id,
        }
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(1, 2), 50);
        assert_eq!(percentage(0, 4), 0);
        assert_eq!(percentage(4, 4), 100);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn test_grade_tally() {
        let quiz = quiz(3, 60);
        let grade = grade(&quiz, &[answer(&quiz, 0, true), answer(&quiz, 1, false)]).unwrap();

        assert_eq!(grade.score, 1);
        assert_eq!(grade.total, 3);
        assert_eq!(grade.percentage, 33);
        assert!(!grade.passed);
        assert_eq!(grade.results.len(), 3);
        assert!(grade.results[0].is_correct);
        assert!(!grade.results[1].is_correct);
        // Unanswered
        assert_eq!(grade.results[2].selected_option_id, None);
        assert!(grade.results[2].correct_option_id.is_some());
    }

    #[test]
    fn test_pass_threshold_is_inclusive() {
        let quiz = quiz(2, 50);
        let grade = grade(&quiz, &[answer(&quiz, 0, true)]).unwrap();
        assert_eq!(grade.percentage, 50);
        assert!(grade.passed);
    }

    #[test]
    fn test_empty_quiz() {
        let quiz = quiz(0, 70);
        assert!(matches!(grade(&quiz, &[]), Err(LearningError::EmptyQuiz)));
    }

    #[test]
    fn test_rejects_foreign_question_and_option() {
        let quiz = quiz(2, 70);
        let other = self::quiz(1, 70);

        let foreign_question = answer(&other, 0, true);
        assert!(matches!(
            grade(&quiz, &[foreign_question]),
            Err(LearningError::InvalidAnswer(_))
        ));

        let foreign_option = SubmittedAnswer {
            question_id: quiz.questions[0].question_id,
            option_id: quiz.questions[1].options[0].option_id,
        };
        assert!(matches!(
            grade(&quiz, &[foreign_option]),
            Err(LearningError::InvalidAnswer(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_answers() {
        let quiz = quiz(2, 70);
        let result = grade(&quiz, &[answer(&quiz, 0, false), answer(&quiz, 0, true)]);
        assert!(matches!(result, Err(LearningError::InvalidAnswer(_))));
    }
}
