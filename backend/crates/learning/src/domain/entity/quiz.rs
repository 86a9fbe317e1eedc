//! Quiz Entity
//!
//! Single-choice questions: every question has at least two options and
//! exactly one correct option. A quiz is replaced as a whole, never edited
//! question by question.

use chrono::{DateTime, Utc};
use kernel::id::{AnswerOptionId, CourseId, LessonId, QuestionId, QuizId};

use crate::error::{LearningError, LearningResult};

pub const QUIZ_TITLE_MAX_LENGTH: usize = 200;
pub const PROMPT_MAX_LENGTH: usize = 1000;
pub const OPTION_TEXT_MAX_LENGTH: usize = 500;
pub const MAX_QUESTIONS: usize = 100;
pub const MAX_OPTIONS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOption {
    pub option_id: AnswerOptionId,
    pub text: String,
    pub is_correct: bool,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub question_id: QuestionId,
    pub prompt: String,
    pub position: i32,
    pub options: Vec<AnswerOption>,
}

impl Question {
    pub fn correct_option(&self) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.is_correct)
    }

    pub fn has_option(&self, option_id: &AnswerOptionId) -> bool {
        self.options.iter().any(|o| &o.option_id == option_id)
    }
}

/// Authoring input for one option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDraft {
    pub text: String,
    pub is_correct: bool,
}

/// Authoring input for one question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub prompt: String,
    pub options: Vec<OptionDraft>,
}

/// Authoring input for a whole quiz
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizDraft {
    pub title: String,
    pub lesson_id: Option<LessonId>,
    /// Falls back to the configured default when absent
    pub pass_percentage: Option<i16>,
    pub questions: Vec<QuestionDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    pub quiz_id: QuizId,
    pub course_id: CourseId,
    pub lesson_id: Option<LessonId>,
    pub title: String,
    /// 1..=100
    pub pass_percentage: i16,
    /// Ordered by position
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Quiz {
    pub fn new(
        course_id: CourseId,
        draft: QuizDraft,
        default_pass_percentage: i16,
        now: DateTime<Utc>,
    ) -> LearningResult<Self> {
        let mut quiz = Self {
            quiz_id: QuizId::new(),
            course_id,
            lesson_id: None,
            title: String::new(),
            pass_percentage: default_pass_percentage,
            questions: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        quiz.replace(draft, default_pass_percentage, now)?;
        Ok(quiz)
    }

    /// Replace title, threshold and all questions; ids of questions and
    /// options are regenerated
    pub fn replace(
        &mut self,
        draft: QuizDraft,
        default_pass_percentage: i16,
        now: DateTime<Utc>,
    ) -> LearningResult<()> {
        let title = draft.title.trim().to_string();
        if title.is_empty() || title.chars().count() > QUIZ_TITLE_MAX_LENGTH {
            return Err(LearningError::Validation(format!(
                "Quiz title must be 1..={} characters",
                QUIZ_TITLE_MAX_LENGTH
            )));
        }

        let pass_percentage = draft.pass_percentage.unwrap_or(default_pass_percentage);
        if !(1..=100).contains(&pass_percentage) {
            return Err(LearningError::Validation(
                "Pass percentage must be between 1 and 100".to_string(),
            ));
        }

        if draft.questions.len() > MAX_QUESTIONS {
            return Err(LearningError::Validation(format!(
                "A quiz can have at most {} questions",
                MAX_QUESTIONS
            )));
        }

        let questions = draft
            .questions
            .into_iter()
            .enumerate()
            .map(|(index, question)| build_question(index, question))
            .collect::<LearningResult<Vec<_>>>()?;

        self.title = title;
        self.lesson_id = draft.lesson_id;
        self.pass_percentage = pass_percentage;
        self.questions = questions;
        self.updated_at = now;
        Ok(())
    }

    pub fn question(&self, question_id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| &q.question_id == question_id)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

fn build_question(index: usize, draft: QuestionDraft) -> LearningResult<Question> {
    let number = index + 1;
    let prompt = draft.prompt.trim().to_string();
    if prompt.is_empty() || prompt.chars().count() > PROMPT_MAX_LENGTH {
        return Err(LearningError::Validation(format!(
            "Question {}: prompt must be 1..={} characters",
            number, PROMPT_MAX_LENGTH
        )));
    }

    if !(2..=MAX_OPTIONS).contains(&draft.options.len()) {
        return Err(LearningError::Validation(format!(
            "Question {}: needs 2..={} options",
            number, MAX_OPTIONS
        )));
    }

    let correct = draft.options.iter().filter(|o| o.is_correct).count();
    if correct != 1 {
        return Err(LearningError::Validation(format!(
            "Question {}: exactly one option must be correct (got {})",
            number, correct
        )));
    }

    let mut options = Vec::with_capacity(draft.options.len());
    for (option_index, option) in draft.options.into_iter().enumerate() {
        let text = option.text.trim().to_string();
        if text.is_empty() || text.chars().count() > OPTION_TEXT_MAX_LENGTH {
            return Err(LearningError::Validation(format!(
                "Question {}: option text must be 1..={} characters",
                number, OPTION_TEXT_MAX_LENGTH
            )));
        }
        options.push(AnswerOption {
            option_id: AnswerOptionId::new(),
            text,
            is_correct: option.is_correct,
            position: option_index as i32 + 1,
        });
    }

    Ok(Question {
        question_id: QuestionId::new(),
        prompt,
        position: number as i32,
        options,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct: &[bool]) -> QuestionDraft {
        QuestionDraft {
            prompt: "Which keyword moves a value?".to_string(),
            options: correct
                .iter()
                .enumerate()
                .map(|(i, is_correct)| OptionDraft {
                    text: format!("option {}", i),
                    is_correct: *is_correct,
                })
                .collect(),
        }
    }

    fn draft(questions: Vec<QuestionDraft>) -> QuizDraft {
        QuizDraft {
            title: "Ownership check".to_string(),
            lesson_id: None,
            pass_percentage: None,
            questions,
        }
    }

    #[test]
    fn test_question_count_is_capped() {
        let questions = (0..=MAX_QUESTIONS).map(|_| question(&[true, false])).collect();
        let result = Quiz::new(CourseId::new(), draft(questions), 70, Utc::now());
        assert!(matches!(result, Err(LearningError::Validation(_))));
    }

    #[test]
    fn test_new_quiz_uses_default_threshold() {
        let quiz = Quiz::new(
            CourseId::new(),
            draft(vec![question(&[true, false]), question(&[false, false, true])]),
            70,
            Utc::now(),
        )
        .unwrap();

        assert_eq!(quiz.pass_percentage, 70);
        assert_eq!(quiz.questions.len(), 2);
        assert_eq!(quiz.questions[1].position, 2);
        assert_eq!(quiz.questions[1].options[2].position, 3);
        assert!(quiz.questions[1].options[2].is_correct);
    }

    #[test]
    fn test_question_rules() {
        let now = Utc::now();
        let course_id = CourseId::new();

        let one_option = Quiz::new(course_id, draft(vec![question(&[true])]), 70, now);
        assert!(matches!(one_option, Err(LearningError::Validation(_))));

        let two_correct = Quiz::new(course_id, draft(vec![question(&[true, true])]), 70, now);
        assert!(two_correct.is_err());

        let none_correct = Quiz::new(course_id, draft(vec![question(&[false, false])]), 70, now);
        assert!(none_correct.is_err());
    }

    #[test]
    fn test_pass_percentage_bounds() {
        let now = Utc::now();
        for bad in [0, 101, -3] {
            let quiz = Quiz::new(
                CourseId::new(),
                QuizDraft {
                    pass_percentage: Some(bad),
                    ..draft(vec![question(&[true, false])])
                },
                70,
                now,
            );
            assert!(quiz.is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_replace_regenerates_ids() {
        let now = Utc::now();
        let mut quiz = Quiz::new(CourseId::new(), draft(vec![question(&[true, false])]), 70, now)
            .unwrap();
        let quiz_id = quiz.quiz_id;
        let old_question = quiz.questions[0].question_id;

        quiz.replace(draft(vec![question(&[false, true])]), 70, now)
            .unwrap();

        assert_eq!(quiz.quiz_id, quiz_id);
        assert_ne!(quiz.questions[0].question_id, old_question);
        assert!(quiz.question(&old_question).is_none());
    }

    #[test]
    fn test_empty_quiz_is_allowed_while_authoring() {
        let quiz = Quiz::new(CourseId::new(), draft(Vec::new()), 70, Utc::now()).unwrap();
        assert!(quiz.is_empty());
    }
}
