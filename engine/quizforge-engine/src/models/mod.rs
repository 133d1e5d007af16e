use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::normalize::normalize;

pub mod answer;
pub mod timer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    FillBlank,
    ShortAnswer,
}

impl QuestionType {
    /// Objective questions are always resolved locally, never deferred to the judge.
    pub fn is_objective(self) -> bool {
        matches!(self, QuestionType::MultipleChoice | QuestionType::TrueFalse)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// A question as supplied by the authoring subsystem. Read-only for the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub subject: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub question: String,
    /// Ordered option texts; meaningful for MultipleChoice only.
    #[serde(default)]
    pub options: Vec<String>,
    /// Canonical answer: an option index letter or an option text for
    /// MultipleChoice, 正确/错误 for TrueFalse, free text otherwise.
    pub answer: String,
    pub explanation: String,
    pub difficulty: Difficulty,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuestionDataError {
    #[error("multiple choice question {0} has an empty options list")]
    MissingOptions(String),
    #[error("canonical answer {answer:?} of question {id} maps to no option")]
    UnmappedAnswer { id: String, answer: String },
}

impl Question {
    /// Data-integrity probe for upstream question data. A violation is a
    /// fault in the authoring subsystem; grading treats such questions as
    /// locally incorrect instead of failing, so this is only used to warn.
    pub fn validate(&self) -> Result<(), QuestionDataError> {
        if self.question_type != QuestionType::MultipleChoice {
            return Ok(());
        }
        if self.options.is_empty() {
            return Err(QuestionDataError::MissingOptions(self.id.clone()));
        }
        let canonical = normalize(&self.answer);
        let mut chars = canonical.chars();
        if let (Some(letter), None) = (chars.next(), chars.next()) {
            let index = letter.to_ascii_uppercase() as i64 - 'A' as i64;
            if (0..self.options.len() as i64).contains(&index) {
                return Ok(());
            }
        }
        let text_matches = self
            .options
            .iter()
            .filter(|option| normalize(option) == canonical)
            .count();
        if text_matches == 1 {
            Ok(())
        } else {
            Err(QuestionDataError::UnmappedAnswer {
                id: self.id.clone(),
                answer: self.answer.clone(),
            })
        }
    }
}

/// An authored exam: an ordered question list plus a time limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    pub id: String,
    pub title: String,
    pub subject: String,
    pub questions: Vec<Question>,
    pub duration_minutes: u32,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice_question(options: &[&str], answer: &str) -> Question {
        Question {
            id: "q1".to_string(),
            subject: "生物".to_string(),
            question_type: QuestionType::MultipleChoice,
            question: "下列哪种动物会汪汪叫？".to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
            answer: answer.to_string(),
            explanation: String::new(),
            difficulty: Difficulty::Easy,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn letter_canonical_answer_is_valid() {
        let q = choice_question(&["猫", "狗", "鸟"], "B");
        assert!(q.validate().is_ok());
    }

    #[test]
    fn option_text_canonical_answer_is_valid() {
        let q = choice_question(&["猫", "狗", "鸟"], "狗");
        assert!(q.validate().is_ok());
    }

    #[test]
    fn empty_options_are_rejected() {
        let q = choice_question(&[], "A");
        assert_eq!(
            q.validate(),
            Err(QuestionDataError::MissingOptions("q1".to_string()))
        );
    }

    #[test]
    fn out_of_range_letter_is_rejected() {
        let q = choice_question(&["猫", "狗"], "D");
        assert!(matches!(
            q.validate(),
            Err(QuestionDataError::UnmappedAnswer { .. })
        ));
    }

    #[test]
    fn non_choice_questions_skip_the_check() {
        let mut q = choice_question(&[], "任意答案");
        q.question_type = QuestionType::ShortAnswer;
        assert!(q.validate().is_ok());
    }

    #[test]
    fn only_choice_and_true_false_are_objective() {
        assert!(QuestionType::MultipleChoice.is_objective());
        assert!(QuestionType::TrueFalse.is_objective());
        assert!(!QuestionType::FillBlank.is_objective());
        assert!(!QuestionType::ShortAnswer.is_objective());
    }

    #[test]
    fn question_type_wire_names_match_the_authoring_subsystem() {
        let json = serde_json::to_string(&QuestionType::MultipleChoice).unwrap();
        assert_eq!(json, "\"multiple_choice\"");
        let parsed: QuestionType = serde_json::from_str("\"short_answer\"").unwrap();
        assert_eq!(parsed, QuestionType::ShortAnswer);
    }
}
