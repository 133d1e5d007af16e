use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One attempt at one question. Ephemeral; an empty raw string means
/// the question was left unanswered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateAnswer {
    pub question_id: String,
    pub raw: String,
}

impl CandidateAnswer {
    pub fn new(question_id: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            raw: raw.into(),
        }
    }
}

/// Where a correctness decision came from. Kept on every verdict for
/// testing and auditing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Local,
    External,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub is_correct: bool,
    /// Populated only when the remote judge was consulted.
    pub feedback: Option<String>,
    pub provenance: Provenance,
}

impl Verdict {
    pub fn local(is_correct: bool) -> Self {
        Self {
            is_correct,
            feedback: None,
            provenance: Provenance::Local,
        }
    }

    pub fn external(is_correct: bool, feedback: String) -> Self {
        Self {
            is_correct,
            feedback: Some(feedback),
            provenance: Provenance::External,
        }
    }
}

/// Persisted grading result, handed to the history store through the
/// record sink. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: String,
    pub subject: String,
    pub is_correct: bool,
    pub user_answer: String,
    pub feedback: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_id: String,
    pub user_answer: String,
    pub verdict: Verdict,
}

/// Final exam report consumed by the review screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamReport {
    /// Aggregate score, 0..=100.
    pub score: u8,
    /// Per-question verdicts in the exam's original question order.
    pub results: Vec<QuestionResult>,
    pub total_duration_minutes: u32,
}
