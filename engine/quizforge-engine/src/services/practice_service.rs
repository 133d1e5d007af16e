use chrono::Utc;
use uuid::Uuid;

use crate::models::answer::{AnswerRecord, Verdict};
use crate::models::Question;
use crate::services::grading_service::grade_single;
use crate::services::judge_client::JudgeClient;
use crate::services::resolver::ChoicePolicy;
use crate::services::RecordSink;

/// One practice run over a single subject. Questions are filtered and
/// shuffled once at session start; the ordering is cosmetic and carries
/// no grading state.
pub struct PracticeSession {
    id: String,
    questions: Vec<Question>,
    cursor: usize,
    correct: usize,
    total: usize,
}

impl PracticeSession {
    pub fn new(bank: &[Question], subject: &str, seed: u64) -> Self {
        let mut questions: Vec<Question> = bank
            .iter()
            .filter(|question| question.subject == subject)
            .cloned()
            .collect();
        for question in &questions {
            if let Err(err) = question.validate() {
                tracing::warn!("Practice bank contains ungradable question data: {}", err);
            }
        }
        crate::utils::shuffle::seeded_shuffle(&mut questions, seed);
        Self {
            id: Uuid::new_v4().to_string(),
            questions,
            cursor: 0,
            correct: 0,
            total: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.cursor)
    }

    pub fn advance(&mut self) {
        if self.cursor < self.questions.len() {
            self.cursor += 1;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.questions.len()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Running (correct, attempted) tally.
    pub fn tally(&self) -> (usize, usize) {
        (self.correct, self.total)
    }
}

/// Interactive grading for the practice screen: one question at a time,
/// strict choice matching, judge feedback surfaced to the learner.
pub struct PracticeService<J: JudgeClient> {
    judge: J,
    recorder: RecordSink,
}

impl<J: JudgeClient> PracticeService<J> {
    pub fn new(judge: J, recorder: RecordSink) -> Self {
        Self { judge, recorder }
    }

    /// Grades the answer to the session's current question and records
    /// the attempt. Returns None once the session is exhausted.
    pub async fn submit_answer(
        &self,
        session: &mut PracticeSession,
        raw_answer: &str,
    ) -> Option<Verdict> {
        let question = session.current()?.clone();

        let verdict =
            grade_single(&question, raw_answer, ChoicePolicy::Strict, &self.judge).await;

        session.total += 1;
        if verdict.is_correct {
            session.correct += 1;
        }

        (self.recorder)(AnswerRecord {
            question_id: question.id.clone(),
            subject: question.subject.clone(),
            is_correct: verdict.is_correct,
            user_answer: raw_answer.to_string(),
            feedback: verdict.feedback.clone(),
            timestamp: Utc::now(),
        });

        tracing::info!(
            "Practice answer graded: session={}, question={}, correct={}, provenance={:?}",
            session.id,
            question.id,
            verdict.is_correct,
            verdict.provenance
        );

        Some(verdict)
    }
}
