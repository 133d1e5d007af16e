#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use quizforge_engine::{
    AnswerRecord, Difficulty, Exam, JudgeClient, JudgeError, JudgeItem, JudgeOutcome, Question,
    QuestionType, RecordSink,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn question(
    id: &str,
    question_type: QuestionType,
    prompt: &str,
    options: &[&str],
    answer: &str,
) -> Question {
    Question {
        id: id.to_string(),
        subject: "常识".to_string(),
        question_type,
        question: prompt.to_string(),
        options: options.iter().map(|s| s.to_string()).collect(),
        answer: answer.to_string(),
        explanation: "解析略".to_string(),
        difficulty: Difficulty::Medium,
        created_at: Utc::now(),
    }
}

pub fn question_in_subject(subject: &str, id: &str, answer: &str) -> Question {
    let mut q = question(id, QuestionType::ShortAnswer, "题干", &[], answer);
    q.subject = subject.to_string();
    q
}

pub fn exam(questions: Vec<Question>, duration_minutes: u32) -> Exam {
    Exam {
        id: "exam-1".to_string(),
        title: "综合测验".to_string(),
        subject: "常识".to_string(),
        questions,
        duration_minutes,
        created_at: Utc::now(),
    }
}

/// Collects records handed to the sink so tests can assert on the stream.
pub fn recording_sink() -> (RecordSink, Arc<Mutex<Vec<AnswerRecord>>>) {
    let records: Arc<Mutex<Vec<AnswerRecord>>> = Arc::new(Mutex::new(Vec::new()));
    let sink_records = records.clone();
    let sink: RecordSink = Arc::new(move |record| {
        sink_records.lock().unwrap().push(record);
    });
    (sink, records)
}

/// Scripted judge: programmable per-id outcomes, optional hard failure,
/// and a call log for round-trip assertions.
#[derive(Clone, Default)]
pub struct MockJudge {
    outcomes: Arc<Mutex<HashMap<String, JudgeOutcome>>>,
    fail: Arc<Mutex<bool>>,
    calls: Arc<Mutex<Vec<Vec<JudgeItem>>>>,
}

impl MockJudge {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let judge = Self::default();
        *judge.fail.lock().unwrap() = true;
        judge
    }

    pub fn with_outcome(self, id: &str, is_correct: bool, feedback: &str) -> Self {
        self.outcomes.lock().unwrap().insert(
            id.to_string(),
            JudgeOutcome {
                is_correct,
                feedback: feedback.to_string(),
            },
        );
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<Vec<JudgeItem>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl JudgeClient for MockJudge {
    async fn judge(
        &self,
        batch: &[JudgeItem],
    ) -> Result<HashMap<String, JudgeOutcome>, JudgeError> {
        self.calls.lock().unwrap().push(batch.to_vec());
        if *self.fail.lock().unwrap() {
            return Err(JudgeError::Status {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        let outcomes = self.outcomes.lock().unwrap();
        Ok(batch
            .iter()
            .filter_map(|item| {
                outcomes
                    .get(&item.id)
                    .map(|outcome| (item.id.clone(), outcome.clone()))
            })
            .collect())
    }
}
