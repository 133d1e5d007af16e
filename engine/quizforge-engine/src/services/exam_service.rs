use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::metrics::{EXAM_SESSIONS_ACTIVE, EXAM_SUBMISSIONS_TOTAL};
use crate::models::answer::{AnswerRecord, CandidateAnswer, ExamReport, QuestionResult};
use crate::models::timer::{TimeExpired, TimerEvent, TimerTick};
use crate::models::Exam;
use crate::services::grading_service::{grade_batch, GradedAnswer};
use crate::services::judge_client::JudgeClient;
use crate::services::resolver::ChoicePolicy;
use crate::services::RecordSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamPhase {
    NotStarted,
    InProgress,
    Grading,
    Reviewed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    /// Learner pressed submit; asks for confirmation when questions are
    /// still unanswered.
    Manual,
    /// Learner confirmed submitting with unanswered questions.
    ManualConfirmed,
    /// Countdown reached zero; bypasses the confirmation step.
    Forced,
}

impl SubmitTrigger {
    fn as_label(self) -> &'static str {
        match self {
            SubmitTrigger::Manual | SubmitTrigger::ManualConfirmed => "manual",
            SubmitTrigger::Forced => "forced",
        }
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// Manual submission with unanswered questions; no state change yet.
    ConfirmationRequired { unanswered: usize },
    /// Duplicate or late submission, absorbed by the phase guard.
    Ignored,
    Report(ExamReport),
}

/// Snapshot handed to the grading orchestrator. The attempt token fences
/// stale judge responses: a result produced for an abandoned attempt is
/// dropped instead of mutating a fresh session.
#[derive(Debug, Clone)]
pub struct GradingJob {
    pub attempt: u64,
    pub candidates: Vec<CandidateAnswer>,
}

/// Aggregate score as an exact integer percentage.
pub fn score_percent(correct: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 / total as f64) * 100.0).round() as u8
}

/// One attempt at one exam. Lifecycle:
/// NotStarted -> InProgress -> Grading -> Reviewed, with reset() back to
/// NotStarted from anywhere. There is no persisted checkpoint: losing the
/// session before submission loses all answers entered so far.
pub struct ExamSession {
    id: String,
    exam: Exam,
    answers: HashMap<String, String>,
    time_left: u32,
    total_seconds: u32,
    phase: ExamPhase,
    attempt: u64,
}

impl ExamSession {
    pub fn new(exam: Exam) -> Self {
        for question in &exam.questions {
            if let Err(err) = question.validate() {
                tracing::warn!("Exam {} contains ungradable question data: {}", exam.id, err);
            }
        }
        Self {
            id: Uuid::new_v4().to_string(),
            exam,
            answers: HashMap::new(),
            time_left: 0,
            total_seconds: 0,
            phase: ExamPhase::NotStarted,
            attempt: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn exam(&self) -> &Exam {
        &self.exam
    }

    pub fn phase(&self) -> ExamPhase {
        self.phase
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn answer_for(&self, question_id: &str) -> Option<&str> {
        self.answers.get(question_id).map(String::as_str)
    }

    /// Launches the attempt and arms the countdown.
    pub fn start(&mut self) {
        if self.phase != ExamPhase::NotStarted {
            tracing::warn!(
                "Ignoring start of exam session {} in phase {:?}",
                self.id,
                self.phase
            );
            return;
        }
        self.total_seconds = self.exam.duration_minutes * 60;
        self.time_left = self.total_seconds;
        self.attempt += 1;
        self.phase = ExamPhase::InProgress;
        EXAM_SESSIONS_ACTIVE.inc();
        tracing::info!(
            "Exam session {} started: {} questions, {} minutes",
            self.id,
            self.exam.questions.len(),
            self.exam.duration_minutes
        );
    }

    /// Records or overwrites the answer for one question. Answers may be
    /// changed freely while InProgress and not at all afterwards.
    pub fn answer(&mut self, question_id: &str, raw: impl Into<String>) {
        if self.phase != ExamPhase::InProgress {
            tracing::warn!(
                "Ignoring answer for session {} in phase {:?}",
                self.id,
                self.phase
            );
            return;
        }
        if !self.exam.questions.iter().any(|q| q.id == question_id) {
            tracing::warn!(
                "Ignoring answer for unknown question {} in session {}",
                question_id,
                self.id
            );
            return;
        }
        self.answers.insert(question_id.to_string(), raw.into());
    }

    /// One cooperative one-second countdown step. Purely local state
    /// mutation; never suspends. Expiry is reported exactly once, after
    /// which further ticks are absorbed.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if self.phase != ExamPhase::InProgress || self.time_left == 0 {
            return None;
        }
        self.time_left -= 1;
        if self.time_left == 0 {
            Some(TimerEvent::TimeExpired(TimeExpired {
                session_id: self.id.clone(),
                timestamp: Utc::now(),
            }))
        } else {
            Some(TimerEvent::TimerTick(TimerTick {
                session_id: self.id.clone(),
                remaining_seconds: self.time_left,
                elapsed_seconds: self.total_seconds - self.time_left,
                total_seconds: self.total_seconds,
                timestamp: Utc::now(),
            }))
        }
    }

    pub fn unanswered_count(&self) -> usize {
        self.exam
            .questions
            .iter()
            .filter(|question| {
                self.answers
                    .get(&question.id)
                    .map(|raw| raw.trim().is_empty())
                    .unwrap_or(true)
            })
            .count()
    }

    /// InProgress -> Grading. Returns the grading snapshot, or None when
    /// the session is not InProgress; duplicate submissions and repeated
    /// zero-ticks fall out of that guard.
    pub fn begin_grading(&mut self) -> Option<GradingJob> {
        if self.phase != ExamPhase::InProgress {
            return None;
        }
        self.phase = ExamPhase::Grading;
        EXAM_SESSIONS_ACTIVE.dec();
        let candidates = self
            .exam
            .questions
            .iter()
            .map(|question| {
                CandidateAnswer::new(
                    question.id.clone(),
                    self.answers.get(&question.id).cloned().unwrap_or_default(),
                )
            })
            .collect();
        Some(GradingJob {
            attempt: self.attempt,
            candidates,
        })
    }

    /// Grading -> Reviewed. Applies verdicts only when the phase is still
    /// Grading and the attempt token matches; a stale result is dropped.
    pub fn finish_grading(
        &mut self,
        attempt: u64,
        graded: Vec<GradedAnswer>,
    ) -> Option<(ExamReport, Vec<AnswerRecord>)> {
        if self.phase != ExamPhase::Grading || attempt != self.attempt {
            tracing::warn!(
                "Dropping stale grading result for session {} (attempt {}, current {})",
                self.id,
                attempt,
                self.attempt
            );
            return None;
        }

        let now = Utc::now();
        let total = self.exam.questions.len();
        let correct = graded
            .iter()
            .filter(|answer| answer.verdict.is_correct)
            .count();

        let subjects: HashMap<&str, &str> = self
            .exam
            .questions
            .iter()
            .map(|question| (question.id.as_str(), question.subject.as_str()))
            .collect();

        let mut results = Vec::with_capacity(graded.len());
        let mut records = Vec::with_capacity(graded.len());
        for answer in graded {
            records.push(AnswerRecord {
                question_id: answer.question_id.clone(),
                subject: subjects
                    .get(answer.question_id.as_str())
                    .copied()
                    .unwrap_or_default()
                    .to_string(),
                is_correct: answer.verdict.is_correct,
                user_answer: answer.user_answer.clone(),
                feedback: answer.verdict.feedback.clone(),
                timestamp: now,
            });
            results.push(QuestionResult {
                question_id: answer.question_id,
                user_answer: answer.user_answer,
                verdict: answer.verdict,
            });
        }

        self.phase = ExamPhase::Reviewed;
        let report = ExamReport {
            score: score_percent(correct, total),
            results,
            total_duration_minutes: self.exam.duration_minutes,
        };
        tracing::info!(
            "Exam session {} graded: {}/{} correct, score {}",
            self.id,
            correct,
            total,
            report.score
        );
        Some((report, records))
    }

    /// Discards the attempt and returns to NotStarted for a fresh
    /// instance. Bumping the attempt counter fences any judge response
    /// still in flight for the abandoned attempt.
    pub fn reset(&mut self) {
        if self.phase == ExamPhase::InProgress {
            EXAM_SESSIONS_ACTIVE.dec();
        }
        self.attempt += 1;
        self.answers.clear();
        self.time_left = 0;
        self.total_seconds = 0;
        self.phase = ExamPhase::NotStarted;
        tracing::info!("Exam session {} reset", self.id);
    }
}

/// Async driver for exam submissions. Owns the judge client and the
/// record sink; all judge failures are absorbed into verdicts, nothing
/// here returns an error to the caller.
pub struct ExamService<J: JudgeClient> {
    judge: J,
    recorder: RecordSink,
}

impl<J: JudgeClient> ExamService<J> {
    pub fn new(judge: J, recorder: RecordSink) -> Self {
        Self { judge, recorder }
    }

    pub async fn submit(&self, session: &mut ExamSession, trigger: SubmitTrigger) -> SubmitOutcome {
        if trigger == SubmitTrigger::Manual && session.phase() == ExamPhase::InProgress {
            let unanswered = session.unanswered_count();
            if unanswered > 0 {
                return SubmitOutcome::ConfirmationRequired { unanswered };
            }
        }

        let Some(job) = session.begin_grading() else {
            tracing::debug!(
                "Ignoring submission for session {} in phase {:?}",
                session.id(),
                session.phase()
            );
            return SubmitOutcome::Ignored;
        };

        EXAM_SUBMISSIONS_TOTAL
            .with_label_values(&[trigger.as_label()])
            .inc();
        tracing::info!(
            "Grading exam session {}: {} questions, trigger {:?}",
            session.id(),
            job.candidates.len(),
            trigger
        );

        let graded = grade_batch(
            &session.exam().questions,
            &job.candidates,
            ChoicePolicy::PrefixLenient,
            &self.judge,
        )
        .await;

        match session.finish_grading(job.attempt, graded) {
            Some((report, records)) => {
                for record in records {
                    (self.recorder)(record);
                }
                SubmitOutcome::Report(report)
            }
            None => SubmitOutcome::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_rounds_to_the_nearest_integer() {
        assert_eq!(score_percent(1, 3), 33);
        assert_eq!(score_percent(2, 3), 67);
        assert_eq!(score_percent(0, 5), 0);
        assert_eq!(score_percent(5, 5), 100);
        assert_eq!(score_percent(1, 8), 13);
    }

    #[test]
    fn empty_question_set_scores_zero() {
        assert_eq!(score_percent(0, 0), 0);
    }
}
