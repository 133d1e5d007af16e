use std::collections::HashMap;

use crate::metrics::{ANSWERS_GRADED_TOTAL, JUDGE_BATCHES_TOTAL, JUDGE_BATCH_DURATION_SECONDS};
use crate::models::answer::{CandidateAnswer, Provenance, Verdict};
use crate::models::Question;
use crate::services::judge_client::{JudgeClient, JudgeItem};
use crate::services::resolver::{resolve, ChoicePolicy, Resolution};

/// Feedback attached to every deferred answer when the judge call fails
/// outright. Ungraded subjective answers are never silently marked correct.
pub const JUDGE_UNAVAILABLE_FEEDBACK: &str = "AI 服务暂时不可用，默认判定为错误";

/// Feedback attached when a successful judge response omits a requested id.
pub const MISSING_RESULT_FEEDBACK: &str = "阅卷结果缺失";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedAnswer {
    pub question_id: String,
    pub user_answer: String,
    pub verdict: Verdict,
}

/// Grades one submission: deterministic resolution first, then at most ONE
/// judge round-trip for the whole deferred set, then an order-preserving
/// merge. Every failure mode is expressed as a verdict; this function does
/// not error and the only suspend point is the judge call.
pub async fn grade_batch<J: JudgeClient + ?Sized>(
    questions: &[Question],
    candidates: &[CandidateAnswer],
    policy: ChoicePolicy,
    judge: &J,
) -> Vec<GradedAnswer> {
    let answers: HashMap<&str, &str> = candidates
        .iter()
        .map(|candidate| (candidate.question_id.as_str(), candidate.raw.as_str()))
        .collect();

    let mut resolved: HashMap<String, Verdict> = HashMap::new();
    let mut deferred: Vec<JudgeItem> = Vec::new();

    for question in questions {
        let raw = answers.get(question.id.as_str()).copied().unwrap_or("");
        match resolve(question, raw, policy) {
            Resolution::LocalPass => {
                resolved.insert(question.id.clone(), Verdict::local(true));
            }
            Resolution::LocalFail => {
                resolved.insert(question.id.clone(), Verdict::local(false));
            }
            Resolution::NeedsExternalJudge => {
                deferred.push(JudgeItem {
                    id: question.id.clone(),
                    question: question.question.clone(),
                    correct_answer: question.answer.clone(),
                    user_answer: raw.to_string(),
                });
            }
        }
    }

    if !deferred.is_empty() {
        let timer = JUDGE_BATCH_DURATION_SECONDS.start_timer();
        let judged = judge.judge(&deferred).await;
        timer.observe_duration();

        match judged {
            Ok(mut outcomes) => {
                JUDGE_BATCHES_TOTAL.with_label_values(&["ok"]).inc();
                for item in &deferred {
                    let verdict = match outcomes.remove(&item.id) {
                        Some(outcome) => Verdict::external(outcome.is_correct, outcome.feedback),
                        None => Verdict::external(false, MISSING_RESULT_FEEDBACK.to_string()),
                    };
                    resolved.insert(item.id.clone(), verdict);
                }
            }
            Err(err) => {
                JUDGE_BATCHES_TOTAL.with_label_values(&["error"]).inc();
                tracing::warn!(
                    "Remote judge unavailable, failing {} deferred answers closed: {}",
                    deferred.len(),
                    err
                );
                for item in &deferred {
                    resolved.insert(
                        item.id.clone(),
                        Verdict::external(false, JUDGE_UNAVAILABLE_FEEDBACK.to_string()),
                    );
                }
            }
        }
    }

    // Restore the submission's original question order when merging.
    questions
        .iter()
        .map(|question| {
            let verdict = resolved
                .remove(&question.id)
                .unwrap_or_else(|| Verdict::local(false));
            record_graded_metric(&verdict);
            GradedAnswer {
                question_id: question.id.clone(),
                user_answer: answers
                    .get(question.id.as_str())
                    .copied()
                    .unwrap_or("")
                    .to_string(),
                verdict,
            }
        })
        .collect()
}

/// Degenerate batch of one, used by the practice flow. Identical
/// orchestration; the feedback is surfaced to the learner.
pub async fn grade_single<J: JudgeClient + ?Sized>(
    question: &Question,
    raw_answer: &str,
    policy: ChoicePolicy,
    judge: &J,
) -> Verdict {
    let candidate = CandidateAnswer::new(question.id.clone(), raw_answer);
    grade_batch(std::slice::from_ref(question), &[candidate], policy, judge)
        .await
        .pop()
        .map(|graded| graded.verdict)
        .unwrap_or_else(|| Verdict::local(false))
}

fn record_graded_metric(verdict: &Verdict) {
    let provenance = match verdict.provenance {
        Provenance::Local => "local",
        Provenance::External => "external",
    };
    let correct = if verdict.is_correct { "true" } else { "false" };
    ANSWERS_GRADED_TOTAL
        .with_label_values(&[provenance, correct])
        .inc();
}
