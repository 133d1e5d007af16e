use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter_vec, register_int_gauge, Encoder, Histogram,
    IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // Grading Metrics
    pub static ref ANSWERS_GRADED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "answers_graded_total",
        "Total number of answers graded",
        &["provenance", "correct"]
    )
    .unwrap();

    pub static ref JUDGE_BATCHES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "judge_batches_total",
        "Total number of remote judge batch calls",
        &["status"]
    )
    .unwrap();

    pub static ref JUDGE_BATCH_DURATION_SECONDS: Histogram = register_histogram!(
        "judge_batch_duration_seconds",
        "Remote judge batch call duration in seconds",
        vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .unwrap();

    // Exam Metrics
    pub static ref EXAM_SESSIONS_ACTIVE: IntGauge = register_int_gauge!(
        "exam_sessions_active",
        "Number of exam sessions currently in progress"
    )
    .unwrap();

    pub static ref EXAM_SUBMISSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "exam_submissions_total",
        "Total number of exam submissions",
        &["trigger"]
    )
    .unwrap();
}

/// Renders the default registry in Prometheus text format for whatever
/// surface the embedding application exposes.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
