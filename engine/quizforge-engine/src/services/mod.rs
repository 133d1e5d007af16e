use std::sync::Arc;

use crate::models::answer::AnswerRecord;

/// Append callback handing finished records to the history store, which
/// lives outside this engine.
pub type RecordSink = Arc<dyn Fn(AnswerRecord) + Send + Sync>;

pub mod exam_service;
pub mod grading_service;
pub mod judge_client;
pub mod practice_service;
pub mod resolver;
