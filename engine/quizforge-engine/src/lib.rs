pub mod config;
pub mod metrics;
pub mod models;
pub mod services;
pub mod utils;

pub use config::JudgeConfig;
pub use models::answer::{
    AnswerRecord, CandidateAnswer, ExamReport, Provenance, QuestionResult, Verdict,
};
pub use models::{Difficulty, Exam, Question, QuestionType};
pub use services::exam_service::{
    score_percent, ExamPhase, ExamService, ExamSession, SubmitOutcome, SubmitTrigger,
};
pub use services::grading_service::{
    grade_batch, grade_single, GradedAnswer, JUDGE_UNAVAILABLE_FEEDBACK, MISSING_RESULT_FEEDBACK,
};
pub use services::judge_client::{
    HttpJudgeClient, JudgeClient, JudgeError, JudgeItem, JudgeOutcome,
};
pub use services::practice_service::{PracticeService, PracticeSession};
pub use services::resolver::{resolve, ChoicePolicy, Resolution};
pub use services::RecordSink;
