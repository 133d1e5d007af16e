use crate::models::{Question, QuestionType};
use crate::utils::normalize::normalize;

/// Outcome of the deterministic matching rules for one candidate answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    LocalPass,
    LocalFail,
    /// The answer may be semantically correct but lexically different
    /// (synonym, reordered multi-blank answer); route to the remote judge.
    NeedsExternalJudge,
}

/// Strictness of multiple-choice matching. The exam flow additionally
/// accepts a pass when the canonical answer starts with the user answer;
/// the practice flow does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChoicePolicy {
    #[default]
    Strict,
    PrefixLenient,
}

/// Pure per-question-type matching. Never errors: malformed question data
/// (e.g. a choice question without options) degrades to LocalFail, since
/// failing an ungradable question is safer than aborting a running exam.
pub fn resolve(question: &Question, raw_answer: &str, policy: ChoicePolicy) -> Resolution {
    let user = normalize(raw_answer);
    if user.is_empty() {
        // An unanswered question is never deferred to the judge.
        return Resolution::LocalFail;
    }
    let canonical = normalize(&question.answer);

    match question.question_type {
        QuestionType::MultipleChoice => {
            if user == canonical {
                return Resolution::LocalPass;
            }
            // The user may answer with the option letter or the option
            // text; the canonical answer may be stored either way too.
            if selected_option_text(question, raw_answer).is_some_and(|text| text == canonical) {
                return Resolution::LocalPass;
            }
            if canonical_option_text(question, &canonical).is_some_and(|text| text == user) {
                return Resolution::LocalPass;
            }
            if policy == ChoicePolicy::PrefixLenient && canonical.starts_with(user.as_str()) {
                return Resolution::LocalPass;
            }
            Resolution::LocalFail
        }
        QuestionType::TrueFalse => {
            if user == canonical {
                Resolution::LocalPass
            } else {
                Resolution::LocalFail
            }
        }
        QuestionType::FillBlank | QuestionType::ShortAnswer => {
            if user == canonical {
                Resolution::LocalPass
            } else {
                Resolution::NeedsExternalJudge
            }
        }
    }
}

/// Normalized text of the option addressed by the first character of the
/// raw user answer ('A' = index 0). Out-of-range selections yield None.
fn selected_option_text(question: &Question, raw_answer: &str) -> Option<String> {
    option_text_at(question, raw_answer.chars().next()?)
}

/// Normalized text of the option addressed by a canonical answer that is
/// a single index letter. Canonical answers stored as option text are
/// handled by direct comparison instead.
fn canonical_option_text(question: &Question, canonical: &str) -> Option<String> {
    let mut chars = canonical.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), None) => option_text_at(question, letter),
        _ => None,
    }
}

fn option_text_at(question: &Question, letter: char) -> Option<String> {
    let index = letter.to_ascii_uppercase() as i64 - 'A' as i64;
    if index < 0 {
        return None;
    }
    question
        .options
        .get(index as usize)
        .map(|option| normalize(option))
}
