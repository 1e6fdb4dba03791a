//! Graders as async agents.
//!
//! Every grading axis implements [`Grader`]. The deterministic core
//! graders are adapted in `deterministic`; Sentiment and Judgment call the
//! generation service.

mod deterministic;
mod judgment;
mod sentiment;
mod traits;

pub use judgment::{parse_judgment, JudgmentGrader, RUN_EVALUATION};
pub use sentiment::{parse_emotions, SentimentGrader};
pub use traits::{GradeError, Grader};

/// Strip an optional surrounding Markdown code fence (with or without a
/// language tag) from a model reply.
pub(crate) fn strip_code_fence(message: &str) -> &str {
    let trimmed = message.trim();
    let Some(inner) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return trimmed;
    };

    match inner.find('\n') {
        Some(newline) => inner[newline + 1..].trim(),
        None => inner.trim(),
    }
}
