//! Grader trait and common types.

use async_trait::async_trait;
use rubric_core::{GraderKind, GraderOutcome, Submission};
use thiserror::Error;

use crate::providers::ServiceError;

/// Errors from graders.
#[derive(Error, Debug)]
pub enum GradeError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Failed to deserialize {kind} response: {message}")]
    Deserialization { kind: GraderKind, message: String },
}

/// One grading axis.
///
/// Graders share nothing mutable; the orchestrator runs all four
/// concurrently against the same borrowed submission.
#[async_trait]
pub trait Grader: Send + Sync {
    /// The axis this grader scores.
    fn kind(&self) -> GraderKind;

    /// Grade one submission. The outcome's detail must match [`Grader::kind`].
    async fn grade(&self, submission: &Submission) -> Result<GraderOutcome, GradeError>;
}
