//! [`Grader`] adapters for the deterministic core graders.

use async_trait::async_trait;
use rubric_core::{
    GraderDetail, GraderKind, GraderOutcome, KeywordGrader, MarkdownGrader, Submission,
};

use super::traits::{GradeError, Grader};

#[async_trait]
impl Grader for KeywordGrader {
    fn kind(&self) -> GraderKind {
        GraderKind::Keyword
    }

    async fn grade(&self, submission: &Submission) -> Result<GraderOutcome, GradeError> {
        let (result, score) = KeywordGrader::grade(self, &submission.candidate);
        Ok(GraderOutcome::new(score, GraderDetail::Keyword(result)))
    }
}

#[async_trait]
impl Grader for MarkdownGrader {
    fn kind(&self) -> GraderKind {
        GraderKind::Markdown
    }

    async fn grade(&self, submission: &Submission) -> Result<GraderOutcome, GradeError> {
        let (report, score) = MarkdownGrader::grade(self, &submission.candidate);
        Ok(GraderOutcome::new(score, GraderDetail::Markdown(report)))
    }
}
