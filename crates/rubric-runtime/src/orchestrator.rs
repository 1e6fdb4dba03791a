//! Grading orchestrator.
//!
//! - Fan-out to all four graders via `tokio::join!`
//! - Fan-in through the [`Aggregator`]
//! - All-or-nothing: any grader failure discards the pass

use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;

use rubric_core::{
    Aggregator, GraderKind, GraderOutcome, GraderScores, GradingResult, GradingWeights,
    Submission,
};

use crate::agents::{GradeError, Grader};

/// Errors from the orchestrator.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("No grader registered for the {0} slot")]
    MissingGrader(GraderKind),

    #[error("Grader registered for the {slot} slot reports kind {actual}")]
    KindMismatch { slot: GraderKind, actual: GraderKind },

    #[error("{kind} grader failed: {source}")]
    Grader {
        kind: GraderKind,
        #[source]
        source: GradeError,
    },

    #[error("{kind} grader returned a {actual} result")]
    UnexpectedDetail { kind: GraderKind, actual: GraderKind },
}

impl OrchestratorError {
    /// The grader responsible, when the error came from a grading pass.
    pub fn grader_kind(&self) -> Option<GraderKind> {
        match self {
            OrchestratorError::Grader { kind, .. }
            | OrchestratorError::UnexpectedDetail { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Runs the four graders concurrently and aggregates their scores.
pub struct GradingOrchestrator {
    sentiment: Arc<dyn Grader>,
    markdown: Arc<dyn Grader>,
    keyword: Arc<dyn Grader>,
    judgment: Arc<dyn Grader>,
    aggregator: Aggregator,
}

impl GradingOrchestrator {
    pub fn builder() -> GradingOrchestratorBuilder {
        GradingOrchestratorBuilder::new()
    }

    pub fn weights(&self) -> &GradingWeights {
        self.aggregator.weights()
    }

    /// Grade one submission.
    ///
    /// A blank candidate is skipped without invoking any grader and yields
    /// a zero result. Otherwise every grader must succeed.
    pub async fn grade(&self, submission: &Submission) -> Result<GradingResult, OrchestratorError> {
        let span = tracing::info_span!("grade", artifact = %submission.name);
        self.grade_inner(submission).instrument(span).await
    }

    async fn grade_inner(&self, submission: &Submission) -> Result<GradingResult, OrchestratorError> {
        if submission.is_blank() {
            tracing::warn!("Candidate is empty, skipping grading");
            return Ok(self.aggregator.skipped(&submission.name));
        }

        let (sentiment, markdown, keyword, judgment) = tokio::join!(
            run_grader(GraderKind::Sentiment, self.sentiment.as_ref(), submission),
            run_grader(GraderKind::Markdown, self.markdown.as_ref(), submission),
            run_grader(GraderKind::Keyword, self.keyword.as_ref(), submission),
            run_grader(GraderKind::Judgment, self.judgment.as_ref(), submission),
        );

        let scores = match collect(sentiment, markdown, keyword, judgment) {
            Ok(scores) => scores,
            Err(e) => {
                tracing::error!(
                    grader = ?e.grader_kind(),
                    error = %e,
                    "Grading failed, no score recorded"
                );
                return Err(e);
            }
        };

        let weights = self.aggregator.weights();
        for (kind, outcome) in scores.iter() {
            tracing::info!(
                grader = %kind,
                score = outcome.score,
                weight = weights.weight_for(kind),
                "Grader score"
            );
        }

        let result = self.aggregator.aggregate(&submission.name, scores);
        tracing::info!(aggregate = result.aggregate, "Grading complete");

        Ok(result)
    }
}

async fn run_grader(
    kind: GraderKind,
    grader: &dyn Grader,
    submission: &Submission,
) -> Result<GraderOutcome, OrchestratorError> {
    let outcome = grader
        .grade(submission)
        .await
        .map_err(|source| OrchestratorError::Grader { kind, source })?;

    if outcome.kind() != kind {
        return Err(OrchestratorError::UnexpectedDetail {
            kind,
            actual: outcome.kind(),
        });
    }

    Ok(outcome)
}

/// Fan-in. The first failure in reporting order wins.
fn collect(
    sentiment: Result<GraderOutcome, OrchestratorError>,
    markdown: Result<GraderOutcome, OrchestratorError>,
    keyword: Result<GraderOutcome, OrchestratorError>,
    judgment: Result<GraderOutcome, OrchestratorError>,
) -> Result<GraderScores, OrchestratorError> {
    Ok(GraderScores {
        sentiment: sentiment?,
        markdown: markdown?,
        keyword: keyword?,
        judgment: judgment?,
    })
}

/// Builder for [`GradingOrchestrator`]; one grader per slot.
pub struct GradingOrchestratorBuilder {
    sentiment: Option<Arc<dyn Grader>>,
    markdown: Option<Arc<dyn Grader>>,
    keyword: Option<Arc<dyn Grader>>,
    judgment: Option<Arc<dyn Grader>>,
    weights: GradingWeights,
}

impl GradingOrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            sentiment: None,
            markdown: None,
            keyword: None,
            judgment: None,
            weights: GradingWeights::default(),
        }
    }

    pub fn sentiment(mut self, grader: Arc<dyn Grader>) -> Self {
        self.sentiment = Some(grader);
        self
    }

    pub fn markdown(mut self, grader: Arc<dyn Grader>) -> Self {
        self.markdown = Some(grader);
        self
    }

    pub fn keyword(mut self, grader: Arc<dyn Grader>) -> Self {
        self.keyword = Some(grader);
        self
    }

    pub fn judgment(mut self, grader: Arc<dyn Grader>) -> Self {
        self.judgment = Some(grader);
        self
    }

    pub fn weights(mut self, weights: GradingWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Build the orchestrator. Fails if a slot is empty or holds a grader
    /// of another kind.
    pub fn build(self) -> Result<GradingOrchestrator, OrchestratorError> {
        Ok(GradingOrchestrator {
            sentiment: checked_slot(GraderKind::Sentiment, self.sentiment)?,
            markdown: checked_slot(GraderKind::Markdown, self.markdown)?,
            keyword: checked_slot(GraderKind::Keyword, self.keyword)?,
            judgment: checked_slot(GraderKind::Judgment, self.judgment)?,
            aggregator: Aggregator::new(self.weights),
        })
    }
}

impl Default for GradingOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn checked_slot(
    slot: GraderKind,
    grader: Option<Arc<dyn Grader>>,
) -> Result<Arc<dyn Grader>, OrchestratorError> {
    let grader = grader.ok_or(OrchestratorError::MissingGrader(slot))?;
    if grader.kind() != slot {
        return Err(OrchestratorError::KindMismatch {
            slot,
            actual: grader.kind(),
        });
    }
    Ok(grader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rubric_core::{
        EmotionVector, GraderDetail, JudgmentScore, KeywordResult, MarkdownReport,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::providers::ServiceError;

    /// Returns a fixed score and counts calls.
    struct FixedGrader {
        kind: GraderKind,
        score: f64,
        fail: bool,
        calls: AtomicUsize,
    }

    impl FixedGrader {
        fn new(kind: GraderKind, score: f64) -> Arc<Self> {
            Arc::new(Self {
                kind,
                score,
                fail: false,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(kind: GraderKind) -> Arc<Self> {
            Arc::new(Self {
                kind,
                score: 0.0,
                fail: true,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Grader for FixedGrader {
        fn kind(&self) -> GraderKind {
            self.kind
        }

        async fn grade(&self, _submission: &Submission) -> Result<GraderOutcome, GradeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GradeError::Service(ServiceError::Status {
                    endpoint: "mock".to_string(),
                    status: 500,
                }));
            }
            let detail = match self.kind {
                GraderKind::Sentiment => GraderDetail::Sentiment(EmotionVector::default()),
                GraderKind::Markdown => GraderDetail::Markdown(MarkdownReport::new()),
                GraderKind::Keyword => GraderDetail::Keyword(KeywordResult::default()),
                GraderKind::Judgment => {
                    GraderDetail::Judgment(JudgmentScore::new(1.0, 1.0, 1.0, 1.0))
                }
            };
            Ok(GraderOutcome::new(self.score, detail))
        }
    }

    fn weights() -> GradingWeights {
        GradingWeights {
            sentiment: 0.1,
            markdown: 0.2,
            keyword: 0.3,
            judgment: 0.4,
        }
    }

    #[tokio::test]
    async fn test_aggregate_is_weighted_sum() {
        let orchestrator = GradingOrchestrator::builder()
            .sentiment(FixedGrader::new(GraderKind::Sentiment, 0.5))
            .markdown(FixedGrader::new(GraderKind::Markdown, 1.0))
            .keyword(FixedGrader::new(GraderKind::Keyword, 0.0))
            .judgment(FixedGrader::new(GraderKind::Judgment, 0.25))
            .weights(weights())
            .build()
            .unwrap();

        let result = orchestrator
            .grade(&Submission::new("a", "some text"))
            .await
            .unwrap();

        let expected = 0.5 * 0.1 + 1.0 * 0.2 + 0.0 * 0.3 + 0.25 * 0.4;
        assert!((result.aggregate - expected).abs() < 1e-12);
        assert_eq!(result.weights, weights());
        let scores = result.scores.unwrap();
        assert_eq!(scores.judgment.score, 0.25);
    }

    #[tokio::test]
    async fn test_blank_candidate_skips_graders() {
        let sentiment = FixedGrader::new(GraderKind::Sentiment, 1.0);
        let markdown = FixedGrader::new(GraderKind::Markdown, 1.0);
        let keyword = FixedGrader::new(GraderKind::Keyword, 1.0);
        let judgment = FixedGrader::new(GraderKind::Judgment, 1.0);

        let orchestrator = GradingOrchestrator::builder()
            .sentiment(sentiment.clone())
            .markdown(markdown.clone())
            .keyword(keyword.clone())
            .judgment(judgment.clone())
            .build()
            .unwrap();

        let result = orchestrator
            .grade(&Submission::new("empty", "  \n "))
            .await
            .unwrap();

        assert!(result.is_skipped());
        assert_eq!(result.aggregate, 0.0);
        let total = sentiment.calls() + markdown.calls() + keyword.calls() + judgment.calls();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_any_failure_aborts_pass() {
        let keyword = FixedGrader::new(GraderKind::Keyword, 1.0);
        let orchestrator = GradingOrchestrator::builder()
            .sentiment(FixedGrader::failing(GraderKind::Sentiment))
            .markdown(FixedGrader::new(GraderKind::Markdown, 1.0))
            .keyword(keyword.clone())
            .judgment(FixedGrader::new(GraderKind::Judgment, 1.0))
            .build()
            .unwrap();

        let err = orchestrator
            .grade(&Submission::new("a", "text"))
            .await
            .unwrap_err();

        assert_eq!(err.grader_kind(), Some(GraderKind::Sentiment));
        assert!(err.to_string().contains("HTTP 500"));
        // The other graders still ran concurrently.
        assert_eq!(keyword.calls(), 1);
    }

    #[test]
    fn test_builder_rejects_wrong_kind() {
        let result = GradingOrchestrator::builder()
            .sentiment(FixedGrader::new(GraderKind::Markdown, 1.0))
            .markdown(FixedGrader::new(GraderKind::Markdown, 1.0))
            .keyword(FixedGrader::new(GraderKind::Keyword, 1.0))
            .judgment(FixedGrader::new(GraderKind::Judgment, 1.0))
            .build();

        assert!(matches!(
            result,
            Err(OrchestratorError::KindMismatch {
                slot: GraderKind::Sentiment,
                actual: GraderKind::Markdown
            })
        ));
    }

    #[test]
    fn test_builder_rejects_missing_slot() {
        let result = GradingOrchestrator::builder()
            .sentiment(FixedGrader::new(GraderKind::Sentiment, 1.0))
            .build();
        assert!(matches!(
            result,
            Err(OrchestratorError::MissingGrader(GraderKind::Markdown))
        ));
    }

    #[tokio::test]
    async fn test_mismatched_detail_rejected() {
        struct Liar;

        #[async_trait]
        impl Grader for Liar {
            fn kind(&self) -> GraderKind {
                GraderKind::Keyword
            }

            async fn grade(&self, _s: &Submission) -> Result<GraderOutcome, GradeError> {
                Ok(GraderOutcome::new(
                    1.0,
                    GraderDetail::Markdown(MarkdownReport::new()),
                ))
            }
        }

        let orchestrator = GradingOrchestrator::builder()
            .sentiment(FixedGrader::new(GraderKind::Sentiment, 1.0))
            .markdown(FixedGrader::new(GraderKind::Markdown, 1.0))
            .keyword(Arc::new(Liar))
            .judgment(FixedGrader::new(GraderKind::Judgment, 1.0))
            .build()
            .unwrap();

        let err = orchestrator
            .grade(&Submission::new("a", "text"))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::UnexpectedDetail { .. }));
    }
}
