//! Aggregator: combines the four grader outcomes into a final result.
//!
//! The aggregate is a plain weighted sum. Weights come from configuration
//! and are not normalised, so the aggregate only stays in [0, 1] when the
//! weights sum to at most 1.

use chrono::Utc;

use crate::config::GradingWeights;
use crate::types::{GraderScores, GradingResult};

/// Applies configured weights to grader outcomes.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    weights: GradingWeights,
}

impl Aggregator {
    pub fn new(weights: GradingWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &GradingWeights {
        &self.weights
    }

    /// `Σ score_i * weight_i` over the four graders.
    pub fn weighted_sum(&self, scores: &GraderScores) -> f64 {
        scores
            .iter()
            .map(|(kind, outcome)| outcome.score * self.weights.weight_for(kind))
            .sum()
    }

    /// Build the result of a completed pass.
    pub fn aggregate(&self, artifact: impl Into<String>, scores: GraderScores) -> GradingResult {
        let aggregate = self.weighted_sum(&scores);
        GradingResult {
            artifact: artifact.into(),
            scores: Some(scores),
            aggregate,
            weights: self.weights,
            graded_at: Utc::now(),
        }
    }

    /// Build the zero result of a pass skipped for blank input.
    pub fn skipped(&self, artifact: impl Into<String>) -> GradingResult {
        GradingResult {
            artifact: artifact.into(),
            scores: None,
            aggregate: 0.0,
            weights: self.weights,
            graded_at: Utc::now(),
        }
    }
}
