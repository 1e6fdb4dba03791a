//! # rubric-core
//!
//! Deterministic building blocks for grading generated text.
//!
//! This crate holds everything that does not talk to a model:
//! - the typed results each grader produces
//! - the Keyword and Markdown structural graders
//! - configuration loading and schema validation
//! - weighted aggregation of grader scores
//!
//! The model-backed graders and the concurrent orchestrator live in
//! `rubric-runtime`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use rubric_core::{MarkdownGrader, MarkdownWeights};
//!
//! let grader = MarkdownGrader::new(MarkdownWeights::default());
//! let (report, score) = grader.grade("# Title\n**bold** text");
//! assert!(report.is_valid());
//! ```

pub mod aggregate;
pub mod config;
pub mod graders;
pub mod types;

pub use aggregate::Aggregator;
pub use config::{
    ConfigError, ExpectedKeyword, GradingConfig, GradingWeights, JudgmentSettings,
    KeywordSettings, MarkdownWeights, OutputSettings, RubricConfig, SentimentSettings,
    ServiceSettings,
};
pub use graders::{KeywordGrader, MarkdownGrader};
pub use types::{
    EmotionVector, GraderDetail, GraderKind, GraderOutcome, GraderScores, GradingResult,
    JudgmentScore, KeywordResult, KeywordTally, MarkdownFeatures, MarkdownReport, Submission,
};
