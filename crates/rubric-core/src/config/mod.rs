//! Grading configuration.
//!
//! Configuration is structured YAML or JSON validated against an embedded
//! JSON Schema. This module handles parsing and validation.

mod parser;
mod schema;

pub use parser::{
    ConfigError, ExpectedKeyword, GradingConfig, GradingWeights, JudgmentSettings,
    KeywordSettings, MarkdownWeights, OutputSettings, RubricConfig, SentimentSettings,
    ServiceSettings,
};
pub use schema::{is_valid_config, validate_config_schema};
