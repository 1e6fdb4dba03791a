//! Configuration parsing from YAML/JSON.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::schema::validate_config_schema;
use crate::types::{EmotionVector, GraderKind};

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config does not match schema: {}", .0.join("; "))]
    Schema(Vec<String>),

    #[error("Config validation failed: {0}")]
    Validation(String),

    #[error("Invalid keyword '{term}': {reason}")]
    InvalidKeyword { term: String, reason: String },
}

/// Connection settings for the chat-completion service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Base URL, e.g. `http://localhost:8080`
    pub base_url: String,

    /// Environment variable holding an optional bearer token
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Request timeout in humantime format (e.g. "90s", "15m")
    #[serde(default = "default_timeout")]
    pub timeout: String,
}

fn default_timeout() -> String {
    "1000s".to_string()
}

/// Settings for the output-generation collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Model used to generate outputs
    #[serde(default)]
    pub model: String,

    /// File containing the system prompt used for generation
    pub system_prompt_path: PathBuf,

    /// Directory of `*.txt` input prompts
    pub input_prompts_dir: PathBuf,

    /// Directory where generated `*.md` outputs are written
    pub model_output_dir: PathBuf,
}

/// Per-grader weights for the aggregate score. Not required to sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradingWeights {
    pub sentiment: f64,
    pub markdown: f64,
    pub keyword: f64,
    pub judgment: f64,
}

impl GradingWeights {
    pub fn weight_for(&self, kind: GraderKind) -> f64 {
        match kind {
            GraderKind::Sentiment => self.sentiment,
            GraderKind::Markdown => self.markdown,
            GraderKind::Keyword => self.keyword,
            GraderKind::Judgment => self.judgment,
        }
    }

    pub fn sum(&self) -> f64 {
        self.sentiment + self.markdown + self.keyword + self.judgment
    }
}

impl Default for GradingWeights {
    fn default() -> Self {
        Self {
            sentiment: 0.25,
            markdown: 0.25,
            keyword: 0.25,
            judgment: 0.25,
        }
    }
}

/// A required term and how often it must appear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedKeyword {
    #[serde(rename = "keyword")]
    pub term: String,

    #[serde(default = "default_minimum_occurrences")]
    pub minimum_occurrences: u32,
}

fn default_minimum_occurrences() -> u32 {
    1
}

impl ExpectedKeyword {
    pub fn new(term: impl Into<String>, minimum_occurrences: u32) -> Self {
        Self {
            term: term.into(),
            minimum_occurrences,
        }
    }
}

/// Keyword grader settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordSettings {
    #[serde(default)]
    pub expected_keywords: Vec<ExpectedKeyword>,
}

/// Markdown grader weights. Not required to sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkdownWeights {
    pub validity_weight: f64,
    pub variety_weight: f64,
}

impl Default for MarkdownWeights {
    fn default() -> Self {
        Self {
            validity_weight: 0.5,
            variety_weight: 0.5,
        }
    }
}

/// Sentiment grader settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentSettings {
    /// File containing the emotion-scoring system prompt
    pub system_prompt_path: PathBuf,

    #[serde(default)]
    pub model: String,

    /// Target emotion profile
    pub target: EmotionVector,
}

/// Judgment (LLM-as-judge) grader settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgmentSettings {
    /// File containing the judge template with its four placeholders
    pub template_path: PathBuf,

    #[serde(default)]
    pub model: String,

    /// Directory of `*.md` reference outputs
    pub examples_dir: PathBuf,
}

/// The `grading` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingConfig {
    #[serde(default)]
    pub weights: GradingWeights,

    #[serde(default)]
    pub keyword: KeywordSettings,

    #[serde(default)]
    pub markdown: MarkdownWeights,

    pub sentiment: SentimentSettings,

    pub judgment: JudgmentSettings,
}

/// Complete rubric configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RubricConfig {
    pub service: ServiceSettings,
    pub output: OutputSettings,
    pub grading: GradingConfig,
}

impl RubricConfig {
    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        let json = serde_json::to_value(value)?;
        Self::from_value(json)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Load configuration from a file; `.json` files are parsed as JSON,
    /// everything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json(&contents)
        } else {
            Self::from_yaml(&contents)
        }
    }

    fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        validate_config_schema(&value).map_err(ConfigError::Schema)?;
        let config: RubricConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the schema cannot express.
    fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.service.base_url.trim();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "service.base_url must start with http:// or https://".to_string(),
            ));
        }

        if !self.grading.sentiment.target.is_finite() {
            return Err(ConfigError::Validation(
                "grading.sentiment.target must contain finite values".to_string(),
            ));
        }

        self.validate_keywords()?;

        Ok(())
    }

    /// Terms must be non-blank and unique ignoring case.
    fn validate_keywords(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();

        for keyword in &self.grading.keyword.expected_keywords {
            if keyword.term.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "grading.keyword.expected_keywords contains a blank keyword".to_string(),
                ));
            }
            if !seen.insert(keyword.term.to_lowercase()) {
                return Err(ConfigError::Validation(format!(
                    "Duplicate keyword: {}",
                    keyword.term
                )));
            }
        }

        Ok(())
    }
}
