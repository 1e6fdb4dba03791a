//! Core types for rubric grading.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::GradingWeights;

/// The four independent grading axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraderKind {
    Sentiment,
    Markdown,
    Keyword,
    Judgment,
}

impl GraderKind {
    /// All kinds, in reporting order.
    pub const ALL: [GraderKind; 4] = [
        GraderKind::Sentiment,
        GraderKind::Markdown,
        GraderKind::Keyword,
        GraderKind::Judgment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GraderKind::Sentiment => "sentiment",
            GraderKind::Markdown => "markdown",
            GraderKind::Keyword => "keyword",
            GraderKind::Judgment => "judgment",
        }
    }
}

impl fmt::Display for GraderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate artifact together with the context it was generated from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submission {
    /// Artifact name used in logs and reports (usually the file stem)
    pub name: String,

    /// The generated text under evaluation
    pub candidate: String,

    /// The user prompt that produced the candidate
    #[serde(default)]
    pub prompt: String,

    /// The system prompt that produced the candidate
    #[serde(default)]
    pub system_prompt: String,

    /// High-quality reference outputs for the judge
    #[serde(default)]
    pub reference_examples: Vec<String>,
}

impl Submission {
    pub fn new(name: impl Into<String>, candidate: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            candidate: candidate.into(),
            ..Default::default()
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn with_reference_examples(mut self, examples: Vec<String>) -> Self {
        self.reference_examples = examples;
        self
    }

    /// Whether the candidate is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.candidate.trim().is_empty()
    }
}

/// Per-term outcome of keyword grading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordTally {
    pub expected_count: u32,
    pub actual_count: u32,
    pub met: bool,
}

impl KeywordTally {
    pub fn new(expected_count: u32, actual_count: u32) -> Self {
        Self {
            expected_count,
            actual_count,
            met: actual_count >= expected_count,
        }
    }
}

/// Keyword grading breakdown, keyed by configured term.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordResult {
    pub results: BTreeMap<String, KeywordTally>,
    pub total_met: usize,
    pub total_keywords: usize,
}

/// Which Markdown feature categories a text uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownFeatures {
    pub headings: bool,
    pub code_blocks: bool,
    pub links: bool,
    pub lists: bool,
    pub images: bool,
    pub tables: bool,
    pub blockquotes: bool,
    pub horizontal_rules: bool,
    /// Bold or italic emphasis
    pub emphasis: bool,
}

impl MarkdownFeatures {
    /// Size of the feature catalog.
    pub const TOTAL: usize = 9;

    /// Number of categories present.
    pub fn present_count(&self) -> usize {
        [
            self.headings,
            self.code_blocks,
            self.links,
            self.lists,
            self.images,
            self.tables,
            self.blockquotes,
            self.horizontal_rules,
            self.emphasis,
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }

    /// Fraction of the catalog in use, in [0, 1].
    pub fn variety_score(&self) -> f64 {
        self.present_count() as f64 / Self::TOTAL as f64
    }
}

/// Structural validation report for Markdown text.
///
/// Validity is read through [`MarkdownReport::is_valid`] and only changes
/// via [`MarkdownReport::push_error`], so it always equals
/// `validation_errors().is_empty()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkdownReport {
    pub(crate) is_valid: bool,
    pub(crate) validation_errors: Vec<String>,
    pub heading_count: usize,
    pub code_block_count: usize,
    pub link_count: usize,
    pub list_count: usize,
    pub image_count: usize,
    pub table_row_count: usize,
    pub blockquote_count: usize,
    pub horizontal_rule_count: usize,
    pub features: MarkdownFeatures,
    pub variety_score: f64,
}

impl MarkdownReport {
    /// An empty, valid report.
    pub fn new() -> Self {
        Self {
            is_valid: true,
            validation_errors: Vec::new(),
            heading_count: 0,
            code_block_count: 0,
            link_count: 0,
            list_count: 0,
            image_count: 0,
            table_row_count: 0,
            blockquote_count: 0,
            horizontal_rule_count: 0,
            features: MarkdownFeatures::default(),
            variety_score: 0.0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Errors in the order the rules ran.
    pub fn validation_errors(&self) -> &[String] {
        &self.validation_errors
    }

    /// Record a validation error.
    pub fn push_error(&mut self, error: impl Into<String>) {
        self.is_valid = false;
        self.validation_errors.push(error.into());
    }
}

impl Default for MarkdownReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Eight-dimension emotion profile, each value in [0, 1].
///
/// Accepts capitalised field names on input since judge-style prompts
/// commonly ask for `"Anger"` rather than `"anger"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionVector {
    #[serde(alias = "Anger")]
    pub anger: f64,
    #[serde(alias = "Fear")]
    pub fear: f64,
    #[serde(alias = "Anticipation")]
    pub anticipation: f64,
    #[serde(alias = "Trust")]
    pub trust: f64,
    #[serde(alias = "Surprise")]
    pub surprise: f64,
    #[serde(alias = "Sadness")]
    pub sadness: f64,
    #[serde(alias = "Joy")]
    pub joy: f64,
    #[serde(alias = "Disgust")]
    pub disgust: f64,
}

impl EmotionVector {
    /// Named dimensions in canonical order.
    pub fn dimensions(&self) -> [(&'static str, f64); 8] {
        [
            ("anger", self.anger),
            ("fear", self.fear),
            ("anticipation", self.anticipation),
            ("trust", self.trust),
            ("surprise", self.surprise),
            ("sadness", self.sadness),
            ("joy", self.joy),
            ("disgust", self.disgust),
        ]
    }

    /// Copy with every dimension clamped into [0, 1].
    pub fn clamped(&self) -> Self {
        let c = |v: f64| v.clamp(0.0, 1.0);
        Self {
            anger: c(self.anger),
            fear: c(self.fear),
            anticipation: c(self.anticipation),
            trust: c(self.trust),
            surprise: c(self.surprise),
            sadness: c(self.sadness),
            joy: c(self.joy),
            disgust: c(self.disgust),
        }
    }

    /// Whether every dimension is a finite number.
    pub fn is_finite(&self) -> bool {
        self.dimensions().iter().all(|(_, v)| v.is_finite())
    }

    /// Unweighted mean of `1 - |target - observed|` over all dimensions.
    pub fn similarity(&self, observed: &EmotionVector) -> f64 {
        let target = self.dimensions();
        let observed = observed.dimensions();
        let total: f64 = target
            .iter()
            .zip(observed.iter())
            .map(|((_, t), (_, o))| 1.0 - (t - o).abs())
            .sum();
        total / target.len() as f64
    }
}

/// Four-axis judge rubric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgmentScore {
    pub accuracy: f64,
    pub language: f64,
    pub conciseness: f64,
    pub clarity: f64,

    /// Raw judge output
    pub feedback: Vec<String>,

    /// False when the judge output could not be parsed
    pub is_valid: bool,
}

impl JudgmentScore {
    pub fn new(accuracy: f64, language: f64, conciseness: f64, clarity: f64) -> Self {
        Self {
            accuracy,
            language,
            conciseness,
            clarity,
            feedback: Vec::new(),
            is_valid: true,
        }
    }

    /// A zeroed, invalid score carrying the unparseable feedback.
    pub fn invalid(feedback: impl Into<String>) -> Self {
        Self {
            accuracy: 0.0,
            language: 0.0,
            conciseness: 0.0,
            clarity: 0.0,
            feedback: vec![feedback.into()],
            is_valid: false,
        }
    }

    /// Unweighted mean of the four axes (0 when invalid).
    pub fn mean(&self) -> f64 {
        if !self.is_valid {
            return 0.0;
        }
        (self.accuracy + self.language + self.conciseness + self.clarity) / 4.0
    }
}

/// Typed sub-result of one grader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GraderDetail {
    Sentiment(EmotionVector),
    Markdown(MarkdownReport),
    Keyword(KeywordResult),
    Judgment(JudgmentScore),
}

impl GraderDetail {
    pub fn kind(&self) -> GraderKind {
        match self {
            GraderDetail::Sentiment(_) => GraderKind::Sentiment,
            GraderDetail::Markdown(_) => GraderKind::Markdown,
            GraderDetail::Keyword(_) => GraderKind::Keyword,
            GraderDetail::Judgment(_) => GraderKind::Judgment,
        }
    }
}

/// A grader's structured result plus its normalised score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraderOutcome {
    pub score: f64,
    pub detail: GraderDetail,
}

impl GraderOutcome {
    pub fn new(score: f64, detail: GraderDetail) -> Self {
        Self { score, detail }
    }

    pub fn kind(&self) -> GraderKind {
        self.detail.kind()
    }
}

/// One outcome per grader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraderScores {
    pub sentiment: GraderOutcome,
    pub markdown: GraderOutcome,
    pub keyword: GraderOutcome,
    pub judgment: GraderOutcome,
}

impl GraderScores {
    /// Outcomes in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = (GraderKind, &GraderOutcome)> {
        [
            (GraderKind::Sentiment, &self.sentiment),
            (GraderKind::Markdown, &self.markdown),
            (GraderKind::Keyword, &self.keyword),
            (GraderKind::Judgment, &self.judgment),
        ]
        .into_iter()
    }
}

/// Final result of one grading pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingResult {
    /// Artifact that was graded
    pub artifact: String,

    /// Sub-results; `None` when grading was skipped for blank input
    pub scores: Option<GraderScores>,

    /// Weighted sum of the four sub-scores
    pub aggregate: f64,

    /// Weights used for the aggregate
    pub weights: GradingWeights,

    /// When the pass completed
    pub graded_at: DateTime<Utc>,
}

impl GradingResult {
    /// Whether the pass was skipped without invoking any grader.
    pub fn is_skipped(&self) -> bool {
        self.scores.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_tally_met_invariant() {
        assert!(KeywordTally::new(2, 2).met);
        assert!(KeywordTally::new(2, 5).met);
        assert!(!KeywordTally::new(3, 2).met);
        assert!(KeywordTally::new(0, 0).met);
    }

    #[test]
    fn test_markdown_report_validity_tracks_errors() {
        let mut report = MarkdownReport::new();
        assert!(report.is_valid());
        assert!(report.validation_errors().is_empty());
        report.push_error("Unclosed code block detected");
        assert!(!report.is_valid());
        assert_eq!(
            report.validation_errors(),
            ["Unclosed code block detected".to_string()]
        );
    }

    #[test]
    fn test_feature_variety() {
        let features = MarkdownFeatures {
            headings: true,
            emphasis: true,
            lists: true,
            ..Default::default()
        };
        assert_eq!(features.present_count(), 3);
        assert!((features.variety_score() - 3.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_emotion_similarity_identity() {
        let v = EmotionVector {
            anger: 0.1,
            trust: 0.8,
            joy: 0.6,
            ..Default::default()
        };
        assert_eq!(v.similarity(&v), 1.0);
    }

    #[test]
    fn test_emotion_capitalised_fields() {
        let json = r#"{"Anger":0.1,"Fear":0.0,"Anticipation":0.5,"Trust":0.9,
                       "Surprise":0.2,"Sadness":0.0,"Joy":0.7,"Disgust":0.0}"#;
        let v: EmotionVector = serde_json::from_str(json).unwrap();
        assert_eq!(v.trust, 0.9);
        assert_eq!(v.joy, 0.7);
    }

    #[test]
    fn test_emotion_clamped() {
        let v = EmotionVector {
            anger: 1.5,
            fear: -0.2,
            ..Default::default()
        }
        .clamped();
        assert_eq!(v.anger, 1.0);
        assert_eq!(v.fear, 0.0);
    }

    #[test]
    fn test_judgment_mean() {
        let score = JudgmentScore::new(1.0, 0.5, 0.5, 0.0);
        assert_eq!(score.mean(), 0.5);
        assert_eq!(JudgmentScore::invalid("not json").mean(), 0.0);
    }

    #[test]
    fn test_outcome_kind_follows_detail() {
        let outcome = GraderOutcome::new(1.0, GraderDetail::Keyword(KeywordResult::default()));
        assert_eq!(outcome.kind(), GraderKind::Keyword);
    }

    #[test]
    fn test_submission_blank() {
        assert!(Submission::new("a", "   \n\t").is_blank());
        assert!(!Submission::new("a", "text").is_blank());
    }
}
