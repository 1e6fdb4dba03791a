//! Keyword Grader
//!
//! **Question**: Does the output mention what it was expected to mention?
//!
//! Counts case-insensitive, whole-word occurrences of each configured term
//! and scores the fraction of terms that reach their minimum.

use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

use crate::config::{ConfigError, ExpectedKeyword};
use crate::types::{GraderKind, KeywordResult, KeywordTally};

/// A configured term with its compiled matcher.
#[derive(Debug, Clone)]
struct CompiledKeyword {
    expected: ExpectedKeyword,
    pattern: Regex,
}

/// The keyword grader.
#[derive(Debug, Clone, Default)]
pub struct KeywordGrader {
    keywords: Vec<CompiledKeyword>,
}

impl KeywordGrader {
    /// Compile matchers for every expected keyword. Terms must be unique
    /// ignoring case.
    pub fn new(keywords: &[ExpectedKeyword]) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        if let Some(duplicate) = keywords
            .iter()
            .find(|keyword| !seen.insert(keyword.term.to_lowercase()))
        {
            return Err(ConfigError::Validation(format!(
                "Duplicate keyword: {}",
                duplicate.term
            )));
        }

        let keywords = keywords
            .iter()
            .map(|expected| {
                let pattern = RegexBuilder::new(&format!(r"\b{}\b", regex::escape(&expected.term)))
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| ConfigError::InvalidKeyword {
                        term: expected.term.clone(),
                        reason: e.to_string(),
                    })?;
                Ok(CompiledKeyword {
                    expected: expected.clone(),
                    pattern,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self { keywords })
    }

    pub fn kind(&self) -> GraderKind {
        GraderKind::Keyword
    }

    /// Number of configured keywords.
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Count keyword occurrences in `text` and score them.
    ///
    /// With no keywords configured every text scores 1.0. Blank text scores
    /// 0.0 otherwise.
    pub fn grade(&self, text: &str) -> (KeywordResult, f64) {
        let mut result = KeywordResult::default();

        if self.keywords.is_empty() {
            return (result, 1.0);
        }

        if text.trim().is_empty() {
            return (result, 0.0);
        }

        result.total_keywords = self.keywords.len();

        for keyword in &self.keywords {
            let actual = keyword.pattern.find_iter(text).count() as u32;
            let tally = KeywordTally::new(keyword.expected.minimum_occurrences, actual);
            if tally.met {
                result.total_met += 1;
            }
            result.results.insert(keyword.expected.term.clone(), tally);
        }

        let score = result.total_met as f64 / result.total_keywords as f64;

        for (term, tally) in &result.results {
            tracing::debug!(
                term = %term,
                actual = tally.actual_count,
                minimum = tally.expected_count,
                met = tally.met,
                "Keyword tally"
            );
        }
        tracing::debug!(
            met = result.total_met,
            total = result.total_keywords,
            score,
            "Keyword grading complete"
        );

        (result, score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(items: &[(&str, u32)]) -> Vec<ExpectedKeyword> {
        items
            .iter()
            .map(|(term, min)| ExpectedKeyword::new(*term, *min))
            .collect()
    }

    #[test]
    fn test_no_keywords_scores_one() {
        let grader = KeywordGrader::new(&[]).unwrap();
        let (result, score) = grader.grade("anything at all");
        assert_eq!(score, 1.0);
        assert!(result.results.is_empty());

        let (_, score) = grader.grade("");
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_empty_text_scores_zero() {
        let grader = KeywordGrader::new(&keywords(&[("rust", 1)])).unwrap();
        let (result, score) = grader.grade("  \n");
        assert_eq!(score, 0.0);
        assert_eq!(result.total_keywords, 0);
    }

    #[test]
    fn test_case_insensitive_whole_word() {
        let grader = KeywordGrader::new(&keywords(&[("rust", 2)])).unwrap();
        let (result, score) = grader.grade("Rust is great. RUST! But rusty and trust don't count.");
        let tally = result.results["rust"];
        assert_eq!(tally.actual_count, 2);
        assert!(tally.met);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_partial_score() {
        let grader = KeywordGrader::new(&keywords(&[
            ("ownership", 1),
            ("borrowing", 2),
            ("lifetimes", 1),
            ("traits", 1),
        ]))
        .unwrap();
        let text = "Ownership and borrowing rules, plus traits.";
        let (result, score) = grader.grade(text);
        assert_eq!(result.total_keywords, 4);
        assert_eq!(result.total_met, 2);
        assert!(!result.results["borrowing"].met);
        assert!(!result.results["lifetimes"].met);
        assert_eq!(score, 0.5);
    }

    #[test]
    fn test_special_characters_escaped() {
        let grader = KeywordGrader::new(&keywords(&[("c.o.d", 1)])).unwrap();
        let (result, _) = grader.grade("cxoxd is not c.o.d");
        assert_eq!(result.results["c.o.d"].actual_count, 1);
    }

    #[test]
    fn test_multi_word_term() {
        let grader = KeywordGrader::new(&keywords(&[("error handling", 1)])).unwrap();
        let (_, score) = grader.grade("Good Error Handling matters.");
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_duplicate_terms_rejected() {
        let result = KeywordGrader::new(&keywords(&[("rust", 1), ("Rust", 5)]));
        match result {
            Err(ConfigError::Validation(message)) => assert_eq!(message, "Duplicate keyword: Rust"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_minimum_always_met() {
        let grader = KeywordGrader::new(&keywords(&[("absent", 0)])).unwrap();
        let (result, score) = grader.grade("nothing relevant");
        assert!(result.results["absent"].met);
        assert_eq!(score, 1.0);
    }
}
