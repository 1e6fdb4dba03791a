//! Markdown Structural Grader
//!
//! **Question**: Is the formatting intact, and how much of Markdown does it use?
//!
//! Every structural rule always runs; errors accumulate rather than
//! short-circuit. The score combines validity (all-or-nothing) with feature
//! variety using configured weights.
//!
//! | Rule | Error |
//! |------|-------|
//! | Code fences paired | `Unclosed code block detected` |
//! | Inline links complete | `Invalid link format: ...` |
//! | Bold markers paired | `Unmatched bold marker (**)` / `(__)` |
//! | Italic markers paired | `Unmatched italic marker (*)` / `(_)` |
//! | Images have targets | `Invalid image format (missing URL): ...` |
//! | Table rows consistent | `Inconsistent table column count in row: ...` |
//! | Reference links defined | `Undefined reference link: [...]` |
//! | HTML tags balanced | `Mismatched HTML closing tag: </...>` / `Unclosed HTML tags: ...` |
//! | Headings don't skip levels | `Skipped heading level from H.. to H..` |

use std::collections::HashSet;

use crate::config::MarkdownWeights;
use crate::types::{GraderKind, MarkdownFeatures, MarkdownReport};

use super::patterns::{
    count_lone, count_marker, has_emphasis, strip_bold, BLOCKQUOTE, CODE_BLOCK, HEADING_LINE,
    HEADING_MARKER, HORIZONTAL_RULE, HTML_TAG, IMAGE, INLINE_LINK, LIST_ITEM,
    REFERENCE_DEFINITION, REFERENCE_LINK, TABLE_ROW, VOID_HTML_TAGS,
};

/// The Markdown structural grader.
#[derive(Debug, Clone, Default)]
pub struct MarkdownGrader {
    weights: MarkdownWeights,
}

impl MarkdownGrader {
    pub fn new(weights: MarkdownWeights) -> Self {
        Self { weights }
    }

    pub fn kind(&self) -> GraderKind {
        GraderKind::Markdown
    }

    pub fn weights(&self) -> &MarkdownWeights {
        &self.weights
    }

    /// Validate `text` and score it.
    ///
    /// Pure and deterministic: the same text always yields the same report.
    pub fn grade(&self, text: &str) -> (MarkdownReport, f64) {
        let mut report = MarkdownReport::new();

        if text.trim().is_empty() {
            report.push_error("Content is empty or whitespace");
            return (report, 0.0);
        }

        let content = text.replace("\r\n", "\n");

        self.count_features(&content, &mut report);

        check_code_fences(&content, &mut report);
        check_links(&content, &mut report);
        check_bold_markers(&content, &mut report);
        check_italic_markers(&content, &mut report);
        check_images(&content, &mut report);
        check_tables(&content, &mut report);
        check_reference_links(&content, &mut report);
        check_html_tags(&content, &mut report);
        check_heading_hierarchy(&content, &mut report);

        report.variety_score = report.features.variety_score();
        let validity_score = if report.is_valid { 1.0 } else { 0.0 };
        let score = validity_score * self.weights.validity_weight
            + report.variety_score * self.weights.variety_weight;

        tracing::debug!(
            valid = report.is_valid,
            features_used = report.features.present_count(),
            features_total = MarkdownFeatures::TOTAL,
            headings = report.heading_count,
            code_blocks = report.code_block_count,
            links = report.link_count,
            lists = report.list_count,
            images = report.image_count,
            tables = report.table_row_count,
            blockquotes = report.blockquote_count,
            horizontal_rules = report.horizontal_rule_count,
            errors = ?report.validation_errors,
            validity_score,
            variety_score = report.variety_score,
            score,
            "Markdown grading complete"
        );

        (report, score)
    }

    fn count_features(&self, content: &str, report: &mut MarkdownReport) {
        report.heading_count = HEADING_LINE.find_iter(content).count();
        report.code_block_count = CODE_BLOCK.find_iter(content).count();
        report.link_count = INLINE_LINK.find_iter(content).count();
        report.list_count = LIST_ITEM.find_iter(content).count();
        report.image_count = IMAGE.find_iter(content).count();
        report.table_row_count = TABLE_ROW.find_iter(content).count();
        report.blockquote_count = BLOCKQUOTE.find_iter(content).count();
        report.horizontal_rule_count = HORIZONTAL_RULE.find_iter(content).count();

        report.features = MarkdownFeatures {
            headings: report.heading_count > 0,
            code_blocks: report.code_block_count > 0,
            links: report.link_count > 0,
            lists: report.list_count > 0,
            images: report.image_count > 0,
            tables: report.table_row_count > 0,
            blockquotes: report.blockquote_count > 0,
            horizontal_rules: report.horizontal_rule_count > 0,
            emphasis: has_emphasis(content),
        };
    }
}

fn check_code_fences(content: &str, report: &mut MarkdownReport) {
    if count_marker(content, "```") % 2 != 0 {
        report.push_error("Unclosed code block detected");
    }
}

fn check_links(content: &str, report: &mut MarkdownReport) {
    for caps in INLINE_LINK.captures_iter(content) {
        if caps[1].trim().is_empty() || caps[2].trim().is_empty() {
            report.push_error(format!("Invalid link format: {}", &caps[0]));
        }
    }
}

fn check_bold_markers(content: &str, report: &mut MarkdownReport) {
    if count_marker(content, "**") % 2 != 0 {
        report.push_error("Unmatched bold marker (**)");
    }
    if count_marker(content, "__") % 2 != 0 {
        report.push_error("Unmatched bold marker (__)");
    }
}

/// Italics are counted on bold-stripped text so `**` never counts twice.
fn check_italic_markers(content: &str, report: &mut MarkdownReport) {
    let stripped = strip_bold(content);
    if count_lone(&stripped, '*') % 2 != 0 {
        report.push_error("Unmatched italic marker (*)");
    }
    if count_lone(&stripped, '_') % 2 != 0 {
        report.push_error("Unmatched italic marker (_)");
    }
}

fn check_images(content: &str, report: &mut MarkdownReport) {
    for caps in IMAGE.captures_iter(content) {
        if caps[2].trim().is_empty() {
            report.push_error(format!("Invalid image format (missing URL): {}", &caps[0]));
        }
    }
}

/// The first row fixes the column count; only the first mismatch is reported.
fn check_tables(content: &str, report: &mut MarkdownReport) {
    let mut expected_columns: Option<usize> = None;

    for row in TABLE_ROW.find_iter(content) {
        let columns = row.as_str().split('|').count().saturating_sub(2);
        match expected_columns {
            None => expected_columns = Some(columns),
            Some(expected) if expected != columns => {
                report.push_error(format!(
                    "Inconsistent table column count in row: {}",
                    row.as_str()
                ));
                break;
            }
            Some(_) => {}
        }
    }
}

fn check_reference_links(content: &str, report: &mut MarkdownReport) {
    let defined: HashSet<String> = REFERENCE_DEFINITION
        .captures_iter(content)
        .map(|caps| caps[1].to_lowercase())
        .collect();

    for caps in REFERENCE_LINK.captures_iter(content) {
        let reference = caps[2].to_lowercase();
        if !defined.contains(&reference) {
            report.push_error(format!("Undefined reference link: [{}]", reference));
        }
    }
}

fn check_html_tags(content: &str, report: &mut MarkdownReport) {
    let mut stack: Vec<String> = Vec::new();

    for caps in HTML_TAG.captures_iter(content) {
        let name = caps[2].to_lowercase();
        if VOID_HTML_TAGS.contains(&name.as_str()) {
            continue;
        }

        if &caps[1] == "/" {
            if stack.last() == Some(&name) {
                stack.pop();
            } else {
                report.push_error(format!("Mismatched HTML closing tag: </{}>", name));
            }
        } else {
            stack.push(name);
        }
    }

    if !stack.is_empty() {
        // Innermost tag first
        let unclosed: Vec<&str> = stack.iter().rev().map(String::as_str).collect();
        report.push_error(format!("Unclosed HTML tags: {}", unclosed.join(", ")));
    }
}

/// Increasing by more than one level is an error; decreasing is always fine.
fn check_heading_hierarchy(content: &str, report: &mut MarkdownReport) {
    let mut previous: Option<usize> = None;

    for caps in HEADING_MARKER.captures_iter(content) {
        let level = caps[1].len();
        if let Some(prev) = previous {
            if level > prev + 1 {
                report.push_error(format!(
                    "Skipped heading level from H{} to H{}",
                    prev, level
                ));
                break;
            }
        }
        previous = Some(level);
    }
}
