//! Shared Markdown detection patterns.
//!
//! All patterns assume LF line endings; the Markdown grader normalises
//! CRLF before matching.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // =========================================================================
    // FEATURE PATTERNS
    // =========================================================================

    /// ATX heading line with content
    pub static ref HEADING_LINE: Regex = Regex::new(r"(?m)^#{1,6}\s+.+$").unwrap();

    /// Heading marker, capturing the `#` run
    pub static ref HEADING_MARKER: Regex = Regex::new(r"(?m)^(#{1,6})\s").unwrap();

    /// Fenced code block (fence pair, lazily matched)
    pub static ref CODE_BLOCK: Regex = Regex::new(r"(?s)```.*?```").unwrap();

    /// Inline link `[label](target)`
    pub static ref INLINE_LINK: Regex = Regex::new(r"\[([^\]]+)\]\(([^\)]+)\)").unwrap();

    /// Unordered (`*`, `-`, `+`) or ordered (`1.`) list item
    pub static ref LIST_ITEM: Regex =
        Regex::new(r"(?m)^(?:[*\-+]\s+.+|\d+\.\s+.+)$").unwrap();

    /// Image `![alt](target)`
    pub static ref IMAGE: Regex = Regex::new(r"!\[([^\]]*)\]\(([^\)]+)\)").unwrap();

    /// Pipe-delimited table row
    pub static ref TABLE_ROW: Regex = Regex::new(r"(?m)^\|.+\|$").unwrap();

    /// Blockquote line
    pub static ref BLOCKQUOTE: Regex = Regex::new(r"(?m)^>\s*.+$").unwrap();

    /// Horizontal rule made of one repeated marker
    pub static ref HORIZONTAL_RULE: Regex =
        Regex::new(r"(?m)^(?:-{3,}|\*{3,}|_{3,})[ \t]*$").unwrap();

    // =========================================================================
    // VALIDATION PATTERNS
    // =========================================================================

    /// Bold markers, used for stripping before italic counting
    pub static ref BOLD_MARKER: Regex = Regex::new(r"\*\*|__").unwrap();

    /// Reference-style link usage `[label][ref]`
    pub static ref REFERENCE_LINK: Regex = Regex::new(r"\[([^\]]+)\]\[([^\]]+)\]").unwrap();

    /// Reference definition line `[ref]: target`
    pub static ref REFERENCE_DEFINITION: Regex =
        Regex::new(r"(?m)^\[([^\]]+)\]:\s*.+$").unwrap();

    /// Opening or closing HTML tag, capturing the slash and the name
    pub static ref HTML_TAG: Regex = Regex::new(r"(?i)<(/?)(\w+)(?:\s[^>]*)?>").unwrap();
}

/// Tags that never need a closing counterpart.
pub const VOID_HTML_TAGS: [&str; 6] = ["br", "hr", "img", "input", "meta", "link"];

/// Count non-overlapping occurrences of a literal marker.
pub fn count_marker(content: &str, marker: &str) -> usize {
    content.matches(marker).count()
}

/// Count occurrences of `marker` whose neighbours are not also `marker`.
pub fn count_lone(content: &str, marker: char) -> usize {
    let chars: Vec<char> = content.chars().collect();
    chars
        .iter()
        .enumerate()
        .filter(|(i, c)| {
            **c == marker
                && (*i == 0 || chars[i - 1] != marker)
                && chars.get(i + 1).map_or(true, |next| *next != marker)
        })
        .count()
}

/// Text with all bold markers removed.
pub fn strip_bold(content: &str) -> String {
    BOLD_MARKER.replace_all(content, "").into_owned()
}

/// Whether the text uses any bold or italic emphasis.
pub fn has_emphasis(content: &str) -> bool {
    if count_marker(content, "**") > 0 || count_marker(content, "__") > 0 {
        return true;
    }
    let stripped = strip_bold(content);
    count_lone(&stripped, '*') > 0 || count_lone(&stripped, '_') > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_lone() {
        assert_eq!(count_lone("*a* **b**", '*'), 2);
        assert_eq!(count_lone("snake_case_name", '_'), 2);
        assert_eq!(count_lone("***", '*'), 0);
        assert_eq!(count_lone("", '*'), 0);
    }

    #[test]
    fn test_strip_bold() {
        assert_eq!(strip_bold("**bold** and __strong__"), "bold and strong");
    }

    #[test]
    fn test_list_item_detection() {
        let text = "- one\n* two\n+ three\n1. four\nnot a list";
        assert_eq!(LIST_ITEM.find_iter(text).count(), 4);
    }

    #[test]
    fn test_horizontal_rule_detection() {
        let text = "---\n***\n___\n-*-\n--";
        assert_eq!(HORIZONTAL_RULE.find_iter(text).count(), 3);
    }

    #[test]
    fn test_html_tag_captures() {
        let caps = HTML_TAG.captures("</DIV>").unwrap();
        assert_eq!(&caps[1], "/");
        assert_eq!(&caps[2], "DIV");

        let caps = HTML_TAG.captures("<span class=\"x\">").unwrap();
        assert_eq!(&caps[1], "");
        assert_eq!(&caps[2], "span");
    }

    #[test]
    fn test_has_emphasis() {
        assert!(has_emphasis("some **bold** text"));
        assert!(has_emphasis("some *italic* text"));
        assert!(!has_emphasis("plain text"));
    }
}
