//! Deterministic graders.
//!
//! These graders never call out and never fail: every input, including
//! blank text, maps to a defined report and score.

mod keyword;
mod markdown;
pub mod patterns;

pub use keyword::KeywordGrader;
pub use markdown::MarkdownGrader;
