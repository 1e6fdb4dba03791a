//! Default prompts for the model-backed graders.
//!
//! Deployments normally keep their own prompt files; `rubric init` writes
//! these as a starting point.

/// System prompt for the Sentiment grader. The reply must be one JSON
/// object with all eight emotion dimensions.
pub const SENTIMENT_SYSTEM_PROMPT: &str = r#"You are an emotion analyst.

Read the text provided by the user and rate how strongly it expresses each
of Plutchik's eight basic emotions. Rate the text itself, not its topic.

Use a scale from 0.0 (absent) to 1.0 (dominant) for every emotion.

Respond with a single JSON object and nothing else:
{
  "anger": 0.0,
  "fear": 0.0,
  "anticipation": 0.0,
  "trust": 0.0,
  "surprise": 0.0,
  "sadness": 0.0,
  "joy": 0.0,
  "disgust": 0.0
}
"#;

/// Judge template for the Judgment grader. Placeholders are substituted
/// before the call.
pub const JUDGMENT_TEMPLATE: &str = r#"You are an impartial reviewer grading a model's answer.

## System prompt the model was given
{system_prompt}

## User prompt the model answered
{user_prompt}

## High-quality reference answers
{example_high_quality_outputs}

## Answer under evaluation
{output_under_evaluation}

## Rubric
Score the answer under evaluation on each axis from 0.0 to 1.0:
- Accuracy: factual and technical correctness
- Language: grammar, spelling and tone appropriate to the prompt
- Conciseness: no padding, repetition or digressions
- Clarity: structure and readability, compared with the reference answers

Respond with a single JSON object and nothing else:
{"Accuracy": 0.0, "Language": 0.0, "Conciseness": 0.0, "Clarity": 0.0}
"#;

/// Placeholders every judge template must contain.
pub const JUDGMENT_PLACEHOLDERS: [&str; 4] = [
    "{system_prompt}",
    "{user_prompt}",
    "{example_high_quality_outputs}",
    "{output_under_evaluation}",
];

/// Placeholders missing from `template`.
pub fn missing_placeholders(template: &str) -> Vec<&'static str> {
    JUDGMENT_PLACEHOLDERS
        .iter()
        .copied()
        .filter(|placeholder| !template.contains(placeholder))
        .collect()
}
