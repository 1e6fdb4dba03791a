//! JSON Schema validation for rubric configuration.
//!
//! Both YAML and JSON configs are converted to a JSON value and checked
//! against `schema/rubric.schema.json` before deserialization.

use std::sync::OnceLock;

const RUBRIC_SCHEMA_JSON: &str = include_str!("../../schema/rubric.schema.json");

static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

fn validator() -> Result<&'static jsonschema::Validator, String> {
    COMPILED_SCHEMA
        .get_or_init(|| {
            let schema: serde_json::Value = serde_json::from_str(RUBRIC_SCHEMA_JSON)
                .map_err(|e| format!("Invalid schema JSON: {}", e))?;
            jsonschema::options()
                .build(&schema)
                .map_err(|e| format!("Failed to compile schema: {}", e))
        })
        .as_ref()
        .map_err(Clone::clone)
}

/// Validate a config value, returning every violation found.
pub fn validate_config_schema(config_json: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = validator().map_err(|e| vec![e])?;

    let errors: Vec<String> = validator
        .iter_errors(config_json)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick validity check without error details.
pub fn is_valid_config(config_json: &serde_json::Value) -> bool {
    validator()
        .map(|v| v.is_valid(config_json))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> serde_json::Value {
        json!({
            "service": { "base_url": "http://localhost:8080" },
            "output": {
                "system_prompt_path": "system.txt",
                "input_prompts_dir": "prompts",
                "model_output_dir": "outputs"
            },
            "grading": {
                "sentiment": {
                    "system_prompt_path": "sentiment.txt",
                    "target": {
                        "anger": 0.0, "fear": 0.0, "anticipation": 0.5, "trust": 0.8,
                        "surprise": 0.1, "sadness": 0.0, "joy": 0.5, "disgust": 0.0
                    }
                },
                "judgment": {
                    "template_path": "judge.txt",
                    "examples_dir": "examples"
                }
            }
        })
    }

    #[test]
    fn test_minimal_config_passes() {
        assert!(validate_config_schema(&minimal()).is_ok());
        assert!(is_valid_config(&minimal()));
    }

    #[test]
    fn test_negative_weight_fails() {
        let mut value = minimal();
        value["grading"]["weights"] = json!({
            "sentiment": -0.1, "markdown": 0.3, "keyword": 0.3, "judgment": 0.5
        });
        assert!(validate_config_schema(&value).is_err());
    }

    #[test]
    fn test_missing_target_dimension_fails() {
        let mut value = minimal();
        value["grading"]["sentiment"]["target"]
            .as_object_mut()
            .unwrap()
            .remove("joy");
        let errors = validate_config_schema(&value).unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_empty_keyword_fails() {
        let mut value = minimal();
        value["grading"]["keyword"] = json!({
            "expected_keywords": [{ "keyword": "", "minimum_occurrences": 1 }]
        });
        assert!(!is_valid_config(&value));
    }

    #[test]
    fn test_unknown_top_level_key_fails() {
        let mut value = minimal();
        value["extra"] = json!(true);
        assert!(validate_config_schema(&value).is_err());
    }
}
