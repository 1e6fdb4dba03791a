//! Judgment grader ("LLM-as-judge").
//!
//! Fills the judge template with the submission's context, asks the
//! service for a four-axis rubric, and averages it. An unparseable verdict
//! is recorded as an invalid score of 0 rather than an error.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::Arc;

use rubric_core::{
    GraderDetail, GraderKind, GraderOutcome, JudgmentScore, JudgmentSettings, Submission,
};

use super::strip_code_fence;
use super::traits::{GradeError, Grader};
use crate::providers::{CompletionRequest, GenerationService};

/// User message sent alongside the composed judge prompt.
pub const RUN_EVALUATION: &str = "Run evaluation.";

pub struct JudgmentGrader {
    service: Arc<dyn GenerationService>,
    template: String,
    model: String,
}

impl JudgmentGrader {
    pub fn new(
        service: Arc<dyn GenerationService>,
        template: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            service,
            template: template.into(),
            model: model.into(),
        }
    }

    /// Build from config; `template` is the loaded template text.
    pub fn from_settings(
        service: Arc<dyn GenerationService>,
        settings: &JudgmentSettings,
        template: impl Into<String>,
    ) -> Self {
        Self::new(service, template, settings.model.clone())
    }

    /// Substitute the four placeholders.
    pub fn compose_prompt(&self, submission: &Submission) -> String {
        let examples = submission
            .reference_examples
            .iter()
            .map(|example| format!("<example>\n{}\n</example>", example))
            .collect::<Vec<_>>()
            .join("\n\n");

        self.template
            .replace("{system_prompt}", &submission.system_prompt)
            .replace("{user_prompt}", &submission.prompt)
            .replace("{example_high_quality_outputs}", &examples)
            .replace("{output_under_evaluation}", &submission.candidate)
    }

    pub async fn grade_submission(
        &self,
        submission: &Submission,
    ) -> Result<(JudgmentScore, f64), GradeError> {
        let request = CompletionRequest::new(RUN_EVALUATION)
            .with_system_prompt(self.compose_prompt(submission))
            .with_model(self.model.clone());

        let completion = self.service.complete(request).await?;

        let score = match parse_judgment(&completion.message) {
            Ok(mut score) => {
                score.feedback.push(completion.message);
                score
            }
            Err(reason) => {
                tracing::error!(error = %reason, "Failed to parse judge response");
                JudgmentScore::invalid(completion.message)
            }
        };

        let mean = score.mean();
        tracing::debug!(
            accuracy = score.accuracy,
            language = score.language,
            conciseness = score.conciseness,
            clarity = score.clarity,
            valid = score.is_valid,
            score = mean,
            "Judgment grading complete"
        );

        Ok((score, mean))
    }
}

/// Parse the four axes; each must be numeric. Values are clamped into
/// [0, 1]. Feedback is left empty.
pub fn parse_judgment(message: &str) -> Result<JudgmentScore, String> {
    let value: JsonValue =
        serde_json::from_str(strip_code_fence(message)).map_err(|e| e.to_string())?;
    let object = value
        .as_object()
        .ok_or_else(|| "judge response is not a JSON object".to_string())?;

    let axis = |name: &str| -> Result<f64, String> {
        object
            .get(name)
            .or_else(|| object.get(&name.to_lowercase()))
            .and_then(JsonValue::as_f64)
            .map(|v| v.clamp(0.0, 1.0))
            .ok_or_else(|| format!("missing or non-numeric '{}'", name))
    };

    Ok(JudgmentScore::new(
        axis("Accuracy")?,
        axis("Language")?,
        axis("Conciseness")?,
        axis("Clarity")?,
    ))
}

#[async_trait]
impl Grader for JudgmentGrader {
    fn kind(&self) -> GraderKind {
        GraderKind::Judgment
    }

    async fn grade(&self, submission: &Submission) -> Result<GraderOutcome, GradeError> {
        let (score, mean) = self.grade_submission(submission).await?;
        Ok(GraderOutcome::new(mean, GraderDetail::Judgment(score)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{Completion, ServiceError};
    use std::sync::Mutex;

    struct ScriptedService {
        reply: Result<String, u16>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl GenerationService for ScriptedService {
        async fn complete(&self, request: CompletionRequest) -> Result<Completion, ServiceError> {
            self.seen.lock().unwrap().push(request);
            match &self.reply {
                Ok(reply) => Ok(Completion::from_content(reply.clone())),
                Err(status) => Err(ServiceError::Status {
                    endpoint: "mock".to_string(),
                    status: *status,
                }),
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn service(reply: Result<&str, u16>) -> Arc<ScriptedService> {
        Arc::new(ScriptedService {
            reply: reply.map(str::to_string),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn submission() -> Submission {
        Submission::new("rust-intro", "Rust is a systems language.")
            .with_prompt("Explain Rust.")
            .with_system_prompt("You are a tutor.")
            .with_reference_examples(vec!["Example A".to_string(), "Example B".to_string()])
    }

    const TEMPLATE: &str = "S={system_prompt}\nU={user_prompt}\nE={example_high_quality_outputs}\nO={output_under_evaluation}";

    #[test]
    fn test_compose_prompt() {
        let grader = JudgmentGrader::new(service(Ok("")), TEMPLATE, "");
        let prompt = grader.compose_prompt(&submission());
        assert_eq!(
            prompt,
            "S=You are a tutor.\nU=Explain Rust.\n\
             E=<example>\nExample A\n</example>\n\n<example>\nExample B\n</example>\n\
             O=Rust is a systems language."
        );
    }

    #[tokio::test]
    async fn test_valid_verdict() {
        let reply = r#"{"Accuracy":1.0,"Language":0.8,"Conciseness":0.6,"Clarity":1.0}"#;
        let svc = service(Ok(reply));
        let grader = JudgmentGrader::new(svc.clone(), TEMPLATE, "judge-model");
        let (score, mean) = grader.grade_submission(&submission()).await.unwrap();
        assert!(score.is_valid);
        assert!((mean - 0.85).abs() < 1e-9);
        assert_eq!(score.feedback, vec![reply.to_string()]);

        let seen = svc.seen.lock().unwrap();
        assert_eq!(seen[0].input, RUN_EVALUATION);
        assert_eq!(seen[0].model, "judge-model");
        assert!(seen[0]
            .system_prompt
            .as_deref()
            .unwrap()
            .contains("<example>\nExample A\n</example>"));
    }

    #[tokio::test]
    async fn test_unparseable_verdict_is_recoverable() {
        let grader = JudgmentGrader::new(service(Ok("Looks good to me!")), TEMPLATE, "");
        let (score, mean) = grader.grade_submission(&submission()).await.unwrap();
        assert!(!score.is_valid);
        assert_eq!(mean, 0.0);
        assert_eq!(score.feedback, vec!["Looks good to me!".to_string()]);
    }

    #[tokio::test]
    async fn test_service_failure_propagates() {
        let grader = JudgmentGrader::new(service(Err(503)), TEMPLATE, "");
        let result = grader.grade_submission(&submission()).await;
        assert!(matches!(
            result,
            Err(GradeError::Service(ServiceError::Status { status: 503, .. }))
        ));
    }

    #[test]
    fn test_parse_judgment_variants() {
        let lower = r#"{"accuracy":1.5,"language":0.5,"conciseness":0.5,"clarity":-0.2}"#;
        let score = parse_judgment(lower).unwrap();
        assert_eq!(score.accuracy, 1.0);
        assert_eq!(score.clarity, 0.0);

        let fenced = "```json\n{\"Accuracy\":1,\"Language\":1,\"Conciseness\":1,\"Clarity\":1}\n```";
        assert_eq!(parse_judgment(fenced).unwrap().mean(), 1.0);

        assert!(parse_judgment(r#"{"Accuracy":"high"}"#).is_err());
        assert!(parse_judgment("[1, 2, 3]").is_err());
    }
}
