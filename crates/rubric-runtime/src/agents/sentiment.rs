//! Sentiment grader: asks the service for an emotion profile of the
//! candidate and scores its closeness to the configured target.

use async_trait::async_trait;
use std::sync::Arc;

use rubric_core::{
    EmotionVector, GraderDetail, GraderKind, GraderOutcome, SentimentSettings, Submission,
};

use super::strip_code_fence;
use super::traits::{GradeError, Grader};
use crate::providers::{CompletionRequest, GenerationService};

pub struct SentimentGrader {
    service: Arc<dyn GenerationService>,
    system_prompt: String,
    model: String,
    target: EmotionVector,
}

impl SentimentGrader {
    pub fn new(
        service: Arc<dyn GenerationService>,
        system_prompt: impl Into<String>,
        model: impl Into<String>,
        target: EmotionVector,
    ) -> Self {
        Self {
            service,
            system_prompt: system_prompt.into(),
            model: model.into(),
            target,
        }
    }

    /// Build from config; `system_prompt` is the loaded prompt text.
    pub fn from_settings(
        service: Arc<dyn GenerationService>,
        settings: &SentimentSettings,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self::new(service, system_prompt, settings.model.clone(), settings.target)
    }

    pub fn target(&self) -> &EmotionVector {
        &self.target
    }

    /// Score `text` against the target profile.
    pub async fn grade_text(&self, text: &str) -> Result<(EmotionVector, f64), GradeError> {
        let request = CompletionRequest::new(text)
            .with_system_prompt(self.system_prompt.clone())
            .with_model(self.model.clone());

        let completion = self.service.complete(request).await?;
        let observed = parse_emotions(&completion.message).map_err(|message| {
            GradeError::Deserialization {
                kind: GraderKind::Sentiment,
                message,
            }
        })?;

        let score = self.target.similarity(&observed);

        for ((name, value), (_, target)) in observed
            .dimensions()
            .iter()
            .zip(self.target.dimensions().iter())
        {
            tracing::debug!(emotion = name, observed = value, expected = target, "Sentiment dimension");
        }
        tracing::debug!(score, "Sentiment grading complete");

        Ok((observed, score))
    }
}

/// Parse an emotion profile; every dimension is required and values are
/// clamped into [0, 1].
pub fn parse_emotions(message: &str) -> Result<EmotionVector, String> {
    let body = strip_code_fence(message);
    if body.is_empty() {
        return Err("empty response from generation service".to_string());
    }

    let vector: EmotionVector = serde_json::from_str(body).map_err(|e| e.to_string())?;
    Ok(vector.clamped())
}

#[async_trait]
impl Grader for SentimentGrader {
    fn kind(&self) -> GraderKind {
        GraderKind::Sentiment
    }

    async fn grade(&self, submission: &Submission) -> Result<GraderOutcome, GradeError> {
        let (observed, score) = self.grade_text(&submission.candidate).await?;
        Ok(GraderOutcome::new(score, GraderDetail::Sentiment(observed)))
    }
}
