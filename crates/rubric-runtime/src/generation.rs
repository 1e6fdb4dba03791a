//! Output generation: runs every input prompt through the generation
//! service, one at a time, and saves the replies as Markdown.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use rubric_core::OutputSettings;

use crate::files::{EvalFiles, FileError};
use crate::providers::{CompletionRequest, GenerationService, ServiceError};

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error(transparent)]
    File(#[from] FileError),

    #[error("Generation failed for prompt '{prompt}': {source}")]
    Service {
        prompt: String,
        #[source]
        source: ServiceError,
    },
}

/// Counts from one generation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenerationSummary {
    /// Prompt files found
    pub found: usize,

    /// Non-blank prompts sent to the service
    pub processed: usize,

    /// Outputs written
    pub saved: usize,
}

pub struct OutputGenerator {
    service: Arc<dyn GenerationService>,
    files: EvalFiles,
    system_prompt_path: PathBuf,
    model: String,
}

impl OutputGenerator {
    pub fn new(
        service: Arc<dyn GenerationService>,
        files: EvalFiles,
        system_prompt_path: impl Into<PathBuf>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            service,
            files,
            system_prompt_path: system_prompt_path.into(),
            model: model.into(),
        }
    }

    pub fn from_settings(
        service: Arc<dyn GenerationService>,
        files: EvalFiles,
        settings: &OutputSettings,
    ) -> Self {
        Self::new(
            service,
            files,
            settings.system_prompt_path.clone(),
            settings.model.clone(),
        )
    }

    /// Generate an output for every `*.txt` prompt in `inputs_dir`, in name
    /// order, saving each non-blank reply as `<stem>.md` in `output_dir`.
    pub async fn generate_all(
        &self,
        inputs_dir: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
    ) -> Result<GenerationSummary, GenerationError> {
        let system_prompt = self.files.load_text(&self.system_prompt_path).await?;

        tracing::info!(dir = %inputs_dir.as_ref().display(), "Loading input prompts");
        let prompts = self.files.load_dir(inputs_dir, "txt").await?;

        let mut summary = GenerationSummary {
            found: prompts.len(),
            ..Default::default()
        };
        tracing::info!(found = summary.found, "Input prompts loaded");

        let pending: Vec<(&String, &String)> = prompts
            .iter()
            .filter(|(_, content)| !content.trim().is_empty())
            .collect();
        let total = pending.len();

        for (stem, prompt) in pending {
            summary.processed += 1;
            tracing::info!(
                prompt = %stem,
                index = summary.processed,
                total,
                "Generating output"
            );

            let request = CompletionRequest::new(prompt.as_str())
                .with_system_prompt(system_prompt.as_str())
                .with_model(self.model.as_str());

            let completion = self
                .service
                .complete(request)
                .await
                .map_err(|source| GenerationError::Service {
                    prompt: stem.clone(),
                    source,
                })?;

            if completion.message.trim().is_empty() {
                tracing::warn!(prompt = %stem, "Service returned no content, nothing saved");
                continue;
            }

            let path = self
                .files
                .save_markdown(output_dir.as_ref(), &completion.message, stem)
                .await?;
            summary.saved += 1;
            tracing::info!(path = %path.display(), "Output saved");
        }

        tracing::info!(
            processed = summary.processed,
            saved = summary.saved,
            "Generation complete"
        );

        Ok(summary)
    }
}
