//! Wiring between configuration, files, the generation service and the
//! grading pipeline.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rubric_core::{
    GradingResult, KeywordGrader, MarkdownGrader, RubricConfig, Submission,
};
use rubric_runtime::files::file_stem;
use rubric_runtime::prompts::missing_placeholders;
use rubric_runtime::{
    ChatCompletionClient, EvalFiles, GenerationService, GenerationSummary, GradingOrchestrator,
    JudgmentGrader, OrchestratorError, OutputGenerator, SentimentGrader,
};

/// Context shared by every grading pass in one run.
#[derive(Debug, Clone, Default)]
pub struct GradingContext {
    /// System prompt the outputs were generated with
    pub system_prompt: String,

    /// Reference outputs for the judge
    pub reference_examples: Vec<String>,
}

/// Outcome of grading one output file.
#[derive(Debug)]
pub enum GradeOutcome {
    Graded(GradingResult),
    /// No input prompt matched the output's name
    NoPrompt { artifact: String },
    Failed {
        artifact: String,
        error: OrchestratorError,
    },
}

pub struct App {
    config: RubricConfig,
    files: EvalFiles,
    service: Arc<dyn GenerationService>,
}

impl App {
    /// Build from a config file. Relative paths in the config resolve
    /// against the config file's directory.
    pub fn from_config_file(path: &Path) -> Result<Self> {
        let config = RubricConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?;

        let root = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let client = ChatCompletionClient::from_settings(&config.service)
            .context("Failed to configure generation service")?;

        Ok(Self::with_service(config, EvalFiles::new(root), Arc::new(client)))
    }

    pub fn with_service(
        config: RubricConfig,
        files: EvalFiles,
        service: Arc<dyn GenerationService>,
    ) -> Self {
        Self {
            config,
            files,
            service,
        }
    }

    pub fn config(&self) -> &RubricConfig {
        &self.config
    }

    pub fn files(&self) -> &EvalFiles {
        &self.files
    }

    /// Load grader prompts and assemble the orchestrator.
    pub async fn orchestrator(&self) -> Result<GradingOrchestrator> {
        let grading = &self.config.grading;

        let sentiment_prompt = self
            .files
            .load_text(&grading.sentiment.system_prompt_path)
            .await
            .context("Failed to load sentiment system prompt")?;

        let template = self
            .files
            .load_text(&grading.judgment.template_path)
            .await
            .context("Failed to load judgment template")?;
        let missing = missing_placeholders(&template);
        if !missing.is_empty() {
            tracing::warn!(missing = ?missing, "Judgment template lacks placeholders");
        }

        let keyword = KeywordGrader::new(&grading.keyword.expected_keywords)?;

        let orchestrator = GradingOrchestrator::builder()
            .sentiment(Arc::new(SentimentGrader::from_settings(
                self.service.clone(),
                &grading.sentiment,
                sentiment_prompt,
            )))
            .markdown(Arc::new(MarkdownGrader::new(grading.markdown)))
            .keyword(Arc::new(keyword))
            .judgment(Arc::new(JudgmentGrader::from_settings(
                self.service.clone(),
                &grading.judgment,
                template,
            )))
            .weights(grading.weights)
            .build()?;

        Ok(orchestrator)
    }

    /// Load the generation system prompt and every reference example.
    pub async fn grading_context(&self) -> Result<GradingContext> {
        let system_prompt = self
            .files
            .load_text(&self.config.output.system_prompt_path)
            .await
            .context("Failed to load output system prompt")?;

        let example_paths = self
            .files
            .list_files(&self.config.grading.judgment.examples_dir, Some("md"))
            .await
            .context("Failed to list reference examples")?;
        let reference_examples = self.files.load_all(&example_paths).await?;

        tracing::debug!(examples = reference_examples.len(), "Grading context loaded");

        Ok(GradingContext {
            system_prompt,
            reference_examples,
        })
    }

    /// Model outputs available for grading, sorted.
    pub async fn list_outputs(&self) -> Result<Vec<PathBuf>> {
        let outputs = self
            .files
            .list_files(&self.config.output.model_output_dir, Some("md"))
            .await?;
        Ok(outputs)
    }

    /// Resolve an output given as a path, a file name or a stem.
    pub async fn resolve_output(&self, output: &str) -> Result<PathBuf> {
        let direct = self.files.resolve(output);
        if direct.is_file() {
            return Ok(direct);
        }

        let output_dir = &self.config.output.model_output_dir;
        let stem = output.strip_suffix(".md").unwrap_or(output);
        match self.files.find_by_stem(output_dir, stem).await? {
            Some(path) => Ok(path),
            None => bail!(
                "No model output named '{}' in {}",
                output,
                self.files.resolve(output_dir).display()
            ),
        }
    }

    /// Assemble the submission for an output file. `None` when no input
    /// prompt shares its name.
    pub async fn submission_for(
        &self,
        output_path: &Path,
        context: &GradingContext,
    ) -> Result<Option<Submission>> {
        let artifact = file_stem(output_path)
            .with_context(|| format!("Invalid output file name {}", output_path.display()))?;

        let Some(prompt_path) = self
            .files
            .find_by_stem(&self.config.output.input_prompts_dir, &artifact)
            .await?
        else {
            tracing::warn!(artifact = %artifact, "No input prompt found for output");
            return Ok(None);
        };

        let candidate = self.files.load_text(output_path).await?;
        let prompt = self.files.load_text(&prompt_path).await?;

        Ok(Some(
            Submission::new(artifact, candidate)
                .with_prompt(prompt)
                .with_system_prompt(context.system_prompt.clone())
                .with_reference_examples(context.reference_examples.clone()),
        ))
    }

    /// Grade one output file. Grading failures are reported in the outcome;
    /// only setup problems (missing files) return `Err`.
    pub async fn grade_output(
        &self,
        orchestrator: &GradingOrchestrator,
        context: &GradingContext,
        output_path: &Path,
    ) -> Result<GradeOutcome> {
        let Some(submission) = self.submission_for(output_path, context).await? else {
            return Ok(GradeOutcome::NoPrompt {
                artifact: file_stem(output_path).unwrap_or_default(),
            });
        };

        Ok(match orchestrator.grade(&submission).await {
            Ok(result) => GradeOutcome::Graded(result),
            Err(error) => GradeOutcome::Failed {
                artifact: submission.name,
                error,
            },
        })
    }

    /// Generate outputs for every input prompt.
    pub async fn generate(&self) -> Result<GenerationSummary> {
        let output = &self.config.output;
        let generator =
            OutputGenerator::from_settings(self.service.clone(), self.files.clone(), output);
        let summary = generator
            .generate_all(&output.input_prompts_dir, &output.model_output_dir)
            .await?;
        Ok(summary)
    }
}
