//! rubric - grade generated text against a weighted multi-grader rubric.
//!
//! ## Commands
//!
//! - `init`: write a starter config and default grader prompts
//! - `check`: validate the configuration
//! - `generate`: produce model outputs for every input prompt
//! - `list`: list model outputs available for grading
//! - `grade`: grade one output
//! - `grade-all`: grade every output

mod app;
mod telemetry;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use rubric_core::{GradingResult, RubricConfig};
use rubric_runtime::prompts::{JUDGMENT_TEMPLATE, SENTIMENT_SYSTEM_PROMPT};

use app::{App, GradeOutcome};

#[derive(Parser)]
#[command(name = "rubric")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Grade generated text with weighted sentiment, structure, keyword and judge scores", long_about = None)]
struct Cli {
    /// Path to the rubric config file (YAML, or JSON by extension)
    #[arg(short, long, global = true, default_value = "rubric.yaml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter config and default grader prompts
    Init {
        /// Directory to initialise
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Load and validate the configuration
    Check,

    /// Generate a model output for every input prompt
    Generate,

    /// List model outputs available for grading
    List,

    /// Grade one model output
    Grade {
        /// Output file path, file name or stem
        output: String,

        /// Result format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Grade every model output
    GradeAll {
        /// Result format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    telemetry::init_tracing(cli.json_logs, level);

    match cli.command {
        Commands::Init { path } => cmd_init(&path),
        Commands::Check => cmd_check(&cli.config),
        Commands::Generate => cmd_generate(&cli.config).await,
        Commands::List => cmd_list(&cli.config).await,
        Commands::Grade { output, format } => cmd_grade(&cli.config, &output, format).await,
        Commands::GradeAll { format } => cmd_grade_all(&cli.config, format).await,
    }
}

const STARTER_CONFIG: &str = r#"service:
  base_url: "http://localhost:8080"
  # api_key_env: "RUBRIC_API_KEY"
  timeout: "1000s"

output:
  model: ""
  system_prompt_path: "prompts/system.txt"
  input_prompts_dir: "prompts/input"
  model_output_dir: "outputs"

grading:
  weights:
    sentiment: 0.25
    markdown: 0.25
    keyword: 0.25
    judgment: 0.25
  keyword:
    expected_keywords: []
  markdown:
    validity_weight: 0.5
    variety_weight: 0.5
  sentiment:
    system_prompt_path: "prompts/sentiment.txt"
    model: ""
    target:
      anger: 0.0
      fear: 0.0
      anticipation: 0.3
      trust: 0.8
      surprise: 0.1
      sadness: 0.0
      joy: 0.5
      disgust: 0.0
  judgment:
    template_path: "prompts/judge.txt"
    model: ""
    examples_dir: "samples"
"#;

const STARTER_SYSTEM_PROMPT: &str =
    "You are a helpful technical writer. Answer in well-structured Markdown.\n";

/// Files written by `init`, relative to the target directory.
fn starter_files() -> [(&'static str, &'static str); 4] {
    [
        ("rubric.yaml", STARTER_CONFIG),
        ("prompts/system.txt", STARTER_SYSTEM_PROMPT),
        ("prompts/sentiment.txt", SENTIMENT_SYSTEM_PROMPT),
        ("prompts/judge.txt", JUDGMENT_TEMPLATE),
    ]
}

fn cmd_init(path: &Path) -> Result<()> {
    for dir in ["prompts/input", "outputs", "samples"] {
        std::fs::create_dir_all(path.join(dir))
            .with_context(|| format!("Failed to create {}", path.join(dir).display()))?;
    }

    for (name, content) in starter_files() {
        let target = path.join(name);
        if target.exists() {
            println!("  kept     {}", target.display());
            continue;
        }
        std::fs::write(&target, content)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        println!("  created  {}", target.display());
    }

    println!("\nAdd prompts as prompts/input/<name>.txt, then run `rubric generate`.");
    Ok(())
}

fn cmd_check(config_path: &Path) -> Result<()> {
    let config = RubricConfig::from_file(config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;

    let weights = &config.grading.weights;
    println!("Config OK: {}", config_path.display());
    println!("  service      {}", config.service.base_url);
    println!("  timeout      {}", config.service.timeout);
    println!(
        "  weights      sentiment={} markdown={} keyword={} judgment={} (sum {:.2})",
        weights.sentiment,
        weights.markdown,
        weights.keyword,
        weights.judgment,
        weights.sum()
    );
    println!(
        "  keywords     {}",
        config.grading.keyword.expected_keywords.len()
    );
    Ok(())
}

async fn cmd_generate(config_path: &Path) -> Result<()> {
    let app = App::from_config_file(config_path)?;
    let summary = app.generate().await?;
    println!(
        "Generated {} output(s) from {} prompt(s) ({} found)",
        summary.saved, summary.processed, summary.found
    );
    Ok(())
}

async fn cmd_list(config_path: &Path) -> Result<()> {
    let app = App::from_config_file(config_path)?;
    let outputs = app.list_outputs().await?;
    if outputs.is_empty() {
        let dir = app.files().resolve(&app.config().output.model_output_dir);
        println!("No model outputs found in {}", dir.display());
    }
    for output in outputs {
        if let Some(name) = output.file_name() {
            println!("{}", name.to_string_lossy());
        }
    }
    Ok(())
}

async fn cmd_grade(config_path: &Path, output: &str, format: Format) -> Result<()> {
    let app = App::from_config_file(config_path)?;
    let path = app.resolve_output(output).await?;
    let orchestrator = app.orchestrator().await?;
    let context = app.grading_context().await?;

    match app.grade_output(&orchestrator, &context, &path).await? {
        GradeOutcome::Graded(result) => print_result(&result, format),
        GradeOutcome::NoPrompt { artifact } => {
            println!("No input prompt found for '{}', nothing graded", artifact);
            Ok(())
        }
        GradeOutcome::Failed { artifact, error } => {
            bail!("Grading failed for '{}': {}", artifact, error)
        }
    }
}

async fn cmd_grade_all(config_path: &Path, format: Format) -> Result<()> {
    let app = App::from_config_file(config_path)?;
    let outputs = app.list_outputs().await?;
    let orchestrator = app.orchestrator().await?;
    let context = app.grading_context().await?;

    info!(outputs = outputs.len(), "Grading all outputs");

    let mut failed = 0usize;
    for path in &outputs {
        match app.grade_output(&orchestrator, &context, path).await? {
            GradeOutcome::Graded(result) => print_result(&result, format)?,
            GradeOutcome::NoPrompt { artifact } => {
                println!("No input prompt found for '{}', skipped", artifact);
            }
            GradeOutcome::Failed { artifact, error } => {
                failed += 1;
                eprintln!("✗ {}: {}", artifact, error);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} output(s) failed grading", failed, outputs.len());
    }
    Ok(())
}

fn print_result(result: &GradingResult, format: Format) -> Result<()> {
    if format == Format::Json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!("{}", result.artifact);
    match &result.scores {
        Some(scores) => {
            for (kind, outcome) in scores.iter() {
                println!(
                    "  {:<10} {:.3}  (weight {})",
                    kind,
                    outcome.score,
                    result.weights.weight_for(kind)
                );
            }
        }
        None => println!("  skipped: output is empty"),
    }
    println!("  {:<10} {:.3}", "aggregate", result.aggregate);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rubric_core::GraderKind;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_starter_config_is_valid() {
        let config = RubricConfig::from_yaml(STARTER_CONFIG).unwrap();
        assert_eq!(config.service.timeout, "1000s");
        assert_eq!(config.grading.weights.weight_for(GraderKind::Judgment), 0.25);
    }

    #[test]
    fn test_init_keeps_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rubric.yaml"), "custom").unwrap();

        cmd_init(dir.path()).unwrap();

        let kept = std::fs::read_to_string(dir.path().join("rubric.yaml")).unwrap();
        assert_eq!(kept, "custom");
        let judge = std::fs::read_to_string(dir.path().join("prompts/judge.txt")).unwrap();
        assert_eq!(judge, JUDGMENT_TEMPLATE);
        assert!(dir.path().join("prompts/input").is_dir());
    }

    #[test]
    fn test_parse_grade_command() {
        let cli = Cli::parse_from(["rubric", "--config", "x.yaml", "grade", "intro", "--format", "json"]);
        assert_eq!(cli.config, PathBuf::from("x.yaml"));
        match cli.command {
            Commands::Grade { output, format } => {
                assert_eq!(output, "intro");
                assert!(format == Format::Json);
            }
            _ => panic!("expected grade command"),
        }
    }
}
