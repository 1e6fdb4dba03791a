//! # rubric-runtime
//!
//! Model-backed grading for rubric.
//!
//! This crate connects the deterministic pieces in `rubric-core` to a
//! chat-completion service:
//! - [`SentimentGrader`] and [`JudgmentGrader`] call the service
//! - [`GradingOrchestrator`] runs all four graders concurrently and
//!   aggregates their scores, all or nothing
//! - [`EvalFiles`] and [`OutputGenerator`] load prompts and produce the
//!   outputs that get graded
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rubric_runtime::{ChatCompletionClient, GradingOrchestrator, SentimentGrader};
//!
//! let service = Arc::new(ChatCompletionClient::from_settings(&config.service)?);
//! let orchestrator = GradingOrchestrator::builder()
//!     .sentiment(Arc::new(SentimentGrader::from_settings(service.clone(), &settings, prompt)))
//!     // ... markdown, keyword, judgment
//!     .weights(config.grading.weights)
//!     .build()?;
//!
//! let result = orchestrator.grade(&submission).await?;
//! println!("aggregate: {:.2}", result.aggregate);
//! ```

pub mod agents;
pub mod files;
pub mod generation;
pub mod orchestrator;
pub mod prompts;
pub mod providers;

pub use agents::{GradeError, Grader, JudgmentGrader, SentimentGrader};
pub use files::{EvalFiles, FileError};
pub use generation::{GenerationError, GenerationSummary, OutputGenerator};
pub use orchestrator::{GradingOrchestrator, GradingOrchestratorBuilder, OrchestratorError};
pub use providers::{
    ApiCredential, ChatCompletionClient, ChatMessage, Completion, CompletionRequest,
    GenerationService, ServiceError,
};
