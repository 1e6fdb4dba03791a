//! Generation-service abstractions for rubric-runtime.
//!
//! The Sentiment and Judgment graders and the output generator all talk to
//! one OpenAI-compatible chat-completion endpoint through the
//! [`GenerationService`] trait. [`ChatCompletionClient`] is the HTTP
//! implementation; tests substitute their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

mod chat;
pub mod secrets;

pub use chat::ChatCompletionClient;
pub use secrets::{ApiCredential, CredentialSource};

/// Delimiter some models emit before the final answer.
pub const MESSAGE_TOKEN: &str = "<|message|>";

/// Errors from the generation service. All of them are fatal to the
/// operation that triggered the call.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Could not connect to generation service at {endpoint}: {message}")]
    Connection { endpoint: String, message: String },

    #[error("Generation service at {endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Failed to deserialize generation service response: {0}")]
    Deserialization(String),

    #[error("Generation service timed out after {0:?}")]
    Timeout(Duration),

    #[error("Generation service not configured: {0}")]
    NotConfigured(String),
}

/// A chat message for completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system" or "user"
    pub role: String,

    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// One completion call: user input plus optional system prompt and model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionRequest {
    pub input: String,
    pub system_prompt: Option<String>,
    pub model: String,
}

impl CompletionRequest {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            ..Default::default()
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Wire messages. A blank system prompt is left out entirely.
    pub fn messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.system_prompt.as_deref() {
            if !system.trim().is_empty() {
                messages.push(ChatMessage::system(system));
            }
        }
        messages.push(ChatMessage::user(self.input.clone()));
        messages
    }

    /// Model to send, `None` when unset.
    pub fn model(&self) -> Option<&str> {
        if self.model.is_empty() {
            None
        } else {
            Some(&self.model)
        }
    }
}

/// Token usage reported by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Response from a completion call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    /// `choices[0].message.content`, empty when there were no choices
    pub raw_content: String,

    /// Content after [`MESSAGE_TOKEN`], or the whole content
    pub message: String,

    /// Model reported by the service
    pub model: Option<String>,

    pub usage: TokenUsage,
}

impl Completion {
    pub fn from_content(raw_content: impl Into<String>) -> Self {
        let raw_content = raw_content.into();
        let message = extract_message(&raw_content);
        Self {
            raw_content,
            message,
            model: None,
            usage: TokenUsage::default(),
        }
    }
}

/// Keep only the text after the first [`MESSAGE_TOKEN`], trimmed.
/// Content without the token is returned unchanged.
pub fn extract_message(content: &str) -> String {
    match content.find(MESSAGE_TOKEN) {
        Some(index) => content[index + MESSAGE_TOKEN.len()..].trim().to_string(),
        None => content.to_string(),
    }
}

/// Chat-completion backend used by every model-backed component.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Execute one completion.
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ServiceError>;

    /// Service name for logs.
    fn name(&self) -> &str;
}
