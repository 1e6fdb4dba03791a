//! OpenAI-compatible chat-completion client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use rubric_core::ServiceSettings;

use super::{
    secrets::ApiCredential, ChatMessage, Completion, CompletionRequest, GenerationService,
    ServiceError, TokenUsage,
};

/// HTTP client for `POST {base_url}/v1/chat/completions`.
pub struct ChatCompletionClient {
    endpoint: String,
    timeout: Duration,
    credential: Option<ApiCredential>,
    client: reqwest::Client,
}

impl std::fmt::Debug for ChatCompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionClient")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("credential", &self.credential)
            .finish()
    }
}

impl ChatCompletionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: format!("{}/v1/chat/completions", base_url.trim_end_matches('/')),
            timeout,
            credential: None,
            client,
        })
    }

    /// Build from the `service` config section. The API key, when
    /// configured, is read from its environment variable here.
    pub fn from_settings(settings: &ServiceSettings) -> Result<Self, ServiceError> {
        let timeout = humantime::parse_duration(&settings.timeout).map_err(|e| {
            ServiceError::NotConfigured(format!("invalid timeout '{}': {}", settings.timeout, e))
        })?;

        let mut client = Self::new(&settings.base_url, timeout)?;
        if let Some(env_var) = settings.api_key_env.as_deref() {
            let credential = ApiCredential::from_env(env_var)?;
            tracing::debug!(
                credential = credential.name(),
                source = %credential.source(),
                "Using API credential"
            );
            client = client.with_credential(credential);
        }

        Ok(client)
    }

    pub fn with_credential(mut self, credential: ApiCredential) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn transport_error(&self, error: reqwest::Error) -> ServiceError {
        if error.is_timeout() {
            ServiceError::Timeout(self.timeout)
        } else {
            ServiceError::Connection {
                endpoint: self.endpoint.clone(),
                message: error.to_string(),
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl GenerationService for ChatCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ServiceError> {
        let body = ChatRequest {
            messages: request.messages(),
            model: request.model(),
        };

        let mut builder = self.client.post(&self.endpoint).json(&body);
        if let Some(credential) = &self.credential {
            builder = builder.bearer_auth(credential.expose());
        }

        tracing::debug!(
            endpoint = %self.endpoint,
            model = ?body.model,
            messages = body.messages.len(),
            "Sending chat completion"
        );

        let response = builder.send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        if text.trim().is_empty() {
            return Err(ServiceError::Deserialization(
                "empty response body".to_string(),
            ));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| ServiceError::Deserialization(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        let mut completion = Completion::from_content(content);
        completion.model = parsed.model;
        completion.usage = parsed.usage.unwrap_or_default();

        tracing::debug!(
            model = ?completion.model,
            total_tokens = completion.usage.total_tokens,
            "Chat completion received"
        );

        Ok(completion)
    }

    fn name(&self) -> &str {
        "chat-completions"
    }
}
