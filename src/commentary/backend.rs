//! Text-generation providers for match commentary.
//!
//! - Local: Ollama (default)
//! - Remote: Anthropic Messages API (`remote-ai` feature)

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::CommentaryError;
use crate::config::{CommentaryBackend, CommentaryConfig};

/// A message in a conversation with the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Request to a commentary provider.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Response from a commentary provider.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub model: String,
    pub tokens_used: Option<TokenUsage>,
}

#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Prompt in, free text out.
#[async_trait]
pub trait CommentaryProvider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &'static str;

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, CommentaryError>;

    async fn health_check(&self) -> Result<bool, CommentaryError>;
}

fn http_client(timeout_seconds: u64) -> Result<reqwest::Client, CommentaryError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()
        .map_err(|e| CommentaryError::ProviderUnavailable(e.to_string()))
}

/// Ollama chat backend.
pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout_seconds: u64,
    ) -> Result<Self, CommentaryError> {
        Ok(Self {
            client: http_client(timeout_seconds)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }
}

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize, Default)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaResponseMessage,
    model: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

#[async_trait]
impl CommentaryProvider for OllamaBackend {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, CommentaryError> {
        let url = format!("{}/api/chat", self.base_url);

        let body = OllamaRequest {
            model: &self.model,
            messages: request
                .messages
                .into_iter()
                .map(|m| OllamaMessage {
                    role: m.role.as_str(),
                    content: m.content,
                })
                .collect(),
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        debug!("Sending commentary request to Ollama: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CommentaryError::ProviderUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(CommentaryError::ProviderUnavailable(format!(
                "Ollama returned {}: {}",
                status, text
            )));
        }

        let parsed: OllamaResponse = response
            .json()
            .await
            .map_err(|e| CommentaryError::ResponseParseError(e.to_string()))?;

        let tokens_used = match (parsed.prompt_eval_count, parsed.eval_count) {
            (Some(prompt), Some(completion)) => Some(TokenUsage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt + completion,
            }),
            _ => None,
        };

        Ok(ChatResponse {
            content: parsed.message.content,
            model: parsed.model,
            tokens_used,
        })
    }

    async fn health_check(&self) -> Result<bool, CommentaryError> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                warn!("Ollama health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

// --- Anthropic backend ---

#[cfg(feature = "remote-ai")]
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";

#[cfg(feature = "remote-ai")]
#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[cfg(feature = "remote-ai")]
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    model: String,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[cfg(feature = "remote-ai")]
#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: String,
}

#[cfg(feature = "remote-ai")]
#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Anthropic Messages API backend.
#[cfg(feature = "remote-ai")]
pub struct AnthropicBackend {
    client: reqwest::Client,
    model: String,
    api_key: String,
}

#[cfg(feature = "remote-ai")]
impl AnthropicBackend {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_seconds: u64,
    ) -> Result<Self, CommentaryError> {
        Ok(Self {
            client: http_client(timeout_seconds)?,
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    /// Read the API key from `api_key_env`.
    pub fn from_env(api_key_env: &str, model: impl Into<String>, timeout_seconds: u64) -> Result<Self, CommentaryError> {
        let api_key = std::env::var(api_key_env).map_err(|_| {
            CommentaryError::ProviderUnavailable(format!("{} env var not set", api_key_env))
        })?;
        Self::new(api_key, model, timeout_seconds)
    }
}

#[cfg(feature = "remote-ai")]
#[async_trait]
impl CommentaryProvider for AnthropicBackend {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, CommentaryError> {
        // System prompts go in the top-level field
        let (system, messages): (Vec<_>, Vec<_>) = request
            .messages
            .into_iter()
            .partition(|m| m.role == MessageRole::System);

        let system = if system.is_empty() {
            None
        } else {
            Some(
                system
                    .into_iter()
                    .map(|m| m.content)
                    .collect::<Vec<_>>()
                    .join("\n\n"),
            )
        };

        let body = AnthropicRequest {
            model: &self.model,
            max_tokens: request.max_tokens.unwrap_or(1024),
            messages: messages
                .into_iter()
                .map(|m| OllamaMessage {
                    role: m.role.as_str(),
                    content: m.content,
                })
                .collect(),
            system,
            temperature: request.temperature,
        };

        debug!("Sending commentary request to Anthropic API");

        let response = self
            .client
            .post(ANTHROPIC_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|e| CommentaryError::ProviderUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(CommentaryError::ProviderUnavailable(format!(
                "Anthropic API returned {}: {}",
                status, text
            )));
        }

        let parsed: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| CommentaryError::ResponseParseError(e.to_string()))?;

        let content = parsed
            .content
            .into_iter()
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");

        let tokens_used = parsed.usage.map(|u| TokenUsage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
            total_tokens: u.input_tokens + u.output_tokens,
        });

        Ok(ChatResponse {
            content,
            model: parsed.model,
            tokens_used,
        })
    }

    async fn health_check(&self) -> Result<bool, CommentaryError> {
        // No health endpoint; a constructed backend has its key
        Ok(true)
    }
}

/// Build the configured provider, or `None` when commentary is disabled.
pub fn create_provider(
    config: &CommentaryConfig,
) -> Result<Option<Arc<dyn CommentaryProvider>>, CommentaryError> {
    if !config.enabled {
        return Ok(None);
    }

    match config.backend {
        CommentaryBackend::Ollama => {
            let backend = OllamaBackend::new(&config.base_url, &config.model, config.timeout_seconds)?;
            Ok(Some(Arc::new(backend)))
        }
        #[cfg(feature = "remote-ai")]
        CommentaryBackend::Anthropic => {
            let backend =
                AnthropicBackend::from_env(&config.api_key_env, &config.model, config.timeout_seconds)?;
            Ok(Some(Arc::new(backend)))
        }
        #[cfg(not(feature = "remote-ai"))]
        CommentaryBackend::Anthropic => Err(CommentaryError::ProviderUnavailable(
            "anthropic backend requires the remote-ai feature".to_string(),
        )),
    }
}

/// Provider that always answers with a fixed string.
#[cfg(test)]
pub struct MockBackend {
    response: String,
}

#[cfg(test)]
impl MockBackend {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl CommentaryProvider for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, CommentaryError> {
        Ok(ChatResponse {
            content: self.response.clone(),
            model: "mock".to_string(),
            tokens_used: None,
        })
    }

    async fn health_check(&self) -> Result<bool, CommentaryError> {
        Ok(true)
    }
}

/// Provider that is never reachable.
#[cfg(test)]
pub struct FailingBackend;

#[cfg(test)]
#[async_trait]
impl CommentaryProvider for FailingBackend {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, CommentaryError> {
        Err(CommentaryError::ProviderUnavailable("connection refused".to_string()))
    }

    async fn health_check(&self) -> Result<bool, CommentaryError> {
        Ok(false)
    }
}

/// Provider that answers after `delay`.
#[cfg(test)]
pub struct SlowBackend {
    pub delay: Duration,
}

#[cfg(test)]
#[async_trait]
impl CommentaryProvider for SlowBackend {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, CommentaryError> {
        tokio::time::sleep(self.delay).await;
        Ok(ChatResponse {
            content: "NARRATIVE: late.\nSUMMARY: late.".to_string(),
            model: "slow".to_string(),
            tokens_used: None,
        })
    }

    async fn health_check(&self) -> Result<bool, CommentaryError> {
        Ok(true)
    }
}
