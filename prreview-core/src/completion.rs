//! Completion API client
//!
//! Talks to any OpenAI-compatible `/v1/chat/completions` endpoint. The
//! pipeline only depends on the [`CompletionClient`] trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CompletionConfig;
use crate::{Error, Result};

/// Something that turns a prompt into a generated review text
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send one prompt as a single user message and return the reply text
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Request body for the chat completions endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI chat completions client
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    config: CompletionConfig,
}

impl OpenAiClient {
    /// Create a client using the configured timeout
    pub fn new(api_key: impl Into<String>, config: &CompletionConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            config: config.clone(),
        })
    }

    /// Model used for every request
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Full URL of the chat completions endpoint
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Build the request body for a prompt
    pub fn build_request(&self, prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: Role::User,
                content: prompt.to_string(),
            }],
            temperature: self.config.temperature,
        }
    }
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = self.build_request(prompt);
        debug!(model = %body.model, chars = prompt.len(), "Sending completion request");

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::CompletionApi {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Completion(format!("Failed to parse response: {}", e)))?;

        first_choice_text(parsed)
    }
}

/// Text of the first returned choice
fn first_choice_text(response: ChatCompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| Error::Completion("Response contained no choices".to_string()))
}
