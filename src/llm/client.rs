//! Chat completion client
//!
//! Speaks the OpenAI `/chat/completions` protocol:
//! - one non-streaming request per call
//! - token usage read from the response and checked for consistency
//! - optional JSON-object response format for the judge

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{BakeError, Result};
use crate::types::UsageRecord;

/// Default chat completion endpoint
pub const DEFAULT_CHAT_URL: &str = "https://api.openai.com/v1";

/// Model that writes the recipe answer
pub const DEFAULT_ANSWER_MODEL: &str = "gpt-5-mini";

/// Model that judges the answer
pub const DEFAULT_EVALUATOR_MODEL: &str = "gpt-5-nano";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One completion request
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Ask the endpoint for a JSON object response
    pub json_response: bool,
}

impl ChatRequest {
    /// Single user message request
    pub fn prompt(model: &str, prompt: &str) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage::user(prompt)],
            json_response: false,
        }
    }

    pub fn json(mut self) -> Self {
        self.json_response = true;
        self
    }
}

/// Text and usage of one completion
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// None when the model produced no message content
    pub content: Option<String>,
    pub usage: UsageRecord,
}

/// Generation capability: message list in, text and usage out
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<Completion>;
}

/// HTTP client for OpenAI-compatible chat completions
#[derive(Debug, Clone)]
pub struct OpenAiChatClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    temperature: Option<f32>,
}

impl OpenAiChatClient {
    /// Create client with default settings
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_config(DEFAULT_CHAT_URL, api_key, None, DEFAULT_TIMEOUT)
    }

    /// Create client with custom configuration
    pub fn with_config(
        base_url: &str,
        api_key: Option<String>,
        temperature: Option<f32>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(BakeError::HttpError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            temperature,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_body<'a>(&self, request: &'a ChatRequest) -> CompletionBody<'a> {
        CompletionBody {
            model: &request.model,
            messages: &request.messages,
            stream: false,
            temperature: self.temperature,
            response_format: request.json_response.then(|| ResponseFormat {
                kind: "json_object",
            }),
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChatClient {
    async fn complete(&self, request: ChatRequest) -> Result<Completion> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_body(&request);

        let mut builder = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| BakeError::ModelApiError(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BakeError::ModelApiError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let raw = response
            .text()
            .await
            .map_err(|e| BakeError::ModelApiError(format!("Failed to read response: {}", e)))?;

        parse_completion(&raw)
    }
}

/// Decode a `/chat/completions` response body
pub fn parse_completion(raw: &str) -> Result<Completion> {
    let response: CompletionResponse = serde_json::from_str(raw)
        .map_err(|e| BakeError::MalformedResponse(format!("invalid completion body: {}", e)))?;

    let wire_usage = response
        .usage
        .ok_or_else(|| BakeError::MalformedResponse("response carries no usage".to_string()))?;
    let usage = UsageRecord::from_reported(
        wire_usage.prompt_tokens,
        wire_usage.completion_tokens,
        wire_usage.total_tokens,
    )?;

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content);

    Ok(Completion { content, usage })
}

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
}
