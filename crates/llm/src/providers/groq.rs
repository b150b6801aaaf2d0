//! Groq LLM provider implementation.
//!
//! Groq exposes an OpenAI-compatible chat completions API:
//! https://console.groq.com/docs/api-reference

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
use docqa_core::{AppError, AppResult};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Groq API endpoint.
const DEFAULT_GROQ_URL: &str = "https://api.groq.com/openai/v1";

/// Request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Chat completions request body.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Chat completions response body.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize, Default)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// Groq LLM client.
pub struct GroqClient {
    /// Base URL for the Groq API
    base_url: String,

    /// API key for bearer authentication
    api_key: String,

    /// HTTP client
    client: reqwest::Client,
}

impl GroqClient {
    /// Create a new Groq client with the default endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_GROQ_URL)
    }

    /// Create a new Groq client with a custom base URL.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Convert LlmRequest to chat-completions format.
    fn to_chat_request(&self, request: &LlmRequest) -> ChatRequest {
        let mut messages = Vec::new();
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        ChatRequest {
            model: request.model.clone(),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        }
    }

    /// Map an HTTP error status to a generation error with a stable class.
    fn status_error(status: StatusCode, body: &str) -> AppError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Generation(format!(
                "Groq authentication failed ({}): {}",
                status, body
            )),
            StatusCode::TOO_MANY_REQUESTS => AppError::Generation(format!(
                "Groq rate limit exceeded ({}): {}",
                status, body
            )),
            _ => AppError::Generation(format!("Groq API error ({}): {}", status, body)),
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for GroqClient {
    fn provider_name(&self) -> &str {
        "groq"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!("Sending completion request to Groq");

        let chat_request = self.to_chat_request(request);
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&chat_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Generation(format!("Groq request timed out: {}", e))
                } else {
                    AppError::Generation(format!("Failed to send request to Groq: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Self::status_error(status, &error_text));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to parse Groq response: {}", e)))?;

        let choice = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Generation("Groq response contained no choices".to_string()))?;

        let usage = chat_response.usage.unwrap_or_default();

        tracing::info!("Received completion from Groq");

        Ok(LlmResponse {
            content: choice.message.content,
            model: chat_response.model,
            usage: LlmUsage::new(usage.prompt_tokens, usage.completion_tokens),
            done: true,
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        // Single-shot completion wrapped as a one-chunk stream; the answer
        // pipeline only consumes final answers.
        let response = self.complete(request).await?;
        let chunk = LlmStreamChunk {
            content: response.content,
            model: response.model,
            done: true,
            usage: Some(response.usage),
        };
        Ok(Box::pin(futures::stream::iter(vec![Ok(chunk)])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groq_request_includes_system_message() {
        let client = GroqClient::new("test-key");
        let request = LlmRequest::new("Question", "qwen-2.5-32b")
            .with_system("You answer from documents only")
            .with_temperature(0.3);

        let chat = client.to_chat_request(&request);
        assert_eq!(chat.messages.len(), 2);
        assert_eq!(chat.messages[0].role, "system");
        assert_eq!(chat.messages[1].role, "user");
        assert_eq!(chat.messages[1].content, "Question");
        assert_eq!(chat.temperature, Some(0.3));
    }

    #[test]
    fn test_status_error_classes() {
        let auth = GroqClient::status_error(StatusCode::UNAUTHORIZED, "bad key");
        assert!(auth.to_string().contains("authentication"));

        let quota = GroqClient::status_error(StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert!(quota.to_string().contains("rate limit"));
    }
}
