//! Ollama embedding provider.
//!
//! Semantic embeddings via Ollama's local API using models like
//! all-minilm or nomic-embed-text. Local-first: no API costs, and text
//! never leaves the machine.

use crate::embeddings::EmbeddingProvider;
use docqa_core::{AppError, AppResult};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default Ollama API endpoint.
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBEDDING_ENDPOINT: &str = "/api/embeddings";

/// Maximum retry attempts for failed requests.
const MAX_RETRIES: u32 = 3;

/// Initial backoff duration in milliseconds.
const INITIAL_BACKOFF_MS: u64 = 100;

/// Request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Request payload for the Ollama embeddings API.
#[derive(Debug, Clone, Serialize)]
struct EmbeddingRequest {
    model: String,
    prompt: String,
}

/// Response from the Ollama embeddings API.
#[derive(Debug, Clone, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Ollama embedding provider using the local API.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder.
    ///
    /// The endpoint defaults to `http://localhost:11434`, overridable via
    /// the argument or the `OLLAMA_URL` environment variable.
    pub fn new(model: impl Into<String>, dimensions: usize, endpoint: Option<&str>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        let base_url = endpoint
            .map(|e| e.to_string())
            .or_else(|| std::env::var("OLLAMA_URL").ok())
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

        Self {
            client,
            base_url,
            model: model.into(),
            dimensions,
        }
    }

    /// Embed one text, retrying transient failures with backoff.
    async fn embed_with_retry(&self, text: &str) -> AppResult<Vec<f32>> {
        let request = EmbeddingRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };
        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);

        let mut backoff_ms = INITIAL_BACKOFF_MS;
        let mut last_error = String::new();

        for attempt in 1..=MAX_RETRIES {
            match self.client.post(&url).json(&request).send().await {
                Ok(response) if response.status().is_success() => {
                    let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
                        AppError::Embedding(format!("Failed to parse Ollama embedding: {}", e))
                    })?;

                    if parsed.embedding.len() != self.dimensions {
                        return Err(AppError::Embedding(format!(
                            "Model '{}' returned {} dimensions, expected {}",
                            self.model,
                            parsed.embedding.len(),
                            self.dimensions
                        )));
                    }

                    return Ok(parsed.embedding);
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());

                    // Client errors will not improve on retry
                    if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
                        return Err(AppError::Embedding(format!(
                            "Ollama embeddings API error ({}): {}",
                            status, body
                        )));
                    }

                    last_error = format!("{}: {}", status, body);
                }
                Err(e) => {
                    last_error = e.to_string();
                }
            }

            if attempt < MAX_RETRIES {
                warn!(
                    attempt,
                    backoff_ms, "Ollama embedding request failed, retrying"
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms *= 2;
            }
        }

        Err(AppError::Embedding(format!(
            "Ollama embedding failed after {} attempts: {}",
            MAX_RETRIES, last_error
        )))
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for text in texts {
            if text.trim().is_empty() {
                return Err(AppError::Embedding(
                    "Cannot embed empty text".to_string(),
                ));
            }
            embeddings.push(self.embed_with_retry(text).await?);
        }

        debug!(count = embeddings.len(), "Generated Ollama embeddings");
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedder_identity() {
        let embedder = OllamaEmbedder::new("all-minilm", 384, None);
        assert_eq!(embedder.provider_name(), "ollama");
        assert_eq!(embedder.model_name(), "all-minilm");
        assert_eq!(embedder.dimensions(), 384);
    }

    #[test]
    fn test_custom_endpoint() {
        let embedder = OllamaEmbedder::new("all-minilm", 384, Some("http://remote:11434"));
        assert_eq!(embedder.base_url, "http://remote:11434");
    }

    #[tokio::test]
    async fn test_empty_text_rejected_before_network() {
        let embedder = OllamaEmbedder::new("all-minilm", 384, Some("http://localhost:1"));
        let result = embedder.embed("   ").await;
        assert!(matches!(result, Err(AppError::Embedding(_))));
    }
}
