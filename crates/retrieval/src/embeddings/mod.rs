//! Text embedding providers.
//!
//! Embedding is a pure function of text plus model identity: the same
//! text with the same model always yields the same vector.

pub mod hash;
pub mod ollama;

pub use hash::HashEmbedder;
pub use ollama::OllamaEmbedder;

use docqa_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "ollama", "hash")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    ///
    /// Batching is an efficiency concern, not a semantic one; the result
    /// equals embedding each text individually.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Create an embedding provider by name.
pub fn create_provider(
    provider: &str,
    model: &str,
    dimensions: usize,
    endpoint: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match provider {
        "ollama" => Ok(Arc::new(OllamaEmbedder::new(model, dimensions, endpoint))),
        "hash" => Ok(Arc::new(HashEmbedder::new(dimensions))),
        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: ollama, hash",
            provider
        ))),
    }
}
