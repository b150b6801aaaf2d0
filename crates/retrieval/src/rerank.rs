//! Relevance reranking of retrieved chunks.

use crate::embeddings::EmbeddingProvider;
use crate::score::cosine_similarity;
use crate::types::Chunk;
use docqa_core::AppResult;
use std::sync::Arc;

/// Reorders retrieved candidates by fresh similarity against the query.
///
/// Reranking is an ordering refinement, not a correctness requirement:
/// if scoring fails for any reason the original retrieval order is
/// returned unchanged rather than failing the query.
pub struct Reranker {
    provider: Arc<dyn EmbeddingProvider>,
}

impl Reranker {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    /// Score each candidate against the query and sort by descending
    /// similarity. The sort is stable and keyed on score alone, so
    /// exact ties keep their incoming order.
    pub async fn score_and_sort(&self, query: &str, candidates: Vec<Chunk>) -> Vec<Chunk> {
        if candidates.len() < 2 {
            return candidates;
        }

        let scores = match self.score_candidates(query, &candidates).await {
            Ok(scores) => scores,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Reranking failed, keeping original retrieval order"
                );
                return candidates;
            }
        };

        let mut scored: Vec<(f32, Chunk)> = scores.into_iter().zip(candidates).collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().map(|(_, chunk)| chunk).collect()
    }

    async fn score_candidates(&self, query: &str, candidates: &[Chunk]) -> AppResult<Vec<f32>> {
        let query_embedding = self.provider.embed(query).await?;

        let texts: Vec<String> = candidates.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.provider.embed_batch(&texts).await?;

        Ok(embeddings
            .iter()
            .map(|embedding| cosine_similarity(&query_embedding, embedding))
            .collect())
    }
}
