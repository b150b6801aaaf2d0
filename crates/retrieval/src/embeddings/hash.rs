//! Deterministic trigram-hash embedding provider.

use crate::embeddings::EmbeddingProvider;
use docqa_core::{AppError, AppResult};

/// Offline embedding provider using trigram-based content hashing.
///
/// Generates deterministic, normalized embeddings from character
/// trigrams and word frequencies. Not semantically accurate like a
/// neural model, but consistent and content-dependent, which makes
/// retrieval behavior fully reproducible in tests and offline setups.
#[derive(Debug)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    /// Create a new hash embedder with the given dimensionality.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn generate_embedding(&self, text: &str) -> AppResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(AppError::Embedding(
                "Cannot embed empty text".to_string(),
            ));
        }

        let mut embedding = vec![0.0; self.dimensions];
        let lower = text.to_lowercase();

        // Filter stop words for better discrimination
        let stop_words: std::collections::HashSet<&str> = [
            "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to",
            "of", "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have",
            "has", "had", "it", "its", "their", "they", "them",
        ]
        .iter()
        .copied()
        .collect();

        let words: Vec<&str> = lower
            .split_whitespace()
            .filter(|w| !stop_words.contains(w) && w.len() > 2)
            .collect();

        let mut word_freq = std::collections::HashMap::new();
        for word in &words {
            *word_freq.entry(*word).or_insert(0u32) += 1;
        }

        // Map each word to several dimensions via character trigrams so
        // related words share mass in the vector.
        for (word, freq) in word_freq.iter() {
            let chars: Vec<char> = word.chars().collect();
            for i in 0..chars.len().saturating_sub(2) {
                let trigram = format!("{}{}{}", chars[i], chars[i + 1], chars[i + 2]);
                let trigram_hash = trigram
                    .bytes()
                    .fold(0u64, |acc, b| acc.wrapping_mul(37).wrapping_add(b as u64));

                let dim_idx = (trigram_hash as usize) % self.dimensions;
                embedding[dim_idx] += (*freq as f32).sqrt();
            }

            let word_hash = word
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            let base_dim = (word_hash as usize) % self.dimensions;
            embedding[base_dim] += *freq as f32;
        }

        // Normalize to unit vector; a text of only stop words stays zero
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        Ok(embedding)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for HashEmbedder {
    fn provider_name(&self) -> &str {
        "hash"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|text| self.generate_embedding(text))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dimensions_and_identity() {
        let embedder = HashEmbedder::new(384);
        assert_eq!(embedder.dimensions(), 384);
        assert_eq!(embedder.provider_name(), "hash");
        assert_eq!(embedder.model_name(), "trigram-v1");
    }

    #[tokio::test]
    async fn test_embedding_is_normalized() {
        let embedder = HashEmbedder::new(384);
        let embedding = embedder.embed("hello world").await.unwrap();

        assert_eq!(embedding.len(), 384);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_embedding_is_deterministic() {
        let embedder = HashEmbedder::new(384);

        let first = embedder.embed("deterministic test input").await.unwrap();
        let second = embedder.embed("deterministic test input").await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_different_texts_differ() {
        let embedder = HashEmbedder::new(384);

        let first = embedder.embed("hello world").await.unwrap();
        let second = embedder.embed("goodbye world").await.unwrap();

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_empty_text_is_embedding_error() {
        let embedder = HashEmbedder::new(384);

        assert!(embedder.embed("").await.is_err());
        assert!(embedder.embed("   \n\t ").await.is_err());
    }

    #[tokio::test]
    async fn test_batch_matches_single() {
        let embedder = HashEmbedder::new(128);
        let texts = vec!["first text".to_string(), "second text".to_string()];

        let batch = embedder.embed_batch(&texts).await.unwrap();
        let single = embedder.embed("second text").await.unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1], single);
    }

    #[tokio::test]
    async fn test_utf8_safety() {
        let embedder = HashEmbedder::new(384);
        let embedding = embedder
            .embed("Acentuação e emoção são bem-vindas aqui!")
            .await
            .unwrap();

        assert_eq!(embedding.len(), 384);
    }
}
