//! Retrieval-augmented answering over uploaded documents.
//!
//! This crate implements the full RAG pipeline: document loading and
//! chunking, embedding, vector indexing, semantic search with reranking,
//! conversation context assembly, and answer generation with history
//! persistence. The [`engine::RagEngine`] coordinates all of it.

pub mod chunker;
pub mod context;
pub mod document;
pub mod embeddings;
pub mod engine;
pub mod index;
pub mod rerank;
pub mod score;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use chunker::Chunker;
pub use context::ContextBuilder;
pub use document::{load_document, Document};
pub use embeddings::EmbeddingProvider;
pub use engine::{AnswerOutcome, RagEngine};
pub use index::{IndexedDocument, Metric, SearchHit, SqliteIndex, VectorIndex};
pub use rerank::Reranker;
pub use types::{Chunk, ChunkMetadata};
