//! Vector index abstraction for embedded chunks.
//!
//! The index is similarity-addressed, not positionally addressed: chunk
//! ordering within a document is irrelevant to storage, and duplicate
//! chunk text across documents is allowed and retrievable independently.

pub mod sqlite;

pub use sqlite::SqliteIndex;

use crate::types::Chunk;
use docqa_core::AppResult;

/// Distance metric for a collection. Fixed at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Cosine similarity; scale-invariant, appropriate for text embeddings
    Cosine,
}

impl Metric {
    /// Canonical metric name as stored alongside the collection.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
        }
    }
}

/// The unit stored by a vector index: a chunk plus its embedding.
#[derive(Debug, Clone)]
pub struct IndexedDocument {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// One search result: an indexed chunk with its similarity score.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub score: f32,
}

/// Trait for vector index backends.
///
/// Implementations must be safe for concurrent searches interleaved with
/// inserts. Batch inserts are not required to be atomic by this trait;
/// the SQLite backend happens to wrap them in a transaction, but callers
/// must treat a failed ingest as possibly partial.
pub trait VectorIndex: Send + Sync {
    /// Create a collection if it does not exist.
    ///
    /// Idempotent: creating a collection that already exists with the
    /// same parameters succeeds without duplicating data. An existing
    /// collection with a different dimensionality or metric fails with
    /// [`docqa_core::AppError::CollectionConflict`].
    fn ensure_collection(&self, name: &str, dimensions: usize, metric: Metric) -> AppResult<()>;

    /// Append documents to a collection.
    ///
    /// Every embedding must match the collection's dimensionality; a
    /// mismatch is an error, never silently truncated or padded.
    fn insert(&self, collection: &str, documents: &[IndexedDocument]) -> AppResult<()>;

    /// Search for the `k` most similar chunks to the query embedding.
    ///
    /// Returns hits ordered by descending similarity; exact ties keep
    /// insertion order, so repeated searches are reproducible. Fails if
    /// `k == 0` or the query dimensionality mismatches the collection.
    fn search(&self, collection: &str, query: &[f32], k: usize) -> AppResult<Vec<SearchHit>>;
}
