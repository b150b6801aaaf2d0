//! Retrieval type definitions.

use serde::{Deserialize, Serialize};

/// A bounded span of document text stored as a retrievable unit.
///
/// Immutable once created; after insertion the vector index owns its
/// copy for the index's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text content (never empty)
    pub text: String,

    /// Provenance of the chunk within its source document
    pub metadata: ChunkMetadata,
}

/// Where a chunk came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Source document name
    pub source: String,

    /// 1-based page number within the source
    pub page: usize,

    /// 0-based position across the whole document's chunks
    pub position: usize,

    /// Character range within the page; consecutive chunks overlap by at
    /// most the configured overlap and leave no gaps
    pub char_range: (usize, usize),
}
