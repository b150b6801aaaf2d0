//! Error types for the docqa system.
//!
//! This module defines a unified error enum covering every failure class
//! in the pipeline: caller input validation, document parsing, embedding,
//! vector index operations, answer generation, and history persistence.

use thiserror::Error;

/// Unified error type for the docqa system.
///
/// All functions in the application return `Result<T, AppError>`.
/// We never panic — errors must be represented and propagated.
///
/// Each collaborator reports exactly one of these kinds, never an opaque
/// catch-all, so callers can tell a bad request (`Validation`) apart from
/// a failing backend (`Embedding`, `Index`, `Generation`, `Persistence`).
#[derive(Error, Debug)]
pub enum AppError {
    /// Empty or malformed caller input; never retried by the system
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unreadable or corrupt source document
    #[error("Document error: {0}")]
    Document(String),

    /// Embedding provider errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector index errors (dimension mismatch, unknown collection, bad k)
    #[error("Index error: {0}")]
    Index(String),

    /// Collection exists under the same name with different parameters
    #[error("Collection '{name}' already exists with dimensions {existing_dimensions} and metric '{existing_metric}' (requested {requested_dimensions}/'{requested_metric}')")]
    CollectionConflict {
        name: String,
        existing_dimensions: usize,
        existing_metric: String,
        requested_dimensions: usize,
        requested_metric: String,
    },

    /// Language model errors (auth, rate limit, timeout, malformed reply)
    #[error("Generation error: {0}")]
    Generation(String),

    /// History store errors
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_conflict_display() {
        let err = AppError::CollectionConflict {
            name: "documents".to_string(),
            existing_dimensions: 384,
            existing_metric: "cosine".to_string(),
            requested_dimensions: 768,
            requested_metric: "cosine".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("documents"));
        assert!(msg.contains("384"));
        assert!(msg.contains("768"));
    }

    #[test]
    fn test_validation_is_distinguishable() {
        let validation = AppError::Validation("question cannot be empty".to_string());
        let generation = AppError::Generation("timeout".to_string());

        assert!(validation.to_string().starts_with("Validation error"));
        assert!(generation.to_string().starts_with("Generation error"));
    }
}
