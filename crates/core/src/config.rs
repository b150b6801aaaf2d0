//! Configuration management for the docqa system.
//!
//! This module handles loading and merging configuration from multiple
//! sources:
//! - Built-in defaults
//! - Config file (docqa.yaml)
//! - Environment variables (`DOCQA_*`)
//! - Command-line flags (applied last via [`AppConfig::with_overrides`])

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Main application configuration.
///
/// Holds the full configuration surface: generation provider identity,
/// embedding model identity, retrieval tuning, and storage locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the vector index and chat history databases
    pub data_dir: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Generation provider (e.g., "ollama", "groq")
    pub provider: String,

    /// Generation model identifier
    pub model: String,

    /// Optional custom endpoint for the generation provider
    pub endpoint: Option<String>,

    /// API key for the generation provider (resolved from environment)
    pub api_key: Option<String>,

    /// Embedding provider (e.g., "ollama", "hash")
    pub embedding_provider: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Embedding vector dimensionality; fixed at collection creation
    pub embedding_dimensions: usize,

    /// Retrieval tuning parameters
    pub retrieval: RetrievalConfig,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Tuning parameters for chunking, retrieval, and history windowing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Vector index collection name
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Maximum chunk length in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters repeated across consecutive chunk boundaries
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Candidates fetched from the vector index per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Candidates kept after reranking
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Maximum prior question/answer pairs rendered into the prompt
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

fn default_collection() -> String {
    "documents".to_string()
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_top_k() -> usize {
    5
}

fn default_top_n() -> usize {
    3
}

fn default_history_window() -> usize {
    5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            top_n: default_top_n(),
            history_window: default_history_window(),
        }
    }
}

/// Config file structure (docqa.yaml).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    embedding: Option<EmbeddingSection>,
    retrieval: Option<RetrievalConfig>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmbeddingSection {
    provider: Option<String>,
    model: Option<String>,
    dimensions: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".docqa"),
            config_file: None,
            provider: "ollama".to_string(), // Local-first default
            model: "llama3.2".to_string(),
            endpoint: None,
            api_key: None,
            embedding_provider: "ollama".to_string(),
            embedding_model: "all-minilm".to_string(),
            embedding_dimensions: 384,
            retrieval: RetrievalConfig::default(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file and environment variables.
    ///
    /// Environment variables (override the file):
    /// - `DOCQA_CONFIG`: path to config file (default: ./docqa.yaml)
    /// - `DOCQA_DATA_DIR`: database directory
    /// - `DOCQA_PROVIDER` / `DOCQA_MODEL` / `DOCQA_ENDPOINT`: generation identity
    /// - `DOCQA_API_KEY` (falls back to `GROQ_API_KEY`): provider credential
    /// - `DOCQA_EMBEDDING_PROVIDER` / `DOCQA_EMBEDDING_MODEL`: embedding identity
    /// - `RUST_LOG`: log level
    /// - `NO_COLOR`: disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(config_file) = std::env::var("DOCQA_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| PathBuf::from("docqa.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(data_dir) = std::env::var("DOCQA_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(provider) = std::env::var("DOCQA_PROVIDER") {
            config.provider = provider;
        }
        if let Ok(model) = std::env::var("DOCQA_MODEL") {
            config.model = model;
        }
        if let Ok(endpoint) = std::env::var("DOCQA_ENDPOINT") {
            config.endpoint = Some(endpoint);
        }
        if let Ok(provider) = std::env::var("DOCQA_EMBEDDING_PROVIDER") {
            config.embedding_provider = provider;
        }
        if let Ok(model) = std::env::var("DOCQA_EMBEDDING_MODEL") {
            config.embedding_model = model;
        }

        config.api_key = std::env::var("DOCQA_API_KEY")
            .or_else(|_| std::env::var("GROQ_API_KEY"))
            .ok();
        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        config.validate()?;
        Ok(config)
    }

    /// Merge settings from a YAML config file into this configuration.
    fn merge_yaml(mut self, path: &std::path::Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config {:?}: {}", path, e)))?;

        let file: ConfigFile = serde_yaml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Invalid config {:?}: {}", path, e)))?;

        if let Some(llm) = file.llm {
            if let Some(provider) = llm.provider {
                self.provider = provider;
            }
            if let Some(model) = llm.model {
                self.model = model;
            }
            if llm.endpoint.is_some() {
                self.endpoint = llm.endpoint;
            }
        }

        if let Some(embedding) = file.embedding {
            if let Some(provider) = embedding.provider {
                self.embedding_provider = provider;
            }
            if let Some(model) = embedding.model {
                self.embedding_model = model;
            }
            if let Some(dimensions) = embedding.dimensions {
                self.embedding_dimensions = dimensions;
            }
        }

        if let Some(retrieval) = file.retrieval {
            self.retrieval = retrieval;
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if logging.color == Some(false) {
                self.no_color = true;
            }
        }

        Ok(self)
    }

    /// Apply command-line overrides to the loaded configuration.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        data_dir: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(data_dir) = data_dir {
            self.data_dir = data_dir;
        }
        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }
        if let Some(provider) = provider {
            self.provider = provider;
        }
        if let Some(model) = model {
            self.model = model;
        }
        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }
        if verbose {
            self.verbose = true;
            self.log_level = Some("debug".to_string());
        }
        if no_color {
            self.no_color = true;
        }
        self
    }

    /// Check the numeric invariants the pipeline relies on.
    ///
    /// Violations are configuration errors reported here, before any
    /// document is touched, not at split or search time.
    pub fn validate(&self) -> AppResult<()> {
        let r = &self.retrieval;

        if r.chunk_size == 0 {
            return Err(AppError::Config("chunk_size must be positive".to_string()));
        }
        if r.chunk_overlap >= r.chunk_size {
            return Err(AppError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                r.chunk_overlap, r.chunk_size
            )));
        }
        if r.top_k == 0 {
            return Err(AppError::Config("top_k must be positive".to_string()));
        }
        if r.top_n == 0 || r.top_n > r.top_k {
            return Err(AppError::Config(format!(
                "top_n ({}) must be between 1 and top_k ({})",
                r.top_n, r.top_k
            )));
        }
        if self.embedding_dimensions == 0 {
            return Err(AppError::Config(
                "embedding_dimensions must be positive".to_string(),
            ));
        }
        if r.collection.trim().is_empty() {
            return Err(AppError::Config("collection name cannot be empty".to_string()));
        }

        Ok(())
    }

    /// Create the data directory if it does not exist.
    pub fn ensure_data_dir(&self) -> AppResult<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir).map_err(|e| {
                AppError::Config(format!(
                    "Failed to create data directory {:?}: {}",
                    self.data_dir, e
                ))
            })?;
        }
        Ok(())
    }

    /// Path of the vector index database.
    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join("index.db")
    }

    /// Path of the chat history database.
    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join("history.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.retrieval.chunk_size, 1000);
        assert_eq!(config.retrieval.chunk_overlap, 200);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.top_n, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_overlap_ge_chunk_size() {
        let mut config = AppConfig::default();
        config.retrieval.chunk_overlap = config.retrieval.chunk_size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_top_n_above_top_k() {
        let mut config = AppConfig::default();
        config.retrieval.top_n = config.retrieval.top_k + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docqa.yaml");
        std::fs::write(
            &path,
            r#"
llm:
  provider: groq
  model: llama-3.1-8b-instant
embedding:
  dimensions: 768
retrieval:
  chunk_size: 500
  chunk_overlap: 50
"#,
        )
        .unwrap();

        let config = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(config.provider, "groq");
        assert_eq!(config.model, "llama-3.1-8b-instant");
        assert_eq!(config.embedding_dimensions, 768);
        assert_eq!(config.retrieval.chunk_size, 500);
        // Unspecified fields keep their defaults
        assert_eq!(config.retrieval.top_k, 5);
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(
            Some(PathBuf::from("/tmp/docqa-data")),
            None,
            Some("groq".to_string()),
            None,
            None,
            true,
            false,
        );

        assert_eq!(config.data_dir, PathBuf::from("/tmp/docqa-data"));
        assert_eq!(config.provider, "groq");
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.index_path(), PathBuf::from("/tmp/docqa-data/index.db"));
    }
}
