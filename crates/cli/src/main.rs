//! Docqa CLI
//!
//! Main entry point for the docqa command-line tool.
//! Provides document ingestion and retrieval-augmented question answering.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, HistoryCommand, IngestCommand};
use docqa_core::{config::AppConfig, logging, AppResult};
use docqa_history::SqliteHistoryStore;
use docqa_llm::create_client;
use docqa_retrieval::embeddings::create_provider;
use docqa_retrieval::{RagEngine, SqliteIndex};
use std::path::PathBuf;
use std::sync::Arc;

/// Docqa CLI - document question answering with local-first RAG
#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(about = "Ask questions about your documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding the index and history databases
    #[arg(short, long, global = true, env = "DOCQA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "DOCQA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generation provider (ollama, groq)
    #[arg(short, long, global = true, env = "DOCQA_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "DOCQA_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ingest documents into the index
    Ingest(IngestCommand),

    /// Ask a question about ingested documents
    Ask(AskCommand),

    /// Show the conversation history of a session
    History(HistoryCommand),
}

/// Build the answering engine from configuration.
///
/// All pipeline resources are constructed here, once, and handed to the
/// commands that need them; nothing is created lazily behind a global.
fn build_engine(config: &AppConfig) -> AppResult<RagEngine> {
    let embedder = create_provider(
        &config.embedding_provider,
        &config.embedding_model,
        config.embedding_dimensions,
        config.endpoint.as_deref(),
    )?;
    let index = Arc::new(SqliteIndex::open(&config.index_path())?);
    let llm = create_client(
        &config.provider,
        config.endpoint.as_deref(),
        config.api_key.as_deref(),
    )?;

    RagEngine::new(
        config.retrieval.clone(),
        config.model.clone(),
        embedder,
        index,
        llm,
    )
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment
    let config = AppConfig::load()?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.data_dir,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::debug!("Data directory: {:?}", config.data_dir);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.ensure_data_dir()?;

    let command_name = match &cli.command {
        Commands::Ingest(_) => "ingest",
        Commands::Ask(_) => "ask",
        Commands::History(_) => "history",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let store = SqliteHistoryStore::open(&config.history_path())?;

    // Route to command handlers
    let result = match cli.command {
        Commands::Ingest(cmd) => {
            let engine = build_engine(&config)?;
            cmd.execute(&engine).await
        }
        Commands::Ask(cmd) => {
            let engine = build_engine(&config)?;
            cmd.execute(&engine, &store).await
        }
        Commands::History(cmd) => cmd.execute(&store),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
