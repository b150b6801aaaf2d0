//! Ingest command handler.

use clap::Args;
use docqa_core::AppResult;
use docqa_retrieval::{load_document, RagEngine};
use std::path::PathBuf;

/// Ingest documents into the index
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Document files to ingest (.pdf, .txt, .md)
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, engine: &RagEngine) -> AppResult<()> {
        let mut results = Vec::new();

        for path in &self.paths {
            tracing::info!("Ingesting document {:?}", path);

            let document = load_document(path)?;
            let chunk_count = engine.ingest(&document).await?;
            results.push((document.name, chunk_count));
        }

        if self.json {
            let output = serde_json::json!({
                "documents": results
                    .iter()
                    .map(|(name, chunks)| serde_json::json!({
                        "name": name,
                        "chunks": chunks,
                    }))
                    .collect::<Vec<_>>(),
                "totalChunks": results.iter().map(|(_, c)| c).sum::<usize>(),
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
        } else {
            for (name, chunks) in &results {
                println!("Ingested '{}' ({} chunks)", name, chunks);
            }
        }

        Ok(())
    }
}
