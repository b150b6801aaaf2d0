//! Ask command handler.

use clap::Args;
use docqa_core::AppResult;
use docqa_history::HistoryStore;
use docqa_retrieval::RagEngine;
use std::io::Write;
use uuid::Uuid;

/// Ask a question about ingested documents
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Session id for conversational context (new session if omitted)
    #[arg(short, long)]
    pub session: Option<String>,

    /// Print the answer incrementally as the model generates it
    #[arg(long, conflicts_with = "json")]
    pub stream: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, engine: &RagEngine, store: &dyn HistoryStore) -> AppResult<()> {
        let session_id = self
            .session
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        tracing::info!(session_id = %session_id, "Answering question");

        if self.stream {
            let mut stdout = std::io::stdout();
            let mut print_chunk = |chunk: &str| {
                print!("{}", chunk);
                let _ = stdout.flush();
            };
            let outcome = engine
                .answer_stream(&self.question, &session_id, store, &mut print_chunk)
                .await?;

            println!();
            println!();
            println!("Session: {}", outcome.session_id);
            return Ok(());
        }

        let outcome = engine.answer(&self.question, &session_id, store).await?;

        if self.json {
            let output = serde_json::json!({
                "answer": outcome.answer,
                "sessionId": outcome.session_id,
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
        } else {
            println!("{}", outcome.answer);
            println!();
            println!("Session: {}", outcome.session_id);
        }

        Ok(())
    }
}
