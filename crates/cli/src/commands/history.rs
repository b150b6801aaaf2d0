//! History command handler.

use clap::Args;
use docqa_core::AppResult;
use docqa_history::HistoryStore;

/// Show the conversation history of a session
#[derive(Args, Debug)]
pub struct HistoryCommand {
    /// Session id to show
    pub session: String,

    /// Maximum number of turns to show
    #[arg(short = 'n', long, default_value = "10")]
    pub limit: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl HistoryCommand {
    pub fn execute(&self, store: &dyn HistoryStore) -> AppResult<()> {
        // Most recent first, matching the store's ordering
        let turns = store.query_recent(&self.session, self.limit)?;

        if self.json {
            let output = serde_json::json!({
                "session": self.session,
                "turns": turns
                    .iter()
                    .map(|turn| serde_json::json!({
                        "question": turn.question,
                        "answer": turn.answer,
                        "timestamp": turn.timestamp.to_rfc3339(),
                    }))
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
        } else if turns.is_empty() {
            println!("No history for session '{}'", self.session);
        } else {
            for turn in &turns {
                println!("[{}]", turn.timestamp.format("%Y-%m-%d %H:%M:%S"));
                println!("Q: {}", turn.question);
                println!("A: {}", turn.answer);
                println!();
            }
        }

        Ok(())
    }
}
