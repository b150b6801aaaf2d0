//! Command handlers for the docqa CLI.

mod ask;
mod history;
mod ingest;

pub use ask::AskCommand;
pub use history::HistoryCommand;
pub use ingest::IngestCommand;
