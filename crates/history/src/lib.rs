//! Conversation history ledger for the docqa system.
//!
//! A session is identified by a caller-supplied opaque string and exists
//! implicitly as the set of turns sharing that id. Turns are append-only:
//! the pipeline writes each successful question/answer pair exactly once
//! and never updates or deletes existing turns.

pub mod sqlite;
pub mod store;
pub mod types;

pub use sqlite::SqliteHistoryStore;
pub use store::HistoryStore;
pub use types::ChatTurn;
