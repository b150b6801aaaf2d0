//! History store abstraction.

use crate::types::ChatTurn;
use docqa_core::AppResult;

/// Trait for chat history backends.
///
/// Implementations must guarantee that an append is atomic: a turn that
/// fails to persist is never visible to `query_recent`, in full or in
/// part. Reads and interleaved writes from concurrent requests must be
/// safe; no ordering is promised across concurrent appends to the same
/// session.
pub trait HistoryStore: Send + Sync {
    /// Append one completed question/answer turn for a session.
    ///
    /// Returns the stored turn with its assigned id and timestamp.
    fn append(&self, session_id: &str, question: &str, answer: &str) -> AppResult<ChatTurn>;

    /// Fetch at most `limit` turns for a session, most recent first.
    ///
    /// An unknown or empty session yields an empty list, not an error.
    /// Only turns whose `session_id` matches are ever returned.
    fn query_recent(&self, session_id: &str, limit: usize) -> AppResult<Vec<ChatTurn>>;
}
