//! History type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One persisted question/answer exchange within a session.
///
/// Created exactly once per successful answer; immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Ledger row id; also disambiguates turns sharing a timestamp
    pub id: i64,

    /// Session the turn belongs to (non-empty, caller-supplied)
    pub session_id: String,

    /// The user's question (non-empty)
    pub question: String,

    /// The generated answer (non-empty)
    pub answer: String,

    /// Creation time; ordering within a session follows this field
    pub timestamp: DateTime<Utc>,
}
