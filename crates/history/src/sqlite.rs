//! SQLite-backed chat history store.

use crate::store::HistoryStore;
use crate::types::ChatTurn;
use chrono::{DateTime, Utc};
use docqa_core::{AppError, AppResult};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

/// Chat history ledger backed by a SQLite database.
///
/// The connection is wrapped in a mutex so the store can be shared across
/// concurrent requests; each append runs inside a transaction, so a
/// half-written turn is never observable.
pub struct SqliteHistoryStore {
    conn: Mutex<Connection>,
}

impl SqliteHistoryStore {
    /// Open (or create) the history database at the given path.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Persistence(format!("Failed to create history directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Persistence(format!("Failed to open history store: {}", e)))?;

        Self::init(conn)
    }

    /// Open an in-memory history database (used in tests).
    pub fn in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            AppError::Persistence(format!("Failed to open in-memory history store: {}", e))
        })?;

        Self::init(conn)
    }

    fn init(conn: Connection) -> AppResult<Self> {
        // Non-empty constraints mirror the answer pipeline's validation so
        // a malformed turn can never reach the ledger.
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS chat_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL CHECK(length(session_id) > 0),
                question TEXT NOT NULL CHECK(length(question) > 0),
                answer TEXT NOT NULL CHECK(length(answer) > 0),
                timestamp TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chat_history_session ON chat_history(session_id);
            "#,
        )
        .map_err(|e| AppError::Persistence(format!("Failed to create history tables: {}", e)))?;

        tracing::debug!("Initialized chat history store");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Persistence("History store lock poisoned".to_string()))
    }
}

impl HistoryStore for SqliteHistoryStore {
    fn append(&self, session_id: &str, question: &str, answer: &str) -> AppResult<ChatTurn> {
        let timestamp = Utc::now();
        let mut conn = self.lock()?;

        let tx = conn
            .transaction()
            .map_err(|e| AppError::Persistence(format!("Failed to begin transaction: {}", e)))?;

        tx.execute(
            "INSERT INTO chat_history (session_id, question, answer, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![session_id, question, answer, timestamp.to_rfc3339()],
        )
        .map_err(|e| AppError::Persistence(format!("Failed to append chat turn: {}", e)))?;

        let id = tx.last_insert_rowid();

        tx.commit()
            .map_err(|e| AppError::Persistence(format!("Failed to commit chat turn: {}", e)))?;

        tracing::debug!(session_id, turn_id = id, "Appended chat turn");

        Ok(ChatTurn {
            id,
            session_id: session_id.to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
            timestamp,
        })
    }

    fn query_recent(&self, session_id: &str, limit: usize) -> AppResult<Vec<ChatTurn>> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, session_id, question, answer, timestamp
                 FROM chat_history
                 WHERE session_id = ?1
                 ORDER BY timestamp DESC, id DESC
                 LIMIT ?2",
            )
            .map_err(|e| AppError::Persistence(format!("Failed to prepare history query: {}", e)))?;

        let turns = stmt
            .query_map(params![session_id, limit as i64], |row| {
                let timestamp: String = row.get(4)?;
                let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            4,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;

                Ok(ChatTurn {
                    id: row.get(0)?,
                    session_id: row.get(1)?,
                    question: row.get(2)?,
                    answer: row.get(3)?,
                    timestamp,
                })
            })
            .map_err(|e| AppError::Persistence(format!("Failed to query history: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Persistence(format!("Failed to read history rows: {}", e)))?;

        Ok(turns)
    }
}
