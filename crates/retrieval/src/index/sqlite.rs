//! SQLite-backed vector index.

use crate::index::{IndexedDocument, Metric, SearchHit, VectorIndex};
use crate::score::cosine_similarity;
use crate::types::Chunk;
use docqa_core::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// Vector index backed by a SQLite database.
///
/// Collections record their dimensionality and metric so idempotent
/// creation is an explicit parameter comparison, not attempt-and-ignore.
/// Scoring is a full scan over the collection; adequate for the
/// single-process document sets this system targets.
pub struct SqliteIndex {
    conn: Mutex<Connection>,
}

impl SqliteIndex {
    /// Open (or create) the index database at the given path.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Index(format!("Failed to create index directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Index(format!("Failed to open vector index: {}", e)))?;

        Self::init(conn)
    }

    /// Open an in-memory index (used in tests and ephemeral sessions).
    pub fn in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Index(format!("Failed to open in-memory index: {}", e)))?;

        Self::init(conn)
    }

    fn init(conn: Connection) -> AppResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY,
                dimensions INTEGER NOT NULL,
                metric TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                text TEXT NOT NULL,
                metadata TEXT NOT NULL,
                embedding BLOB NOT NULL,
                FOREIGN KEY (collection) REFERENCES collections(name)
            );

            CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
            "#,
        )
        .map_err(|e| AppError::Index(format!("Failed to create index tables: {}", e)))?;

        tracing::debug!("Initialized SQLite vector index");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Index("Vector index lock poisoned".to_string()))
    }

    /// Look up a collection's (dimensions, metric), if it exists.
    fn collection_params(
        conn: &Connection,
        name: &str,
    ) -> AppResult<Option<(usize, String)>> {
        conn.query_row(
            "SELECT dimensions, metric FROM collections WHERE name = ?1",
            params![name],
            |row| {
                let dimensions: i64 = row.get(0)?;
                let metric: String = row.get(1)?;
                Ok((dimensions as usize, metric))
            },
        )
        .optional()
        .map_err(|e| AppError::Index(format!("Failed to query collection: {}", e)))
    }
}

impl VectorIndex for SqliteIndex {
    fn ensure_collection(&self, name: &str, dimensions: usize, metric: Metric) -> AppResult<()> {
        let conn = self.lock()?;

        // Explicit idempotency: compare existing parameters instead of
        // attempting creation and swallowing the failure.
        if let Some((existing_dimensions, existing_metric)) =
            Self::collection_params(&conn, name)?
        {
            if existing_dimensions == dimensions && existing_metric == metric.as_str() {
                return Ok(());
            }
            return Err(AppError::CollectionConflict {
                name: name.to_string(),
                existing_dimensions,
                existing_metric,
                requested_dimensions: dimensions,
                requested_metric: metric.as_str().to_string(),
            });
        }

        conn.execute(
            "INSERT INTO collections (name, dimensions, metric) VALUES (?1, ?2, ?3)",
            params![name, dimensions as i64, metric.as_str()],
        )
        .map_err(|e| AppError::Index(format!("Failed to create collection: {}", e)))?;

        tracing::info!(collection = name, dimensions, "Created collection");
        Ok(())
    }

    fn insert(&self, collection: &str, documents: &[IndexedDocument]) -> AppResult<()> {
        if documents.is_empty() {
            return Ok(());
        }

        let mut conn = self.lock()?;

        let (dimensions, _) = Self::collection_params(&conn, collection)?
            .ok_or_else(|| AppError::Index(format!("Unknown collection '{}'", collection)))?;

        for document in documents {
            if document.embedding.len() != dimensions {
                return Err(AppError::Index(format!(
                    "Embedding has {} dimensions, collection '{}' expects {}",
                    document.embedding.len(),
                    collection,
                    dimensions
                )));
            }
        }

        // One transaction per batch: a failed ingest leaves no partial
        // chunks behind with this backend.
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Index(format!("Failed to begin transaction: {}", e)))?;

        for document in documents {
            let metadata_json = serde_json::to_string(&document.chunk.metadata)
                .map_err(|e| AppError::Index(format!("Failed to serialize metadata: {}", e)))?;

            tx.execute(
                "INSERT INTO documents (collection, text, metadata, embedding)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    collection,
                    document.chunk.text,
                    metadata_json,
                    embedding_to_bytes(&document.embedding),
                ],
            )
            .map_err(|e| AppError::Index(format!("Failed to insert document: {}", e)))?;
        }

        tx.commit()
            .map_err(|e| AppError::Index(format!("Failed to commit insert: {}", e)))?;

        tracing::debug!(
            collection,
            count = documents.len(),
            "Inserted documents into index"
        );
        Ok(())
    }

    fn search(&self, collection: &str, query: &[f32], k: usize) -> AppResult<Vec<SearchHit>> {
        if k == 0 {
            return Err(AppError::Index("k must be positive".to_string()));
        }

        let conn = self.lock()?;

        let (dimensions, _) = Self::collection_params(&conn, collection)?
            .ok_or_else(|| AppError::Index(format!("Unknown collection '{}'", collection)))?;

        if query.len() != dimensions {
            return Err(AppError::Index(format!(
                "Query has {} dimensions, collection '{}' expects {}",
                query.len(),
                collection,
                dimensions
            )));
        }

        let mut stmt = conn
            .prepare(
                "SELECT text, metadata, embedding FROM documents
                 WHERE collection = ?1 ORDER BY id ASC",
            )
            .map_err(|e| AppError::Index(format!("Failed to prepare search: {}", e)))?;

        let rows = stmt
            .query_map(params![collection], |row| {
                let text: String = row.get(0)?;
                let metadata_json: String = row.get(1)?;
                let embedding_bytes: Vec<u8> = row.get(2)?;
                Ok((text, metadata_json, embedding_bytes))
            })
            .map_err(|e| AppError::Index(format!("Failed to query documents: {}", e)))?;

        let mut hits = Vec::new();
        for row in rows {
            let (text, metadata_json, embedding_bytes) =
                row.map_err(|e| AppError::Index(format!("Failed to read document row: {}", e)))?;

            let metadata = serde_json::from_str(&metadata_json)
                .map_err(|e| AppError::Index(format!("Failed to parse metadata: {}", e)))?;
            let embedding = bytes_to_embedding(&embedding_bytes)?;

            let score = cosine_similarity(query, &embedding);
            hits.push(SearchHit {
                chunk: Chunk { text, metadata },
                score,
            });
        }

        // Stable sort keyed on score only: exact ties keep insertion
        // order, so results are reproducible across runs.
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);

        tracing::debug!(
            collection,
            result_count = hits.len(),
            requested = k,
            "Vector search completed"
        );

        Ok(hits)
    }
}

/// Convert an embedding vector to little-endian bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert stored bytes back to an embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Index(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    let mut embedding = Vec::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        embedding.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }

    Ok(embedding)
}
