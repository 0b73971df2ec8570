//! SQLite record-store backend.
//!
//! Persists every record table to a single SQLite file. Uses `sqlx` with
//! WAL mode for concurrent read performance.
//!
//! # Usage
//! ```rust,no_run
//! use flowindex_storage::sqlite::SqliteRecordStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // File-backed (persistent)
//! let store = SqliteRecordStore::open("./flowindex.db").await?;
//!
//! // In-memory (tests / ephemeral)
//! let store = SqliteRecordStore::in_memory().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use flowindex_core::error::EngineError;
use flowindex_core::store::RecordStore;

/// SQLite-backed keyed-record store.
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Open (or create) a SQLite database at `path`.
    ///
    /// The path may be a plain file path (`"./flowindex.db"`) or a full
    /// SQLite URL (`"sqlite:./flowindex.db?mode=rwc"`).
    pub async fn open(path: &str) -> Result<Self, EngineError> {
        let url = if path.starts_with("sqlite:") {
            path.to_string()
        } else {
            format!("sqlite:{path}?mode=rwc")
        };

        let pool = SqlitePool::connect(&url)
            .await
            .map_err(|e| EngineError::Storage(e.to_string()))?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Open an in-memory SQLite database.
    ///
    /// All data is lost when the pool is dropped. Ideal for tests.
    pub async fn in_memory() -> Result<Self, EngineError> {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .map_err(|e| EngineError::Storage(e.to_string()))?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create the records table and enable WAL mode.
    async fn init_schema(&self) -> Result<(), EngineError> {
        // WAL mode for better concurrent read throughput
        sqlx::query("PRAGMA journal_mode=WAL;")
            .execute(&self.pool)
            .await
            .map_err(|e| EngineError::Storage(e.to_string()))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS records (
                tbl        TEXT    NOT NULL,
                id         TEXT    NOT NULL,
                body       TEXT    NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (tbl, id)
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| EngineError::Storage(e.to_string()))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_records_tbl ON records (tbl);")
            .execute(&self.pool)
            .await
            .map_err(|e| EngineError::Storage(e.to_string()))?;

        Ok(())
    }

    /// All ids currently present in a table, ordered.
    pub async fn ids_in(&self, table: &str) -> Result<Vec<String>, EngineError> {
        let rows = sqlx::query("SELECT id FROM records WHERE tbl = ? ORDER BY id")
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| EngineError::Storage(e.to_string()))?;

        Ok(rows.iter().map(|r| r.get::<String, _>("id")).collect())
    }

    /// Total number of records across all tables.
    pub async fn record_count(&self) -> Result<u64, EngineError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM records")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| EngineError::Storage(e.to_string()))?;

        let cnt: i64 = row.get("cnt");
        Ok(cnt as u64)
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn get(&self, table: &str, id: &str) -> Result<Option<Value>, EngineError> {
        let row = sqlx::query("SELECT body FROM records WHERE tbl = ? AND id = ?")
            .bind(table)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| EngineError::Storage(e.to_string()))?;

        match row {
            None => Ok(None),
            Some(row) => {
                let body: String = row.get("body");
                serde_json::from_str(&body)
                    .map(Some)
                    .map_err(|e| EngineError::Decode {
                        table: table.to_string(),
                        id: id.to_string(),
                        reason: e.to_string(),
                    })
            }
        }
    }

    async fn put(&self, table: &str, id: &str, body: Value) -> Result<(), EngineError> {
        let body = serde_json::to_string(&body)
            .map_err(|e| EngineError::Storage(e.to_string()))?;

        sqlx::query(
            "INSERT OR REPLACE INTO records (tbl, id, body, updated_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(table)
        .bind(id)
        .bind(&body)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| EngineError::Storage(e.to_string()))?;

        debug!(table, id, "record stored");
        Ok(())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), EngineError> {
        // Absent rows delete zero records, which is fine.
        sqlx::query("DELETE FROM records WHERE tbl = ? AND id = ?")
            .bind(table)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| EngineError::Storage(e.to_string()))?;

        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
