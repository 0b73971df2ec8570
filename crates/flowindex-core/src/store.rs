//! The record store contract and an in-memory implementation.
//!
//! The engine treats the store as the sole persistence authority: a generic
//! table of JSON record bodies keyed by `(table, id)`, with single-record
//! atomicity and nothing more. Typed access lives in [`crate::repo`].

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::EngineError;

/// Table-name constants for every record kind the engine writes.
pub mod tables {
    pub const ACCOUNT: &str = "account";
    pub const ASSET_CONFIG: &str = "asset_config";
    pub const STREAMS_ENTRY: &str = "streams_entry";
    pub const SPLITS_ENTRY: &str = "splits_entry";
    pub const STREAMS_SET_MAPPING: &str = "last_streams_set";
    pub const SPLITS_SET_MAPPING: &str = "last_splits_set";
    pub const REPO_ACCOUNT: &str = "repo_account";
    pub const ACCOUNT_METADATA: &str = "account_metadata";
    pub const APP: &str = "app";
    pub const NFT_SUB_ACCOUNT: &str = "nft_sub_account";
    pub const IMMUTABLE_SPLITS: &str = "immutable_splits";
    pub const EVENT_LOG: &str = "event_log";

    /// Every table, for schema setup and introspection.
    pub const ALL: &[&str] = &[
        ACCOUNT,
        ASSET_CONFIG,
        STREAMS_ENTRY,
        SPLITS_ENTRY,
        STREAMS_SET_MAPPING,
        SPLITS_SET_MAPPING,
        REPO_ACCOUNT,
        ACCOUNT_METADATA,
        APP,
        NFT_SUB_ACCOUNT,
        IMMUTABLE_SPLITS,
        EVENT_LOG,
    ];
}

/// Generic persistent keyed-record store.
///
/// Implementations include [`MemoryRecordStore`] and the SQLite backend in
/// `flowindex-storage`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch a record body by table + id.
    async fn get(&self, table: &str, id: &str) -> Result<Option<Value>, EngineError>;

    /// Insert or overwrite a record body.
    async fn put(&self, table: &str, id: &str, body: Value) -> Result<(), EngineError>;

    /// Delete a record. Deleting an absent record is a no-op, not an error.
    async fn delete(&self, table: &str, id: &str) -> Result<(), EngineError>;
}

/// In-memory record store for tests and ephemeral runs.
///
/// All data is lost when the process exits.
#[derive(Default)]
pub struct MemoryRecordStore {
    data: Mutex<HashMap<String, Value>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(table: &str, id: &str) -> String {
        format!("{table}:{id}")
    }

    /// Total number of records across all tables.
    pub fn record_count(&self) -> usize {
        self.data.lock().unwrap().len()
    }

    /// All ids currently present in a table (unordered).
    pub fn ids_in(&self, table: &str) -> Vec<String> {
        let prefix = format!("{table}:");
        self.data
            .lock()
            .unwrap()
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, table: &str, id: &str) -> Result<Option<Value>, EngineError> {
        Ok(self.data.lock().unwrap().get(&Self::key(table, id)).cloned())
    }

    async fn put(&self, table: &str, id: &str, body: Value) -> Result<(), EngineError> {
        self.data.lock().unwrap().insert(Self::key(table, id), body);
        Ok(())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), EngineError> {
        self.data.lock().unwrap().remove(&Self::key(table, id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn put_get_roundtrip() {
        let store = MemoryRecordStore::new();
        store
            .put(tables::ACCOUNT, "1", json!({"id": "1"}))
            .await
            .unwrap();

        let body = store.get(tables::ACCOUNT, "1").await.unwrap().unwrap();
        assert_eq!(body["id"], "1");
        assert!(store.get(tables::ACCOUNT, "2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_overwrites() {
        let store = MemoryRecordStore::new();
        store.put(tables::APP, "9", json!({"v": 1})).await.unwrap();
        store.put(tables::APP, "9", json!({"v": 2})).await.unwrap();

        let body = store.get(tables::APP, "9").await.unwrap().unwrap();
        assert_eq!(body["v"], 2);
        assert_eq!(store.record_count(), 1);
    }

    #[tokio::test]
    async fn delete_absent_is_noop() {
        let store = MemoryRecordStore::new();
        store.delete(tables::STREAMS_ENTRY, "missing").await.unwrap();

        store
            .put(tables::STREAMS_ENTRY, "1-2-3", json!({}))
            .await
            .unwrap();
        store.delete(tables::STREAMS_ENTRY, "1-2-3").await.unwrap();
        assert!(store.get(tables::STREAMS_ENTRY, "1-2-3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn tables_are_isolated() {
        let store = MemoryRecordStore::new();
        store.put(tables::ACCOUNT, "1", json!({"a": 1})).await.unwrap();
        store.put(tables::ASSET_CONFIG, "1", json!({"b": 2})).await.unwrap();

        assert_eq!(store.ids_in(tables::ACCOUNT), vec!["1".to_string()]);
        let body = store.get(tables::ACCOUNT, "1").await.unwrap().unwrap();
        assert_eq!(body["a"], 1);
    }
}
