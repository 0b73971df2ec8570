//! Storage backends for flowindex.
//!
//! The in-memory store lives in `flowindex-core` (it doubles as the test
//! store); this crate adds persistent backends.

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRecordStore;

pub use flowindex_core::store::{MemoryRecordStore, RecordStore};
