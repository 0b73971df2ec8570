//! flowindex-core: reconciliation engine for a token-streaming/splitting
//! protocol's event log.
//!
//! # Architecture
//!
//! ```text
//! log follower (external) → Engine::apply(event)
//!                               ├── Repository       (typed load-or-create over the record store)
//!                               ├── correlation maps (hash → pending commit descriptor)
//!                               ├── diff/prune       (stale receiver records on hash change)
//!                               └── balance ledgers  (splittable / collectable / collected)
//! ```
//!
//! Events arrive one at a time in (block, log index) order and are applied
//! synchronously against a [`store::RecordStore`]. There is no batching and
//! no out-of-order application.

pub mod asset;
pub mod correlation;
pub mod engine;
pub mod entity;
pub mod error;
pub mod event;
pub mod repo;
pub mod store;

pub use engine::{CorrelationPolicy, Engine, EngineConfig};
pub use entity::{Account, AssetConfig, RepoAccount, RepoAccountStatus, SplitsEntry, StreamsEntry};
pub use error::EngineError;
pub use event::{Event, EventMeta};
pub use repo::Repository;
pub use store::{MemoryRecordStore, RecordStore};
