//! Hash-keyed correlation tables.
//!
//! A configuration commit carries only a content hash; the receiver records
//! for that configuration arrive later as separate events citing the same
//! hash and nothing else. These tables thread the owner (and asset) identity
//! through: each commit unconditionally overwrites the entry for its hash,
//! and each receiver-seen event looks the entry up. Last writer wins, with
//! no expiry and no reference counting: stale entries are only ever
//! consulted by events that cite a hash no longer in use, which well-formed
//! traces do not produce.

use alloy_primitives::{B256, U256};
use tracing::debug;

use crate::entity::{SplitsSetMapping, StreamsSetMapping};
use crate::error::EngineError;
use crate::repo::Repository;
use crate::store::{tables, RecordStore};

/// Store key for a configuration hash: `0x…` lowercase hex.
pub fn hash_key(hash: B256) -> String {
    format!("{hash:#x}")
}

impl<S: RecordStore> Repository<S> {
    /// Record a streaming-configuration commit for `hash`, overwriting any
    /// previous entry.
    pub async fn record_streams_commit(
        &self,
        hash: B256,
        account_id: &str,
        asset_id: U256,
        commit_event_id: &str,
    ) -> Result<(), EngineError> {
        let mapping = StreamsSetMapping {
            streams_set_event_id: commit_event_id.to_string(),
            account_id: account_id.to_string(),
            asset_id,
        };
        let key = hash_key(hash);
        self.save(tables::STREAMS_SET_MAPPING, &key, &mapping).await?;
        debug!(hash = %key, account = account_id, "streams commit recorded");
        Ok(())
    }

    /// Most recent streaming commit for `hash`, if any.
    pub async fn streams_commit(
        &self,
        hash: B256,
    ) -> Result<Option<StreamsSetMapping>, EngineError> {
        self.load(tables::STREAMS_SET_MAPPING, &hash_key(hash)).await
    }

    /// Record a splits-configuration commit for `hash`, overwriting any
    /// previous entry.
    pub async fn record_splits_commit(
        &self,
        hash: B256,
        account_id: &str,
        commit_event_id: &str,
    ) -> Result<(), EngineError> {
        let mapping = SplitsSetMapping {
            splits_set_event_id: commit_event_id.to_string(),
            account_id: account_id.to_string(),
        };
        let key = hash_key(hash);
        self.save(tables::SPLITS_SET_MAPPING, &key, &mapping).await?;
        debug!(hash = %key, account = account_id, "splits commit recorded");
        Ok(())
    }

    /// Most recent splits commit for `hash`, if any.
    pub async fn splits_commit(
        &self,
        hash: B256,
    ) -> Result<Option<SplitsSetMapping>, EngineError> {
        self.load(tables::SPLITS_SET_MAPPING, &hash_key(hash)).await
    }
}
