//! Streaming-configuration handlers: commit, receiver correlation, and
//! stream income.

use alloy_primitives::{Address, B256, U256};
use tracing::debug;

use crate::asset::asset_id_for_token;
use crate::correlation::hash_key;
use crate::entity::{AssetConfig, StreamsEntry};
use crate::error::EngineError;
use crate::event::{Event, EventMeta};
use crate::store::RecordStore;

use super::Engine;

impl<S: RecordStore> Engine<S> {
    /// `StreamsSet`: commit a streaming configuration for `(account, token)`.
    ///
    /// If the committed hash differs from the ledger's current one, every
    /// materialized receiver record is deleted and the id list emptied; the
    /// receiver-seen events that follow repopulate it. A hash-equal commit
    /// leaves the list untouched (balance and timestamp still refresh).
    pub(crate) async fn apply_streams_set(
        &self,
        event: &Event,
        meta: &EventMeta,
        account_id: U256,
        erc20: Address,
        receivers_hash: B256,
        balance: U256,
    ) -> Result<(), EngineError> {
        let account_id = account_id.to_string();
        self.repo
            .account_or_create(&account_id, meta.block_timestamp)
            .await?;

        let asset_id = asset_id_for_token(erc20);
        let config_id = AssetConfig::id_for(&account_id, asset_id);
        let mut config = match self.repo.asset_config(&config_id).await? {
            None => AssetConfig::new(&account_id, asset_id, meta.block_timestamp),
            Some(mut config) => {
                if config.streams_hash != Some(receivers_hash) {
                    let stale = std::mem::take(&mut config.streams_entry_ids);
                    for entry_id in &stale {
                        self.repo.delete_streams_entry(entry_id).await?;
                    }
                    debug!(
                        asset_config = %config_id,
                        pruned = stale.len(),
                        "streams hash changed; stale receiver entries pruned"
                    );
                }
                config
            }
        };

        config.balance = balance;
        config.streams_hash = Some(receivers_hash);
        config.last_updated = meta.block_timestamp;
        self.repo.save_asset_config(&config).await?;

        let commit_event_id = self.repo.log_event(event, meta).await?;
        self.repo
            .record_streams_commit(receivers_hash, &account_id, asset_id, &commit_event_id)
            .await
    }

    /// `StreamReceiverSeen`: correlate one receiver back to the pending
    /// commit that shares its hash and materialize the receiver record.
    pub(crate) async fn apply_stream_receiver_seen(
        &self,
        event: &Event,
        meta: &EventMeta,
        receivers_hash: B256,
        receiver_id: U256,
        stream_config: U256,
    ) -> Result<(), EngineError> {
        let Some(mapping) = self.repo.streams_commit(receivers_hash).await? else {
            self.repo.log_event(event, meta).await?;
            return self.missing_correlation("streams", hash_key(receivers_hash));
        };

        let mut config = self
            .repo
            .asset_config_or_create(&mapping.account_id, mapping.asset_id, meta.block_timestamp)
            .await?;

        let receiver = receiver_id.to_string();
        let entry_id = StreamsEntry::id_for(&mapping.account_id, &receiver, mapping.asset_id);
        let entry = StreamsEntry {
            id: entry_id.clone(),
            sender: mapping.account_id.clone(),
            receiver,
            config: stream_config,
            sender_asset_config: config.id.clone(),
        };
        self.repo.save_streams_entry(&entry).await?;

        // Duplicate receiver-seen events for the same id must not create
        // duplicate list entries.
        if !config.streams_entry_ids.contains(&entry_id) {
            config.streams_entry_ids.push(entry_id);
        }
        config.last_updated = meta.block_timestamp;
        self.repo.save_asset_config(&config).await?;

        let mut payload = serde_json::to_value(event)
            .map_err(|e| EngineError::Other(format!("encode event payload: {e}")))?;
        if let Some(fields) = payload.as_object_mut() {
            fields.insert("sender_account_id".into(), mapping.account_id.clone().into());
            fields.insert(
                "streams_set_event_id".into(),
                mapping.streams_set_event_id.clone().into(),
            );
        }
        self.repo.log_event_with_payload(event, meta, payload).await?;
        Ok(())
    }

    /// `ReceivedStreams` / `SqueezedStreams`: stream income lands on the
    /// receiving account's splittable balance.
    pub(crate) async fn apply_stream_income(
        &self,
        event: &Event,
        meta: &EventMeta,
        account_id: U256,
        erc20: Address,
        amt: U256,
    ) -> Result<(), EngineError> {
        self.repo.log_event(event, meta).await?;
        self.credit_splittable(
            &account_id.to_string(),
            asset_id_for_token(erc20),
            amt,
            meta.block_timestamp,
        )
        .await
    }
}
