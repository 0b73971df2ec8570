//! Splits-configuration handlers and split/give value movement.
//!
//! Structurally the Account-scoped twin of the streams handlers: the commit
//! carries a hash, receivers arrive separately citing it, and a hash change
//! prunes the previously materialized entries.

use alloy_primitives::{Address, B256, U256};
use tracing::debug;

use crate::asset::asset_id_for_token;
use crate::correlation::hash_key;
use crate::entity::SplitsEntry;
use crate::error::EngineError;
use crate::event::{Event, EventMeta};
use crate::store::RecordStore;

use super::Engine;

impl<S: RecordStore> Engine<S> {
    /// `SplitsSet`: commit a splits configuration for `account`.
    pub(crate) async fn apply_splits_set(
        &self,
        event: &Event,
        meta: &EventMeta,
        account_id: U256,
        receivers_hash: B256,
    ) -> Result<(), EngineError> {
        let account_id = account_id.to_string();
        let mut account = self
            .repo
            .account_or_create(&account_id, meta.block_timestamp)
            .await?;

        if account.splits_receivers_hash != Some(receivers_hash) {
            let stale = std::mem::take(&mut account.splits_entry_ids);
            for entry_id in &stale {
                self.repo.delete_splits_entry(entry_id).await?;
            }
            debug!(
                account = %account_id,
                pruned = stale.len(),
                "splits hash changed; stale receiver entries pruned"
            );
        }

        account.splits_receivers_hash = Some(receivers_hash);
        account.last_updated = meta.block_timestamp;
        self.repo.save_account(&account).await?;

        let commit_event_id = self.repo.log_event(event, meta).await?;
        self.repo
            .record_splits_commit(receivers_hash, &account_id, &commit_event_id)
            .await
    }

    /// `SplitsReceiverSeen`: correlate one splits receiver back to its
    /// pending commit.
    pub(crate) async fn apply_splits_receiver_seen(
        &self,
        event: &Event,
        meta: &EventMeta,
        receivers_hash: B256,
        receiver_id: U256,
        weight: u32,
    ) -> Result<(), EngineError> {
        let Some(mapping) = self.repo.splits_commit(receivers_hash).await? else {
            self.repo.log_event(event, meta).await?;
            return self.missing_correlation("splits", hash_key(receivers_hash));
        };

        let mut account = self
            .repo
            .account_or_create(&mapping.account_id, meta.block_timestamp)
            .await?;

        let receiver = receiver_id.to_string();
        let entry_id = SplitsEntry::id_for(&mapping.account_id, &receiver);
        let entry = SplitsEntry {
            id: entry_id.clone(),
            sender: mapping.account_id.clone(),
            receiver,
            weight,
        };
        self.repo.save_splits_entry(&entry).await?;

        if !account.splits_entry_ids.contains(&entry_id) {
            account.splits_entry_ids.push(entry_id);
        }
        account.last_updated = meta.block_timestamp;
        self.repo.save_account(&account).await?;

        let mut payload = serde_json::to_value(event)
            .map_err(|e| EngineError::Other(format!("encode event payload: {e}")))?;
        if let Some(fields) = payload.as_object_mut() {
            fields.insert("sender_account_id".into(), mapping.account_id.clone().into());
            fields.insert(
                "splits_set_event_id".into(),
                mapping.splits_set_event_id.clone().into(),
            );
        }
        self.repo.log_event_with_payload(event, meta, payload).await?;
        Ok(())
    }

    /// `Split`: the splitting account's splittable balance is zeroed, the
    /// receiver's is credited.
    pub(crate) async fn apply_split(
        &self,
        event: &Event,
        meta: &EventMeta,
        account_id: U256,
        receiver: U256,
        erc20: Address,
        amt: U256,
    ) -> Result<(), EngineError> {
        self.repo.log_event(event, meta).await?;

        let asset_id = asset_id_for_token(erc20);
        let mut sender_config = self
            .repo
            .asset_config_or_create(&account_id.to_string(), asset_id, meta.block_timestamp)
            .await?;
        sender_config.amount_splittable = U256::ZERO;
        sender_config.last_updated = meta.block_timestamp;
        self.repo.save_asset_config(&sender_config).await?;

        self.credit_splittable(&receiver.to_string(), asset_id, amt, meta.block_timestamp)
            .await
    }

    /// `Given`: a one-off gift lands on the splittable balance.
    pub(crate) async fn apply_given(
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
