//! The reconciliation engine.
//!
//! One event at a time, applied synchronously to completion against the
//! record store. Handlers own the hash-correlation bookkeeping, the
//! diff/prune of stale receiver records, and the running balance ledgers.
//! Upstream ordering (non-decreasing (block, log index), commits before
//! their receiver-seen events) is a trusted precondition, not something the
//! engine corrects.

mod claims;
mod collect;
mod registry;
mod splits;
mod streams;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::EngineError;
use crate::event::{Event, EventMeta};
use crate::repo::Repository;
use crate::store::RecordStore;

/// What to do with a receiver-seen event whose hash has no pending commit.
///
/// The audit record is persisted either way; the policy only decides whether
/// processing continues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrelationPolicy {
    /// Log a warning and skip the ledger mutation.
    #[default]
    Skip,
    /// Fail the event with [`EngineError::MissingCorrelation`].
    Reject,
}

/// Engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub correlation_policy: CorrelationPolicy,
}

/// Applies decoded protocol events against a record store.
pub struct Engine<S> {
    repo: Repository<S>,
    config: EngineConfig,
    /// Last applied (block number, log index), for the order guard.
    last_position: Option<(u64, u32)>,
}

impl<S: RecordStore> Engine<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: S, config: EngineConfig) -> Self {
        Self {
            repo: Repository::new(store),
            config,
            last_position: None,
        }
    }

    /// The underlying typed repository (for queries and tests).
    pub fn repository(&self) -> &Repository<S> {
        &self.repo
    }

    /// Apply one event to completion.
    ///
    /// Every event writes its append-only audit record; most additionally
    /// create or mutate state records. Errors abort the event as a whole.
    pub async fn apply(&mut self, event: &Event, meta: &EventMeta) -> Result<(), EngineError> {
        self.guard_order(meta);

        match event {
            Event::StreamsSet {
                account_id,
                erc20,
                receivers_hash,
                balance,
                ..
            } => {
                self.apply_streams_set(event, meta, *account_id, *erc20, *receivers_hash, *balance)
                    .await
            }
            Event::StreamReceiverSeen {
                receivers_hash,
                account_id,
                config,
            } => {
                self.apply_stream_receiver_seen(event, meta, *receivers_hash, *account_id, *config)
                    .await
            }
            Event::ReceivedStreams {
                account_id,
                erc20,
                amt,
                ..
            } => self.apply_stream_income(event, meta, *account_id, *erc20, *amt).await,
            Event::SqueezedStreams {
                account_id,
                erc20,
                amt,
                ..
            } => self.apply_stream_income(event, meta, *account_id, *erc20, *amt).await,
            Event::SplitsSet {
                account_id,
                receivers_hash,
            } => self.apply_splits_set(event, meta, *account_id, *receivers_hash).await,
            Event::SplitsReceiverSeen {
                receivers_hash,
                account_id,
                weight,
            } => {
                self.apply_splits_receiver_seen(event, meta, *receivers_hash, *account_id, *weight)
                    .await
            }
            Event::Split {
                account_id,
                receiver,
                erc20,
                amt,
            } => self.apply_split(event, meta, *account_id, *receiver, *erc20, *amt).await,
            Event::Given {
                account_id, erc20, amt, ..
            } => self.apply_given(event, meta, *account_id, *erc20, *amt).await,
            Event::Collectable {
                account_id,
                erc20,
                amt,
            } => self.apply_collectable(event, meta, *account_id, *erc20, *amt).await,
            Event::Collected {
                account_id,
                erc20,
                collected,
            } => self.apply_collected(event, meta, *account_id, *erc20, *collected).await,
            Event::AccountMetadataEmitted {
                account_id,
                key,
                value,
            } => {
                self.apply_account_metadata(event, meta, *account_id, *key, value)
                    .await
            }
            Event::DriverRegistered {
                driver_id,
                driver_addr,
            } => self.apply_driver_registered(event, meta, *driver_id, *driver_addr).await,
            Event::DriverAddressUpdated {
                driver_id,
                new_driver_addr,
            } => {
                self.apply_driver_address_updated(event, meta, *driver_id, *new_driver_addr)
                    .await
            }
            Event::NftSubAccountTransfer { from, to, token_id } => {
                self.apply_nft_sub_account_transfer(event, meta, *from, *to, *token_id)
                    .await
            }
            Event::CreatedSplits {
                account_id,
                receivers_hash,
            } => self.apply_created_splits(event, meta, *account_id, *receivers_hash).await,
            Event::OwnerUpdateRequested {
                account_id,
                forge,
                name,
            } => {
                self.apply_owner_update_requested(event, meta, *account_id, *forge, name)
                    .await
            }
            Event::OwnerUpdated { account_id, owner } => {
                self.apply_owner_updated(event, meta, *account_id, *owner).await
            }
        }
    }

    fn guard_order(&mut self, meta: &EventMeta) {
        let position = (meta.block_number, meta.log_index);
        if let Some(last) = self.last_position {
            if position < last {
                warn!(
                    block = meta.block_number,
                    log_index = meta.log_index,
                    last_block = last.0,
                    last_log_index = last.1,
                    "event delivered out of order; upstream ordering guarantee violated"
                );
            }
        }
        self.last_position = Some(position);
    }

    /// Accumulate `amt` onto the splittable balance of `(account, asset)`.
    /// Shared by `ReceivedStreams`, `SqueezedStreams`, `Given`, and the
    /// receiver side of `Split`.
    pub(crate) async fn credit_splittable(
        &self,
        account_id: &str,
        asset_id: U256,
        amt: U256,
        timestamp: u64,
    ) -> Result<(), EngineError> {
        let mut config = self
            .repo
            .asset_config_or_create(account_id, asset_id, timestamp)
            .await?;
        config.amount_splittable += amt;
        config.last_updated = timestamp;
        self.repo.save_asset_config(&config).await
    }

    /// Missing-correlation exit shared by both receiver-seen handlers: the
    /// audit record has already been written.
    pub(crate) fn missing_correlation(
        &self,
        kind: &str,
        hash_key: String,
    ) -> Result<(), EngineError> {
        match self.config.correlation_policy {
            CorrelationPolicy::Skip => {
                warn!(kind, hash = %hash_key, "receiver seen with no pending commit; skipping");
                Ok(())
            }
            CorrelationPolicy::Reject => Err(EngineError::MissingCorrelation {
                kind: kind.to_string(),
                hash: hash_key,
            }),
        }
    }
}
