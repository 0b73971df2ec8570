//! Withdrawal-stage handlers.

use alloy_primitives::{Address, U256};

use crate::asset::asset_id_for_token;
use crate::error::EngineError;
use crate::event::{Event, EventMeta};
use crate::store::RecordStore;

use super::Engine;

impl<S: RecordStore> Engine<S> {
    /// `Collectable`: funds past splitting accumulate until collected.
    pub(crate) async fn apply_collectable(
        &self,
        event: &Event,
        meta: &EventMeta,
        account_id: U256,
        erc20: Address,
        amt: U256,
    ) -> Result<(), EngineError> {
        self.repo.log_event(event, meta).await?;

        let mut config = self
            .repo
            .asset_config_or_create(
                &account_id.to_string(),
                asset_id_for_token(erc20),
                meta.block_timestamp,
            )
            .await?;
        config.amount_post_split_collectable += amt;
        config.last_updated = meta.block_timestamp;
        self.repo.save_asset_config(&config).await
    }

    /// `Collected`: the withdrawal itself. The lifetime total grows and the
    /// post-split collectable balance resets to zero. No other code path
    /// zeroes it.
    pub(crate) async fn apply_collected(
        &self,
        event: &Event,
        meta: &EventMeta,
        account_id: U256,
        erc20: Address,
        collected: U256,
    ) -> Result<(), EngineError> {
        self.repo.log_event(event, meta).await?;

        let mut config = self
            .repo
            .asset_config_or_create(
                &account_id.to_string(),
                asset_id_for_token(erc20),
                meta.block_timestamp,
            )
            .await?;
        config.amount_collected += collected;
        config.amount_post_split_collectable = U256::ZERO;
        config.last_updated = meta.block_timestamp;
        self.repo.save_asset_config(&config).await
    }
}
