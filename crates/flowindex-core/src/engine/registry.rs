//! Secondary registries: account metadata, driver (app) addresses, NFT
//! sub-accounts, and immutable splits creation records.

use alloy_primitives::{Address, B256, U256};
use tracing::debug;

use crate::entity::{AccountMetadata, App, ImmutableSplitsCreated, NftSubAccount};
use crate::error::EngineError;
use crate::event::{Event, EventMeta};
use crate::store::RecordStore;

use super::Engine;

impl<S: RecordStore> Engine<S> {
    /// `AccountMetadataEmitted`: upsert the latest value for (account, key).
    pub(crate) async fn apply_account_metadata(
        &self,
        event: &Event,
        meta: &EventMeta,
        account_id: U256,
        key: B256,
        value: &[u8],
    ) -> Result<(), EngineError> {
        self.repo.log_event(event, meta).await?;

        let account_id = account_id.to_string();
        let metadata = AccountMetadata {
            id: AccountMetadata::id_for(&account_id, key),
            account_id,
            key,
            value: value.to_vec(),
            last_updated: meta.block_timestamp,
        };
        self.repo.save_account_metadata(&metadata).await
    }

    /// `DriverRegistered`: upsert the app record.
    pub(crate) async fn apply_driver_registered(
        &self,
        event: &Event,
        meta: &EventMeta,
        driver_id: u32,
        driver_addr: Address,
    ) -> Result<(), EngineError> {
        self.repo.log_event(event, meta).await?;

        let app = App {
            id: driver_id.to_string(),
            app_address: driver_addr,
            last_updated: meta.block_timestamp,
        };
        self.repo.save_app(&app).await
    }

    /// `DriverAddressUpdated`: update the app's address if it is registered;
    /// an update for an unknown driver is dropped.
    pub(crate) async fn apply_driver_address_updated(
        &self,
        event: &Event,
        meta: &EventMeta,
        driver_id: u32,
        new_driver_addr: Address,
    ) -> Result<(), EngineError> {
        self.repo.log_event(event, meta).await?;

        let id = driver_id.to_string();
        let Some(mut app) = self.repo.app(&id).await? else {
            debug!(driver = %id, "address update for unregistered driver; ignored");
            return Ok(());
        };
        app.app_address = new_driver_addr;
        app.last_updated = meta.block_timestamp;
        self.repo.save_app(&app).await
    }

    /// NFT sub-account `Transfer`: track the current owner; a zero-address
    /// `from` is a mint and records the original owner.
    pub(crate) async fn apply_nft_sub_account_transfer(
        &self,
        event: &Event,
        meta: &EventMeta,
        from: Address,
        to: Address,
        token_id: U256,
    ) -> Result<(), EngineError> {
        self.repo.log_event(event, meta).await?;

        let id = token_id.to_string();
        let mut sub = self
            .repo
            .nft_sub_account(&id)
            .await?
            .unwrap_or_else(|| NftSubAccount {
                id: id.clone(),
                owner_address: to,
                original_owner_address: None,
            });

        if from == Address::ZERO {
            sub.original_owner_address = Some(to);
        }
        sub.owner_address = to;
        self.repo.save_nft_sub_account(&sub).await
    }

    /// `CreatedSplits`: record the immutable splits configuration creation.
    pub(crate) async fn apply_created_splits(
        &self,
        event: &Event,
        meta: &EventMeta,
        account_id: U256,
        receivers_hash: B256,
    ) -> Result<(), EngineError> {
        self.repo.log_event(event, meta).await?;

        let account_id = account_id.to_string();
        let created = ImmutableSplitsCreated {
            id: ImmutableSplitsCreated::id_for(&account_id, receivers_hash),
            account_id,
            receivers_hash,
        };
        self.repo.save_immutable_splits(&created).await
    }
}
