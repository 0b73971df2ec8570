//! Two-phase ownership-claim state machine for repository-backed accounts.
//!
//! `OwnerUpdateRequested` creates or re-arms the record; `OwnerUpdated`
//! confirms it. Confirmation without a prior request is a protocol
//! violation and fails the event. `Claimed` is not terminal: a later
//! request re-enters `OwnerUpdateRequested`.

use alloy_primitives::{Address, U256};
use tracing::info;

use crate::entity::{RepoAccount, RepoAccountStatus};
use crate::error::EngineError;
use crate::event::{Event, EventMeta};
use crate::store::RecordStore;

use super::Engine;

impl<S: RecordStore> Engine<S> {
    /// `OwnerUpdateRequested`: create or update the record, clear the owner
    /// address pending the confirmation event.
    pub(crate) async fn apply_owner_update_requested(
        &self,
        event: &Event,
        meta: &EventMeta,
        account_id: U256,
        forge: u8,
        name: &[u8],
    ) -> Result<(), EngineError> {
        self.repo.log_event(event, meta).await?;

        let id = account_id.to_string();
        let account = RepoAccount {
            id: id.clone(),
            name: String::from_utf8_lossy(name).into_owned(),
            forge,
            owner_address: None,
            status: RepoAccountStatus::OwnerUpdateRequested,
            last_updated: meta.block_timestamp,
        };
        self.repo.save_repo_account(&account).await?;
        info!(repo_account = %id, "owner update requested");
        Ok(())
    }

    /// `OwnerUpdated`: confirm the claim. The record must already exist;
    /// a request event always precedes confirmation in well-formed traces.
    /// `name` and `forge` are left untouched.
    pub(crate) async fn apply_owner_updated(
        &self,
        event: &Event,
        meta: &EventMeta,
        account_id: U256,
        owner: Address,
    ) -> Result<(), EngineError> {
        self.repo.log_event(event, meta).await?;

        let id = account_id.to_string();
        let Some(mut account) = self.repo.repo_account(&id).await? else {
            return Err(EngineError::MissingPrerequisite {
                entity: "RepoAccount".to_string(),
                id,
                reason: "OwnerUpdated received before any OwnerUpdateRequested".to_string(),
            });
        };

        account.owner_address = Some(owner);
        account.status = RepoAccountStatus::Claimed;
        account.last_updated = meta.block_timestamp;
        self.repo.save_repo_account(&account).await?;
        info!(repo_account = %id, owner = %owner, "claim confirmed");
        Ok(())
    }
}
