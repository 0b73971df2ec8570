//! Typed repository over the record store.
//!
//! Wraps the generic `(table, id)` store with serde encoding and the
//! load-or-create helpers the reconciliation algorithms depend on. The
//! repository holds no cache; every read goes to the store.

use alloy_primitives::U256;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::entity::{
    Account, AccountMetadata, App, AssetConfig, EventLogEntry, ImmutableSplitsCreated,
    NftSubAccount, RepoAccount, SplitsEntry, StreamsEntry,
};
use crate::error::EngineError;
use crate::event::{Event, EventMeta};
use crate::store::{tables, RecordStore};

pub struct Repository<S> {
    store: S,
}

impl<S: RecordStore> Repository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub(crate) async fn load<T: DeserializeOwned>(
        &self,
        table: &str,
        id: &str,
    ) -> Result<Option<T>, EngineError> {
        match self.store.get(table, id).await? {
            None => Ok(None),
            Some(body) => serde_json::from_value(body)
                .map(Some)
                .map_err(|e| EngineError::Decode {
                    table: table.to_string(),
                    id: id.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    pub(crate) async fn save<T: Serialize>(
        &self,
        table: &str,
        id: &str,
        record: &T,
    ) -> Result<(), EngineError> {
        let body = serde_json::to_value(record)
            .map_err(|e| EngineError::Other(format!("encode {table} '{id}': {e}")))?;
        self.store.put(table, id, body).await
    }

    // ─── Account ────────────────────────────────────────────────────────────

    pub async fn account(&self, id: &str) -> Result<Option<Account>, EngineError> {
        self.load(tables::ACCOUNT, id).await
    }

    /// Load an account, creating (and persisting) it if absent.
    pub async fn account_or_create(
        &self,
        id: &str,
        timestamp: u64,
    ) -> Result<Account, EngineError> {
        if let Some(account) = self.account(id).await? {
            return Ok(account);
        }
        let account = Account::new(id, timestamp);
        self.save_account(&account).await?;
        debug!(account = id, "account created");
        Ok(account)
    }

    pub async fn save_account(&self, account: &Account) -> Result<(), EngineError> {
        self.save(tables::ACCOUNT, &account.id, account).await
    }

    // ─── AssetConfig ────────────────────────────────────────────────────────

    pub async fn asset_config(&self, id: &str) -> Result<Option<AssetConfig>, EngineError> {
        self.load(tables::ASSET_CONFIG, id).await
    }

    /// Load a `(account, asset)` ledger, creating it (and its owning
    /// account) if absent.
    pub async fn asset_config_or_create(
        &self,
        account_id: &str,
        asset_id: U256,
        timestamp: u64,
    ) -> Result<AssetConfig, EngineError> {
        self.account_or_create(account_id, timestamp).await?;

        let id = AssetConfig::id_for(account_id, asset_id);
        if let Some(config) = self.asset_config(&id).await? {
            return Ok(config);
        }
        let config = AssetConfig::new(account_id, asset_id, timestamp);
        self.save_asset_config(&config).await?;
        debug!(asset_config = %id, "asset config created");
        Ok(config)
    }

    pub async fn save_asset_config(&self, config: &AssetConfig) -> Result<(), EngineError> {
        self.save(tables::ASSET_CONFIG, &config.id, config).await
    }

    // ─── Receiver entries ───────────────────────────────────────────────────

    pub async fn streams_entry(&self, id: &str) -> Result<Option<StreamsEntry>, EngineError> {
        self.load(tables::STREAMS_ENTRY, id).await
    }

    pub async fn save_streams_entry(&self, entry: &StreamsEntry) -> Result<(), EngineError> {
        self.save(tables::STREAMS_ENTRY, &entry.id, entry).await
    }

    pub async fn delete_streams_entry(&self, id: &str) -> Result<(), EngineError> {
        self.store.delete(tables::STREAMS_ENTRY, id).await
    }

    pub async fn splits_entry(&self, id: &str) -> Result<Option<SplitsEntry>, EngineError> {
        self.load(tables::SPLITS_ENTRY, id).await
    }

    pub async fn save_splits_entry(&self, entry: &SplitsEntry) -> Result<(), EngineError> {
        self.save(tables::SPLITS_ENTRY, &entry.id, entry).await
    }

    pub async fn delete_splits_entry(&self, id: &str) -> Result<(), EngineError> {
        self.store.delete(tables::SPLITS_ENTRY, id).await
    }

    // ─── Claims ─────────────────────────────────────────────────────────────

    pub async fn repo_account(&self, id: &str) -> Result<Option<RepoAccount>, EngineError> {
        self.load(tables::REPO_ACCOUNT, id).await
    }

    pub async fn save_repo_account(&self, account: &RepoAccount) -> Result<(), EngineError> {
        self.save(tables::REPO_ACCOUNT, &account.id, account).await
    }

    // ─── Registry records ───────────────────────────────────────────────────

    pub async fn account_metadata(
        &self,
        id: &str,
    ) -> Result<Option<AccountMetadata>, EngineError> {
        self.load(tables::ACCOUNT_METADATA, id).await
    }

    pub async fn save_account_metadata(
        &self,
        metadata: &AccountMetadata,
    ) -> Result<(), EngineError> {
        self.save(tables::ACCOUNT_METADATA, &metadata.id, metadata).await
    }

    pub async fn app(&self, id: &str) -> Result<Option<App>, EngineError> {
        self.load(tables::APP, id).await
    }

    pub async fn save_app(&self, app: &App) -> Result<(), EngineError> {
        self.save(tables::APP, &app.id, app).await
    }

    pub async fn nft_sub_account(&self, id: &str) -> Result<Option<NftSubAccount>, EngineError> {
        self.load(tables::NFT_SUB_ACCOUNT, id).await
    }

    pub async fn save_nft_sub_account(&self, sub: &NftSubAccount) -> Result<(), EngineError> {
        self.save(tables::NFT_SUB_ACCOUNT, &sub.id, sub).await
    }

    pub async fn save_immutable_splits(
        &self,
        created: &ImmutableSplitsCreated,
    ) -> Result<(), EngineError> {
        self.save(tables::IMMUTABLE_SPLITS, &created.id, created).await
    }

    // ─── Audit log ──────────────────────────────────────────────────────────

    pub async fn event_log_entry(&self, id: &str) -> Result<Option<EventLogEntry>, EngineError> {
        self.load(tables::EVENT_LOG, id).await
    }

    /// Append the immutable audit record for `event`. The payload is the
    /// verbatim event fields; callers may extend it with correlation context
    /// before writing via [`Repository::log_event_with_payload`].
    pub async fn log_event(&self, event: &Event, meta: &EventMeta) -> Result<String, EngineError> {
        let payload = serde_json::to_value(event)
            .map_err(|e| EngineError::Other(format!("encode event payload: {e}")))?;
        self.log_event_with_payload(event, meta, payload).await
    }

    pub async fn log_event_with_payload(
        &self,
        event: &Event,
        meta: &EventMeta,
        payload: serde_json::Value,
    ) -> Result<String, EngineError> {
        let entry = EventLogEntry {
            id: meta.record_id(),
            kind: event.kind().to_string(),
            block_number: meta.block_number,
            block_timestamp: meta.block_timestamp,
            payload,
        };
        self.save(tables::EVENT_LOG, &entry.id, &entry).await?;
        Ok(entry.id)
    }
}
