//! Persisted records mirroring protocol state.
//!
//! Every record is a plain serde struct; creation is a pure function of the
//! id parts plus a block timestamp so the reconciliation algorithms stay
//! testable without a live store. Records carry their own id for convenience
//! even though the store keys them externally.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// One protocol account. Created lazily on first reference, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Decimal-string-encoded account id.
    pub id: String,
    /// Current splits-configuration hash; `None` = never set.
    pub splits_receivers_hash: Option<B256>,
    /// Ids of the materialized [`SplitsEntry`] records for the current hash.
    pub splits_entry_ids: Vec<String>,
    /// Block timestamp of the last update (seconds since epoch).
    pub last_updated: u64,
}

impl Account {
    pub fn new(id: impl Into<String>, timestamp: u64) -> Self {
        Self {
            id: id.into(),
            splits_receivers_hash: None,
            splits_entry_ids: Vec::new(),
            last_updated: timestamp,
        }
    }
}

/// Per-(account, asset) ledger. Created lazily, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfig {
    /// `"{account}-{asset}"`.
    pub id: String,
    pub account_id: String,
    pub asset_id: U256,
    /// Protocol-reported streaming balance, not locally computed.
    pub balance: U256,
    /// Current streaming-configuration hash; `None` = never set.
    pub streams_hash: Option<B256>,
    /// Ids of the materialized [`StreamsEntry`] records for the current hash.
    pub streams_entry_ids: Vec<String>,
    /// Funds received and available for splitting.
    pub amount_splittable: U256,
    /// Lifetime total withdrawn.
    pub amount_collected: U256,
    /// Funds past splitting, awaiting withdrawal. Zeroed by `Collected`.
    pub amount_post_split_collectable: U256,
    pub last_updated: u64,
}

impl AssetConfig {
    pub fn id_for(account_id: &str, asset_id: U256) -> String {
        format!("{account_id}-{asset_id}")
    }

    pub fn new(account_id: impl Into<String>, asset_id: U256, timestamp: u64) -> Self {
        let account_id = account_id.into();
        Self {
            id: Self::id_for(&account_id, asset_id),
            account_id,
            asset_id,
            balance: U256::ZERO,
            streams_hash: None,
            streams_entry_ids: Vec::new(),
            amount_splittable: U256::ZERO,
            amount_collected: U256::ZERO,
            amount_post_split_collectable: U256::ZERO,
            last_updated: timestamp,
        }
    }
}

/// One receiver of a streaming configuration. Deleted en masse when the
/// owning configuration hash changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamsEntry {
    /// `"{sender}-{receiver}-{asset}"`.
    pub id: String,
    pub sender: String,
    pub receiver: String,
    /// Packed amount-per-second + scheduling bits; stored verbatim.
    pub config: U256,
    /// Id of the owning [`AssetConfig`].
    pub sender_asset_config: String,
}

impl StreamsEntry {
    pub fn id_for(sender: &str, receiver: &str, asset_id: U256) -> String {
        format!("{sender}-{receiver}-{asset_id}")
    }
}

/// One receiver of a splits configuration. Deleted en masse when the owning
/// configuration hash changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitsEntry {
    /// `"{sender}-{receiver}"`.
    pub id: String,
    pub sender: String,
    pub receiver: String,
    pub weight: u32,
}

impl SplitsEntry {
    pub fn id_for(sender: &str, receiver: &str) -> String {
        format!("{sender}-{receiver}")
    }
}

/// Pending streaming-configuration descriptor, keyed by the hash's hex
/// string. Overwritten last-writer-wins on each commit, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamsSetMapping {
    /// Audit-record id of the commit event that produced this hash.
    pub streams_set_event_id: String,
    pub account_id: String,
    pub asset_id: U256,
}

/// Splits twin of [`StreamsSetMapping`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitsSetMapping {
    pub splits_set_event_id: String,
    pub account_id: String,
}

/// Claim status of a repository-backed account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepoAccountStatus {
    OwnerUpdateRequested,
    Claimed,
}

/// A repository-backed account going through the two-phase ownership claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoAccount {
    pub id: String,
    pub name: String,
    pub forge: u8,
    /// Set by the confirmation event; cleared again on each new request.
    pub owner_address: Option<Address>,
    pub status: RepoAccountStatus,
    pub last_updated: u64,
}

/// Latest metadata value per (account, key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMetadata {
    /// `"{account}-{key}"`.
    pub id: String,
    pub account_id: String,
    pub key: B256,
    pub value: Vec<u8>,
    pub last_updated: u64,
}

impl AccountMetadata {
    pub fn id_for(account_id: &str, key: B256) -> String {
        format!("{account_id}-{key:#x}")
    }
}

/// Registered protocol driver (app), keyed by driver id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    pub id: String,
    pub app_address: Address,
    pub last_updated: u64,
}

/// NFT-backed sub-account, keyed by token id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftSubAccount {
    pub id: String,
    pub owner_address: Address,
    /// First owner, recorded at mint (zero-address `from`).
    pub original_owner_address: Option<Address>,
}

/// Record of an immutable splits configuration creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImmutableSplitsCreated {
    /// `"{account}-{hash}"`.
    pub id: String,
    pub account_id: String,
    pub receivers_hash: B256,
}

impl ImmutableSplitsCreated {
    pub fn id_for(account_id: &str, receivers_hash: B256) -> String {
        format!("{account_id}-{receivers_hash:#x}")
    }
}

/// Append-only audit copy of an observed event, keyed
/// `"{tx_hash}-{log_index}"`. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: String,
    pub kind: String,
    pub block_number: u64,
    pub block_timestamp: u64,
    /// Verbatim event fields, plus any correlation context known at the time.
    pub payload: serde_json::Value,
}
