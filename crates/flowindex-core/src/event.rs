//! Decoded protocol events and their delivery envelope.
//!
//! Wire-level decoding happens upstream; the engine receives already-typed
//! fields. Every event carries an [`EventMeta`] envelope used to derive
//! audit-record ids and timestamps.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// Delivery envelope common to all events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMeta {
    /// Transaction hash the event was emitted in.
    pub tx_hash: B256,
    /// Log index within the block.
    pub log_index: u32,
    /// Block number.
    pub block_number: u64,
    /// Block timestamp (seconds since epoch).
    pub block_timestamp: u64,
}

impl EventMeta {
    /// Id for the append-only audit record of this event:
    /// `"{tx_hash}-{log_index}"`.
    pub fn record_id(&self) -> String {
        format!("{:#x}-{}", self.tx_hash, self.log_index)
    }
}

/// A decoded protocol event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Event {
    /// A streaming configuration was committed for `(account, token)`.
    /// Receiver details follow in separate `StreamReceiverSeen` events
    /// carrying the same `receivers_hash`.
    StreamsSet {
        account_id: U256,
        erc20: Address,
        receivers_hash: B256,
        streams_history_hash: B256,
        balance: U256,
        max_end: u32,
    },
    /// One receiver of a previously committed streaming configuration.
    StreamReceiverSeen {
        receivers_hash: B256,
        account_id: U256,
        /// Packed amount-per-second + scheduling bits; opaque to the engine.
        config: U256,
    },
    ReceivedStreams {
        account_id: U256,
        erc20: Address,
        amt: U256,
        receivable_cycles: u32,
    },
    SqueezedStreams {
        account_id: U256,
        erc20: Address,
        sender_id: U256,
        amt: U256,
        streams_history_hashes: Vec<B256>,
    },
    /// A splits configuration was committed for `account`.
    SplitsSet {
        account_id: U256,
        receivers_hash: B256,
    },
    /// One receiver of a previously committed splits configuration.
    SplitsReceiverSeen {
        receivers_hash: B256,
        account_id: U256,
        weight: u32,
    },
    Split {
        account_id: U256,
        receiver: U256,
        erc20: Address,
        amt: U256,
    },
    Given {
        account_id: U256,
        receiver: U256,
        erc20: Address,
        amt: U256,
    },
    Collectable {
        account_id: U256,
        erc20: Address,
        amt: U256,
    },
    Collected {
        account_id: U256,
        erc20: Address,
        collected: U256,
    },
    AccountMetadataEmitted {
        account_id: U256,
        key: B256,
        value: Vec<u8>,
    },
    DriverRegistered {
        driver_id: u32,
        driver_addr: Address,
    },
    DriverAddressUpdated {
        driver_id: u32,
        new_driver_addr: Address,
    },
    NftSubAccountTransfer {
        from: Address,
        to: Address,
        token_id: U256,
    },
    CreatedSplits {
        account_id: U256,
        receivers_hash: B256,
    },
    OwnerUpdateRequested {
        account_id: U256,
        forge: u8,
        name: Vec<u8>,
    },
    OwnerUpdated {
        account_id: U256,
        owner: Address,
    },
}

impl Event {
    /// The event's kind name, used for dispatch logging and audit records.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StreamsSet { .. } => "StreamsSet",
            Self::StreamReceiverSeen { .. } => "StreamReceiverSeen",
            Self::ReceivedStreams { .. } => "ReceivedStreams",
            Self::SqueezedStreams { .. } => "SqueezedStreams",
            Self::SplitsSet { .. } => "SplitsSet",
            Self::SplitsReceiverSeen { .. } => "SplitsReceiverSeen",
            Self::Split { .. } => "Split",
            Self::Given { .. } => "Given",
            Self::Collectable { .. } => "Collectable",
            Self::Collected { .. } => "Collected",
            Self::AccountMetadataEmitted { .. } => "AccountMetadataEmitted",
            Self::DriverRegistered { .. } => "DriverRegistered",
            Self::DriverAddressUpdated { .. } => "DriverAddressUpdated",
            Self::NftSubAccountTransfer { .. } => "NftSubAccountTransfer",
            Self::CreatedSplits { .. } => "CreatedSplits",
            Self::OwnerUpdateRequested { .. } => "OwnerUpdateRequested",
            Self::OwnerUpdated { .. } => "OwnerUpdated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    #[test]
    fn record_id_format() {
        let meta = EventMeta {
            tx_hash: b256!("00000000000000000000000000000000000000000000000000000000000000ab"),
            log_index: 7,
            block_number: 100,
            block_timestamp: 1_700_000_000,
        };
        assert_eq!(
            meta.record_id(),
            "0x00000000000000000000000000000000000000000000000000000000000000ab-7"
        );
    }

    #[test]
    fn kind_names() {
        let ev = Event::Collected {
            account_id: U256::from(1),
            erc20: Address::ZERO,
            collected: U256::from(5),
        };
        assert_eq!(ev.kind(), "Collected");
    }
}
