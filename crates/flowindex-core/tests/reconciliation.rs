//! End-to-end reconciliation scenarios: commit/receiver correlation,
//! stale-entry pruning, balance ledgers, and the claim state machine.

use alloy_primitives::{address, Address, B256, U256};
use flowindex_core::engine::{CorrelationPolicy, Engine, EngineConfig};
use flowindex_core::entity::RepoAccountStatus;
use flowindex_core::event::{Event, EventMeta};
use flowindex_core::store::MemoryRecordStore;

// Token whose little-endian byte interpretation yields asset id 2.
const TOKEN_2: Address = address!("0200000000000000000000000000000000000000");
// Asset id 9.
const TOKEN_9: Address = address!("0900000000000000000000000000000000000000");

fn hash(n: u8) -> B256 {
    B256::with_last_byte(n)
}

fn meta(block: u64, log_index: u32) -> EventMeta {
    EventMeta {
        tx_hash: B256::with_last_byte((block % 251) as u8),
        log_index,
        block_number: block,
        block_timestamp: 1_700_000_000 + block * 12,
    }
}

fn streams_set(account: u64, token: Address, h: B256, balance: u64) -> Event {
    Event::StreamsSet {
        account_id: U256::from(account),
        erc20: token,
        receivers_hash: h,
        streams_history_hash: B256::ZERO,
        balance: U256::from(balance),
        max_end: 0,
    }
}

fn stream_receiver_seen(h: B256, receiver: u64, config: u64) -> Event {
    Event::StreamReceiverSeen {
        receivers_hash: h,
        account_id: U256::from(receiver),
        config: U256::from(config),
    }
}

fn engine() -> Engine<MemoryRecordStore> {
    Engine::new(MemoryRecordStore::new())
}

// ─── Streams commit + correlation ─────────────────────────────────────────────

#[tokio::test]
async fn commit_then_receiver_materializes_ledger() {
    let mut engine = engine();

    engine
        .apply(&streams_set(1, TOKEN_2, hash(1), 100), &meta(10, 0))
        .await
        .unwrap();
    engine
        .apply(&stream_receiver_seen(hash(1), 5, 42), &meta(10, 1))
        .await
        .unwrap();

    let ledger = engine.repository().asset_config("1-2").await.unwrap().unwrap();
    assert_eq!(ledger.balance, U256::from(100));
    assert_eq!(ledger.streams_entry_ids, vec!["1-5-2".to_string()]);

    let entry = engine.repository().streams_entry("1-5-2").await.unwrap().unwrap();
    assert_eq!(entry.sender, "1");
    assert_eq!(entry.receiver, "5");
    assert_eq!(entry.config, U256::from(42));
    assert_eq!(entry.sender_asset_config, "1-2");
}

#[tokio::test]
async fn reconciliation_completeness() {
    let mut engine = engine();

    engine
        .apply(&streams_set(1, TOKEN_2, hash(1), 500), &meta(10, 0))
        .await
        .unwrap();
    for (i, receiver) in [5u64, 6, 7].into_iter().enumerate() {
        engine
            .apply(
                &stream_receiver_seen(hash(1), receiver, 10 + receiver),
                &meta(10, 1 + i as u32),
            )
            .await
            .unwrap();
    }

    let ledger = engine.repository().asset_config("1-2").await.unwrap().unwrap();
    assert_eq!(ledger.streams_entry_ids.len(), 3);
    for entry_id in &ledger.streams_entry_ids {
        let entry = engine
            .repository()
            .streams_entry(entry_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.sender, "1");
    }
}

#[tokio::test]
async fn hash_equal_commit_leaves_receiver_list_untouched() {
    let mut engine = engine();

    engine
        .apply(&streams_set(1, TOKEN_2, hash(1), 100), &meta(10, 0))
        .await
        .unwrap();
    engine
        .apply(&stream_receiver_seen(hash(1), 5, 42), &meta(10, 1))
        .await
        .unwrap();

    // Same hash again, twice: balance refreshes, list survives.
    engine
        .apply(&streams_set(1, TOKEN_2, hash(1), 90), &meta(11, 0))
        .await
        .unwrap();
    engine
        .apply(&streams_set(1, TOKEN_2, hash(1), 80), &meta(12, 0))
        .await
        .unwrap();

    let ledger = engine.repository().asset_config("1-2").await.unwrap().unwrap();
    assert_eq!(ledger.balance, U256::from(80));
    assert_eq!(ledger.streams_entry_ids, vec!["1-5-2".to_string()]);
    assert!(engine.repository().streams_entry("1-5-2").await.unwrap().is_some());
}

#[tokio::test]
async fn stale_entries_pruned_on_hash_change() {
    let mut engine = engine();

    engine
        .apply(&streams_set(1, TOKEN_2, hash(1), 100), &meta(10, 0))
        .await
        .unwrap();
    engine
        .apply(&stream_receiver_seen(hash(1), 5, 42), &meta(10, 1))
        .await
        .unwrap();
    engine
        .apply(&stream_receiver_seen(hash(1), 6, 43), &meta(10, 2))
        .await
        .unwrap();

    // New hash before any of its receiver-seen events arrive.
    engine
        .apply(&streams_set(1, TOKEN_2, hash(2), 0), &meta(11, 0))
        .await
        .unwrap();

    let ledger = engine.repository().asset_config("1-2").await.unwrap().unwrap();
    assert!(ledger.streams_entry_ids.is_empty());
    assert_eq!(ledger.balance, U256::ZERO);
    assert!(engine.repository().streams_entry("1-5-2").await.unwrap().is_none());
    assert!(engine.repository().streams_entry("1-6-2").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_receiver_seen_appends_once() {
    let mut engine = engine();

    engine
        .apply(&streams_set(1, TOKEN_2, hash(1), 100), &meta(10, 0))
        .await
        .unwrap();
    engine
        .apply(&stream_receiver_seen(hash(1), 5, 42), &meta(10, 1))
        .await
        .unwrap();
    engine
        .apply(&stream_receiver_seen(hash(1), 5, 42), &meta(10, 2))
        .await
        .unwrap();

    let ledger = engine.repository().asset_config("1-2").await.unwrap().unwrap();
    assert_eq!(ledger.streams_entry_ids, vec!["1-5-2".to_string()]);
}

#[tokio::test]
async fn correlation_is_last_writer_wins() {
    let mut engine = engine();

    // Two different owners commit the same hash; the receiver-seen event
    // attaches to the most recent committer.
    engine
        .apply(&streams_set(1, TOKEN_2, hash(1), 100), &meta(10, 0))
        .await
        .unwrap();
    engine
        .apply(&streams_set(9, TOKEN_2, hash(1), 100), &meta(11, 0))
        .await
        .unwrap();
    engine
        .apply(&stream_receiver_seen(hash(1), 5, 42), &meta(11, 1))
        .await
        .unwrap();

    let entry = engine.repository().streams_entry("9-5-2").await.unwrap().unwrap();
    assert_eq!(entry.sender, "9");
    let stale_owner = engine.repository().asset_config("1-2").await.unwrap().unwrap();
    assert!(stale_owner.streams_entry_ids.is_empty());
}

// ─── Missing-correlation policy ───────────────────────────────────────────────

#[tokio::test]
async fn orphan_receiver_seen_skips_by_default() {
    let mut engine = engine();
    let meta = meta(10, 0);

    engine
        .apply(&stream_receiver_seen(hash(9), 5, 42), &meta)
        .await
        .unwrap();

    // Audit record persisted, no ledger mutation.
    assert!(engine
        .repository()
        .event_log_entry(&meta.record_id())
        .await
        .unwrap()
        .is_some());
    assert!(engine.repository().account("5").await.unwrap().is_none());
}

#[tokio::test]
async fn orphan_receiver_seen_fails_under_reject_policy() {
    let config = EngineConfig {
        correlation_policy: CorrelationPolicy::Reject,
    };
    let mut engine = Engine::with_config(MemoryRecordStore::new(), config);
    let meta = meta(10, 0);

    let err = engine
        .apply(&stream_receiver_seen(hash(9), 5, 42), &meta)
        .await
        .unwrap_err();
    assert!(err.is_missing_correlation());

    // The audit record is still written before the event fails.
    assert!(engine
        .repository()
        .event_log_entry(&meta.record_id())
        .await
        .unwrap()
        .is_some());
}

// ─── Splits twin ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn splits_commit_receiver_and_reprune() {
    let mut engine = engine();

    engine
        .apply(
            &Event::SplitsSet {
                account_id: U256::from(1),
                receivers_hash: hash(1),
            },
            &meta(10, 0),
        )
        .await
        .unwrap();
    engine
        .apply(
            &Event::SplitsReceiverSeen {
                receivers_hash: hash(1),
                account_id: U256::from(5),
                weight: 500_000,
            },
            &meta(10, 1),
        )
        .await
        .unwrap();

    let account = engine.repository().account("1").await.unwrap().unwrap();
    assert_eq!(account.splits_receivers_hash, Some(hash(1)));
    assert_eq!(account.splits_entry_ids, vec!["1-5".to_string()]);
    let entry = engine.repository().splits_entry("1-5").await.unwrap().unwrap();
    assert_eq!(entry.weight, 500_000);

    engine
        .apply(
            &Event::SplitsSet {
                account_id: U256::from(1),
                receivers_hash: hash(2),
            },
            &meta(11, 0),
        )
        .await
        .unwrap();

    let account = engine.repository().account("1").await.unwrap().unwrap();
    assert!(account.splits_entry_ids.is_empty());
    assert!(engine.repository().splits_entry("1-5").await.unwrap().is_none());
}

// ─── Balance ledgers ──────────────────────────────────────────────────────────

#[tokio::test]
async fn collectable_then_collected() {
    let mut engine = engine();

    engine
        .apply(
            &Event::Collectable {
                account_id: U256::from(7),
                erc20: TOKEN_9,
                amt: U256::from(30),
            },
            &meta(10, 0),
        )
        .await
        .unwrap();
    engine
        .apply(
            &Event::Collected {
                account_id: U256::from(7),
                erc20: TOKEN_9,
                collected: U256::from(30),
            },
            &meta(10, 1),
        )
        .await
        .unwrap();

    let ledger = engine.repository().asset_config("7-9").await.unwrap().unwrap();
    assert_eq!(ledger.amount_post_split_collectable, U256::ZERO);
    assert_eq!(ledger.amount_collected, U256::from(30));
}

#[tokio::test]
async fn split_zeroes_sender_and_credits_receiver() {
    let mut engine = engine();

    engine
        .apply(
            &Event::Given {
                account_id: U256::from(1),
                receiver: U256::from(1),
                erc20: TOKEN_2,
                amt: U256::from(70),
            },
            &meta(10, 0),
        )
        .await
        .unwrap();
    engine
        .apply(
            &Event::Split {
                account_id: U256::from(1),
                receiver: U256::from(5),
                erc20: TOKEN_2,
                amt: U256::from(70),
            },
            &meta(10, 1),
        )
        .await
        .unwrap();

    let sender = engine.repository().asset_config("1-2").await.unwrap().unwrap();
    assert_eq!(sender.amount_splittable, U256::ZERO);
    let receiver = engine.repository().asset_config("5-2").await.unwrap().unwrap();
    assert_eq!(receiver.amount_splittable, U256::from(70));
}

#[tokio::test]
async fn ledger_counters_only_decrease_at_defined_resets() {
    let mut engine = engine();
    let account = U256::from(3);

    // Deterministically generated mix of income, split, and collect events.
    let mut seed: u64 = 0x5eed;
    let mut prev_splittable = U256::ZERO;
    let mut prev_collected = U256::ZERO;

    for i in 0..200u64 {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let amt = U256::from(seed % 1_000 + 1);
        let event = match seed % 5 {
            0 => Event::ReceivedStreams {
                account_id: account,
                erc20: TOKEN_2,
                amt,
                receivable_cycles: 0,
            },
            1 => Event::SqueezedStreams {
                account_id: account,
                erc20: TOKEN_2,
                sender_id: U256::from(8),
                amt,
                streams_history_hashes: vec![],
            },
            2 => Event::Given {
                account_id: account,
                receiver: account,
                erc20: TOKEN_2,
                amt,
            },
            3 => Event::Split {
                account_id: account,
                receiver: U256::from(11),
                erc20: TOKEN_2,
                amt,
            },
            _ => Event::Collected {
                account_id: account,
                erc20: TOKEN_2,
                collected: amt,
            },
        };
        let is_split = matches!(event, Event::Split { .. });

        engine.apply(&event, &meta(100 + i, 0)).await.unwrap();

        let ledger = engine.repository().asset_config("3-2").await.unwrap().unwrap();
        // amount_collected never decreases.
        assert!(ledger.amount_collected >= prev_collected);
        // amount_splittable only decreases on Split-as-sender, and then to zero.
        if ledger.amount_splittable < prev_splittable {
            assert!(is_split);
            assert_eq!(ledger.amount_splittable, U256::ZERO);
        }
        prev_splittable = ledger.amount_splittable;
        prev_collected = ledger.amount_collected;
    }
}

#[tokio::test]
async fn every_event_writes_an_audit_record() {
    let mut engine = engine();
    let m = meta(10, 4);

    engine
        .apply(
            &Event::Given {
                account_id: U256::from(1),
                receiver: U256::from(2),
                erc20: TOKEN_2,
                amt: U256::from(5),
            },
            &m,
        )
        .await
        .unwrap();

    let entry = engine
        .repository()
        .event_log_entry(&m.record_id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.kind, "Given");
    assert_eq!(entry.block_number, 10);
    assert_eq!(entry.payload["kind"], "Given");
}

// ─── Claim state machine ──────────────────────────────────────────────────────

#[tokio::test]
async fn owner_updated_without_request_is_fatal() {
    let mut engine = engine();

    let err = engine
        .apply(
            &Event::OwnerUpdated {
                account_id: U256::from(77),
                owner: address!("1111111111111111111111111111111111111111"),
            },
            &meta(10, 0),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        flowindex_core::EngineError::MissingPrerequisite { .. }
    ));
}

#[tokio::test]
async fn claim_transitions_and_preserves_request_fields() {
    let mut engine = engine();
    let owner = address!("1111111111111111111111111111111111111111");

    engine
        .apply(
            &Event::OwnerUpdateRequested {
                account_id: U256::from(77),
                forge: 1,
                name: b"org/repo".to_vec(),
            },
            &meta(10, 0),
        )
        .await
        .unwrap();

    let requested = engine.repository().repo_account("77").await.unwrap().unwrap();
    assert_eq!(requested.status, RepoAccountStatus::OwnerUpdateRequested);
    assert!(requested.owner_address.is_none());

    engine
        .apply(
            &Event::OwnerUpdated {
                account_id: U256::from(77),
                owner,
            },
            &meta(11, 0),
        )
        .await
        .unwrap();

    let claimed = engine.repository().repo_account("77").await.unwrap().unwrap();
    assert_eq!(claimed.status, RepoAccountStatus::Claimed);
    assert_eq!(claimed.owner_address, Some(owner));
    assert_eq!(claimed.name, "org/repo");
    assert_eq!(claimed.forge, 1);

    // A later request re-arms the machine and clears the owner again.
    engine
        .apply(
            &Event::OwnerUpdateRequested {
                account_id: U256::from(77),
                forge: 1,
                name: b"org/repo".to_vec(),
            },
            &meta(12, 0),
        )
        .await
        .unwrap();
    let rearmed = engine.repository().repo_account("77").await.unwrap().unwrap();
    assert_eq!(rearmed.status, RepoAccountStatus::OwnerUpdateRequested);
    assert!(rearmed.owner_address.is_none());
}
