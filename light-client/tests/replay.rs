// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

use beacon_lc::config::Config;
use beacon_lc::engine::{Engine, Outcome};
use beacon_lc::error::EngineError;
use beacon_lc::feed::{parse_feed, FeedEntry};
use beacon_lc_core::anchor::AnchorProvider;
use beacon_lc_core::chunks::ChunkError;
use beacon_lc_core::merkle::chunk::chunk_branch;
use beacon_lc_core::crypto::hash::keccak_hash;
use beacon_lc_core::test_utils::{
    checkpoint, full_update, mock_block_hash, mock_block_hashes, mock_chunk_proof,
    mock_header_chain, mock_oracles, sync_aggregate, test_genesis, HeaderFixture, MockOracles,
    MockProofOracle, StateContents, BLOCK_NUMBER_OFFSET, FULL_PARTICIPATION,
};
use beacon_lc_core::types::block::execution::Witness;
use beacon_lc_core::types::block::HeaderWithExecution;
use beacon_lc_core::types::committee::SyncAggregate;
use beacon_lc_core::types::error::ConsensusError;
use beacon_lc_core::types::store::StoreEvent;
use beacon_lc_core::types::update::{FullUpdate, OptimisticUpdate};
use beacon_lc_core::types::utils::SLOTS_PER_SYNC_COMMITTEE_PERIOD;
use beacon_lc_core::types::Bytes32;
use serde_json::{json, Value};
use std::sync::Arc;

const CHAIN_ID: u64 = 5;
const CHECKPOINT_SLOT: u64 = 2 * SLOTS_PER_SYNC_COMMITTEE_PERIOD + 64;
// The execution block of this slot closes a chunk.
const FINALIZED_SLOT: u64 = CHECKPOINT_SLOT + 127;
const FINALIZED_NUMBER: u64 = FINALIZED_SLOT + BLOCK_NUMBER_OFFSET;
const RECENT_CHUNK: u64 = FINALIZED_NUMBER - 127;
const OLD_CHUNK: u64 = RECENT_CHUNK - 128;

fn engine() -> (Engine, MockOracles, Arc<MockProofOracle>) {
    let genesis = test_genesis();
    let (root, checkpoint) = checkpoint(&genesis, CHECKPOINT_SLOT);
    let config = Config::new(genesis, root, checkpoint, vec![CHAIN_ID]);

    let mocks = mock_oracles();
    let chunk_oracle = MockProofOracle::accepting();
    let engine = Engine::new(&config, mocks.oracles.clone(), chunk_oracle.clone()).unwrap();

    (engine, mocks, chunk_oracle)
}

fn hex32(value: &Bytes32) -> String {
    format!("0x{}", hex::encode(value))
}

fn hex_list(values: &[Bytes32]) -> Vec<String> {
    values.iter().map(hex32).collect()
}

fn witness_json(witness: &Witness) -> Value {
    json!({ "leaf": hex32(witness.leaf()), "branch": hex_list(witness.branch()) })
}

fn header_json(header: &HeaderWithExecution) -> Value {
    let beacon = header.beacon();
    let execution = header.execution();

    json!({
        "beacon": {
            "slot": beacon.slot().to_string(),
            "proposer_index": beacon.proposer_index(),
            "parent_root": hex32(beacon.parent_root()),
            "state_root": hex32(beacon.state_root()),
            "body_root": hex32(beacon.body_root()),
        },
        "execution": {
            "payload_root": witness_json(execution.payload_root()),
            "state_root": witness_json(execution.state_root()),
            "block_number": witness_json(execution.block_number()),
            "block_hash": witness_json(execution.block_hash()),
        },
    })
}

fn aggregate_json(aggregate: &SyncAggregate) -> Value {
    json!({
        "participation": aggregate.participation(),
        "poseidon_root": hex32(aggregate.poseidon_root()),
        "commitment": hex32(aggregate.commitment()),
        "proof": format!("0x{}", hex::encode(aggregate.proof().to_bytes())),
    })
}

fn full_update_json(update: &FullUpdate) -> Value {
    let finality = update.finality_update();
    let committee = update.committee_update();

    json!({
        "kind": "update",
        "attested_header": header_json(finality.attested_header()),
        "finalized_header": header_json(finality.finalized_header()),
        "finality_branch": hex_list(finality.finality_branch()),
        "committee_update": {
            "next_committee_root": hex32(committee.next_committee_root()),
            "next_committee_branch": hex_list(committee.next_committee_branch()),
            "next_committee_poseidon_root": hex32(committee.next_committee_poseidon_root()),
            "mapping_proof": format!("0x{}", hex::encode(committee.mapping_proof().to_bytes())),
        },
        "sync_aggregate": aggregate_json(finality.sync_aggregate()),
        "signature_slot": finality.signature_slot(),
    })
}

fn head_json(update: &OptimisticUpdate, headers: &[Vec<u8>]) -> Value {
    json!({
        "kind": "anchor_head",
        "head": {
            "attested_header": header_json(update.attested_header()),
            "sync_aggregate": aggregate_json(update.sync_aggregate()),
            "signature_slot": update.signature_slot(),
        },
        "headers": headers
            .iter()
            .map(|header| format!("0x{}", hex::encode(header)))
            .collect::<Vec<_>>(),
    })
}

fn chunk_recent_json(start: u64) -> Value {
    json!({
        "kind": "chunk_recent",
        "chain_id": CHAIN_ID,
        "proof": format!("0x{}", hex::encode(mock_chunk_proof(start).to_bytes())),
    })
}

fn chunk_old_json(start: u64) -> Value {
    json!({
        "kind": "chunk_old",
        "chain_id": CHAIN_ID,
        "next_chunk_root": hex32(mock_chunk_proof(start + 128).chunk_root()),
        "start_block_number": start,
        "proof": format!("0x{}", hex::encode(mock_chunk_proof(start).to_bytes())),
    })
}

fn block_hash_json(block_number: u64, claimed: &Bytes32) -> Value {
    let start = block_number - block_number % 128;
    let branch = chunk_branch(&mock_block_hashes(start), (block_number - start) as usize).unwrap();

    json!({
        "kind": "block_hash",
        "chain_id": CHAIN_ID,
        "block_number": block_number,
        "claimed_block_hash": hex32(claimed),
        "prev_hash": hex32(&mock_block_hash(start - 1)),
        "num_final": 128,
        "merkle_proof": hex_list(&branch),
    })
}

fn entries(values: Vec<Value>) -> Vec<FeedEntry> {
    parse_feed(&Value::Array(values).to_string()).unwrap()
}

fn finalizing_update() -> FullUpdate {
    full_update(
        &test_genesis(),
        FINALIZED_SLOT,
        FINALIZED_SLOT + 32,
        FINALIZED_SLOT + 33,
        FULL_PARTICIPATION,
    )
}

#[test]
fn test_replay_full_feed() {
    let (mut engine, _, chunk_oracle) = engine();

    let feed = entries(vec![
        full_update_json(&finalizing_update()),
        json!({ "kind": "import_finalized" }),
        chunk_recent_json(RECENT_CHUNK),
        chunk_old_json(OLD_CHUNK),
        block_hash_json(OLD_CHUNK + 125, &mock_block_hash(OLD_CHUNK + 125)),
        block_hash_json(RECENT_CHUNK + 3, &mock_block_hash(RECENT_CHUNK + 3)),
    ]);
    let summary = engine.replay(&feed);

    assert_eq!(summary.applied(), 6);
    assert_eq!(summary.rejected(), 0);
    assert_eq!(summary.invalid_block_hashes(), 0);
    assert_eq!(engine.store().finalized_header().slot(), FINALIZED_SLOT);
    assert_eq!(
        engine.anchors().block_hash(FINALIZED_NUMBER),
        Some(mock_block_hash(FINALIZED_NUMBER))
    );
    assert!(engine.chunks().chunk(CHAIN_ID, OLD_CHUNK).is_some());
    assert_eq!(chunk_oracle.calls().len(), 2);
}

#[test]
fn test_replay_skips_rejected_entries() {
    let (mut engine, mocks, _) = engine();

    let feed = entries(vec![
        // Not anchored yet
        chunk_recent_json(RECENT_CHUNK),
        full_update_json(&finalizing_update()),
        // Same update again, no longer relevant
        full_update_json(&finalizing_update()),
        json!({ "kind": "import_finalized" }),
        chunk_recent_json(RECENT_CHUNK),
        block_hash_json(RECENT_CHUNK + 3, &[0xde; 32]),
    ]);
    let summary = engine.replay(&feed);

    assert_eq!(summary.applied(), 3);
    assert_eq!(summary.rejected(), 2);
    assert_eq!(summary.invalid_block_hashes(), 1);
    assert!(!mocks.signature.calls().is_empty());
}

#[test]
fn test_apply_reports_component_errors() {
    let (mut engine, mocks, _) = engine();

    let update = finalizing_update();
    mocks.signature.set_accept(false);
    let rejected = engine.apply(&entries(vec![full_update_json(&update)])[0]);
    assert!(matches!(
        rejected,
        Err(EngineError::Consensus {
            source: ConsensusError::InvalidSignatureProof
        })
    ));
    assert_eq!(engine.store().finalized_header().slot(), CHECKPOINT_SLOT);

    mocks.signature.set_accept(true);
    let events = engine.process_update(&update.into()).unwrap();
    assert!(events.contains(&StoreEvent::FinalityUpdated {
        slot: FINALIZED_SLOT,
        block_number: FINALIZED_NUMBER,
        block_hash: mock_block_hash(FINALIZED_NUMBER),
    }));

    let unregistered = json!({
        "kind": "chunk_recent",
        "chain_id": 1,
        "proof": format!("0x{}", hex::encode(mock_chunk_proof(RECENT_CHUNK).to_bytes())),
    });
    assert!(matches!(
        engine.apply(&entries(vec![unregistered])[0]),
        Err(EngineError::Chunk {
            source: ChunkError::UnsupportedChain { chain_id: 1 }
        })
    ));

    let truncated = json!({ "kind": "chunk_recent", "chain_id": CHAIN_ID, "proof": "0x00" });
    assert!(matches!(
        engine.apply(&entries(vec![truncated])[0]),
        Err(EngineError::Chunk {
            source: ChunkError::MalformedProof { .. }
        })
    ));
}

#[test]
fn test_anchor_head_with_headers() {
    let (mut engine, _, _) = engine();

    let head_slot = CHECKPOINT_SLOT + 32;
    let head_number = head_slot + BLOCK_NUMBER_OFFSET;
    let oldest_parent = [0x5a; 32];
    let headers = mock_header_chain(head_number, 3, oldest_parent);
    let head_hash = *keccak_hash(&headers[0]).hash();

    let head = |block_hash: Bytes32| {
        let fixture = HeaderFixture::new(
            &test_genesis(),
            head_slot,
            head_number,
            block_hash,
            &StateContents::default(),
        );
        OptimisticUpdate::new(
            fixture.header().clone(),
            sync_aggregate(2, FULL_PARTICIPATION),
            head_slot + 1,
        )
    };

    // The head hash is not the hash of the first header, so the link is broken.
    let unlinked = entries(vec![head_json(&head([0xee; 32]), &headers)]);
    assert!(matches!(
        engine.apply(&unlinked[0]),
        Err(EngineError::Anchor { .. })
    ));
    assert!(engine.anchors().is_empty());

    let linked = entries(vec![head_json(&head(head_hash), &headers)]);
    let Outcome::Anchors(events) = engine.apply(&linked[0]).unwrap() else {
        panic!("expected anchor events");
    };
    let numbers = events
        .iter()
        .map(|event| event.block_number)
        .collect::<Vec<_>>();
    assert_eq!(
        numbers,
        [head_number, head_number - 1, head_number - 2, head_number - 3]
    );
    assert_eq!(engine.anchors().block_hash(head_number - 3), Some(oldest_parent));

    // Walk further back from the oldest block
    let older = mock_header_chain(head_number - 3, 2, [0x6b; 32]);
    let extend = entries(vec![json!({
        "kind": "extend_backward",
        "block_number": head_number - 3,
        "headers": older
            .iter()
            .map(|header| format!("0x{}", hex::encode(header)))
            .collect::<Vec<_>>(),
    })]);
    // The oldest parent claimed earlier is not the hash of this header chain.
    assert!(matches!(
        engine.apply(&extend[0]),
        Err(EngineError::Anchor { .. })
    ));
    assert_eq!(engine.anchors().earliest(), Some((head_number - 3, oldest_parent)));
}
