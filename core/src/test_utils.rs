// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! Fixtures shared by the tests of this crate and of the crates depending on it.
//!
//! Beacon states and execution payloads are replaced by sparse Merkle trees holding only the
//! nodes the light client looks at, so that every branch handed to the store is a real one.

use crate::chunks::ChunkProof;
use crate::crypto::hash::{keccak_hash, sha2_hash, sha2_hash_concat, HashValue};
use crate::crypto::oracle::{ConsensusOracles, Groth16Proof, ProofOracle};
use crate::merkle::chunk::chunk_root;
use crate::merkle::utils::get_generalized_index_depth;
use crate::merkle::Merkleized;
use crate::types::block::consensus::BeaconBlockHeader;
use crate::types::block::execution::{ExecutionField, ExecutionRef, Witness};
use crate::types::block::HeaderWithExecution;
use crate::types::committee::{CommitteeUpdate, SyncAggregate};
use crate::types::fork::{BranchSchema, Fork, ForkName, ForkSchedule, GenesisConfig};
use crate::types::store::{CommitteeRoots, LightClientStore, TrustedCheckpoint};
use crate::types::update::{FinalityUpdate, FullUpdate, OptimisticUpdate};
use crate::types::utils::calc_sync_period;
use crate::types::Bytes32;
use ethers_core::utils::rlp::RlpStream;
use getset::Getters;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Offset between a slot and the execution block number of its fixture header.
pub const BLOCK_NUMBER_OFFSET: u64 = 1_000_000;

/// Participation used by fixtures unless a test asks otherwise.
pub const FULL_PARTICIPATION: u64 = 512;

/// A [`ProofOracle`] answering a programmable verdict and recording the public inputs it saw.
#[derive(Debug, Default)]
pub struct MockProofOracle {
    reject: AtomicBool,
    calls: Mutex<Vec<Vec<Bytes32>>>,
}

impl MockProofOracle {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn rejecting() -> Arc<Self> {
        let oracle = Self::default();
        oracle.set_accept(false);
        Arc::new(oracle)
    }

    pub fn set_accept(&self, accept: bool) {
        self.reject.store(!accept, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Vec<Bytes32>> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn last_public_inputs(&self) -> Option<Vec<Bytes32>> {
        self.calls().pop()
    }
}

impl ProofOracle for MockProofOracle {
    fn verify(&self, _proof: &Groth16Proof, public_inputs: &[Bytes32]) -> bool {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(public_inputs.to_vec());
        }
        !self.reject.load(Ordering::SeqCst)
    }
}

/// Oracles of a test, with handles on the mocks behind them.
pub struct MockOracles {
    pub signature: Arc<MockProofOracle>,
    pub committee_mapping: Arc<MockProofOracle>,
    pub oracles: ConsensusOracles,
}

pub fn mock_oracles() -> MockOracles {
    let signature = MockProofOracle::accepting();
    let committee_mapping = MockProofOracle::accepting();
    let oracles = ConsensusOracles::new(signature.clone(), committee_mapping.clone());

    MockOracles {
        signature,
        committee_mapping,
        oracles,
    }
}

/// Hash of block `number` in chunk tests: the block number as a big-endian 256-bit word.
pub fn mock_block_hash(number: u64) -> Bytes32 {
    let mut hash = [0u8; 32];
    hash[24..].copy_from_slice(&number.to_be_bytes());
    hash
}

/// Mock hashes of the 128 blocks starting at `start`.
pub fn mock_block_hashes(start: u64) -> Vec<Bytes32> {
    (start..start + 128).map(mock_block_hash).collect()
}

/// Chunk proof over the mock hashes of the 128 blocks starting at `start`.
pub fn mock_chunk_proof(start: u64) -> ChunkProof {
    let hashes = mock_block_hashes(start);
    let root = chunk_root(&hashes).expect("a chunk holds 128 hashes");
    let prev_hash = if start > 0 {
        mock_block_hash(start - 1)
    } else {
        [0u8; 32]
    };

    ChunkProof::new(
        Groth16Proof::default(),
        *root.hash(),
        prev_hash,
        hashes[127],
        start,
        start + 127,
    )
}

/// RLP encoding of a London style execution header for block `number`.
pub fn mock_header_rlp(number: u64, parent_hash: Bytes32) -> Vec<u8> {
    let seed = number.to_be_bytes();
    let filler = |tag: u8| {
        let mut bytes = seed.to_vec();
        bytes.push(tag);
        keccak_hash(&bytes).to_vec()
    };

    let mut stream = RlpStream::new_list(16);
    stream.append(&parent_hash.to_vec());
    stream.append(&filler(1));
    stream.append(&filler(2)[..20].to_vec());
    stream.append(&filler(3));
    stream.append(&filler(4));
    stream.append(&filler(5));
    stream.append(&vec![0u8; 256]);
    stream.append(&0u64);
    stream.append(&number);
    stream.append(&30_000_000u64);
    stream.append(&(number % 30_000_000));
    stream.append(&(1_700_000_000u64 + number * 12));
    stream.append(&b"beacon-lc".to_vec());
    stream.append(&filler(6));
    stream.append(&vec![0u8; 8]);
    stream.append(&7u64);

    stream.out().to_vec()
}

/// Raw headers of blocks `head_number`, `head_number - 1`, ... , `head_number - count + 1`, hash
/// linked, the oldest one having `oldest_parent` as parent hash.
pub fn mock_header_chain(head_number: u64, count: u64, oldest_parent: Bytes32) -> Vec<Vec<u8>> {
    let mut headers = Vec::new();
    let mut parent = oldest_parent;
    for number in (head_number + 1 - count)..=head_number {
        let raw = mock_header_rlp(number, parent);
        parent = *keccak_hash(&raw).hash();
        headers.push(raw);
    }
    headers.reverse();
    headers
}

/// A Merkle tree in which only a few nodes are set. Every other leaf at the depth of the deepest
/// set node is a filler derived from its generalized index.
#[derive(Debug, Clone)]
pub struct SparseMerkleTree {
    nodes: BTreeMap<u64, HashValue>,
    depth: usize,
}

impl SparseMerkleTree {
    pub fn new(nodes: &[(u64, HashValue)]) -> Self {
        let depth = nodes
            .iter()
            .map(|(gindex, _)| get_generalized_index_depth(*gindex))
            .max()
            .unwrap_or(1);

        Self {
            nodes: nodes.iter().copied().collect(),
            depth,
        }
    }

    pub fn node(&self, gindex: u64) -> HashValue {
        if let Some(node) = self.nodes.get(&gindex) {
            return *node;
        }
        if get_generalized_index_depth(gindex) >= self.depth {
            return sha2_hash(&gindex.to_be_bytes());
        }

        sha2_hash_concat(&self.node(gindex * 2), &self.node(gindex * 2 + 1))
    }

    pub fn root(&self) -> HashValue {
        self.node(1)
    }

    pub fn branch(&self, gindex: u64) -> Vec<Bytes32> {
        let mut branch = Vec::new();
        let mut current = gindex;
        while current > 1 {
            branch.push(*self.node(current ^ 1).hash());
            current /= 2;
        }
        branch
    }
}

/// An execution payload reduced to the fields the light client proves, and a block body holding
/// it.
#[derive(Debug, Clone, Getters)]
#[getset(get = "pub")]
pub struct ExecutionFixture {
    body_root: Bytes32,
    execution_ref: ExecutionRef,
}

impl ExecutionFixture {
    pub fn new(
        block_number: u64,
        block_hash: Bytes32,
        state_root: Bytes32,
        schema: &BranchSchema,
    ) -> Self {
        let number_leaf = *block_number.hash_tree_root().hash();
        let leaves = [
            (ExecutionField::StateRoot, state_root),
            (ExecutionField::BlockNumber, number_leaf),
            (ExecutionField::BlockHash, block_hash),
        ];

        let payload = SparseMerkleTree::new(
            &leaves
                .iter()
                .map(|(field, leaf)| (schema.execution_field(*field), HashValue::new(*leaf)))
                .collect::<Vec<_>>(),
        );
        let payload_root = payload.root();
        let witness = |field: ExecutionField, leaf: Bytes32| {
            Witness::new(leaf, payload.branch(schema.execution_field(field)))
        };

        let body = SparseMerkleTree::new(&[(schema.execution_payload(), payload_root)]);

        Self {
            body_root: *body.root().hash(),
            execution_ref: ExecutionRef::new(
                Witness::new(*payload_root.hash(), body.branch(schema.execution_payload())),
                witness(ExecutionField::StateRoot, state_root),
                witness(ExecutionField::BlockNumber, number_leaf),
                witness(ExecutionField::BlockHash, block_hash),
            ),
        }
    }
}

/// Fork schedule used by the fixtures: Capella from epoch 1, Deneb from period 2, Electra from
/// period 4.
pub fn test_genesis() -> GenesisConfig {
    let schedule = ForkSchedule::new(vec![
        Fork::new(ForkName::Phase0, 0, [0x00, 0x00, 0x00, 0x01]),
        Fork::new(ForkName::Capella, 1, [0x03, 0x00, 0x00, 0x01]),
        Fork::new(ForkName::Deneb, 512, [0x04, 0x00, 0x00, 0x01]),
        Fork::new(ForkName::Electra, 1024, [0x05, 0x00, 0x00, 0x01]),
    ])
    .expect("fixture schedule is ordered");

    GenesisConfig::new(1_700_000_000, [0x42; 32], schedule)
}

/// Deterministic roots of the committee active during `period`.
pub fn committee_roots(period: u64) -> CommitteeRoots {
    let mut seed = b"committee".to_vec();
    seed.extend(period.to_be_bytes());
    let ssz_root = *sha2_hash(&seed).hash();
    seed.extend(b"poseidon");
    // Poseidon roots are field elements, keep them below 2^248.
    let mut poseidon_root = *sha2_hash(&seed).hash();
    poseidon_root[0] = 0;

    CommitteeRoots::new(ssz_root, poseidon_root)
}

/// What the state of a fixture header commits to.
#[derive(Debug, Clone, Default)]
pub struct StateContents {
    pub current_committee: Option<Bytes32>,
    pub next_committee: Option<Bytes32>,
    pub finalized_header: Option<HashValue>,
}

/// A beacon header with valid execution witnesses, and the state tree behind its state root.
#[derive(Debug, Clone, Getters)]
pub struct HeaderFixture {
    #[getset(get = "pub")]
    header: HeaderWithExecution,
    state: SparseMerkleTree,
    #[getset(get = "pub")]
    schema: BranchSchema,
}

impl HeaderFixture {
    pub fn new(
        genesis: &GenesisConfig,
        slot: u64,
        block_number: u64,
        block_hash: Bytes32,
        contents: &StateContents,
    ) -> Self {
        let schema = genesis
            .fork_schedule()
            .schema_at_slot(slot)
            .expect("fixture slots are post Capella");

        let mut nodes = Vec::new();
        if let Some(root) = contents.current_committee {
            nodes.push((schema.current_sync_committee(), HashValue::new(root)));
        }
        if let Some(root) = contents.next_committee {
            nodes.push((schema.next_sync_committee(), HashValue::new(root)));
        }
        if let Some(root) = contents.finalized_header {
            nodes.push((schema.finalized_root(), root));
        }
        let state = SparseMerkleTree::new(&nodes);

        let execution_state_root = *sha2_hash(&block_number.to_le_bytes()).hash();
        let execution =
            ExecutionFixture::new(block_number, block_hash, execution_state_root, &schema);
        let beacon = BeaconBlockHeader::new(
            slot,
            slot % 1_000,
            *sha2_hash(&slot.to_be_bytes()).hash(),
            *state.root().hash(),
            *execution.body_root(),
        );

        Self {
            header: HeaderWithExecution::new(beacon, execution.execution_ref().clone()),
            state,
            schema,
        }
    }

    /// Header of a finalized block whose state holds the committees of its period.
    pub fn finalized(genesis: &GenesisConfig, slot: u64) -> Self {
        let period = calc_sync_period(slot);
        let block_number = slot + BLOCK_NUMBER_OFFSET;

        Self::new(
            genesis,
            slot,
            block_number,
            mock_block_hash(block_number),
            &StateContents {
                current_committee: Some(*committee_roots(period).ssz_root()),
                next_committee: Some(*committee_roots(period + 1).ssz_root()),
                finalized_header: None,
            },
        )
    }

    /// Header of an attested block whose state holds `finalized` as finalized checkpoint.
    pub fn attested(genesis: &GenesisConfig, slot: u64, finalized: &BeaconBlockHeader) -> Self {
        let block_number = slot + BLOCK_NUMBER_OFFSET;

        Self::new(
            genesis,
            slot,
            block_number,
            mock_block_hash(block_number),
            &StateContents {
                finalized_header: Some(finalized.hash_tree_root()),
                ..Default::default()
            },
        )
    }

    pub fn branch(&self, gindex: u64) -> Vec<Bytes32> {
        self.state.branch(gindex)
    }

    pub fn beacon(&self) -> &BeaconBlockHeader {
        self.header.beacon()
    }
}

/// Sync aggregate signed by the committee of `period`.
pub fn sync_aggregate(period: u64, participation: u64) -> SyncAggregate {
    SyncAggregate::new(
        participation,
        *committee_roots(period).poseidon_root(),
        [0u8; 32],
        Groth16Proof::default(),
    )
}

/// Checkpoint at `slot` with a proven current committee and an unknown next committee.
pub fn checkpoint(genesis: &GenesisConfig, slot: u64) -> (Bytes32, TrustedCheckpoint) {
    let fixture = HeaderFixture::finalized(genesis, slot);
    let period = calc_sync_period(slot);
    let branch = fixture.branch(fixture.schema().current_sync_committee());

    (
        *fixture.beacon().hash_tree_root().hash(),
        TrustedCheckpoint::new(
            fixture.header().clone(),
            committee_roots(period),
            branch,
            None,
        ),
    )
}

/// Store initialized from [`checkpoint`] over [`test_genesis`].
pub fn test_store(checkpoint_slot: u64) -> LightClientStore {
    let genesis = test_genesis();
    let (root, checkpoint) = checkpoint(&genesis, checkpoint_slot);

    LightClientStore::initialize(root, genesis, &checkpoint).expect("fixture checkpoint is valid")
}

/// Finality update signed at `signature_slot` by the committee of its period.
pub fn finality_update(
    genesis: &GenesisConfig,
    finalized_slot: u64,
    attested_slot: u64,
    signature_slot: u64,
    participation: u64,
) -> FinalityUpdate {
    let finalized = HeaderFixture::finalized(genesis, finalized_slot);
    let attested = HeaderFixture::attested(genesis, attested_slot, finalized.beacon());
    let branch = attested.branch(attested.schema().finalized_root());

    FinalityUpdate::new(
        attested.header().clone(),
        finalized.header().clone(),
        branch,
        sync_aggregate(calc_sync_period(signature_slot), participation),
        signature_slot,
    )
}

/// Full update announcing the committee following the period of `finalized_slot`.
pub fn full_update(
    genesis: &GenesisConfig,
    finalized_slot: u64,
    attested_slot: u64,
    signature_slot: u64,
    participation: u64,
) -> FullUpdate {
    let finalized = HeaderFixture::finalized(genesis, finalized_slot);
    let next = committee_roots(calc_sync_period(finalized_slot) + 1);

    FullUpdate::new(
        finality_update(
            genesis,
            finalized_slot,
            attested_slot,
            signature_slot,
            participation,
        ),
        CommitteeUpdate::new(
            *next.ssz_root(),
            finalized.branch(finalized.schema().next_sync_committee()),
            *next.poseidon_root(),
            Groth16Proof::default(),
        ),
    )
}

/// Optimistic update for a header at `attested_slot`.
pub fn optimistic_update(
    genesis: &GenesisConfig,
    attested_slot: u64,
    signature_slot: u64,
    participation: u64,
) -> OptimisticUpdate {
    let attested = HeaderFixture::finalized(genesis, attested_slot);

    OptimisticUpdate::new(
        attested.header().clone(),
        sync_aggregate(calc_sync_period(signature_slot), participation),
        signature_slot,
    )
}
