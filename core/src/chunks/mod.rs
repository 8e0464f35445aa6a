// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Block chunks
//!
//! [`BlockChunks`] stores, for each registered chain, the Merkle roots of ranges of
//! [`CHUNK_SIZE`] consecutive blocks. A chunk is accepted when its succinct proof verifies and it
//! is bound to something already trusted:
//! - the most recent chunks end at a block whose hash is known to an [`AnchorProvider`],
//! - older chunks end at the block preceding an already stored chunk, whose `prev_hash` must be
//!   the end hash of the new one.
//!
//! Any block hash inside a stored chunk can then be checked with a Merkle branch, see
//! [`BlockChunks::is_block_hash_valid`].

use crate::anchor::AnchorProvider;
use crate::crypto::hash::HashValue;
use crate::crypto::oracle::ProofOracle;
use crate::merkle::chunk::{is_chunk_branch_valid, CHUNK_DEPTH, CHUNK_SIZE};
use crate::types::Bytes32;
use getset::{CopyGetters, Getters};
use log::{debug, info};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub mod error;
pub mod proof;

pub use error::ChunkError;
pub use proof::ChunkProof;

const CHUNK_SIZE_U64: u64 = CHUNK_SIZE as u64;

/// A stored chunk, covering blocks `start` to `start + 127`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, CopyGetters)]
pub struct ChunkRecord {
    #[getset(get_copy = "pub")]
    start: u64,
    #[getset(get = "pub")]
    merkle_root: Bytes32,
    #[getset(get = "pub")]
    end_hash: Bytes32,
    #[getset(get = "pub")]
    prev_hash: Bytes32,
}

impl ChunkRecord {
    pub const fn end(&self) -> u64 {
        self.start + CHUNK_SIZE_U64 - 1
    }
}

impl From<&ChunkProof> for ChunkRecord {
    fn from(proof: &ChunkProof) -> Self {
        Self {
            start: proof.start_block_number(),
            merkle_root: *proof.chunk_root(),
            end_hash: *proof.end_hash(),
            prev_hash: *proof.prev_hash(),
        }
    }
}

/// Claim that a block has a given hash, with the data needed to check it against a stored chunk.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct BlockHashWitness {
    #[getset(get_copy = "pub")]
    chain_id: u64,
    #[getset(get_copy = "pub")]
    block_number: u64,
    #[getset(get = "pub")]
    claimed_block_hash: Bytes32,
    #[getset(get = "pub")]
    prev_hash: Bytes32,
    #[getset(get_copy = "pub")]
    num_final: u64,
    #[getset(get = "pub")]
    merkle_proof: Vec<Bytes32>,
}

impl BlockHashWitness {
    pub const fn new(
        chain_id: u64,
        block_number: u64,
        claimed_block_hash: Bytes32,
        prev_hash: Bytes32,
        num_final: u64,
        merkle_proof: Vec<Bytes32>,
    ) -> Self {
        Self {
            chain_id,
            block_number,
            claimed_block_hash,
            prev_hash,
            num_final,
            merkle_proof,
        }
    }
}

struct ChainChunks {
    oracle: Arc<dyn ProofOracle>,
    records: BTreeMap<u64, ChunkRecord>,
}

impl fmt::Debug for ChainChunks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainChunks")
            .field("records", &self.records)
            .finish_non_exhaustive()
    }
}

/// Chunk roots of every registered chain.
#[derive(Debug, Default)]
pub struct BlockChunks {
    chains: BTreeMap<u64, ChainChunks>,
}

impl BlockChunks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `chain_id` with the verifier of its chunk proofs. Registering a known chain only
    /// replaces its verifier.
    pub fn register_chain(&mut self, chain_id: u64, oracle: Arc<dyn ProofOracle>) {
        match self.chains.get_mut(&chain_id) {
            Some(chain) => chain.oracle = oracle,
            None => {
                self.chains.insert(
                    chain_id,
                    ChainChunks {
                        oracle,
                        records: BTreeMap::new(),
                    },
                );
            }
        }
        info!("chain {chain_id} registered for chunk sync");
    }

    pub fn is_registered(&self, chain_id: u64) -> bool {
        self.chains.contains_key(&chain_id)
    }

    /// Returns the chunk of `chain_id` starting at block `start`, if stored.
    pub fn chunk(&self, chain_id: u64, start: u64) -> Option<&ChunkRecord> {
        self.chains
            .get(&chain_id)
            .and_then(|chain| chain.records.get(&start))
    }

    /// Returns the lowest stored chunk of `chain_id`.
    pub fn earliest_chunk(&self, chain_id: u64) -> Option<&ChunkRecord> {
        self.chains
            .get(&chain_id)
            .and_then(|chain| chain.records.values().next())
    }

    /// Stores a chunk whose last block hash is known to `anchors`.
    ///
    /// # Errors
    ///
    /// Returns a `ChunkError` if the chain is not registered, the proof is malformed or rejected,
    /// the range is not a single aligned chunk, the end hash differs from the anchor block hash or
    /// the chunk is already stored.
    pub fn update_recent(
        &mut self,
        chain_id: u64,
        anchors: &dyn AnchorProvider,
        proof_bytes: &[u8],
    ) -> Result<ChunkRecord, ChunkError> {
        let chain = self.chain_mut(chain_id)?;
        let proof = decode_and_verify(chain.oracle.as_ref(), proof_bytes)?;
        let end = proof.end_block_number();

        let anchor_hash = anchors
            .block_hash(end)
            .ok_or(ChunkError::UnknownAnchorBlock { block_number: end })?;
        if &anchor_hash != proof.end_hash() {
            return Err(ChunkError::EndHashMismatch {
                block_number: end,
                expected: HashValue::new(anchor_hash).to_string(),
                actual: HashValue::new(*proof.end_hash()).to_string(),
            });
        }

        chain.store(ChunkRecord::from(&proof))
    }

    /// Stores the chunk starting at `start_block_number`, which must end right below the stored
    /// chunk of root `next_chunk_root`.
    ///
    /// # Errors
    ///
    /// Returns a `ChunkError` if the chain is not registered, the proof is malformed, rejected,
    /// or does not start at `start_block_number`, if no chunk can follow it, if the following
    /// chunk is not stored with root `next_chunk_root`, if that chunk does not link to the proven
    /// end hash or if the chunk is already stored.
    pub fn update_old(
        &mut self,
        chain_id: u64,
        next_chunk_root: &Bytes32,
        start_block_number: u64,
        proof_bytes: &[u8],
    ) -> Result<ChunkRecord, ChunkError> {
        let chain = self.chain_mut(chain_id)?;

        let proof = ChunkProof::from_bytes(proof_bytes)?;
        if proof.start_block_number() != start_block_number {
            return Err(ChunkError::StartMismatch {
                expected: start_block_number,
                actual: proof.start_block_number(),
            });
        }
        let proof = verify_proof(chain.oracle.as_ref(), proof)?;

        let next_start = start_block_number
            .checked_add(CHUNK_SIZE_U64)
            .ok_or(ChunkError::LastChunk {
                start: start_block_number,
            })?;
        let next = chain
            .records
            .get(&next_start)
            .ok_or(ChunkError::UnknownNextChunk { start: next_start })?;
        if next.merkle_root() != next_chunk_root {
            return Err(ChunkError::NextChunkRootMismatch { start: next_start });
        }
        if next.prev_hash() != proof.end_hash() {
            return Err(ChunkError::PrevHashMismatch { start: next_start });
        }

        chain.store(ChunkRecord::from(&proof))
    }

    /// Checks a claimed block hash against the stored chunk containing the block. Any missing data
    /// or mismatch yields `false`.
    pub fn is_block_hash_valid(&self, witness: &BlockHashWitness) -> bool {
        let start = witness.block_number - witness.block_number % CHUNK_SIZE_U64;
        let Some(record) = self.chunk(witness.chain_id, start) else {
            return false;
        };

        if witness.num_final != CHUNK_SIZE_U64
            || witness.prev_hash != record.prev_hash
            || witness.merkle_proof.len() != CHUNK_DEPTH
        {
            return false;
        }

        is_chunk_branch_valid(
            &HashValue::new(record.merkle_root),
            &witness.claimed_block_hash,
            witness.block_number % CHUNK_SIZE_U64,
            &witness.merkle_proof,
        )
    }

    fn chain_mut(&mut self, chain_id: u64) -> Result<&mut ChainChunks, ChunkError> {
        self.chains
            .get_mut(&chain_id)
            .ok_or(ChunkError::UnsupportedChain { chain_id })
    }
}

impl ChainChunks {
    fn store(&mut self, record: ChunkRecord) -> Result<ChunkRecord, ChunkError> {
        if self.records.contains_key(&record.start) {
            return Err(ChunkError::ChunkAlreadyStored {
                start: record.start,
            });
        }
        self.records.insert(record.start, record);

        info!(
            "chunk of blocks {} to {} stored with root {}",
            record.start,
            record.end(),
            HashValue::new(record.merkle_root)
        );

        Ok(record)
    }
}

fn decode_and_verify(
    oracle: &dyn ProofOracle,
    proof_bytes: &[u8],
) -> Result<ChunkProof, ChunkError> {
    verify_proof(oracle, ChunkProof::from_bytes(proof_bytes)?)
}

/// Checks that the proof covers a single aligned chunk and that the verifier accepts it.
fn verify_proof(oracle: &dyn ProofOracle, proof: ChunkProof) -> Result<ChunkProof, ChunkError> {
    let (start, end) = (proof.start_block_number(), proof.end_block_number());
    if end.checked_sub(start) != Some(CHUNK_SIZE_U64 - 1) {
        return Err(ChunkError::InvalidRange { start, end });
    }
    if start % CHUNK_SIZE_U64 != 0 {
        return Err(ChunkError::MisalignedStart { start });
    }
    if !oracle.verify(proof.proof(), &proof.public_inputs()) {
        return Err(ChunkError::InvalidProof { start, end });
    }
    debug!("chunk proof of blocks {start} to {end} verified");

    Ok(proof)
}
