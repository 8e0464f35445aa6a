// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Engine
//!
//! The [`Engine`] owns the three verification components and routes each feed entry to the one it
//! concerns. Components only read each other's state: anchor blocks check head signatures against
//! the store and chunks check their end hash against the anchor blocks.

use crate::config::Config;
use crate::error::EngineError;
use crate::feed::{header_witnesses, FeedEntry};
use beacon_lc_core::anchor::{AnchorBlockUpdated, AnchorBlocks};
use beacon_lc_core::chunks::{BlockChunks, BlockHashWitness, ChunkRecord};
use beacon_lc_core::crypto::oracle::{ConsensusOracles, Groth16Proof, ProofOracle};
use beacon_lc_core::types::store::{LightClientStore, StoreEvent};
use beacon_lc_core::types::update::LightClientUpdate;
use beacon_lc_core::types::Bytes32;
use getset::{CopyGetters, Getters};
use log::{debug, info, warn};
use std::sync::Arc;

/// A [`ProofOracle`] accepting every proof.
///
/// Only meant for replaying feeds whose succinct proofs were checked beforehand: with it, the
/// engine still verifies every Merkle branch and hash link but trusts the proofs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UncheckedOracle;

impl ProofOracle for UncheckedOracle {
    fn verify(&self, _proof: &Groth16Proof, _public_inputs: &[Bytes32]) -> bool {
        true
    }
}

/// Result of an accepted feed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Store(Vec<StoreEvent>),
    Anchors(Vec<AnchorBlockUpdated>),
    Chunk(ChunkRecord),
    BlockHash {
        chain_id: u64,
        block_number: u64,
        valid: bool,
    },
}

/// Counters of a feed replay.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct ReplaySummary {
    applied: usize,
    rejected: usize,
    invalid_block_hashes: usize,
}

#[derive(Debug, Getters)]
#[getset(get = "pub")]
pub struct Engine {
    store: LightClientStore,
    anchors: AnchorBlocks,
    chunks: BlockChunks,
    oracles: ConsensusOracles,
}

impl Engine {
    /// Bootstraps the store from the configured checkpoint and registers the configured chunk
    /// chains, all verified by `chunk_oracle`.
    ///
    /// # Errors
    ///
    /// Returns an `EngineError` if the checkpoint is rejected.
    pub fn new(
        config: &Config,
        oracles: ConsensusOracles,
        chunk_oracle: Arc<dyn ProofOracle>,
    ) -> Result<Self, EngineError> {
        let store = LightClientStore::initialize(
            *config.trusted_block_root(),
            config.genesis().clone(),
            config.checkpoint(),
        )?;
        info!(
            "store bootstrapped at slot {}, period {}",
            store.finalized_header().slot(),
            store.current_period()
        );

        let mut chunks = BlockChunks::new();
        for chain_id in config.chunk_chains() {
            chunks.register_chain(*chain_id, chunk_oracle.clone());
        }

        Ok(Self {
            store,
            anchors: AnchorBlocks::new(),
            chunks,
            oracles,
        })
    }

    /// Applies a light client update to the store.
    ///
    /// # Errors
    ///
    /// Returns an `EngineError` if the store rejects the update.
    pub fn process_update(
        &mut self,
        update: &LightClientUpdate,
    ) -> Result<Vec<StoreEvent>, EngineError> {
        Ok(self.store.process_update(update, &self.oracles)?)
    }

    /// Applies a feed entry.
    ///
    /// # Errors
    ///
    /// Returns an `EngineError` if the entry is malformed or rejected by its component. Nothing is
    /// changed in that case.
    pub fn apply(&mut self, entry: &FeedEntry) -> Result<Outcome, EngineError> {
        let outcome = match entry {
            FeedEntry::Update(update) => {
                Outcome::Store(self.process_update(&LightClientUpdate::try_from(update)?)?)
            }
            FeedEntry::AnchorHead { head, headers } => {
                let head = head.to_head_update()?;
                let events = if headers.is_empty() {
                    self.anchors
                        .process_update(&self.store, &self.oracles, &head)?
                } else {
                    let (witnesses, claim) = header_witnesses(headers)?;
                    self.anchors.process_update_with_chain_proof(
                        &self.store,
                        &self.oracles,
                        &head,
                        &claim,
                        &witnesses,
                    )?
                };
                Outcome::Anchors(events)
            }
            FeedEntry::ExtendBackward {
                block_number,
                headers,
            } => {
                let (witnesses, claim) = header_witnesses(headers)?;
                Outcome::Anchors(
                    self.anchors
                        .extend_backward(block_number.0, &claim, &witnesses)?,
                )
            }
            FeedEntry::ImportFinalized => {
                Outcome::Anchors(vec![self.anchors.import_finalized(&self.store)])
            }
            FeedEntry::ChunkRecent { chain_id, proof } => {
                Outcome::Chunk(self.chunks.update_recent(chain_id.0, &self.anchors, &proof.0)?)
            }
            FeedEntry::ChunkOld {
                chain_id,
                next_chunk_root,
                start_block_number,
                proof,
            } => Outcome::Chunk(self.chunks.update_old(
                chain_id.0,
                &next_chunk_root.0,
                start_block_number.0,
                &proof.0,
            )?),
            FeedEntry::BlockHash(claim) => Outcome::BlockHash {
                chain_id: claim.chain_id().0,
                block_number: claim.block_number().0,
                valid: self.chunks.is_block_hash_valid(&BlockHashWitness::from(claim)),
            },
        };
        debug!("{} entry applied: {outcome:?}", entry.kind());

        Ok(outcome)
    }

    /// Applies every entry in order. Rejected entries are logged and skipped.
    pub fn replay<'a>(
        &mut self,
        entries: impl IntoIterator<Item = &'a FeedEntry>,
    ) -> ReplaySummary {
        let mut summary = ReplaySummary::default();

        for (index, entry) in entries.into_iter().enumerate() {
            match self.apply(entry) {
                Ok(Outcome::BlockHash {
                    chain_id,
                    block_number,
                    valid: false,
                }) => {
                    warn!(
                        "entry {index}: block hash of block {block_number} on chain {chain_id} \
                         is not proven"
                    );
                    summary.invalid_block_hashes += 1;
                }
                Ok(_) => summary.applied += 1,
                Err(err) => {
                    warn!("entry {index} ({}) rejected: {err}", entry.kind());
                    summary.rejected += 1;
                }
            }
        }

        info!(
            "replay done: {} applied, {} rejected, {} unproven block hashes",
            summary.applied, summary.rejected, summary.invalid_block_hashes
        );

        summary
    }
}
