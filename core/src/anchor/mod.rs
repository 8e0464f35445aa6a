// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Anchor blocks
//!
//! [`AnchorBlocks`] is a sparse map from execution block number to block hash in which every entry
//! is trusted. An entry is trusted either because a sync committee signed the beacon block that
//! carries it, because the [`LightClientStore`] finalized it, or because the header of the block
//! right after it is known and commits to it as its parent hash.
//!
//! The map only grows: new heads are added as committees sign them, and the history below a known
//! block is filled by walking raw headers backward, one [`ParentHashWitness`] per block.

use crate::crypto::hash::HashValue;
use crate::crypto::oracle::ConsensusOracles;
use crate::merkle::error::MerkleError;
use crate::merkle::header_chain::ParentHashWitness;
use crate::merkle::update_proofs::{
    is_execution_field_proof_valid, is_execution_payload_proof_valid,
};
use crate::types::block::execution::ExecutionField;
use crate::types::store::LightClientStore;
use crate::types::update::HeadUpdate;
use crate::types::Bytes32;
use getset::Getters;
use log::{debug, info, warn};
use std::collections::BTreeMap;

pub mod error;

pub use error::AnchorError;

/// Source of trusted execution block hashes.
pub trait AnchorProvider {
    /// Returns the trusted hash of block `block_number`, if known.
    fn block_hash(&self, block_number: u64) -> Option<Bytes32>;
}

/// Emitted for every block hash recorded as trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorBlockUpdated {
    pub block_number: u64,
    pub block_hash: Bytes32,
}

/// The set of trusted execution block hashes.
#[derive(Debug, Default, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct AnchorBlocks {
    blocks: BTreeMap<u64, Bytes32>,
}

impl AnchorBlocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verifies a signed head and records the execution block it designates.
    ///
    /// # Arguments
    ///
    /// * `store` - The store holding the sync committees.
    /// * `oracles` - The verifiers of the signature proof.
    /// * `head` - The signed head.
    ///
    /// # Errors
    ///
    /// Returns an `AnchorError` if the signature is not accepted by the store or if the execution
    /// payload root, block number or block hash witnesses are missing or invalid.
    pub fn process_update(
        &mut self,
        store: &LightClientStore,
        oracles: &ConsensusOracles,
        head: &HeadUpdate,
    ) -> Result<Vec<AnchorBlockUpdated>, AnchorError> {
        let (block_number, block_hash) = verify_head(store, oracles, head)?;

        Ok(self.record(vec![(block_number, block_hash)]))
    }

    /// Verifies a signed head, then walks `witnesses` backward from the block it designates.
    /// Nothing is recorded unless both steps succeed.
    ///
    /// # Errors
    ///
    /// Returns an `AnchorError` if the head is invalid or if the header chain does not link to it.
    pub fn process_update_with_chain_proof(
        &mut self,
        store: &LightClientStore,
        oracles: &ConsensusOracles,
        head: &HeadUpdate,
        parent_hash_claim: &Bytes32,
        witnesses: &[ParentHashWitness],
    ) -> Result<Vec<AnchorBlockUpdated>, AnchorError> {
        let (block_number, block_hash) = verify_head(store, oracles, head)?;
        let mut linked = walk_back(block_number, &block_hash, parent_hash_claim, witnesses)?;
        linked.insert(0, (block_number, block_hash));

        Ok(self.record(linked))
    }

    /// Extends the trusted set below the known block `block_number`.
    ///
    /// Witness `i` holds the header of block `block_number - i` split around its parent hash. The
    /// parent hash of each header is the hash of the next witness, and the parent hash of the last
    /// one is `parent_hash_claim`. Every block hash reconstructed along the way, down to
    /// `parent_hash_claim` for block `block_number - witnesses.len()`, is recorded.
    ///
    /// # Errors
    ///
    /// Returns an `AnchorError` if `block_number` is not known, if `witnesses` is empty or longer
    /// than the chain below `block_number`, if a witness is malformed or if the reconstructed
    /// header of `block_number` does not hash to the known hash.
    pub fn extend_backward(
        &mut self,
        block_number: u64,
        parent_hash_claim: &Bytes32,
        witnesses: &[ParentHashWitness],
    ) -> Result<Vec<AnchorBlockUpdated>, AnchorError> {
        let known_hash = self
            .blocks
            .get(&block_number)
            .copied()
            .ok_or(AnchorError::UnknownAnchorBlock { block_number })?;

        let linked = walk_back(block_number, &known_hash, parent_hash_claim, witnesses)?;

        Ok(self.record(linked))
    }

    /// Records the finalized execution block of `store`.
    pub fn import_finalized(&mut self, store: &LightClientStore) -> AnchorBlockUpdated {
        let execution = store.finalized_execution();

        self.record_block(execution.block_number(), *execution.block_hash())
    }

    /// Lowest known block.
    pub fn earliest(&self) -> Option<(u64, Bytes32)> {
        self.blocks
            .first_key_value()
            .map(|(number, hash)| (*number, *hash))
    }

    /// Highest known block.
    pub fn latest(&self) -> Option<(u64, Bytes32)> {
        self.blocks
            .last_key_value()
            .map(|(number, hash)| (*number, *hash))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    fn record(&mut self, entries: Vec<(u64, Bytes32)>) -> Vec<AnchorBlockUpdated> {
        entries
            .into_iter()
            .map(|(block_number, block_hash)| self.record_block(block_number, block_hash))
            .collect()
    }

    fn record_block(&mut self, block_number: u64, block_hash: Bytes32) -> AnchorBlockUpdated {
        // A later signed or finalized head for the same number supersedes the earlier one
        if let Some(previous) = self.blocks.insert(block_number, block_hash) {
            if previous != block_hash {
                warn!(
                    "anchor block {block_number} changed from {} to {}, blocks walked back from it are no longer linked",
                    HashValue::new(previous),
                    HashValue::new(block_hash)
                );
            }
        }
        info!(
            "anchor block {block_number} recorded with hash {}",
            HashValue::new(block_hash)
        );

        AnchorBlockUpdated {
            block_number,
            block_hash,
        }
    }
}

impl AnchorProvider for AnchorBlocks {
    fn block_hash(&self, block_number: u64) -> Option<Bytes32> {
        self.blocks.get(&block_number).copied()
    }
}

/// Checks the signature of `head` against the committees of `store`, then the execution block
/// number and hash witnesses. Returns the verified block number and hash.
fn verify_head(
    store: &LightClientStore,
    oracles: &ConsensusOracles,
    head: &HeadUpdate,
) -> Result<(u64, Bytes32), AnchorError> {
    let beacon = head.attested_header().beacon();
    store.verify_committee_signature(
        head.signature_slot(),
        beacon,
        head.sync_aggregate(),
        oracles,
    )?;

    let schema = store
        .genesis()
        .fork_schedule()
        .schema_at_slot(beacon.slot())
        .ok_or(AnchorError::UnsupportedFork {
            slot: beacon.slot(),
        })?;

    let execution = head.attested_header().execution();
    let payload_root = execution.payload_root();
    if payload_root.branch().is_empty() {
        return Err(AnchorError::NoExecutionRootProof);
    }
    let payload_valid = is_execution_payload_proof_valid(
        beacon.body_root(),
        payload_root.leaf(),
        payload_root.branch(),
        &schema,
    )
    .unwrap_or(false);
    if !payload_valid {
        return Err(AnchorError::InvalidExecutionRootProof);
    }

    for field in [ExecutionField::BlockNumber, ExecutionField::BlockHash] {
        let witness = execution.field(field);
        if witness.branch().is_empty() {
            return Err(AnchorError::NoExecutionFieldProof { field });
        }
        let field_valid = is_execution_field_proof_valid(
            payload_root.leaf(),
            field,
            witness.leaf(),
            witness.branch(),
            &schema,
        )
        .unwrap_or(false);
        if !field_valid {
            return Err(AnchorError::InvalidExecutionFieldProof { field });
        }
    }

    let block_number = execution
        .execution_block_number()
        .map_err(|_| AnchorError::InvalidExecutionFieldProof {
            field: ExecutionField::BlockNumber,
        })?;
    debug!(
        "head at slot {} verified for execution block {block_number}",
        beacon.slot()
    );

    Ok((block_number, *execution.execution_block_hash()))
}

/// Reconstructs the hashes of the `witnesses.len()` blocks below `block_number` and checks that
/// they link up to `known_hash`. Returns the blocks to record, from the highest to the lowest.
fn walk_back(
    block_number: u64,
    known_hash: &Bytes32,
    parent_hash_claim: &Bytes32,
    witnesses: &[ParentHashWitness],
) -> Result<Vec<(u64, Bytes32)>, AnchorError> {
    let length = witnesses.len();
    if length == 0 || length as u64 > block_number {
        return Err(AnchorError::InvalidProofLength {
            block_number,
            length,
        });
    }

    // Hash the headers from the oldest one, whose parent is the claim, up to the known block
    let mut linked = vec![(block_number - length as u64, *parent_hash_claim)];
    let mut parent_hash = *parent_hash_claim;
    for (offset, witness) in witnesses.iter().enumerate().rev() {
        let current = block_number - offset as u64;
        let header_hash = witness
            .header_hash(&parent_hash)
            .map_err(|err| match err {
                MerkleError::InvalidLeftLength { actual, .. } => AnchorError::InvalidLeftLength {
                    block_number: current,
                    actual,
                },
                other => AnchorError::MalformedHeader {
                    block_number: current,
                    source: other.into(),
                },
            })?;
        parent_hash = *header_hash.hash();

        if offset > 0 {
            linked.push((current, parent_hash));
        }
    }

    if &parent_hash != known_hash {
        return Err(AnchorError::BlockHashMismatch {
            block_number,
            expected: HashValue::new(*known_hash).to_string(),
            actual: HashValue::new(parent_hash).to_string(),
        });
    }

    linked.reverse();
    debug!(
        "{length} headers linked below block {block_number}, down to block {}",
        block_number - length as u64
    );

    Ok(linked)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::hash::keccak_hash;
    use crate::test_utils::{
        mock_header_chain, mock_oracles, sync_aggregate, test_genesis, test_store, HeaderFixture,
        StateContents, FULL_PARTICIPATION,
    };
    use crate::types::block::execution::{ExecutionRef, Witness};
    use crate::types::block::HeaderWithExecution;
    use crate::types::update::OptimisticUpdate;
    use crate::types::utils::SLOTS_PER_SYNC_COMMITTEE_PERIOD as PERIOD;

    const CHECKPOINT_SLOT: u64 = 2 * PERIOD + 64;
    const HEAD_SLOT: u64 = CHECKPOINT_SLOT + 32;
    const HEAD_NUMBER: u64 = 8_687_478;
    const OLDEST_PARENT: Bytes32 = [0x5a; 32];

    /// Headers of blocks `HEAD_NUMBER` down to `HEAD_NUMBER - count + 1`, as witnesses, and the
    /// hash of the head block.
    fn chain(count: u64) -> (Vec<ParentHashWitness>, Bytes32) {
        let headers = mock_header_chain(HEAD_NUMBER, count, OLDEST_PARENT);
        let head_hash = *keccak_hash(&headers[0]).hash();
        let witnesses = headers
            .iter()
            .map(|raw| ParentHashWitness::from_raw_header(raw).unwrap().0)
            .collect();

        (witnesses, head_hash)
    }

    fn head(block_hash: Bytes32) -> HeadUpdate {
        let fixture = HeaderFixture::new(
            &test_genesis(),
            HEAD_SLOT,
            HEAD_NUMBER,
            block_hash,
            &StateContents::default(),
        );

        OptimisticUpdate::new(
            fixture.header().clone(),
            sync_aggregate(2, FULL_PARTICIPATION),
            HEAD_SLOT + 1,
        )
    }

    fn with_execution(head: &HeadUpdate, execution: ExecutionRef) -> HeadUpdate {
        OptimisticUpdate::new(
            HeaderWithExecution::new(head.attested_header().beacon().clone(), execution),
            head.sync_aggregate().clone(),
            head.signature_slot(),
        )
    }

    #[test]
    fn test_process_update() {
        let store = test_store(CHECKPOINT_SLOT);
        let mut anchors = AnchorBlocks::new();
        let (_, head_hash) = chain(1);

        let events = anchors
            .process_update(&store, &mock_oracles().oracles, &head(head_hash))
            .unwrap();

        assert_eq!(
            events,
            vec![AnchorBlockUpdated {
                block_number: HEAD_NUMBER,
                block_hash: head_hash
            }]
        );
        assert_eq!(anchors.block_hash(HEAD_NUMBER), Some(head_hash));
        assert_eq!(anchors.latest(), Some((HEAD_NUMBER, head_hash)));
    }

    #[test]
    fn test_process_update_rejections() {
        let store = test_store(CHECKPOINT_SLOT);
        let mut anchors = AnchorBlocks::new();
        let oracles = mock_oracles().oracles;
        let head = head([0x11; 32]);
        let execution = head.attested_header().execution();

        let low_participation = OptimisticUpdate::new(
            head.attested_header().clone(),
            sync_aggregate(2, 123),
            head.signature_slot(),
        );
        assert!(matches!(
            anchors.process_update(&store, &oracles, &low_participation),
            Err(AnchorError::InsufficientParticipation {
                participation: 123,
                ..
            })
        ));

        let bad_root = with_execution(
            &head,
            ExecutionRef::new(
                Witness::new([0u8; 32], execution.payload_root().branch().clone()),
                execution.state_root().clone(),
                execution.block_number().clone(),
                execution.block_hash().clone(),
            ),
        );
        assert!(matches!(
            anchors.process_update(&store, &oracles, &bad_root),
            Err(AnchorError::InvalidExecutionRootProof)
        ));

        let bad_hash = with_execution(
            &head,
            ExecutionRef::new(
                execution.payload_root().clone(),
                execution.state_root().clone(),
                execution.block_number().clone(),
                Witness::new([0u8; 32], execution.block_hash().branch().clone()),
            ),
        );
        assert!(matches!(
            anchors.process_update(&store, &oracles, &bad_hash),
            Err(AnchorError::InvalidExecutionFieldProof {
                field: ExecutionField::BlockHash
            })
        ));

        let bad_number = with_execution(
            &head,
            ExecutionRef::new(
                execution.payload_root().clone(),
                execution.state_root().clone(),
                Witness::new([0u8; 32], execution.block_number().branch().clone()),
                execution.block_hash().clone(),
            ),
        );
        assert!(matches!(
            anchors.process_update(&store, &oracles, &bad_number),
            Err(AnchorError::InvalidExecutionFieldProof {
                field: ExecutionField::BlockNumber
            })
        ));

        // The state root witness is not needed to anchor a block
        let no_state_root = with_execution(
            &head,
            ExecutionRef::new(
                execution.payload_root().clone(),
                Witness::default(),
                execution.block_number().clone(),
                execution.block_hash().clone(),
            ),
        );
        assert!(anchors
            .process_update(&store, &oracles, &no_state_root)
            .is_ok());

        let mocks = mock_oracles();
        mocks.signature.set_accept(false);
        let mut anchors = AnchorBlocks::new();
        assert!(matches!(
            anchors.process_update(&store, &mocks.oracles, &head),
            Err(AnchorError::InvalidHeadSignature { .. })
        ));
        assert!(anchors.is_empty());
    }

    #[test]
    fn test_process_update_with_chain_proof() {
        let store = test_store(CHECKPOINT_SLOT);
        let mut anchors = AnchorBlocks::new();
        let oracles = mock_oracles().oracles;
        let (witnesses, head_hash) = chain(1);

        let events = anchors
            .process_update_with_chain_proof(
                &store,
                &oracles,
                &head(head_hash),
                &OLDEST_PARENT,
                &witnesses,
            )
            .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            AnchorBlockUpdated {
                block_number: HEAD_NUMBER - 1,
                block_hash: OLDEST_PARENT
            }
        );
        assert_eq!(anchors.block_hash(HEAD_NUMBER - 1), Some(OLDEST_PARENT));
        assert_eq!(anchors.block_hash(HEAD_NUMBER), Some(head_hash));
    }

    #[test]
    fn test_chain_proof_rejections() {
        let store = test_store(CHECKPOINT_SLOT);
        let mut anchors = AnchorBlocks::new();
        let oracles = mock_oracles().oracles;
        let (witnesses, head_hash) = chain(1);
        let head = head(head_hash);

        assert!(matches!(
            anchors.process_update_with_chain_proof(&store, &oracles, &head, &OLDEST_PARENT, &[]),
            Err(AnchorError::InvalidProofLength { length: 0, .. })
        ));

        let short_left = ParentHashWitness::new(vec![0x00], witnesses[0].right().clone());
        assert!(matches!(
            anchors.process_update_with_chain_proof(
                &store,
                &oracles,
                &head,
                &OLDEST_PARENT,
                &[short_left]
            ),
            Err(AnchorError::InvalidLeftLength {
                block_number: HEAD_NUMBER,
                actual: 1
            })
        ));

        assert!(matches!(
            anchors.process_update_with_chain_proof(
                &store,
                &oracles,
                &head,
                &[0u8; 32],
                &witnesses
            ),
            Err(AnchorError::BlockHashMismatch {
                block_number: HEAD_NUMBER,
                ..
            })
        ));

        // Nothing was recorded, not even the verified head
        assert!(anchors.is_empty());
    }

    #[test]
    fn test_extend_backward() {
        let store = test_store(CHECKPOINT_SLOT);
        let mut anchors = AnchorBlocks::new();
        let (witnesses, head_hash) = chain(5);
        anchors
            .process_update(&store, &mock_oracles().oracles, &head(head_hash))
            .unwrap();

        let events = anchors
            .extend_backward(HEAD_NUMBER, &OLDEST_PARENT, &witnesses)
            .unwrap();

        assert_eq!(events.len(), 5);
        assert_eq!(anchors.len(), 6);
        assert_eq!(anchors.earliest(), Some((HEAD_NUMBER - 5, OLDEST_PARENT)));
        for (offset, event) in events.iter().enumerate() {
            assert_eq!(event.block_number, HEAD_NUMBER - 1 - offset as u64);
        }

        // Each recorded hash is the hash of the next witness header
        let headers = mock_header_chain(HEAD_NUMBER, 5, OLDEST_PARENT);
        assert_eq!(
            anchors.block_hash(HEAD_NUMBER - 2),
            Some(*keccak_hash(&headers[2]).hash())
        );

        // Continue from the new earliest block
        let older = mock_header_chain(HEAD_NUMBER - 5, 2, [0x77; 32]);
        let older_witnesses: Vec<_> = older
            .iter()
            .map(|raw| ParentHashWitness::from_raw_header(raw).unwrap().0)
            .collect();
        // The headers were built with another parent for block HEAD_NUMBER - 5, they do not link
        assert!(matches!(
            anchors.extend_backward(HEAD_NUMBER - 5, &[0x77; 32], &older_witnesses),
            Err(AnchorError::BlockHashMismatch { .. })
        ));
    }

    #[test]
    fn test_extend_backward_is_all_or_nothing() {
        let store = test_store(CHECKPOINT_SLOT);
        let mut anchors = AnchorBlocks::new();
        let (mut witnesses, head_hash) = chain(4);
        anchors
            .process_update(&store, &mock_oracles().oracles, &head(head_hash))
            .unwrap();
        let before = anchors.clone();

        // Break the link between the two middle headers
        let mut right = witnesses[2].right().clone();
        right[10] ^= 1;
        witnesses[2] = ParentHashWitness::new(witnesses[2].left().clone(), right);

        assert!(matches!(
            anchors.extend_backward(HEAD_NUMBER, &OLDEST_PARENT, &witnesses),
            Err(AnchorError::BlockHashMismatch { .. })
        ));
        assert_eq!(anchors, before);

        assert!(matches!(
            anchors.extend_backward(HEAD_NUMBER - 1, &OLDEST_PARENT, &witnesses),
            Err(AnchorError::UnknownAnchorBlock {
                block_number
            }) if block_number == HEAD_NUMBER - 1
        ));
    }

    #[test]
    fn test_import_finalized() {
        let store = test_store(CHECKPOINT_SLOT);
        let mut anchors = AnchorBlocks::new();

        let event = anchors.import_finalized(&store);

        assert_eq!(event.block_number, store.finalized_execution().block_number());
        assert_eq!(
            anchors.block_hash(event.block_number),
            Some(*store.finalized_execution().block_hash())
        );
    }

    #[test]
    fn test_import_finalized_supersedes_head() {
        let store = test_store(CHECKPOINT_SLOT);
        let block_number = store.finalized_execution().block_number();
        let finalized_hash = *store.finalized_execution().block_hash();
        let mut anchors = AnchorBlocks::new();
        anchors.record_block(block_number, [0xee; 32]);
        anchors.record_block(block_number - 1, [0xdd; 32]);

        let event = anchors.import_finalized(&store);

        assert_eq!(event.block_hash, finalized_hash);
        assert_eq!(anchors.block_hash(block_number), Some(finalized_hash));
        assert_eq!(anchors.block_hash(block_number - 1), Some([0xdd; 32]));
        assert_eq!(anchors.len(), 2);
    }
}
