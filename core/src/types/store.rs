// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Light Client Store
//!
//! The `LightClientStore` represents the full state for our Light Client. It includes the
//! necessary data to be maintained to verify the consensus rules in future updates. This data
//! structure lives as long as the Light Client is running.
//!
//! It notably exposes the main entry point for consensus verification through the `process_update`
//! function. This function will validate the given `LightClientUpdate` in full and only then apply
//! it to the `LightClientStore`, returning the events describing what changed.

use crate::crypto::hash::HashValue;
use crate::crypto::oracle::{ConsensusOracles, ProofOracle};
use crate::merkle::update_proofs::{
    is_current_committee_proof_valid, is_finality_proof_valid, is_next_committee_proof_valid,
};
use crate::merkle::Merkleized;
use crate::types::block::consensus::BeaconBlockHeader;
use crate::types::block::execution::ExecutionField;
use crate::types::block::HeaderWithExecution;
use crate::types::committee::{CommitteeUpdate, SyncAggregate, MIN_SYNC_COMMITTEE_PARTICIPANTS};
use crate::types::error::{ConsensusError, StoreError, TypesError};
use crate::types::fork::{BranchSchema, GenesisConfig};
use crate::types::signing_data::compute_signing_root;
use crate::types::update::LightClientUpdate;
use crate::types::utils::calc_sync_period;
use crate::types::Bytes32;
use getset::{CopyGetters, Getters};
use log::{debug, info};

/// The two roots identifying a sync committee.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct CommitteeRoots {
    ssz_root: Bytes32,
    poseidon_root: Bytes32,
}

impl CommitteeRoots {
    pub const fn new(ssz_root: Bytes32, poseidon_root: Bytes32) -> Self {
        Self {
            ssz_root,
            poseidon_root,
        }
    }
}

impl From<&CommitteeUpdate> for CommitteeRoots {
    fn from(update: &CommitteeUpdate) -> Self {
        Self::new(
            *update.next_committee_root(),
            *update.next_committee_poseidon_root(),
        )
    }
}

/// The execution block designated by a trusted beacon header.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Getters, CopyGetters)]
pub struct ExecutionState {
    #[getset(get = "pub")]
    state_root: Bytes32,
    #[getset(get_copy = "pub")]
    block_number: u64,
    #[getset(get = "pub")]
    block_hash: Bytes32,
    #[getset(get_copy = "pub")]
    slot: u64,
}

impl ExecutionState {
    pub const fn new(
        state_root: Bytes32,
        block_number: u64,
        block_hash: Bytes32,
        slot: u64,
    ) -> Self {
        Self {
            state_root,
            block_number,
            block_hash,
            slot,
        }
    }

    /// Reads the execution state out of the witnesses of a header. The witnesses are expected to
    /// have been verified already.
    pub fn from_header(header: &HeaderWithExecution) -> Result<Self, TypesError> {
        let execution = header.execution();

        Ok(Self::new(
            *execution.execution_state_root(),
            execution.execution_block_number()?,
            *execution.execution_block_hash(),
            header.beacon().slot(),
        ))
    }
}

/// Trusted data the store is bootstrapped from, supplied out of band.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct TrustedCheckpoint {
    header: HeaderWithExecution,
    current_committee: CommitteeRoots,
    /// Proof of the current committee SSZ root in the header state. Left empty to skip the check.
    current_committee_branch: Vec<Bytes32>,
    next_committee: Option<CommitteeRoots>,
}

impl TrustedCheckpoint {
    pub const fn new(
        header: HeaderWithExecution,
        current_committee: CommitteeRoots,
        current_committee_branch: Vec<Bytes32>,
        next_committee: Option<CommitteeRoots>,
    ) -> Self {
        Self {
            header,
            current_committee,
            current_committee_branch,
            next_committee,
        }
    }
}

/// Changes applied to the store by an accepted update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    HeaderUpdated {
        slot: u64,
        state_root: Bytes32,
        execution_state_root: Bytes32,
        finalized: bool,
    },
    FinalityUpdated {
        slot: u64,
        block_number: u64,
        block_hash: Bytes32,
    },
    OptimisticUpdated {
        slot: u64,
        block_number: u64,
        block_hash: Bytes32,
    },
    SyncCommitteeUpdated {
        period: u64,
        root: Bytes32,
        poseidon_root: Bytes32,
    },
}

/// The `LightClientStore` represents the full state for our Light Client. It includes the necessary
/// data to be maintained to verify the consensus rules in future updates.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct LightClientStore {
    #[getset(get = "pub")]
    genesis: GenesisConfig,
    #[getset(get = "pub")]
    finalized_header: BeaconBlockHeader,
    #[getset(get = "pub")]
    finalized_execution: ExecutionState,
    #[getset(get = "pub")]
    optimistic_header: BeaconBlockHeader,
    #[getset(get = "pub")]
    optimistic_execution: ExecutionState,
    #[getset(get = "pub")]
    current_committee: CommitteeRoots,
    #[getset(get = "pub")]
    next_committee: Option<CommitteeRoots>,
    /// Attested slot of the latest accepted finality carrying update.
    #[getset(get_copy = "pub")]
    latest_finality_attested_slot: u64,
}

impl LightClientStore {
    /// Initializes the `LightClientStore` with the given `TrustedCheckpoint`.
    ///
    /// # Arguments
    ///
    /// * `trusted_block_root` - The block root of the trusted checkpoint.
    /// * `genesis` - The genesis configuration of the network.
    /// * `checkpoint` - The `TrustedCheckpoint` data to initialize the store.
    ///
    /// # Returns
    ///
    /// A `Result` containing the initialized `LightClientStore` or a `StoreError` if the given
    /// checkpoint does not match the trusted root or carries invalid proofs.
    pub fn initialize(
        trusted_block_root: Bytes32,
        genesis: GenesisConfig,
        checkpoint: &TrustedCheckpoint,
    ) -> Result<Self, StoreError> {
        let beacon = checkpoint.header.beacon();

        // Ensure that we receive the checkpoint for the correct block
        let checkpoint_block_root = beacon.hash_tree_root();
        if &trusted_block_root != checkpoint_block_root.hash() {
            return Err(StoreError::InvalidBootstrap {
                expected: HashValue::new(trusted_block_root).to_string(),
                actual: checkpoint_block_root.to_string(),
            });
        }

        let schema = genesis
            .fork_schedule()
            .schema_at_slot(beacon.slot())
            .ok_or(StoreError::UnsupportedFork {
                slot: beacon.slot(),
            })?;

        // Confirm that the given sync committee was committed in the block
        if !checkpoint.current_committee_branch.is_empty() {
            let is_valid = is_current_committee_proof_valid(
                beacon.state_root(),
                checkpoint.current_committee.ssz_root(),
                &checkpoint.current_committee_branch,
                &schema,
            )
            .map_err(|err| StoreError::MerkleError { source: err.into() })?;

            if !is_valid {
                return Err(StoreError::InvalidCurrentCommitteeProof);
            }
        }

        checkpoint
            .header
            .verify_execution(&schema)
            .map_err(|err| StoreError::InvalidExecutionProof { source: err.into() })?;
        let execution = ExecutionState::from_header(&checkpoint.header)
            .map_err(|err| StoreError::InvalidExecutionProof { source: err.into() })?;

        info!(
            "store initialized at slot {} (execution block {})",
            beacon.slot(),
            execution.block_number()
        );

        Ok(Self {
            genesis,
            finalized_header: beacon.clone(),
            finalized_execution: execution,
            optimistic_header: beacon.clone(),
            optimistic_execution: execution,
            current_committee: checkpoint.current_committee,
            next_committee: checkpoint.next_committee,
            latest_finality_attested_slot: beacon.slot(),
        })
    }

    /// Returns the sync committee period of the finalized header.
    pub fn current_period(&self) -> u64 {
        calc_sync_period(self.finalized_header.slot())
    }

    /// Main entrypoint for consensus verification. This function validates the given
    /// `LightClientUpdate` and, only if every check succeeds, applies it to the store.
    ///
    /// # Arguments
    ///
    /// * `update` - The `LightClientUpdate` data to process.
    /// * `oracles` - The verifiers of the signature and committee mapping proofs.
    ///
    /// # Returns
    ///
    /// A `Result` containing the events describing the changes applied to the store, or a
    /// `ConsensusError` if the update is invalid. An invalid update leaves the store untouched.
    pub fn process_update(
        &mut self,
        update: &LightClientUpdate,
        oracles: &ConsensusOracles,
    ) -> Result<Vec<StoreEvent>, ConsensusError> {
        let new_execution = self.validate_update(update, oracles)?;

        Ok(self.apply_update(update, new_execution))
    }

    /// Verifies that the sync committee signed `attested_header` at `signature_slot`. This covers
    /// the participation threshold, the selection of the committee for the signature period and
    /// the signature proof itself.
    ///
    /// # Errors
    ///
    /// Returns a `ConsensusError` naming the first check that failed.
    pub fn verify_committee_signature(
        &self,
        signature_slot: u64,
        attested_header: &BeaconBlockHeader,
        sync_aggregate: &SyncAggregate,
        oracles: &ConsensusOracles,
    ) -> Result<(), ConsensusError> {
        check_quorum(sync_aggregate)?;

        let expected_poseidon_root = self.committee_poseidon_root_at(signature_slot)?;
        if sync_aggregate.poseidon_root() != expected_poseidon_root {
            return Err(ConsensusError::InvalidCommitteePoseidonRoot {
                expected: HashValue::new(*expected_poseidon_root).to_string(),
                actual: HashValue::new(*sync_aggregate.poseidon_root()).to_string(),
            });
        }

        let domain = self.genesis.sync_committee_domain(signature_slot);
        let signing_root = compute_signing_root(&attested_header.hash_tree_root(), domain);
        let public_inputs = sync_aggregate.public_inputs(&signing_root);

        if !oracles
            .signature()
            .verify(sync_aggregate.proof(), &public_inputs)
        {
            return Err(ConsensusError::InvalidSignatureProof);
        }

        debug!(
            "sync committee signature accepted for slot {} ({} participants)",
            attested_header.slot(),
            sync_aggregate.participation()
        );

        Ok(())
    }

    /// Selects the Poseidon root of the committee expected to sign at `signature_slot`.
    fn committee_poseidon_root_at(&self, signature_slot: u64) -> Result<&Bytes32, ConsensusError> {
        let signature_period = calc_sync_period(signature_slot);
        let store_period = self.current_period();

        if signature_period == store_period {
            Ok(self.current_committee.poseidon_root())
        } else if signature_period == store_period + 1 {
            self.next_committee
                .as_ref()
                .map(CommitteeRoots::poseidon_root)
                .ok_or(ConsensusError::UnknownNextSyncCommittee)
        } else {
            Err(ConsensusError::InvalidPeriod {
                signature_period,
                store_period,
            })
        }
    }

    fn schema_at(&self, slot: u64) -> Result<BranchSchema, ConsensusError> {
        self.genesis
            .fork_schedule()
            .schema_at_slot(slot)
            .ok_or(ConsensusError::UnsupportedFork { slot })
    }

    /// Runs every check on `update` without touching the store. Returns the execution state of the
    /// header the update makes trusted.
    fn validate_update(
        &self,
        update: &LightClientUpdate,
        oracles: &ConsensusOracles,
    ) -> Result<ExecutionState, ConsensusError> {
        let attested = update.attested_header().beacon();
        let signature_slot = update.signature_slot();

        // Ordering and relevance
        match update.finality() {
            Some(finality) => {
                if attested.slot() <= self.latest_finality_attested_slot {
                    return Err(ConsensusError::StaleUpdate {
                        update_slot: attested.slot(),
                        latest_slot: self.latest_finality_attested_slot,
                    });
                }

                let finalized = finality.finalized_header().beacon();
                if finalized.slot() <= self.finalized_header.slot()
                    && !self.fills_next_committee(update)
                {
                    return Err(ConsensusError::NotRelevant);
                }

                if !(signature_slot > attested.slot() && attested.slot() >= finalized.slot()) {
                    return Err(ConsensusError::InvalidTimestamp);
                }

                let finalized_period = calc_sync_period(finalized.slot());
                if finalized_period == self.current_period() + 1 && self.next_committee.is_none() {
                    return Err(ConsensusError::UnknownNextSyncCommittee);
                }
                if finalized_period > self.current_period() + 1 {
                    return Err(ConsensusError::InvalidPeriod {
                        signature_period: calc_sync_period(signature_slot),
                        store_period: self.current_period(),
                    });
                }
            }
            None => {
                if attested.slot() <= self.optimistic_header.slot() {
                    return Err(ConsensusError::StaleUpdate {
                        update_slot: attested.slot(),
                        latest_slot: self.optimistic_header.slot(),
                    });
                }
                if signature_slot <= attested.slot() {
                    return Err(ConsensusError::InvalidTimestamp);
                }
            }
        }

        check_quorum(update.sync_aggregate())?;

        // Finality proof
        if let Some(finality) = update.finality() {
            if finality.finality_branch().is_empty() {
                return Err(ConsensusError::NoFinalityProof);
            }
            let schema = self.schema_at(attested.slot())?;
            let is_valid = is_finality_proof_valid(
                attested.state_root(),
                finality.finalized_header().beacon(),
                finality.finality_branch(),
                &schema,
            )
            .unwrap_or(false);
            if !is_valid {
                return Err(ConsensusError::InvalidFinalityProof);
            }
            debug!("finality proof accepted for slot {}", attested.slot());
        }

        // Execution witnesses of the header becoming trusted
        let trusted_header = update
            .finality()
            .map_or_else(|| update.attested_header(), |f| f.finalized_header());
        let schema = self.schema_at(trusted_header.beacon().slot())?;
        trusted_header.verify_execution(&schema)?;
        let execution = ExecutionState::from_header(trusted_header).map_err(|_| {
            ConsensusError::InvalidExecutionFieldProof {
                field: ExecutionField::BlockNumber,
            }
        })?;

        // Next sync committee
        if let (Some(committee_update), Some(finality)) =
            (update.committee_update(), update.finality())
        {
            if committee_update.next_committee_branch().is_empty() {
                return Err(ConsensusError::NoNextSyncCommitteeProof);
            }
            let finalized = finality.finalized_header().beacon();
            let is_valid = is_next_committee_proof_valid(
                finalized.state_root(),
                committee_update.next_committee_root(),
                committee_update.next_committee_branch(),
                &schema,
            )
            .unwrap_or(false);
            if !is_valid {
                return Err(ConsensusError::InvalidNextSyncCommitteeProof);
            }

            if !oracles.committee_mapping().verify(
                committee_update.mapping_proof(),
                &committee_update.mapping_public_inputs(),
            ) {
                return Err(ConsensusError::InvalidCommitteeRootMapping);
            }
            debug!(
                "next sync committee {} accepted",
                HashValue::new(*committee_update.next_committee_root())
            );
        }

        self.verify_committee_signature(
            signature_slot,
            attested,
            update.sync_aggregate(),
            oracles,
        )?;

        Ok(execution)
    }

    /// Whether `update` is a full update completing an unknown next committee for the current
    /// period.
    fn fills_next_committee(&self, update: &LightClientUpdate) -> bool {
        match (update.committee_update(), update.finality()) {
            (Some(_), Some(finality)) => {
                self.next_committee.is_none()
                    && calc_sync_period(finality.finalized_header().beacon().slot())
                        == self.current_period()
            }
            _ => false,
        }
    }

    /// Applies a validated update. Must only be called once `validate_update` succeeded.
    fn apply_update(
        &mut self,
        update: &LightClientUpdate,
        new_execution: ExecutionState,
    ) -> Vec<StoreEvent> {
        let mut events = Vec::new();

        let Some(finality) = update.finality() else {
            let attested = update.attested_header().beacon();
            self.optimistic_header = attested.clone();
            self.optimistic_execution = new_execution;

            info!(
                "optimistic header updated to slot {} (execution block {})",
                attested.slot(),
                new_execution.block_number()
            );
            events.push(StoreEvent::HeaderUpdated {
                slot: attested.slot(),
                state_root: *attested.state_root(),
                execution_state_root: *new_execution.state_root(),
                finalized: false,
            });
            events.push(StoreEvent::OptimisticUpdated {
                slot: attested.slot(),
                block_number: new_execution.block_number(),
                block_hash: *new_execution.block_hash(),
            });

            return events;
        };

        // Committee changes are computed against the period before the update
        let store_period = self.current_period();
        let finalized = finality.finalized_header().beacon();
        let finalized_period = calc_sync_period(finalized.slot());
        let fills_next = self.fills_next_committee(update);

        self.latest_finality_attested_slot = update.attested_header().beacon().slot();

        if finalized.slot() > self.finalized_header.slot() {
            self.finalized_header = finalized.clone();
            self.finalized_execution = new_execution;

            info!(
                "finalized header updated to slot {} (execution block {})",
                finalized.slot(),
                new_execution.block_number()
            );
            events.push(StoreEvent::HeaderUpdated {
                slot: finalized.slot(),
                state_root: *finalized.state_root(),
                execution_state_root: *new_execution.state_root(),
                finalized: true,
            });
            events.push(StoreEvent::FinalityUpdated {
                slot: finalized.slot(),
                block_number: new_execution.block_number(),
                block_hash: *new_execution.block_hash(),
            });

            if finalized.slot() > self.optimistic_header.slot() {
                self.optimistic_header = finalized.clone();
                self.optimistic_execution = new_execution;
            }
        }

        let announced = update.committee_update().map(CommitteeRoots::from);
        let next_changed = if finalized_period == store_period + 1 {
            if let Some(next) = self.next_committee.take() {
                self.current_committee = next;
            }
            self.next_committee = announced;
            info!("sync committee rotated to period {finalized_period}");
            true
        } else if fills_next {
            self.next_committee = announced;
            true
        } else {
            false
        };

        if let (true, Some(next)) = (next_changed, &self.next_committee) {
            info!(
                "next sync committee for period {} set to {}",
                finalized_period + 1,
                HashValue::new(*next.ssz_root())
            );
            events.push(StoreEvent::SyncCommitteeUpdated {
                period: finalized_period + 1,
                root: *next.ssz_root(),
                poseidon_root: *next.poseidon_root(),
            });
        }

        events
    }
}

fn check_quorum(sync_aggregate: &SyncAggregate) -> Result<(), ConsensusError> {
    if !sync_aggregate.has_quorum() {
        return Err(ConsensusError::InsufficientParticipation {
            participation: sync_aggregate.participation(),
            required: MIN_SYNC_COMMITTEE_PARTICIPANTS,
        });
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::oracle::Groth16Proof;
    use crate::test_utils::{
        checkpoint, committee_roots, finality_update, full_update, mock_block_hash, mock_oracles,
        optimistic_update, sync_aggregate, test_genesis, test_store, BLOCK_NUMBER_OFFSET,
        FULL_PARTICIPATION,
    };
    use crate::types::block::execution::{ExecutionRef, Witness};
    use crate::types::update::{FinalityUpdate, FullUpdate, OptimisticUpdate};
    use crate::types::utils::SLOTS_PER_SYNC_COMMITTEE_PERIOD as PERIOD;

    const CHECKPOINT_SLOT: u64 = 2 * PERIOD + 64;
    const FINALIZED_SLOT: u64 = CHECKPOINT_SLOT + 64;

    fn full(finalized_slot: u64, attested_slot: u64, signature_slot: u64) -> LightClientUpdate {
        full_update(
            &test_genesis(),
            finalized_slot,
            attested_slot,
            signature_slot,
            FULL_PARTICIPATION,
        )
        .into()
    }

    fn finality(finalized_slot: u64, attested_slot: u64, signature_slot: u64) -> FinalityUpdate {
        finality_update(
            &test_genesis(),
            finalized_slot,
            attested_slot,
            signature_slot,
            FULL_PARTICIPATION,
        )
    }

    fn with_branch(update: &FinalityUpdate, branch: Vec<Bytes32>) -> LightClientUpdate {
        FinalityUpdate::new(
            update.attested_header().clone(),
            update.finalized_header().clone(),
            branch,
            update.sync_aggregate().clone(),
            update.signature_slot(),
        )
        .into()
    }

    /// Store whose next committee is known, after a full update finalizing `FINALIZED_SLOT`.
    fn synced_store() -> LightClientStore {
        let mut store = test_store(CHECKPOINT_SLOT);
        store
            .process_update(
                &full(FINALIZED_SLOT, FINALIZED_SLOT + 64, FINALIZED_SLOT + 65),
                &mock_oracles().oracles,
            )
            .unwrap();
        store
    }

    #[test]
    fn test_initialize() {
        let store = test_store(CHECKPOINT_SLOT);

        assert_eq!(store.current_period(), 2);
        assert_eq!(store.finalized_header().slot(), CHECKPOINT_SLOT);
        assert_eq!(store.optimistic_header().slot(), CHECKPOINT_SLOT);
        assert_eq!(
            store.finalized_execution().block_number(),
            CHECKPOINT_SLOT + BLOCK_NUMBER_OFFSET
        );
        assert_eq!(store.current_committee(), &committee_roots(2));
        assert!(store.next_committee().is_none());

        // Electra moved the committees in the state tree
        let electra = test_store(4 * PERIOD + 32);
        assert_eq!(electra.current_committee(), &committee_roots(4));
    }

    #[test]
    fn test_initialize_rejects_invalid_checkpoint() {
        let genesis = test_genesis();
        let (root, trusted) = checkpoint(&genesis, CHECKPOINT_SLOT);

        let result = LightClientStore::initialize([0u8; 32], genesis.clone(), &trusted);
        assert!(matches!(result, Err(StoreError::InvalidBootstrap { .. })));

        let wrong_committee = TrustedCheckpoint::new(
            trusted.header().clone(),
            committee_roots(3),
            trusted.current_committee_branch().clone(),
            None,
        );
        let result = LightClientStore::initialize(root, genesis.clone(), &wrong_committee);
        assert!(matches!(
            result,
            Err(StoreError::InvalidCurrentCommitteeProof)
        ));

        // Without a branch the committee is taken as is
        let unproven = TrustedCheckpoint::new(
            trusted.header().clone(),
            committee_roots(3),
            vec![],
            Some(committee_roots(4)),
        );
        let store = LightClientStore::initialize(root, genesis, &unproven).unwrap();
        assert_eq!(store.next_committee(), &Some(committee_roots(4)));
    }

    #[test]
    fn test_full_update_fills_next_committee() {
        let mut store = test_store(CHECKPOINT_SLOT);
        let mocks = mock_oracles();

        let events = store
            .process_update(
                &full(FINALIZED_SLOT, FINALIZED_SLOT + 64, FINALIZED_SLOT + 65),
                &mocks.oracles,
            )
            .unwrap();

        let block_number = FINALIZED_SLOT + BLOCK_NUMBER_OFFSET;
        assert_eq!(store.finalized_header().slot(), FINALIZED_SLOT);
        assert_eq!(store.optimistic_header().slot(), FINALIZED_SLOT);
        assert_eq!(store.finalized_execution().block_number(), block_number);
        assert_eq!(store.latest_finality_attested_slot(), FINALIZED_SLOT + 64);
        assert_eq!(store.current_committee(), &committee_roots(2));
        assert_eq!(store.next_committee(), &Some(committee_roots(3)));

        assert!(events.contains(&StoreEvent::FinalityUpdated {
            slot: FINALIZED_SLOT,
            block_number,
            block_hash: mock_block_hash(block_number),
        }));
        assert!(events.contains(&StoreEvent::SyncCommitteeUpdated {
            period: 3,
            root: *committee_roots(3).ssz_root(),
            poseidon_root: *committee_roots(3).poseidon_root(),
        }));

        let [hi, lo] = HashValue::new(*committee_roots(3).ssz_root()).split_words();
        assert_eq!(
            mocks.committee_mapping.last_public_inputs(),
            Some(vec![hi, lo, *committee_roots(3).poseidon_root()])
        );
    }

    #[test]
    fn test_insufficient_participation() {
        let mut store = test_store(CHECKPOINT_SLOT);
        let snapshot = store.clone();
        let genesis = test_genesis();

        let update: LightClientUpdate = full_update(
            &genesis,
            FINALIZED_SLOT,
            FINALIZED_SLOT + 64,
            FINALIZED_SLOT + 65,
            341,
        )
        .into();
        let result = store.process_update(&update, &mock_oracles().oracles);
        assert!(matches!(
            result,
            Err(ConsensusError::InsufficientParticipation {
                participation: 341,
                required: 342
            })
        ));
        assert_eq!(store, snapshot);

        let update: LightClientUpdate = full_update(
            &genesis,
            FINALIZED_SLOT,
            FINALIZED_SLOT + 64,
            FINALIZED_SLOT + 65,
            342,
        )
        .into();
        assert!(store
            .process_update(&update, &mock_oracles().oracles)
            .is_ok());
    }

    #[test]
    fn test_committee_rotation() {
        let mut store = synced_store();
        let oracles = mock_oracles().oracles;

        // Same period, no rotation
        let update = finality(FINALIZED_SLOT + 64, FINALIZED_SLOT + 128, FINALIZED_SLOT + 129);
        store.process_update(&update.into(), &oracles).unwrap();
        assert_eq!(store.current_committee(), &committee_roots(2));
        assert_eq!(store.next_committee(), &Some(committee_roots(3)));

        // Finalizing into the next period rotates, the next committee becomes unknown
        let update = finality(3 * PERIOD + 32, 3 * PERIOD + 64, 3 * PERIOD + 65);
        let events = store.process_update(&update.into(), &oracles).unwrap();
        assert_eq!(store.current_period(), 3);
        assert_eq!(store.current_committee(), &committee_roots(3));
        assert!(store.next_committee().is_none());
        assert!(!events
            .iter()
            .any(|event| matches!(event, StoreEvent::SyncCommitteeUpdated { .. })));

        // Nothing can be signed by the committee of period 4 yet
        let early = optimistic_update(&test_genesis(), 4 * PERIOD + 10, 4 * PERIOD + 11, 512);
        assert!(matches!(
            store.process_update(&early.clone().into(), &oracles),
            Err(ConsensusError::UnknownNextSyncCommittee)
        ));

        // A full update of period 3 completes it
        let events = store
            .process_update(
                &full(3 * PERIOD + 96, 3 * PERIOD + 128, 3 * PERIOD + 129),
                &oracles,
            )
            .unwrap();
        assert!(events.contains(&StoreEvent::SyncCommitteeUpdated {
            period: 4,
            root: *committee_roots(4).ssz_root(),
            poseidon_root: *committee_roots(4).poseidon_root(),
        }));
        assert!(store.process_update(&early.into(), &oracles).is_ok());
    }

    #[test]
    fn test_full_update_rotation() {
        let mut store = synced_store();
        let oracles = mock_oracles().oracles;

        store
            .process_update(
                &full(3 * PERIOD + 32, 3 * PERIOD + 64, 3 * PERIOD + 65),
                &oracles,
            )
            .unwrap();
        assert_eq!(store.current_committee(), &committee_roots(3));
        assert_eq!(store.next_committee(), &Some(committee_roots(4)));
    }

    #[test]
    fn test_period_change_requires_next_committee() {
        let mut store = test_store(CHECKPOINT_SLOT);
        let update = finality(3 * PERIOD + 32, 3 * PERIOD + 64, 3 * PERIOD + 65);

        assert!(matches!(
            store.process_update(&update.into(), &mock_oracles().oracles),
            Err(ConsensusError::UnknownNextSyncCommittee)
        ));
    }

    #[test]
    fn test_stale_and_irrelevant_updates() {
        let mut store = synced_store();
        let oracles = mock_oracles().oracles;

        let replay = full(FINALIZED_SLOT, FINALIZED_SLOT + 64, FINALIZED_SLOT + 65);
        assert!(matches!(
            store.process_update(&replay, &oracles),
            Err(ConsensusError::StaleUpdate {
                update_slot,
                latest_slot
            }) if update_slot == FINALIZED_SLOT + 64 && latest_slot == FINALIZED_SLOT + 64
        ));

        let same_finalized = finality(FINALIZED_SLOT, FINALIZED_SLOT + 96, FINALIZED_SLOT + 97);
        assert!(matches!(
            store.process_update(&same_finalized.into(), &oracles),
            Err(ConsensusError::NotRelevant)
        ));

        // Next committee already known
        let same_finalized = full(FINALIZED_SLOT, FINALIZED_SLOT + 96, FINALIZED_SLOT + 97);
        assert!(matches!(
            store.process_update(&same_finalized, &oracles),
            Err(ConsensusError::NotRelevant)
        ));
    }

    #[test]
    fn test_full_update_without_finality_progress() {
        let mut store = test_store(CHECKPOINT_SLOT);

        // Finalizes the checkpoint again, but brings the next committee
        let events = store
            .process_update(
                &full(CHECKPOINT_SLOT, CHECKPOINT_SLOT + 64, CHECKPOINT_SLOT + 65),
                &mock_oracles().oracles,
            )
            .unwrap();
        assert_eq!(store.finalized_header().slot(), CHECKPOINT_SLOT);
        assert_eq!(store.next_committee(), &Some(committee_roots(3)));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_invalid_timestamp() {
        let mut store = test_store(CHECKPOINT_SLOT);
        let oracles = mock_oracles().oracles;

        let unsigned = finality(FINALIZED_SLOT, FINALIZED_SLOT + 64, FINALIZED_SLOT + 64);
        assert!(matches!(
            store.process_update(&unsigned.into(), &oracles),
            Err(ConsensusError::InvalidTimestamp)
        ));

        let inverted = finality(FINALIZED_SLOT + 64, FINALIZED_SLOT, FINALIZED_SLOT + 65);
        assert!(matches!(
            store.process_update(&inverted.into(), &oracles),
            Err(ConsensusError::InvalidTimestamp)
        ));

        let optimistic = optimistic_update(&test_genesis(), FINALIZED_SLOT, FINALIZED_SLOT, 512);
        assert!(matches!(
            store.process_update(&optimistic.into(), &oracles),
            Err(ConsensusError::InvalidTimestamp)
        ));
    }

    #[test]
    fn test_finality_branch() {
        let mut store = test_store(CHECKPOINT_SLOT);
        let snapshot = store.clone();
        let oracles = mock_oracles().oracles;
        let update = finality(FINALIZED_SLOT, FINALIZED_SLOT + 64, FINALIZED_SLOT + 65);

        let branch = update.finality_branch();
        for truncated_branch in [&branch[1..], &branch[1..branch.len() - 1]] {
            let truncated = with_branch(&update, truncated_branch.to_vec());
            assert!(matches!(
                store.process_update(&truncated, &oracles),
                Err(ConsensusError::InvalidFinalityProof)
            ));
        }

        let mut tampered_branch = update.finality_branch().clone();
        tampered_branch[0][0] ^= 1;
        let tampered = with_branch(&update, tampered_branch);
        assert!(matches!(
            store.process_update(&tampered, &oracles),
            Err(ConsensusError::InvalidFinalityProof)
        ));

        let empty = with_branch(&update, vec![]);
        assert!(matches!(
            store.process_update(&empty, &oracles),
            Err(ConsensusError::NoFinalityProof)
        ));

        assert_eq!(store, snapshot);
    }

    #[test]
    fn test_execution_witnesses() {
        let mut store = test_store(CHECKPOINT_SLOT);
        let oracles = mock_oracles().oracles;
        let update = finality(FINALIZED_SLOT, FINALIZED_SLOT + 64, FINALIZED_SLOT + 65);
        let execution = update.finalized_header().execution();

        let with_execution = |execution: ExecutionRef| -> LightClientUpdate {
            FinalityUpdate::new(
                update.attested_header().clone(),
                HeaderWithExecution::new(update.finalized_header().beacon().clone(), execution),
                update.finality_branch().clone(),
                update.sync_aggregate().clone(),
                update.signature_slot(),
            )
            .into()
        };

        let forged_hash = with_execution(ExecutionRef::new(
            execution.payload_root().clone(),
            execution.state_root().clone(),
            execution.block_number().clone(),
            Witness::new([0xff; 32], execution.block_hash().branch().clone()),
        ));
        assert!(matches!(
            store.process_update(&forged_hash, &oracles),
            Err(ConsensusError::InvalidExecutionFieldProof {
                field: ExecutionField::BlockHash
            })
        ));

        let no_payload = with_execution(ExecutionRef::new(
            Witness::new(*execution.payload_root().leaf(), vec![]),
            execution.state_root().clone(),
            execution.block_number().clone(),
            execution.block_hash().clone(),
        ));
        assert!(matches!(
            store.process_update(&no_payload, &oracles),
            Err(ConsensusError::NoExecutionPayloadProof)
        ));
    }

    #[test]
    fn test_next_committee_checks() {
        let genesis = test_genesis();
        let mut store = test_store(CHECKPOINT_SLOT);
        let snapshot = store.clone();
        let update = full_update(
            &genesis,
            FINALIZED_SLOT,
            FINALIZED_SLOT + 64,
            FINALIZED_SLOT + 65,
            FULL_PARTICIPATION,
        );
        let committee = update.committee_update();

        let with_committee = |committee: CommitteeUpdate| -> LightClientUpdate {
            FullUpdate::new(update.finality_update().clone(), committee).into()
        };

        let no_branch = with_committee(CommitteeUpdate::new(
            *committee.next_committee_root(),
            vec![],
            *committee.next_committee_poseidon_root(),
            Groth16Proof::default(),
        ));
        assert!(matches!(
            store.process_update(&no_branch, &mock_oracles().oracles),
            Err(ConsensusError::NoNextSyncCommitteeProof)
        ));

        let wrong_root = with_committee(CommitteeUpdate::new(
            *committee_roots(9).ssz_root(),
            committee.next_committee_branch().clone(),
            *committee.next_committee_poseidon_root(),
            Groth16Proof::default(),
        ));
        assert!(matches!(
            store.process_update(&wrong_root, &mock_oracles().oracles),
            Err(ConsensusError::InvalidNextSyncCommitteeProof)
        ));

        let mocks = mock_oracles();
        mocks.committee_mapping.set_accept(false);
        assert!(matches!(
            store.process_update(&update.clone().into(), &mocks.oracles),
            Err(ConsensusError::InvalidCommitteeRootMapping)
        ));

        assert_eq!(store, snapshot);
    }

    #[test]
    fn test_signature_checks() {
        let genesis = test_genesis();
        let mut store = test_store(CHECKPOINT_SLOT);

        let mocks = mock_oracles();
        mocks.signature.set_accept(false);
        let update = finality(FINALIZED_SLOT, FINALIZED_SLOT + 64, FINALIZED_SLOT + 65);
        assert!(matches!(
            store.process_update(&update.clone().into(), &mocks.oracles),
            Err(ConsensusError::InvalidSignatureProof)
        ));

        let wrong_committee: LightClientUpdate = FinalityUpdate::new(
            update.attested_header().clone(),
            update.finalized_header().clone(),
            update.finality_branch().clone(),
            sync_aggregate(7, FULL_PARTICIPATION),
            update.signature_slot(),
        )
        .into();
        assert!(matches!(
            store.process_update(&wrong_committee, &mock_oracles().oracles),
            Err(ConsensusError::InvalidCommitteePoseidonRoot { .. })
        ));

        let far = optimistic_update(&genesis, 5 * PERIOD + 10, 5 * PERIOD + 11, 512);
        assert!(matches!(
            store.process_update(&far.into(), &mock_oracles().oracles),
            Err(ConsensusError::InvalidPeriod {
                signature_period: 5,
                store_period: 2
            })
        ));
    }

    #[test]
    fn test_signature_public_inputs() {
        let genesis = test_genesis();
        let mut store = test_store(CHECKPOINT_SLOT);
        let mocks = mock_oracles();

        let update = optimistic_update(&genesis, FINALIZED_SLOT, FINALIZED_SLOT + 1, 400);
        store
            .process_update(&update.clone().into(), &mocks.oracles)
            .unwrap();

        let domain = genesis.sync_committee_domain(FINALIZED_SLOT + 1);
        assert_eq!(&domain[..4], &[0x07, 0x00, 0x00, 0x00]);
        let signing_root =
            compute_signing_root(&update.attested_header().beacon().hash_tree_root(), domain);

        assert_eq!(
            mocks.signature.last_public_inputs(),
            Some(update.sync_aggregate().public_inputs(&signing_root))
        );
    }

    #[test]
    fn test_optimistic_update() {
        let genesis = test_genesis();
        let mut store = test_store(CHECKPOINT_SLOT);
        let oracles = mock_oracles().oracles;

        let update: OptimisticUpdate =
            optimistic_update(&genesis, FINALIZED_SLOT + 200, FINALIZED_SLOT + 201, 512);
        let events = store.process_update(&update.clone().into(), &oracles).unwrap();

        let block_number = FINALIZED_SLOT + 200 + BLOCK_NUMBER_OFFSET;
        assert_eq!(store.optimistic_header().slot(), FINALIZED_SLOT + 200);
        assert_eq!(store.optimistic_execution().block_number(), block_number);
        assert_eq!(store.finalized_header().slot(), CHECKPOINT_SLOT);
        assert_eq!(
            events,
            vec![
                StoreEvent::HeaderUpdated {
                    slot: FINALIZED_SLOT + 200,
                    state_root: *update.attested_header().beacon().state_root(),
                    execution_state_root: *update
                        .attested_header()
                        .execution()
                        .execution_state_root(),
                    finalized: false,
                },
                StoreEvent::OptimisticUpdated {
                    slot: FINALIZED_SLOT + 200,
                    block_number,
                    block_hash: mock_block_hash(block_number),
                },
            ]
        );

        // Optimistic updates are ordered on their own
        assert!(matches!(
            store.process_update(&update.into(), &oracles),
            Err(ConsensusError::StaleUpdate { .. })
        ));

        // A finalized header behind the optimistic one leaves it in place
        store
            .process_update(
                &finality(FINALIZED_SLOT, FINALIZED_SLOT + 64, FINALIZED_SLOT + 65).into(),
                &oracles,
            )
            .unwrap();
        assert_eq!(store.finalized_header().slot(), FINALIZED_SLOT);
        assert_eq!(store.optimistic_header().slot(), FINALIZED_SLOT + 200);
    }

    #[test]
    fn test_finalized_slot_never_decreases() {
        let mut store = synced_store();
        let oracles = mock_oracles().oracles;
        let mut finalized_slot = store.finalized_header().slot();

        for (finalized, attested) in [(600, 700), (500, 800), (900, 950), (900, 1000)] {
            let update = finality(
                CHECKPOINT_SLOT + finalized,
                CHECKPOINT_SLOT + attested,
                CHECKPOINT_SLOT + attested + 1,
            );
            let _ = store.process_update(&update.into(), &oracles);
            assert!(store.finalized_header().slot() >= finalized_slot);
            finalized_slot = store.finalized_header().slot();
        }
        assert_eq!(finalized_slot, CHECKPOINT_SLOT + 900);
    }
}
