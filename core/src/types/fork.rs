// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Fork module
//!
//! The beacon chain state and block body layouts change across forks, which moves the generalized
//! indices at which the light client finds the data it proves. This module holds:
//!
//! - the [`BranchSchema`] of each supported fork, defining every generalized index in one place,
//! - the [`ForkSchedule`] mapping epochs to forks and fork versions,
//! - the [`GenesisConfig`] of a network, from which signing domains are derived.

use crate::types::block::execution::ExecutionField;
use crate::types::error::TypesError;
use crate::types::signing_data::compute_domain;
use crate::types::utils::{calc_epoch, SECONDS_PER_SLOT};
use crate::types::Bytes32;
use getset::{CopyGetters, Getters};
use std::fmt;

/// Length in bytes of a fork version.
pub const FORK_VERSION_LEN: usize = 4;

/// A fork version, as found in the beacon state `Fork` container.
pub type ForkVersion = [u8; FORK_VERSION_LEN];

/// Domain type of sync committee signatures.
///
/// From [the Altair specifications](https://github.com/ethereum/consensus-specs/blob/dev/specs/altair/beacon-chain.md#domain-types).
pub const DOMAIN_SYNC_COMMITTEE: [u8; 4] = [0x07, 0x00, 0x00, 0x00];

/// Generalized indices of every value the light client proves, for one fork.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct BranchSchema {
    /// `finalized_checkpoint.root` in the beacon state.
    finalized_root: u64,
    /// `current_sync_committee` in the beacon state.
    current_sync_committee: u64,
    /// `next_sync_committee` in the beacon state.
    next_sync_committee: u64,
    /// `execution_payload` in the beacon block body.
    execution_payload: u64,
    /// `state_root` in the execution payload.
    execution_state_root: u64,
    /// `block_number` in the execution payload.
    execution_block_number: u64,
    /// `block_hash` in the execution payload.
    execution_block_hash: u64,
}

impl BranchSchema {
    /// Generalized index of an execution payload field.
    pub const fn execution_field(&self, field: ExecutionField) -> u64 {
        match field {
            ExecutionField::StateRoot => self.execution_state_root,
            ExecutionField::BlockNumber => self.execution_block_number,
            ExecutionField::BlockHash => self.execution_block_hash,
        }
    }
}

/// Capella: 15 execution payload fields.
pub const CAPELLA_SCHEMA: BranchSchema = BranchSchema {
    finalized_root: 105,
    current_sync_committee: 54,
    next_sync_committee: 55,
    execution_payload: 25,
    execution_state_root: 18,
    execution_block_number: 22,
    execution_block_hash: 28,
};

/// Deneb: blob gas fields push the execution payload to 17 fields.
pub const DENEB_SCHEMA: BranchSchema = BranchSchema {
    finalized_root: 105,
    current_sync_committee: 54,
    next_sync_committee: 55,
    execution_payload: 25,
    execution_state_root: 34,
    execution_block_number: 38,
    execution_block_hash: 44,
};

/// Electra: the beacon state grows past 32 fields.
pub const ELECTRA_SCHEMA: BranchSchema = BranchSchema {
    finalized_root: 169,
    current_sync_committee: 86,
    next_sync_committee: 87,
    execution_payload: 25,
    execution_state_root: 34,
    execution_block_number: 38,
    execution_block_hash: 44,
};

/// Beacon chain forks known to the light client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ForkName {
    Phase0,
    Altair,
    Bellatrix,
    Capella,
    Deneb,
    Electra,
}

impl ForkName {
    /// Branch schema of the fork. Forks before Capella have no execution payload header to prove
    /// and are not supported.
    pub const fn schema(&self) -> Option<BranchSchema> {
        match self {
            ForkName::Phase0 | ForkName::Altair | ForkName::Bellatrix => None,
            ForkName::Capella => Some(CAPELLA_SCHEMA),
            ForkName::Deneb => Some(DENEB_SCHEMA),
            ForkName::Electra => Some(ELECTRA_SCHEMA),
        }
    }
}

impl fmt::Display for ForkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ForkName::Phase0 => "phase0",
            ForkName::Altair => "altair",
            ForkName::Bellatrix => "bellatrix",
            ForkName::Capella => "capella",
            ForkName::Deneb => "deneb",
            ForkName::Electra => "electra",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for ForkName {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "phase0" => Ok(ForkName::Phase0),
            "altair" => Ok(ForkName::Altair),
            "bellatrix" => Ok(ForkName::Bellatrix),
            "capella" => Ok(ForkName::Capella),
            "deneb" => Ok(ForkName::Deneb),
            "electra" => Ok(ForkName::Electra),
            other => Err(TypesError::InvalidValue {
                structure: "ForkName".into(),
                reason: format!("unknown fork {other}"),
            }),
        }
    }
}

/// A fork activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, CopyGetters)]
pub struct Fork {
    #[getset(get_copy = "pub")]
    name: ForkName,
    #[getset(get_copy = "pub")]
    epoch: u64,
    #[getset(get = "pub")]
    version: ForkVersion,
}

impl Fork {
    pub const fn new(name: ForkName, epoch: u64, version: ForkVersion) -> Self {
        Self {
            name,
            epoch,
            version,
        }
    }
}

/// The ordered list of forks of a network.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct ForkSchedule {
    forks: Vec<Fork>,
}

impl ForkSchedule {
    /// Builds a schedule from a list of forks.
    ///
    /// # Errors
    ///
    /// Returns a `TypesError` if the list is empty, does not start at epoch 0, or is not strictly
    /// ordered by both epoch and fork name.
    pub fn new(forks: Vec<Fork>) -> Result<Self, TypesError> {
        let invalid = |reason: &str| TypesError::InvalidValue {
            structure: "ForkSchedule".into(),
            reason: reason.into(),
        };

        match forks.first() {
            None => return Err(invalid("no fork given")),
            Some(first) if first.epoch != 0 => {
                return Err(invalid("the first fork must activate at epoch 0"))
            }
            Some(_) => {}
        }

        let ordered = forks
            .windows(2)
            .all(|pair| pair[0].epoch < pair[1].epoch && pair[0].name < pair[1].name);
        if !ordered {
            return Err(invalid("forks must be strictly ordered"));
        }

        Ok(Self { forks })
    }

    /// Returns the fork active at the given epoch.
    pub fn fork_at_epoch(&self, epoch: u64) -> &Fork {
        // The first fork activates at epoch 0, so the search always finds one.
        self.forks
            .iter()
            .rev()
            .find(|fork| fork.epoch <= epoch)
            .unwrap_or(&self.forks[0])
    }

    /// Returns the fork active at the given slot.
    pub fn fork_at_slot(&self, slot: u64) -> &Fork {
        self.fork_at_epoch(calc_epoch(slot))
    }

    /// Returns the branch schema of the fork active at the given slot, if supported.
    pub fn schema_at_slot(&self, slot: u64) -> Option<BranchSchema> {
        self.fork_at_slot(slot).name.schema()
    }
}

/// Static parameters of a network, used to derive signing domains and wall clock slots.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct GenesisConfig {
    #[getset(get_copy = "pub")]
    genesis_time: u64,
    #[getset(get = "pub")]
    genesis_validators_root: Bytes32,
    #[getset(get = "pub")]
    fork_schedule: ForkSchedule,
}

impl GenesisConfig {
    pub const fn new(
        genesis_time: u64,
        genesis_validators_root: Bytes32,
        fork_schedule: ForkSchedule,
    ) -> Self {
        Self {
            genesis_time,
            genesis_validators_root,
            fork_schedule,
        }
    }

    /// Slot in progress at the given unix timestamp, or `None` before genesis.
    pub fn slot_at(&self, timestamp: u64) -> Option<u64> {
        timestamp
            .checked_sub(self.genesis_time)
            .map(|elapsed| elapsed / SECONDS_PER_SLOT)
    }

    /// Domain of a sync committee signature included at `signature_slot`. The committee signs
    /// during the previous slot, so the fork version is taken at `signature_slot - 1`.
    ///
    /// From [the Altair specifications](https://github.com/ethereum/consensus-specs/blob/dev/specs/altair/light-client/sync-protocol.md#validate_light_client_update).
    pub fn sync_committee_domain(&self, signature_slot: u64) -> Bytes32 {
        let fork = self
            .fork_schedule
            .fork_at_slot(signature_slot.max(1) - 1);

        compute_domain(
            DOMAIN_SYNC_COMMITTEE,
            fork.version,
            self.genesis_validators_root,
        )
    }
}
