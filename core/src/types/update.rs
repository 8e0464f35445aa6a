// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Light Client Update
//!
//! The module contains the update messages that our Light Client leverages to update its state to
//! the latest one on the Beacon chain. Every update carries an attested header signed by the sync
//! committee. Finality carrying updates also prove a finalized header in the attested state, and
//! full updates announce the next sync committee.

use crate::types::block::HeaderWithExecution;
use crate::types::committee::{CommitteeUpdate, SyncAggregate};
use crate::types::Bytes32;
use getset::{CopyGetters, Getters};

/// An update proving that a header was finalized.
///
/// From [the Altaïr specifications](https://github.com/ethereum/consensus-specs/blob/v1.4.0/specs/altair/light-client/sync-protocol.md#lightclientfinalityupdate).
#[derive(Debug, Clone, Eq, PartialEq, Getters, CopyGetters)]
pub struct FinalityUpdate {
    #[getset(get = "pub")]
    attested_header: HeaderWithExecution,
    #[getset(get = "pub")]
    finalized_header: HeaderWithExecution,
    #[getset(get = "pub")]
    finality_branch: Vec<Bytes32>,
    #[getset(get = "pub")]
    sync_aggregate: SyncAggregate,
    #[getset(get_copy = "pub")]
    signature_slot: u64,
}

impl FinalityUpdate {
    pub const fn new(
        attested_header: HeaderWithExecution,
        finalized_header: HeaderWithExecution,
        finality_branch: Vec<Bytes32>,
        sync_aggregate: SyncAggregate,
        signature_slot: u64,
    ) -> Self {
        Self {
            attested_header,
            finalized_header,
            finality_branch,
            sync_aggregate,
            signature_slot,
        }
    }
}

/// A finality update that also announces the next sync committee.
///
/// From [the Altaïr specifications](https://github.com/ethereum/consensus-specs/blob/v1.4.0/specs/altair/light-client/sync-protocol.md#lightclientupdate).
#[derive(Debug, Clone, Eq, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct FullUpdate {
    finality_update: FinalityUpdate,
    committee_update: CommitteeUpdate,
}

impl FullUpdate {
    pub const fn new(finality_update: FinalityUpdate, committee_update: CommitteeUpdate) -> Self {
        Self {
            finality_update,
            committee_update,
        }
    }
}

/// An update only carrying a signed attested header.
///
/// From [the Altaïr specifications](https://github.com/ethereum/consensus-specs/blob/v1.4.0/specs/altair/light-client/sync-protocol.md#lightclientoptimisticupdate).
#[derive(Debug, Clone, Eq, PartialEq, Getters, CopyGetters)]
pub struct OptimisticUpdate {
    #[getset(get = "pub")]
    attested_header: HeaderWithExecution,
    #[getset(get = "pub")]
    sync_aggregate: SyncAggregate,
    #[getset(get_copy = "pub")]
    signature_slot: u64,
}

impl OptimisticUpdate {
    pub const fn new(
        attested_header: HeaderWithExecution,
        sync_aggregate: SyncAggregate,
        signature_slot: u64,
    ) -> Self {
        Self {
            attested_header,
            sync_aggregate,
            signature_slot,
        }
    }
}

/// A signed head consumed by [`crate::anchor::AnchorBlocks`]. It has the shape of an optimistic
/// update.
pub type HeadUpdate = OptimisticUpdate;

/// The update variants accepted by [`crate::types::store::LightClientStore::process_update`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum LightClientUpdate {
    Full(FullUpdate),
    FinalityOnly(FinalityUpdate),
    OptimisticOnly(OptimisticUpdate),
}

impl LightClientUpdate {
    pub const fn attested_header(&self) -> &HeaderWithExecution {
        match self {
            LightClientUpdate::Full(update) => &update.finality_update.attested_header,
            LightClientUpdate::FinalityOnly(update) => &update.attested_header,
            LightClientUpdate::OptimisticOnly(update) => &update.attested_header,
        }
    }

    pub const fn sync_aggregate(&self) -> &SyncAggregate {
        match self {
            LightClientUpdate::Full(update) => &update.finality_update.sync_aggregate,
            LightClientUpdate::FinalityOnly(update) => &update.sync_aggregate,
            LightClientUpdate::OptimisticOnly(update) => &update.sync_aggregate,
        }
    }

    pub const fn signature_slot(&self) -> u64 {
        match self {
            LightClientUpdate::Full(update) => update.finality_update.signature_slot,
            LightClientUpdate::FinalityOnly(update) => update.signature_slot,
            LightClientUpdate::OptimisticOnly(update) => update.signature_slot,
        }
    }

    /// Returns the finality part of the update, if any.
    pub const fn finality(&self) -> Option<&FinalityUpdate> {
        match self {
            LightClientUpdate::Full(update) => Some(&update.finality_update),
            LightClientUpdate::FinalityOnly(update) => Some(update),
            LightClientUpdate::OptimisticOnly(_) => None,
        }
    }

    pub const fn committee_update(&self) -> Option<&CommitteeUpdate> {
        match self {
            LightClientUpdate::Full(update) => Some(&update.committee_update),
            _ => None,
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            LightClientUpdate::Full(_) => "full",
            LightClientUpdate::FinalityOnly(_) => "finality",
            LightClientUpdate::OptimisticOnly(_) => "optimistic",
        }
    }
}

impl From<FullUpdate> for LightClientUpdate {
    fn from(update: FullUpdate) -> Self {
        LightClientUpdate::Full(update)
    }
}

impl From<FinalityUpdate> for LightClientUpdate {
    fn from(update: FinalityUpdate) -> Self {
        LightClientUpdate::FinalityOnly(update)
    }
}

impl From<OptimisticUpdate> for LightClientUpdate {
    fn from(update: OptimisticUpdate) -> Self {
        LightClientUpdate::OptimisticOnly(update)
    }
}
