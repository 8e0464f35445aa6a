// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Feed module
//!
//! A feed is a JSON array of entries, applied in order by the [`crate::engine::Engine`]. Each entry
//! carries a `kind` tag:
//!
//! - `update`: a light client update. It is a full update when it carries both a finalized header
//!   and a committee update, a finality update with only a finalized header, and an optimistic
//!   update otherwise.
//! - `anchor_head`: a signed head whose execution block becomes an anchor block, optionally with
//!   the raw headers of the blocks below it.
//! - `extend_backward`: raw headers walking back from a known anchor block.
//! - `import_finalized`: records the finalized execution block of the store as an anchor block.
//! - `chunk_recent` and `chunk_old`: chunk proofs.
//! - `block_hash`: a block hash to check against the stored chunks.
//!
//! Raw header lists start with the header of the highest block. The parent hash found in the last
//! header is the hash claimed for the block below the list.

use crate::error::FeedError;
use beacon_lc_core::chunks::BlockHashWitness;
use beacon_lc_core::crypto::oracle::Groth16Proof;
use beacon_lc_core::merkle::header_chain::ParentHashWitness;
use beacon_lc_core::types::block::consensus::BeaconBlockHeader;
use beacon_lc_core::types::block::execution::{ExecutionRef, Witness};
use beacon_lc_core::types::block::HeaderWithExecution;
use beacon_lc_core::types::committee::{CommitteeUpdate, SyncAggregate};
use beacon_lc_core::types::store::{CommitteeRoots, TrustedCheckpoint};
use beacon_lc_core::types::update::{
    FinalityUpdate, FullUpdate, HeadUpdate, LightClientUpdate, OptimisticUpdate,
};
use beacon_lc_core::types::Bytes32;
use getset::Getters;
use serde::Deserialize;

pub mod encoding;

use encoding::{to_bytes32_vec, Hex32, HexBytes, Quantity};

/// An entry of a feed.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedEntry {
    Update(UpdateJson),
    AnchorHead {
        head: UpdateJson,
        #[serde(default)]
        headers: Vec<HexBytes>,
    },
    ExtendBackward {
        block_number: Quantity,
        headers: Vec<HexBytes>,
    },
    ImportFinalized,
    ChunkRecent {
        chain_id: Quantity,
        proof: HexBytes,
    },
    ChunkOld {
        chain_id: Quantity,
        next_chunk_root: Hex32,
        start_block_number: Quantity,
        proof: HexBytes,
    },
    BlockHash(BlockHashJson),
}

impl FeedEntry {
    /// Short name of the entry, for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            FeedEntry::Update(_) => "update",
            FeedEntry::AnchorHead { .. } => "anchor_head",
            FeedEntry::ExtendBackward { .. } => "extend_backward",
            FeedEntry::ImportFinalized => "import_finalized",
            FeedEntry::ChunkRecent { .. } => "chunk_recent",
            FeedEntry::ChunkOld { .. } => "chunk_old",
            FeedEntry::BlockHash(_) => "block_hash",
        }
    }
}

/// Parses a feed.
///
/// # Errors
///
/// Returns a `FeedError` if `json` is not an array of valid entries.
pub fn parse_feed(json: &str) -> Result<Vec<FeedEntry>, FeedError> {
    serde_json::from_str(json).map_err(|err| FeedError::Json { source: err.into() })
}

/// Splits raw headers into parent hash witnesses, returning them with the parent hash claimed by
/// the last header.
///
/// # Errors
///
/// Returns a `FeedError` if a header is too short to hold a parent hash.
pub fn header_witnesses(
    headers: &[HexBytes],
) -> Result<(Vec<ParentHashWitness>, Bytes32), FeedError> {
    let mut witnesses = Vec::with_capacity(headers.len());
    let mut claim = [0u8; 32];
    for header in headers {
        let (witness, parent_hash) = ParentHashWitness::from_raw_header(&header.0)?;
        witnesses.push(witness);
        claim = parent_hash;
    }

    Ok((witnesses, claim))
}

fn conversion_error(structure: &str, reason: &str) -> FeedError {
    FeedError::Conversion {
        structure: structure.into(),
        source: reason.into(),
    }
}

fn groth16_proof(bytes: &HexBytes, structure: &str) -> Result<Groth16Proof, FeedError> {
    Groth16Proof::from_bytes(&bytes.0).map_err(|err| FeedError::Conversion {
        structure: structure.into(),
        source: err.into(),
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct BeaconHeaderJson {
    slot: Quantity,
    proposer_index: Quantity,
    parent_root: Hex32,
    state_root: Hex32,
    body_root: Hex32,
}

impl From<&BeaconHeaderJson> for BeaconBlockHeader {
    fn from(json: &BeaconHeaderJson) -> Self {
        BeaconBlockHeader::new(
            json.slot.0,
            json.proposer_index.0,
            json.parent_root.0,
            json.state_root.0,
            json.body_root.0,
        )
    }
}

/// A leaf and its branch. A missing witness decodes to an empty one, which the verifiers report as
/// absent.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct WitnessJson {
    #[serde(default)]
    leaf: Hex32,
    #[serde(default)]
    branch: Vec<Hex32>,
}

impl From<&WitnessJson> for Witness {
    fn from(json: &WitnessJson) -> Self {
        Witness::new(json.leaf.0, to_bytes32_vec(&json.branch))
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ExecutionJson {
    payload_root: WitnessJson,
    state_root: WitnessJson,
    block_number: WitnessJson,
    block_hash: WitnessJson,
}

impl From<&ExecutionJson> for ExecutionRef {
    fn from(json: &ExecutionJson) -> Self {
        ExecutionRef::new(
            (&json.payload_root).into(),
            (&json.state_root).into(),
            (&json.block_number).into(),
            (&json.block_hash).into(),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeaderJson {
    beacon: BeaconHeaderJson,
    #[serde(default)]
    execution: ExecutionJson,
}

impl From<&HeaderJson> for HeaderWithExecution {
    fn from(json: &HeaderJson) -> Self {
        HeaderWithExecution::new((&json.beacon).into(), (&json.execution).into())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncAggregateJson {
    participation: Quantity,
    poseidon_root: Hex32,
    #[serde(default)]
    commitment: Hex32,
    proof: HexBytes,
}

impl TryFrom<&SyncAggregateJson> for SyncAggregate {
    type Error = FeedError;

    fn try_from(json: &SyncAggregateJson) -> Result<Self, Self::Error> {
        Ok(SyncAggregate::new(
            json.participation.0,
            json.poseidon_root.0,
            json.commitment.0,
            groth16_proof(&json.proof, "SyncAggregate")?,
        ))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitteeUpdateJson {
    next_committee_root: Hex32,
    #[serde(default)]
    next_committee_branch: Vec<Hex32>,
    next_committee_poseidon_root: Hex32,
    mapping_proof: HexBytes,
}

impl TryFrom<&CommitteeUpdateJson> for CommitteeUpdate {
    type Error = FeedError;

    fn try_from(json: &CommitteeUpdateJson) -> Result<Self, Self::Error> {
        Ok(CommitteeUpdate::new(
            json.next_committee_root.0,
            to_bytes32_vec(&json.next_committee_branch),
            json.next_committee_poseidon_root.0,
            groth16_proof(&json.mapping_proof, "CommitteeUpdate")?,
        ))
    }
}

/// A light client update, see the module documentation for how its variant is chosen.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateJson {
    attested_header: HeaderJson,
    #[serde(default)]
    finalized_header: Option<HeaderJson>,
    #[serde(default)]
    finality_branch: Vec<Hex32>,
    #[serde(default)]
    committee_update: Option<CommitteeUpdateJson>,
    sync_aggregate: SyncAggregateJson,
    signature_slot: Quantity,
}

impl UpdateJson {
    /// Decodes the update as a signed head, ignoring any finality or committee data.
    ///
    /// # Errors
    ///
    /// Returns a `FeedError` if the signature proof is malformed.
    pub fn to_head_update(&self) -> Result<HeadUpdate, FeedError> {
        Ok(OptimisticUpdate::new(
            (&self.attested_header).into(),
            (&self.sync_aggregate).try_into()?,
            self.signature_slot.0,
        ))
    }
}

impl TryFrom<&UpdateJson> for LightClientUpdate {
    type Error = FeedError;

    fn try_from(json: &UpdateJson) -> Result<Self, Self::Error> {
        let Some(finalized_header) = &json.finalized_header else {
            if json.committee_update.is_some() {
                return Err(conversion_error(
                    "LightClientUpdate",
                    "committee update without finalized header",
                ));
            }
            return Ok(json.to_head_update()?.into());
        };

        let finality_update = FinalityUpdate::new(
            (&json.attested_header).into(),
            finalized_header.into(),
            to_bytes32_vec(&json.finality_branch),
            (&json.sync_aggregate).try_into()?,
            json.signature_slot.0,
        );

        Ok(match &json.committee_update {
            Some(committee_update) => {
                FullUpdate::new(finality_update, committee_update.try_into()?).into()
            }
            None => finality_update.into(),
        })
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CommitteeRootsJson {
    ssz_root: Hex32,
    poseidon_root: Hex32,
}

impl From<&CommitteeRootsJson> for CommitteeRoots {
    fn from(json: &CommitteeRootsJson) -> Self {
        CommitteeRoots::new(json.ssz_root.0, json.poseidon_root.0)
    }
}

/// Trusted checkpoint as found in configuration files.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckpointJson {
    header: HeaderJson,
    current_committee: CommitteeRootsJson,
    #[serde(default)]
    current_committee_branch: Vec<Hex32>,
    #[serde(default)]
    next_committee: Option<CommitteeRootsJson>,
}

impl From<&CheckpointJson> for TrustedCheckpoint {
    fn from(json: &CheckpointJson) -> Self {
        TrustedCheckpoint::new(
            (&json.header).into(),
            (&json.current_committee).into(),
            to_bytes32_vec(&json.current_committee_branch),
            json.next_committee.as_ref().map(Into::into),
        )
    }
}

/// Claim of a block hash, checked against the stored chunks.
#[derive(Debug, Clone, Deserialize, Getters)]
pub struct BlockHashJson {
    #[getset(get = "pub")]
    chain_id: Quantity,
    #[getset(get = "pub")]
    block_number: Quantity,
    claimed_block_hash: Hex32,
    prev_hash: Hex32,
    num_final: Quantity,
    merkle_proof: Vec<Hex32>,
}

impl From<&BlockHashJson> for BlockHashWitness {
    fn from(json: &BlockHashJson) -> Self {
        BlockHashWitness::new(
            json.chain_id.0,
            json.block_number.0,
            json.claimed_block_hash.0,
            json.prev_hash.0,
            json.num_final.0,
            to_bytes32_vec(&json.merkle_proof),
        )
    }
}
