// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

use crate::crypto::hash::{sha2_hash_concat, HashValue};
use crate::merkle::error::MerkleError;
use crate::merkle::utils::is_valid_merkle_branch;
use crate::merkle::Merkleized;
use crate::types::block::consensus::BeaconBlockHeader;
use crate::types::block::execution::ExecutionField;
use crate::types::fork::BranchSchema;
use crate::types::Bytes32;

/// Verifies the validity of a finality proof received in a [`crate::types::update::LightClientUpdate`].
///
/// # Arguments
///
/// * `state_root` - The state root of the attested Beacon block.
/// * `finalized_header` - The header of the block that the update is attesting to be finalized.
/// * `finality_branch` - The branch of the Merkle tree that proves the finality of the block.
/// * `schema` - The generalized indices of the fork active at the attested slot.
///
/// # Returns
///
/// A `bool` indicating whether the finality proof is valid.
pub fn is_finality_proof_valid(
    state_root: &Bytes32,
    finalized_header: &BeaconBlockHeader,
    finality_branch: &[Bytes32],
    schema: &BranchSchema,
) -> Result<bool, MerkleError> {
    is_proof_valid(
        state_root,
        finalized_header,
        finality_branch,
        schema.finalized_root(),
    )
}

/// Verifies the validity of a next sync committee proof received in a
/// [`crate::types::update::LightClientUpdate::Full`] update.
///
/// # Arguments
///
/// * `state_root` - The state root of the finalized Beacon block.
/// * `next_committee_root` - The SSZ root of the next sync committee.
/// * `next_committee_branch` - The branch of the Merkle tree that proves the next sync committee.
/// * `schema` - The generalized indices of the fork active at the finalized slot.
///
/// # Returns
///
/// A `bool` indicating whether the sync committee proof is valid.
pub fn is_next_committee_proof_valid(
    state_root: &Bytes32,
    next_committee_root: &Bytes32,
    next_committee_branch: &[Bytes32],
    schema: &BranchSchema,
) -> Result<bool, MerkleError> {
    is_proof_valid(
        state_root,
        next_committee_root,
        next_committee_branch,
        schema.next_sync_committee(),
    )
}

/// Verifies the validity of a current committee proof received in a
/// [`crate::types::store::TrustedCheckpoint`].
///
/// # Arguments
///
/// * `state_root` - The state root of the checkpoint Beacon block.
/// * `current_committee_root` - The SSZ root of the current sync committee.
/// * `current_committee_branch` - The branch of the Merkle tree that proves the current committee.
/// * `schema` - The generalized indices of the fork active at the checkpoint slot.
///
/// # Returns
///
/// A `bool` indicating whether the current committee proof is valid.
pub fn is_current_committee_proof_valid(
    state_root: &Bytes32,
    current_committee_root: &Bytes32,
    current_committee_branch: &[Bytes32],
    schema: &BranchSchema,
) -> Result<bool, MerkleError> {
    is_proof_valid(
        state_root,
        current_committee_root,
        current_committee_branch,
        schema.current_sync_committee(),
    )
}

/// Verifies the validity of an execution payload proof, binding the root of an execution payload
/// to the body of a Beacon block.
///
/// # Arguments
///
/// * `body_root` - The body root of the Beacon block.
/// * `execution_payload_root` - The hash tree root of the execution payload.
/// * `execution_payload_branch` - The branch of the Merkle tree that proves the execution payload.
/// * `schema` - The generalized indices of the fork active at the block slot.
///
/// # Returns
///
/// A `bool` indicating whether the execution payload proof is valid.
pub fn is_execution_payload_proof_valid(
    body_root: &Bytes32,
    execution_payload_root: &Bytes32,
    execution_payload_branch: &[Bytes32],
    schema: &BranchSchema,
) -> Result<bool, MerkleError> {
    is_proof_valid(
        body_root,
        execution_payload_root,
        execution_payload_branch,
        schema.execution_payload(),
    )
}

/// Verifies the validity of the proof of a single field of an execution payload.
///
/// # Arguments
///
/// * `execution_payload_root` - The hash tree root of the execution payload.
/// * `field` - The execution payload field being proven.
/// * `leaf` - The SSZ chunk of the field value.
/// * `branch` - The branch of the Merkle tree that proves the field.
/// * `schema` - The generalized indices of the fork active at the block slot.
///
/// # Returns
///
/// A `bool` indicating whether the field proof is valid.
pub fn is_execution_field_proof_valid(
    execution_payload_root: &Bytes32,
    field: ExecutionField,
    leaf: &Bytes32,
    branch: &[Bytes32],
    schema: &BranchSchema,
) -> Result<bool, MerkleError> {
    is_proof_valid(
        execution_payload_root,
        leaf,
        branch,
        schema.execution_field(field),
    )
}

/// Generic function to verify the validity of a Merkle proof.
///
/// # Arguments
///
/// * `root` - The root of the tree the proof is attesting to.
/// * `leaf_object` - The object the proof is attesting to.
/// * `branch` - The branch of the Merkle tree that proves the object.
/// * `generalized_index` - The generalized index of the object in the tree.
///
/// # Returns
///
/// A `bool` indicating whether the proof is valid.
fn is_proof_valid<M: Merkleized>(
    root: &Bytes32,
    leaf_object: &M,
    branch: &[Bytes32],
    generalized_index: u64,
) -> Result<bool, MerkleError> {
    is_valid_merkle_branch(
        &leaf_object.hash_tree_root(),
        branch,
        generalized_index,
        &HashValue::new(*root),
        sha2_hash_concat,
    )
}
