// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

use crate::crypto::hash::{sha2_hash_concat, HashValue};
use crate::merkle::error::MerkleError;
use crate::types::Bytes32;

/// Returns the index of the subtree that a given generalized index belongs to. The generalized index
/// is the index of a leaf in a binary tree where the leaves are numbered from left to right.
///
/// # Arguments
///
/// * `generalized_index` - The generalized index of the leaf.
///
/// # Returns
///
/// The index of the subtree that the leaf belongs to.
///
/// # Notes
///
/// From [the Altaïr specifications](https://github.com/ethereum/consensus-specs/blob/dev/specs/altair/light-client/sync-protocol.md#get_subtree_index).
pub const fn get_subtree_index(generalized_index: u64) -> u64 {
    // Calculate floor(log2(generalized_index)) using bit manipulation
    let floor_log2 = 63 - generalized_index.leading_zeros();

    // Calculate 2^floor(log2(generalized_index))
    let power_of_two = 1u64 << floor_log2;

    // Return the remainder of generalized_index divided by 2^floor(log2(generalized_index))
    generalized_index % power_of_two
}

/// Returns the depth of a generalized index, that is the number of siblings in a branch proving
/// the node it designates.
pub const fn get_generalized_index_depth(generalized_index: u64) -> usize {
    (63 - generalized_index.leading_zeros()) as usize
}

/// Computes the SSZ Merkle root of a container given the roots of its fields.
///
/// # Arguments
///
/// * `fields` - The hash tree roots of the container fields, in declaration order.
///
/// # Returns
///
/// The Merkle root of the container.
pub fn merkle_root(fields: Vec<HashValue>) -> HashValue {
    calculate_root(fields, sha2_hash_concat)
}

/// Computes the root of a Merkle tree given a list of leaves and the function combining two
/// siblings into their parent.
///
/// # Arguments
///
/// * `leaves` - The leaves of the Merkle tree.
/// * `hash_concat` - The node hashing function.
///
/// # Returns
///
/// The root of the Merkle tree.
pub fn calculate_root(
    mut leaves: Vec<HashValue>,
    hash_concat: fn(&HashValue, &HashValue) -> HashValue,
) -> HashValue {
    if leaves.is_empty() {
        return HashValue::default();
    }

    let num_leaves = leaves.len().next_power_of_two();
    let empty_leaf = HashValue::default();

    // Pad the leaves vector with empty_leaf to ensure the tree is balanced
    leaves.resize(num_leaves, empty_leaf);

    // Compute the root of the Merkle tree
    while leaves.len() > 1 {
        leaves = leaves
            .chunks_exact(2)
            .map(|pair| hash_concat(&pair[0], &pair[1]))
            .collect();
    }

    leaves[0]
}

/// Verifies a Merkle branch for a leaf at the position designated by a generalized index.
///
/// # Arguments
///
/// * `leaf` - The leaf value.
/// * `branch` - The siblings, from the leaf level up to the root level.
/// * `generalized_index` - The position of the leaf.
/// * `root` - The expected root.
/// * `hash_concat` - The node hashing function.
///
/// # Returns
///
/// A `bool` indicating whether the reconstructed root matches `root`.
///
/// # Errors
///
/// Returns a `MerkleError` if the generalized index is 0 or 1 or if the branch does not have one
/// sibling per level.
pub fn is_valid_merkle_branch(
    leaf: &HashValue,
    branch: &[Bytes32],
    generalized_index: u64,
    root: &HashValue,
    hash_concat: fn(&HashValue, &HashValue) -> HashValue,
) -> Result<bool, MerkleError> {
    if generalized_index < 2 {
        return Err(MerkleError::InvalidGeneralizedIndex(generalized_index));
    }

    // Ensure we receive the number of siblings we expected
    let depth = get_generalized_index_depth(generalized_index);
    if branch.len() != depth {
        return Err(MerkleError::InvalidBranchLength {
            expected: depth,
            actual: branch.len(),
        });
    }

    let subtree_index = get_subtree_index(generalized_index);

    let reconstructed_root =
        branch
            .iter()
            .enumerate()
            .fold(*leaf, |acc_hash, (level, sibling)| {
                let sibling = HashValue::new(*sibling);
                if (subtree_index >> level) & 1 == 1 {
                    hash_concat(&sibling, &acc_hash)
                } else {
                    hash_concat(&acc_hash, &sibling)
                }
            });

    Ok(&reconstructed_root == root)
}

/// Builds the branch proving the leaf at `index` in a tree of `leaves.len()` leaves, which must be
/// a power of two.
pub fn build_branch(
    leaves: &[HashValue],
    index: usize,
    hash_concat: fn(&HashValue, &HashValue) -> HashValue,
) -> Result<Vec<Bytes32>, MerkleError> {
    if !leaves.len().is_power_of_two() {
        return Err(MerkleError::InvalidLeafCount {
            expected: leaves.len().next_power_of_two(),
            actual: leaves.len(),
        });
    }
    if index >= leaves.len() {
        return Err(MerkleError::LeafIndexOutOfRange {
            index,
            leaves: leaves.len(),
        });
    }

    let mut branch = Vec::new();
    let mut level = leaves.to_vec();
    let mut position = index;

    while level.len() > 1 {
        branch.push(*level[position ^ 1].hash());
        level = level
            .chunks_exact(2)
            .map(|pair| hash_concat(&pair[0], &pair[1]))
            .collect();
        position /= 2;
    }

    Ok(branch)
}
