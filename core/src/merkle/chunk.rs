// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Chunk tree
//!
//! A chunk is a range of [`CHUNK_SIZE`] consecutive execution blocks. Its Merkle root is computed
//! over the raw block hashes, in block order, with parents hashed as `keccak256(left ++ right)`.
//! The tree is full, so a block hash is proven by exactly [`CHUNK_DEPTH`] siblings and its
//! position is the block number modulo [`CHUNK_SIZE`].

use crate::crypto::hash::{keccak_hash_concat, HashValue};
use crate::merkle::error::MerkleError;
use crate::merkle::utils::{build_branch, calculate_root, is_valid_merkle_branch};
use crate::types::Bytes32;

/// Number of blocks in a chunk.
pub const CHUNK_SIZE: usize = 128;

/// Depth of a chunk tree.
pub const CHUNK_DEPTH: usize = CHUNK_SIZE.trailing_zeros() as usize;

fn chunk_leaves(block_hashes: &[Bytes32]) -> Result<Vec<HashValue>, MerkleError> {
    if block_hashes.len() != CHUNK_SIZE {
        return Err(MerkleError::InvalidLeafCount {
            expected: CHUNK_SIZE,
            actual: block_hashes.len(),
        });
    }

    Ok(block_hashes.iter().copied().map(HashValue::new).collect())
}

/// Computes the root of a chunk.
///
/// # Errors
///
/// Returns a `MerkleError` if `block_hashes` does not hold exactly [`CHUNK_SIZE`] hashes.
pub fn chunk_root(block_hashes: &[Bytes32]) -> Result<HashValue, MerkleError> {
    Ok(calculate_root(
        chunk_leaves(block_hashes)?,
        keccak_hash_concat,
    ))
}

/// Builds the branch proving the block hash at `index` in a chunk.
///
/// # Errors
///
/// Returns a `MerkleError` if `block_hashes` does not hold exactly [`CHUNK_SIZE`] hashes or if
/// `index` is out of the chunk.
pub fn chunk_branch(block_hashes: &[Bytes32], index: usize) -> Result<Vec<Bytes32>, MerkleError> {
    build_branch(&chunk_leaves(block_hashes)?, index, keccak_hash_concat)
}

/// Verifies that `block_hash` sits at `index` in the chunk of root `root`.
///
/// Returns `false` for any malformed input: an index outside the chunk or a branch that does not
/// have [`CHUNK_DEPTH`] siblings.
pub fn is_chunk_branch_valid(
    root: &HashValue,
    block_hash: &Bytes32,
    index: u64,
    branch: &[Bytes32],
) -> bool {
    if index >= CHUNK_SIZE as u64 || branch.len() != CHUNK_DEPTH {
        return false;
    }

    is_valid_merkle_branch(
        &HashValue::new(*block_hash),
        branch,
        CHUNK_SIZE as u64 + index,
        root,
        keccak_hash_concat,
    )
    .unwrap_or(false)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::mock_block_hashes;

    #[test]
    fn test_chunk_depth() {
        assert_eq!(CHUNK_DEPTH, 7);
    }

    #[test]
    fn test_chunk_branches() {
        let hashes = mock_block_hashes(256);
        let root = chunk_root(&hashes).unwrap();

        for index in [0usize, 1, 64, 125, 127] {
            let branch = chunk_branch(&hashes, index).unwrap();
            assert_eq!(branch.len(), CHUNK_DEPTH);
            assert!(is_chunk_branch_valid(
                &root,
                &hashes[index],
                index as u64,
                &branch
            ));
        }
    }

    #[test]
    fn test_chunk_branch_tampering() {
        let hashes = mock_block_hashes(0);
        let root = chunk_root(&hashes).unwrap();
        let mut branch = chunk_branch(&hashes, 10).unwrap();

        // Off by one leaf index
        assert!(!is_chunk_branch_valid(&root, &hashes[10], 11, &branch));
        // Wrong leaf
        assert!(!is_chunk_branch_valid(&root, &hashes[11], 10, &branch));
        // Index outside the chunk
        assert!(!is_chunk_branch_valid(&root, &hashes[10], 138, &branch));
        // Altered sibling
        branch[3][0] ^= 1;
        assert!(!is_chunk_branch_valid(&root, &hashes[10], 10, &branch));
        // Truncated branch
        assert!(!is_chunk_branch_valid(&root, &hashes[10], 10, &branch[..6]));
    }

    #[test]
    fn test_chunk_root_leaf_count() {
        let hashes = mock_block_hashes(0);
        assert!(matches!(
            chunk_root(&hashes[..127]),
            Err(MerkleError::InvalidLeafCount {
                expected: 128,
                actual: 127
            })
        ));
    }
}
