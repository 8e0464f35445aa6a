// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Merkle Tree
//!
//! This module provides the utilities to create and verify Merkle proofs. Two tree flavours are
//! used by the light client: SSZ trees hashed with SHA-256 on the consensus side, and the keccak
//! trees built over 128 consecutive execution block hashes on the chunk side.
//!
//! ## Sub-modules
//!
//! - `error`: This sub-module contains the error types that can be returned by the Merkle
//!   utilities.
//! - `update_proofs`: Verification of the branches received in light client updates, positioned by
//!   the generalized indices of the active fork.
//! - `chunk`: The keccak Merkle tree over a chunk of 128 block hashes.
//! - `header_chain`: Verification that a raw execution header links to a known block hash.
//! - `utils`: This sub-module contains the utilities to manipulate the Merkle Tree.

use crate::crypto::hash::HashValue;
use crate::types::Bytes32;

pub mod chunk;
pub mod error;
pub mod header_chain;
pub mod update_proofs;
pub mod utils;

/// The `Merkleized` trait is implemented by types that can be hashed and represented as a single
/// Merkle Tree root.
pub trait Merkleized {
    /// Hash the object following [SSZ standard](https://www.ssz.dev/show) and return the root of the
    /// Merkle Tree.
    fn hash_tree_root(&self) -> HashValue;
}

impl Merkleized for Bytes32 {
    fn hash_tree_root(&self) -> HashValue {
        HashValue::new(*self)
    }
}

impl Merkleized for u64 {
    fn hash_tree_root(&self) -> HashValue {
        let mut leaf = [0u8; 32];
        leaf[..8].copy_from_slice(&self.to_le_bytes());
        HashValue::new(leaf)
    }
}
