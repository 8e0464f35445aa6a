// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Signing Data
//!
//! The module contains the `SigningData` data structure, which is the message actually signed by
//! the sync committee. It binds the root of the attested header to a domain, itself derived from
//! the fork version and the genesis validators root so that signatures cannot be replayed across
//! forks or networks.

use crate::crypto::hash::HashValue;
use crate::merkle::utils::merkle_root;
use crate::merkle::Merkleized;
use crate::types::fork::{ForkVersion, FORK_VERSION_LEN};
use crate::types::{Bytes32, BYTES_32_LEN};

/// From [the Phase0 specifications](https://github.com/ethereum/consensus-specs/blob/dev/specs/phase0/beacon-chain.md#signingdata).
pub struct SigningData {
    object_root: Bytes32,
    domain: Bytes32,
}

impl SigningData {
    pub const fn new(object_root: Bytes32, domain: Bytes32) -> Self {
        Self {
            object_root,
            domain,
        }
    }
}

impl Merkleized for SigningData {
    fn hash_tree_root(&self) -> HashValue {
        let leaves: Vec<HashValue> = vec![self.object_root.into(), self.domain.into()];

        merkle_root(leaves)
    }
}

/// From [the Phase0 specifications](https://github.com/ethereum/consensus-specs/blob/dev/specs/phase0/beacon-chain.md#forkdata).
pub struct ForkData {
    current_version: ForkVersion,
    genesis_validators_root: Bytes32,
}

impl ForkData {
    pub const fn new(current_version: ForkVersion, genesis_validators_root: Bytes32) -> Self {
        Self {
            current_version,
            genesis_validators_root,
        }
    }
}

impl Merkleized for ForkData {
    fn hash_tree_root(&self) -> HashValue {
        let mut version_leaf = [0u8; BYTES_32_LEN];
        version_leaf[..FORK_VERSION_LEN].copy_from_slice(&self.current_version);

        merkle_root(vec![
            version_leaf.into(),
            self.genesis_validators_root.into(),
        ])
    }
}

/// Computes a signature domain: the domain type followed by the first 28 bytes of the fork data
/// root.
///
/// From [the Phase0 specifications](https://github.com/ethereum/consensus-specs/blob/dev/specs/phase0/beacon-chain.md#compute_domain).
pub fn compute_domain(
    domain_type: [u8; 4],
    fork_version: ForkVersion,
    genesis_validators_root: Bytes32,
) -> Bytes32 {
    let fork_data_root = ForkData::new(fork_version, genesis_validators_root).hash_tree_root();

    let mut domain = [0u8; BYTES_32_LEN];
    domain[..4].copy_from_slice(&domain_type);
    domain[4..].copy_from_slice(&fork_data_root.hash()[..BYTES_32_LEN - 4]);
    domain
}

/// Computes the signing root of an object under a domain.
pub fn compute_signing_root(object_root: &HashValue, domain: Bytes32) -> HashValue {
    SigningData::new(*object_root.hash(), domain).hash_tree_root()
}
