// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Consensus block module
//!
//! This module contains the data structures used by the Beacon Node to store consensus-related
//! data.
//!
//! It mainly contains the `BeaconBlockHeader` data structure, which represent the header of a beacon block.

use crate::crypto::hash::HashValue;
use crate::merkle::utils::merkle_root;
use crate::merkle::Merkleized;
use crate::types::error::TypesError;
use crate::types::utils::{extract_fixed_bytes, extract_u64};
use crate::types::{Bytes32, BYTES_32_LEN, U64_LEN};
use getset::{CopyGetters, Getters};

/// Length in bytes of a serialized `BeaconBlockHeader`.
pub const BEACON_BLOCK_HEADER_BYTES_LEN: usize = BYTES_32_LEN * 3 + U64_LEN * 2;

/// `BeaconBlockHeader` represents the header of a beacon block.
///
/// From [the CL specifications](https://github.com/ethereum/consensus-specs/blob/v1.3.0/specs/phase0/beacon-chain.md#beaconblockheader).
#[derive(Debug, Default, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct BeaconBlockHeader {
    #[getset(get_copy = "pub")]
    slot: u64,
    #[getset(get_copy = "pub")]
    proposer_index: u64,
    #[getset(get = "pub")]
    parent_root: Bytes32,
    #[getset(get = "pub")]
    state_root: Bytes32,
    #[getset(get = "pub")]
    body_root: Bytes32,
}

impl BeaconBlockHeader {
    pub const fn new(
        slot: u64,
        proposer_index: u64,
        parent_root: Bytes32,
        state_root: Bytes32,
        body_root: Bytes32,
    ) -> Self {
        Self {
            slot,
            proposer_index,
            parent_root,
            state_root,
            body_root,
        }
    }

    /// Serialize a `BeaconBlockHeader` data structure to an SSZ formatted vector of bytes.
    ///
    /// # Returns
    ///
    /// A `Vec<u8>` containing the SSZ serialized `BeaconBlockHeader` data structure.
    pub fn to_ssz_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(BEACON_BLOCK_HEADER_BYTES_LEN);

        bytes.extend(&self.slot.to_le_bytes());
        bytes.extend(&self.proposer_index.to_le_bytes());
        bytes.extend(&self.parent_root);
        bytes.extend(&self.state_root);
        bytes.extend(&self.body_root);

        bytes
    }

    /// Deserialize a `BeaconBlockHeader` data structure from SSZ formatted bytes.
    ///
    /// # Arguments
    ///
    /// * `bytes` - The SSZ formatted bytes to deserialize the `BeaconBlockHeader` data structure from.
    ///
    /// # Returns
    ///
    /// A `Result` containing the deserialized `BeaconBlockHeader` data structure or a `TypesError`.
    ///
    /// # Errors
    ///
    /// Returns a `TypesError` if the length of `bytes` is not equal to [`BEACON_BLOCK_HEADER_BYTES_LEN`] or
    /// if the conversion from bytes of internal types fails.
    pub fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, TypesError> {
        if bytes.len() != BEACON_BLOCK_HEADER_BYTES_LEN {
            return Err(TypesError::InvalidLength {
                structure: "BeaconBlockHeader".into(),
                expected: BEACON_BLOCK_HEADER_BYTES_LEN,
                actual: bytes.len(),
            });
        }

        let cursor = 0;
        let (cursor, slot) = extract_u64("BeaconBlockHeader", bytes, cursor)?;
        let (cursor, proposer_index) = extract_u64("BeaconBlockHeader", bytes, cursor)?;
        let (cursor, parent_root) =
            extract_fixed_bytes::<BYTES_32_LEN>("BeaconBlockHeader", bytes, cursor)?;
        let (cursor, state_root) =
            extract_fixed_bytes::<BYTES_32_LEN>("BeaconBlockHeader", bytes, cursor)?;
        let (_, body_root) =
            extract_fixed_bytes::<BYTES_32_LEN>("BeaconBlockHeader", bytes, cursor)?;

        Ok(Self {
            slot,
            proposer_index,
            parent_root,
            state_root,
            body_root,
        })
    }
}

impl Merkleized for BeaconBlockHeader {
    fn hash_tree_root(&self) -> HashValue {
        merkle_root(vec![
            self.slot.hash_tree_root(),
            self.proposer_index.hash_tree_root(),
            self.parent_root.hash_tree_root(),
            self.state_root.hash_tree_root(),
            self.body_root.hash_tree_root(),
        ])
    }
}
