// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Header chain verification
//!
//! An execution block hash is the keccak-256 hash of the RLP encoded block header, and the parent
//! hash is the first field of that header. A [`ParentHashWitness`] carries a raw header with its
//! parent hash cut out, so that a verifier can plug in a claimed parent hash, recompute the block
//! hash and compare it with a trusted one. If they match, the claimed parent hash is trusted as
//! well.
//!
//! Every post-London header is longer than 255 bytes, so the RLP list header always takes 3 bytes
//! (`0xf9` and a 2-byte length) and is followed by `0xa0`, the header of the 32-byte parent hash
//! string. The left part of a witness is therefore exactly 4 bytes long.

use crate::crypto::hash::{keccak_hash, HashValue};
use crate::merkle::error::MerkleError;
use crate::types::{Bytes32, BYTES_32_LEN};
use getset::Getters;

/// Number of bytes preceding the parent hash in a raw header.
pub const PARENT_HASH_OFFSET: usize = 4;

/// RLP prefix of a list whose payload length is encoded on 2 bytes.
const LONG_LIST_2_BYTES_PREFIX: u8 = 0xf9;

/// RLP prefix of a 32-byte string.
const BYTES_32_STRING_PREFIX: u8 = 0xa0;

/// A raw execution header split around its parent hash.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct ParentHashWitness {
    left: Vec<u8>,
    right: Vec<u8>,
}

impl ParentHashWitness {
    pub const fn new(left: Vec<u8>, right: Vec<u8>) -> Self {
        Self { left, right }
    }

    /// Splits a raw RLP header into a witness and the parent hash it contains.
    ///
    /// # Errors
    ///
    /// Returns a `MerkleError` if the header is too short to contain a parent hash.
    pub fn from_raw_header(raw_header: &[u8]) -> Result<(Self, Bytes32), MerkleError> {
        if raw_header.len() < PARENT_HASH_OFFSET + BYTES_32_LEN {
            return Err(MerkleError::HeaderTooShort {
                actual: raw_header.len(),
            });
        }

        let mut parent_hash = [0u8; BYTES_32_LEN];
        parent_hash
            .copy_from_slice(&raw_header[PARENT_HASH_OFFSET..PARENT_HASH_OFFSET + BYTES_32_LEN]);

        let witness = Self::new(
            raw_header[..PARENT_HASH_OFFSET].to_vec(),
            raw_header[PARENT_HASH_OFFSET + BYTES_32_LEN..].to_vec(),
        );

        Ok((witness, parent_hash))
    }

    /// Computes the hash of the header obtained by placing `parent_hash` between the left and
    /// right parts of the witness.
    ///
    /// # Errors
    ///
    /// Returns a `MerkleError` if the left part is not exactly [`PARENT_HASH_OFFSET`] bytes long,
    /// or if it is not the RLP prefix of a header whose first field is a 32-byte string.
    pub fn header_hash(&self, parent_hash: &Bytes32) -> Result<HashValue, MerkleError> {
        if self.left.len() != PARENT_HASH_OFFSET {
            return Err(MerkleError::InvalidLeftLength {
                expected: PARENT_HASH_OFFSET,
                actual: self.left.len(),
            });
        }

        let declared_len = u16::from_be_bytes([self.left[1], self.left[2]]) as usize;
        let payload_len = 1 + BYTES_32_LEN + self.right.len();
        if self.left[0] != LONG_LIST_2_BYTES_PREFIX
            || self.left[3] != BYTES_32_STRING_PREFIX
            || declared_len != payload_len
        {
            return Err(MerkleError::InvalidHeaderPrefix);
        }

        let mut raw_header = Vec::with_capacity(PARENT_HASH_OFFSET + payload_len);
        raw_header.extend_from_slice(&self.left);
        raw_header.extend_from_slice(parent_hash);
        raw_header.extend_from_slice(&self.right);

        Ok(keccak_hash(&raw_header))
    }
}
