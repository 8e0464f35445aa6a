// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

use crate::crypto::error::CryptoError;
use crate::types::Bytes32;
use ethers_core::utils::keccak256;
use getset::Getters;
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of hash digests in bytes.
pub const HASH_LEN: usize = 32;

/// A structure representing a hash value.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Getters, Hash, PartialOrd, Ord)]
pub struct HashValue {
    #[getset(get = "pub")]
    hash: [u8; HASH_LEN],
}

impl HashValue {
    /// Creates a new `HashValue` from a given hash.
    ///
    /// # Arguments
    ///
    /// * `hash` - A byte array of length `HASH_LEN` representing the hash value.
    ///
    /// # Returns
    ///
    /// A new `HashValue` instance.
    pub const fn new(hash: [u8; HASH_LEN]) -> Self {
        HashValue { hash }
    }

    /// Creates a `HashValue` from a slice (e.g., retrieved from a witness).
    ///
    /// # Arguments
    ///
    /// * `bytes` - A byte slice from which to create the `HashValue`.
    ///
    /// # Returns
    ///
    /// A `Result` which is `Ok` if the `HashValue` could be created successfully. If the slice has an invalid length,
    /// the `Result` is `Err`.
    pub fn from_slice<T: AsRef<[u8]>>(bytes: T) -> Result<Self, CryptoError> {
        let bytes = bytes.as_ref();
        <[u8; HASH_LEN]>::try_from(bytes)
            .map_err(|_| CryptoError::InvalidLength {
                expected: HASH_LEN,
                actual: bytes.len(),
            })
            .map(Self::new)
    }

    /// Converts the `HashValue` into a vector.
    pub fn to_vec(&self) -> Vec<u8> {
        self.hash.to_vec()
    }

    /// Splits the hash into its two 128-bit halves, each placed in the low bytes of a 32-byte
    /// big-endian word. This is how hashes are fed to the succinct proof verifiers, whose public
    /// inputs are field elements smaller than 256 bits.
    pub fn split_words(&self) -> [Bytes32; 2] {
        let mut hi = [0u8; HASH_LEN];
        let mut lo = [0u8; HASH_LEN];
        hi[HASH_LEN / 2..].copy_from_slice(&self.hash[..HASH_LEN / 2]);
        lo[HASH_LEN / 2..].copy_from_slice(&self.hash[HASH_LEN / 2..]);
        [hi, lo]
    }

    /// Inverse of [`HashValue::split_words`]. Returns `None` if either word does not fit in 128 bits.
    pub fn from_split_words(hi: &Bytes32, lo: &Bytes32) -> Option<Self> {
        if hi[..HASH_LEN / 2].iter().any(|&b| b != 0) || lo[..HASH_LEN / 2].iter().any(|&b| b != 0)
        {
            return None;
        }
        let mut hash = [0u8; HASH_LEN];
        hash[..HASH_LEN / 2].copy_from_slice(&hi[HASH_LEN / 2..]);
        hash[HASH_LEN / 2..].copy_from_slice(&lo[HASH_LEN / 2..]);
        Some(Self::new(hash))
    }
}

impl From<Bytes32> for HashValue {
    fn from(bytes: Bytes32) -> Self {
        HashValue::new(bytes)
    }
}

impl From<HashValue> for Bytes32 {
    fn from(value: HashValue) -> Self {
        value.hash
    }
}

impl AsRef<[u8]> for HashValue {
    fn as_ref(&self) -> &[u8] {
        &self.hash
    }
}

impl fmt::Display for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.hash))
    }
}

/// Hashes the given bytes with SHA-256, the hash function of SSZ Merkleization.
pub fn sha2_hash(bytes: &[u8]) -> HashValue {
    let digest: [u8; HASH_LEN] = Sha256::digest(bytes).into();
    HashValue::new(digest)
}

/// Hashes the concatenation of two nodes with SHA-256.
///
/// # Arguments
///
/// * `left` - The left node.
/// * `right` - The right node.
///
/// # Returns
///
/// The parent node in an SSZ Merkle tree.
pub fn sha2_hash_concat(left: &HashValue, right: &HashValue) -> HashValue {
    let mut hasher = Sha256::new();
    hasher.update(left.hash);
    hasher.update(right.hash);
    let digest: [u8; HASH_LEN] = hasher.finalize().into();
    HashValue::new(digest)
}

/// Hashes the given bytes with keccak-256, the hash function of execution blocks.
pub fn keccak_hash(bytes: &[u8]) -> HashValue {
    HashValue::new(keccak256(bytes))
}

/// Hashes the concatenation of two nodes with keccak-256.
///
/// # Arguments
///
/// * `left` - The left node.
/// * `right` - The right node.
///
/// # Returns
///
/// The parent node in a chunk Merkle tree.
pub fn keccak_hash_concat(left: &HashValue, right: &HashValue) -> HashValue {
    let mut bytes = [0u8; HASH_LEN * 2];
    bytes[..HASH_LEN].copy_from_slice(&left.hash);
    bytes[HASH_LEN..].copy_from_slice(&right.hash);
    keccak_hash(&bytes)
}
