// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! Encoding of chunk proofs.
//!
//! A chunk proof is the concatenation of 18 big-endian 32-byte words: the ten words of a
//! [`Groth16Proof`] followed by its eight public inputs
//! `chunk_root_hi, chunk_root_lo, prev_hash_hi, prev_hash_lo, end_hash_hi, end_hash_lo,
//! start_block_number, end_block_number`.

use crate::chunks::error::ChunkError;
use crate::crypto::hash::HashValue;
use crate::crypto::oracle::{
    split_words, u64_to_word, word_to_u64, Groth16Proof, GROTH16_PROOF_WORDS,
};
use crate::types::{Bytes32, BYTES_32_LEN};
use getset::{CopyGetters, Getters};

/// Number of public inputs of a chunk proof.
pub const CHUNK_PUBLIC_INPUTS: usize = 8;

/// Number of words of an encoded chunk proof.
pub const CHUNK_PROOF_WORDS: usize = GROTH16_PROOF_WORDS + CHUNK_PUBLIC_INPUTS;

/// Length in bytes of an encoded chunk proof.
pub const CHUNK_PROOF_BYTES_LEN: usize = CHUNK_PROOF_WORDS * BYTES_32_LEN;

/// A proof that a range of blocks is hash linked, ends with `end_hash`, follows `prev_hash` and has
/// `chunk_root` as Merkle root over its block hashes.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct ChunkProof {
    #[getset(get = "pub")]
    proof: Groth16Proof,
    #[getset(get = "pub")]
    chunk_root: Bytes32,
    #[getset(get = "pub")]
    prev_hash: Bytes32,
    #[getset(get = "pub")]
    end_hash: Bytes32,
    #[getset(get_copy = "pub")]
    start_block_number: u64,
    #[getset(get_copy = "pub")]
    end_block_number: u64,
}

impl ChunkProof {
    pub const fn new(
        proof: Groth16Proof,
        chunk_root: Bytes32,
        prev_hash: Bytes32,
        end_hash: Bytes32,
        start_block_number: u64,
        end_block_number: u64,
    ) -> Self {
        Self {
            proof,
            chunk_root,
            prev_hash,
            end_hash,
            start_block_number,
            end_block_number,
        }
    }

    /// Public inputs the chunk verifier checks the proof against.
    pub fn public_inputs(&self) -> Vec<Bytes32> {
        let mut inputs = Vec::with_capacity(CHUNK_PUBLIC_INPUTS);
        for hash in [&self.chunk_root, &self.prev_hash, &self.end_hash] {
            inputs.extend(HashValue::new(*hash).split_words());
        }
        inputs.push(u64_to_word(self.start_block_number));
        inputs.push(u64_to_word(self.end_block_number));
        inputs
    }

    /// Deserialize a `ChunkProof` from its word encoding.
    ///
    /// # Errors
    ///
    /// Returns a `ChunkError` if `bytes` is not exactly [`CHUNK_PROOF_BYTES_LEN`] long, if a hash
    /// half does not fit in 128 bits or if a block number does not fit in 64 bits.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ChunkError> {
        let words = split_words::<CHUNK_PROOF_WORDS>(bytes).ok_or_else(|| {
            ChunkError::MalformedProof {
                reason: format!(
                    "expected {CHUNK_PROOF_BYTES_LEN} bytes, got {}",
                    bytes.len()
                ),
            }
        })?;

        let mut proof_words = [[0u8; BYTES_32_LEN]; GROTH16_PROOF_WORDS];
        proof_words.copy_from_slice(&words[..GROTH16_PROOF_WORDS]);
        let inputs = &words[GROTH16_PROOF_WORDS..];

        let hash = |index: usize, name: &str| {
            HashValue::from_split_words(&inputs[index], &inputs[index + 1])
                .map(|hash| *hash.hash())
                .ok_or_else(|| ChunkError::MalformedProof {
                    reason: format!("{name} halves do not fit in 128 bits"),
                })
        };
        let number = |index: usize, name: &str| {
            word_to_u64(&inputs[index]).ok_or_else(|| ChunkError::MalformedProof {
                reason: format!("{name} does not fit in 64 bits"),
            })
        };

        Ok(Self {
            proof: Groth16Proof::from_words(&proof_words),
            chunk_root: hash(0, "chunk root")?,
            prev_hash: hash(2, "prev hash")?,
            end_hash: hash(4, "end hash")?,
            start_block_number: number(6, "start block number")?,
            end_block_number: number(7, "end block number")?,
        })
    }

    /// Serialize the `ChunkProof` to its word encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.proof.to_bytes();
        bytes.extend(self.public_inputs().concat());
        bytes
    }
}
