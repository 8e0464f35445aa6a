// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Proof Oracle
//!
//! The light client never checks pairings or circuits itself. Every succinct proof it consumes is
//! handed, together with the public inputs the light client computed on its own, to a
//! [`ProofOracle`]. The oracle is a pure function of its inputs: it answers `true` if the proof is
//! valid for those public inputs.
//!
//! Three kinds of proofs flow through oracles:
//! - the sync committee signature proof, attesting that `participation` members of a committee
//!   identified by its Poseidon root signed a header,
//! - the committee root mapping proof, binding the SSZ root and the Poseidon root of the same
//!   committee,
//! - the chunk proof, attesting that 128 consecutive headers are hash-linked and Merkleized to a
//!   given root.

use crate::crypto::error::CryptoError;
use crate::types::{Bytes32, BYTES_32_LEN, U64_LEN};
use getset::Getters;
use std::sync::Arc;

/// Number of 32-byte words in an encoded [`Groth16Proof`].
pub const GROTH16_PROOF_WORDS: usize = 10;

/// Length in bytes of an encoded [`Groth16Proof`].
pub const GROTH16_PROOF_BYTES_LEN: usize = GROTH16_PROOF_WORDS * BYTES_32_LEN;

/// A point on the base curve, as two big-endian coordinates.
pub type G1Point = [Bytes32; 2];

/// A point on the twisted curve, as two pairs of big-endian coordinates.
pub type G2Point = [[Bytes32; 2]; 2];

/// Fixed-shape succinct proof as produced by the provers: three curve points plus an optional
/// commitment point (all zeroes when the circuit has none).
#[derive(Debug, Default, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct Groth16Proof {
    a: G1Point,
    b: G2Point,
    c: G1Point,
    commitment: G1Point,
}

impl Groth16Proof {
    pub const fn new(a: G1Point, b: G2Point, c: G1Point, commitment: G1Point) -> Self {
        Self {
            a,
            b,
            c,
            commitment,
        }
    }

    /// Serialize the proof as `a[0], a[1], b[0][0], b[0][1], b[1][0], b[1][1], c[0], c[1],
    /// commitment[0], commitment[1]`.
    pub fn to_words(&self) -> [Bytes32; GROTH16_PROOF_WORDS] {
        [
            self.a[0],
            self.a[1],
            self.b[0][0],
            self.b[0][1],
            self.b[1][0],
            self.b[1][1],
            self.c[0],
            self.c[1],
            self.commitment[0],
            self.commitment[1],
        ]
    }

    /// Deserialize a proof from its word representation.
    pub const fn from_words(words: &[Bytes32; GROTH16_PROOF_WORDS]) -> Self {
        Self {
            a: [words[0], words[1]],
            b: [[words[2], words[3]], [words[4], words[5]]],
            c: [words[6], words[7]],
            commitment: [words[8], words[9]],
        }
    }

    /// Deserialize a proof from exactly [`GROTH16_PROOF_BYTES_LEN`] bytes.
    ///
    /// # Errors
    ///
    /// Returns a `CryptoError::MalformedProof` if the byte length does not match.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let words = split_words::<GROTH16_PROOF_WORDS>(bytes).ok_or(CryptoError::MalformedProof {
            expected: GROTH16_PROOF_BYTES_LEN,
            actual: bytes.len(),
        })?;

        Ok(Self::from_words(&words))
    }

    /// Serialize the proof to bytes, the inverse of [`Groth16Proof::from_bytes`].
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_words().concat()
    }
}

/// Splits `bytes` into exactly `N` 32-byte words.
pub(crate) fn split_words<const N: usize>(bytes: &[u8]) -> Option<[Bytes32; N]> {
    if bytes.len() != N * BYTES_32_LEN {
        return None;
    }

    let mut words = [[0u8; BYTES_32_LEN]; N];
    for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(BYTES_32_LEN)) {
        word.copy_from_slice(chunk);
    }

    Some(words)
}

/// Encodes an unsigned integer as a big-endian public input word.
pub fn u64_to_word(value: u64) -> Bytes32 {
    let mut word = [0u8; BYTES_32_LEN];
    word[BYTES_32_LEN - U64_LEN..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Decodes a big-endian public input word into an unsigned integer. Returns `None` if the value
/// does not fit in 64 bits.
pub fn word_to_u64(word: &Bytes32) -> Option<u64> {
    if word[..BYTES_32_LEN - U64_LEN].iter().any(|&b| b != 0) {
        return None;
    }
    let mut bytes = [0u8; U64_LEN];
    bytes.copy_from_slice(&word[BYTES_32_LEN - U64_LEN..]);
    Some(u64::from_be_bytes(bytes))
}

/// Capability to verify a succinct proof against a vector of public inputs.
///
/// Implementations must be pure: the same proof and inputs always yield the same answer. A proof
/// whose shape the backend cannot interpret is simply invalid.
pub trait ProofOracle: Send + Sync {
    fn verify(&self, proof: &Groth16Proof, public_inputs: &[Bytes32]) -> bool;
}

impl<T: ProofOracle + ?Sized> ProofOracle for Arc<T> {
    fn verify(&self, proof: &Groth16Proof, public_inputs: &[Bytes32]) -> bool {
        (**self).verify(proof, public_inputs)
    }
}

impl<T: ProofOracle + ?Sized> ProofOracle for &T {
    fn verify(&self, proof: &Groth16Proof, public_inputs: &[Bytes32]) -> bool {
        (**self).verify(proof, public_inputs)
    }
}

/// The two oracles the consensus layer depends on.
#[derive(Clone, Getters)]
#[getset(get = "pub")]
pub struct ConsensusOracles {
    /// Verifies sync committee signature proofs.
    signature: Arc<dyn ProofOracle>,
    /// Verifies SSZ root to Poseidon root committee mapping proofs.
    committee_mapping: Arc<dyn ProofOracle>,
}

impl ConsensusOracles {
    pub fn new(signature: Arc<dyn ProofOracle>, committee_mapping: Arc<dyn ProofOracle>) -> Self {
        Self {
            signature,
            committee_mapping,
        }
    }
}

impl std::fmt::Debug for ConsensusOracles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsensusOracles").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn word(byte: u8) -> Bytes32 {
        [byte; BYTES_32_LEN]
    }

    #[test]
    fn test_proof_words_layout() {
        let proof = Groth16Proof::new(
            [word(1), word(2)],
            [[word(3), word(4)], [word(5), word(6)]],
            [word(7), word(8)],
            [word(9), word(10)],
        );

        let bytes = proof.to_bytes();
        assert_eq!(bytes.len(), GROTH16_PROOF_BYTES_LEN);
        assert_eq!(bytes[BYTES_32_LEN * 4], 5);
        assert_eq!(Groth16Proof::from_bytes(&bytes).unwrap(), proof);
    }

    #[test]
    fn test_proof_from_short_bytes() {
        let err = Groth16Proof::from_bytes(&[0u8; GROTH16_PROOF_BYTES_LEN - 1]).unwrap_err();
        assert!(matches!(
            err,
            CryptoError::MalformedProof {
                expected: GROTH16_PROOF_BYTES_LEN,
                ..
            }
        ));
    }

    #[test]
    fn test_u64_words() {
        let w = u64_to_word(383);
        assert_eq!(w[31], 0x7f);
        assert_eq!(w[30], 0x01);
        assert_eq!(word_to_u64(&w), Some(383));
        assert_eq!(word_to_u64(&word(1)), None);
    }
}
