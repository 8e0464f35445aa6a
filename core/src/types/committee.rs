// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Sync Committee module
//!
//! This module contains the data structures used to prove that a sync committee signed a header.
//!
//! In the context of the Ethereum network, the sync committee is a subset of the full validator set
//! that is responsible for attesting to the latest block. The light client never handles the 512
//! public keys of a committee. It tracks two roots per committee: the SSZ root, which is what the
//! beacon state commits to, and a Poseidon root, which is what the signature circuit commits to.
//! A mapping proof binds the two.
//!
//! For more information about the sync committee you can refer [to the Eth2 book](https://eth2book.info/capella/part2/building_blocks/committees/)
//! by Ben Edgington.

use crate::crypto::hash::HashValue;
use crate::crypto::oracle::{u64_to_word, Groth16Proof};
use crate::types::{Bytes32, SYNC_COMMITTEE_SIZE};
use getset::{CopyGetters, Getters};

/// Minimum number of participants for a sync aggregate to be accepted, the smallest `p` such that
/// `p * 3 >= SYNC_COMMITTEE_SIZE * 2`.
pub const MIN_SYNC_COMMITTEE_PARTICIPANTS: u64 = (SYNC_COMMITTEE_SIZE as u64 * 2).div_ceil(3);

/// The aggregated signature of a sync committee over a beacon header, expressed as a succinct
/// proof.
#[derive(Debug, Default, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct SyncAggregate {
    #[getset(get_copy = "pub")]
    participation: u64,
    #[getset(get = "pub")]
    poseidon_root: Bytes32,
    #[getset(get = "pub")]
    commitment: Bytes32,
    #[getset(get = "pub")]
    proof: Groth16Proof,
}

impl SyncAggregate {
    pub const fn new(
        participation: u64,
        poseidon_root: Bytes32,
        commitment: Bytes32,
        proof: Groth16Proof,
    ) -> Self {
        Self {
            participation,
            poseidon_root,
            commitment,
            proof,
        }
    }

    /// Checks that at least two thirds of the committee took part in the signature.
    pub const fn has_quorum(&self) -> bool {
        self.participation.saturating_mul(3) >= SYNC_COMMITTEE_SIZE as u64 * 2
    }

    /// Public inputs of the signature proof:
    /// `[signing_root_hi, signing_root_lo, poseidon_root, participation, commitment]`.
    pub fn public_inputs(&self, signing_root: &HashValue) -> Vec<Bytes32> {
        let [hi, lo] = signing_root.split_words();
        vec![
            hi,
            lo,
            self.poseidon_root,
            u64_to_word(self.participation),
            self.commitment,
        ]
    }
}

/// The next sync committee announced by a full update, and the proof that its SSZ root and its
/// Poseidon root designate the same committee.
#[derive(Debug, Default, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct CommitteeUpdate {
    next_committee_root: Bytes32,
    next_committee_branch: Vec<Bytes32>,
    next_committee_poseidon_root: Bytes32,
    mapping_proof: Groth16Proof,
}

impl CommitteeUpdate {
    pub const fn new(
        next_committee_root: Bytes32,
        next_committee_branch: Vec<Bytes32>,
        next_committee_poseidon_root: Bytes32,
        mapping_proof: Groth16Proof,
    ) -> Self {
        Self {
            next_committee_root,
            next_committee_branch,
            next_committee_poseidon_root,
            mapping_proof,
        }
    }

    /// Public inputs of the mapping proof: `[ssz_root_hi, ssz_root_lo, poseidon_root]`.
    pub fn mapping_public_inputs(&self) -> Vec<Bytes32> {
        let [hi, lo] = HashValue::new(self.next_committee_root).split_words();
        vec![hi, lo, self.next_committee_poseidon_root]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_quorum_threshold() {
        assert_eq!(MIN_SYNC_COMMITTEE_PARTICIPANTS, 342);

        let aggregate = |participation| {
            SyncAggregate::new(participation, [0; 32], [0; 32], Groth16Proof::default())
        };
        assert!(!aggregate(0).has_quorum());
        assert!(!aggregate(341).has_quorum());
        assert!(aggregate(342).has_quorum());
        assert!(aggregate(512).has_quorum());
        assert!(aggregate(u64::MAX).has_quorum());
    }

    #[test]
    fn test_public_inputs_layout() {
        let aggregate =
            SyncAggregate::new(400, [0xaa; 32], [0xcc; 32], Groth16Proof::default());
        let mut root = [0u8; 32];
        root[..16].copy_from_slice(&[0x01; 16]);
        root[16..].copy_from_slice(&[0x02; 16]);

        let inputs = aggregate.public_inputs(&HashValue::new(root));
        assert_eq!(inputs.len(), 5);
        assert_eq!(&inputs[0][..16], &[0u8; 16]);
        assert_eq!(&inputs[0][16..], &[0x01; 16]);
        assert_eq!(&inputs[1][16..], &[0x02; 16]);
        assert_eq!(inputs[2], [0xaa; 32]);
        assert_eq!(&inputs[3][24..], &400u64.to_be_bytes());
        assert_eq!(inputs[4], [0xcc; 32]);

        let update = CommitteeUpdate::new(root, vec![], [0xdd; 32], Groth16Proof::default());
        let inputs = update.mapping_public_inputs();
        assert_eq!(inputs.len(), 3);
        assert_eq!(inputs[2], [0xdd; 32]);
        assert_eq!(&inputs[0][16..], &[0x01; 16]);
    }
}
