// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Errors possible while building or verifying Merkle proofs.
#[derive(Debug, Error)]
pub enum MerkleError {
    #[error("Unexpected branch length received. Expected {expected}, got {actual}")]
    InvalidBranchLength { expected: usize, actual: usize },
    #[error("Generalized index {0} does not designate a node below the root")]
    InvalidGeneralizedIndex(u64),
    #[error("Unexpected number of leaves. Expected {expected}, got {actual}")]
    InvalidLeafCount { expected: usize, actual: usize },
    #[error("Leaf index {index} out of range for {leaves} leaves")]
    LeafIndexOutOfRange { index: usize, leaves: usize },
    #[error("Invalid left len: expected {expected} bytes before the parent hash, got {actual}")]
    InvalidLeftLength { expected: usize, actual: usize },
    #[error("Invalid header prefix: bytes before the parent hash are not an RLP list header followed by a 32-byte string header")]
    InvalidHeaderPrefix,
    #[error("Raw header too short: {actual} bytes")]
    HeaderTooShort { actual: usize },
}
