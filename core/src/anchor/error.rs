// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

use crate::types::block::execution::ExecutionField;
use crate::types::error::ConsensusError;
use thiserror::Error;

/// Errors possible while extending the set of anchor blocks.
#[derive(Debug, Error)]
pub enum AnchorError {
    #[error("Not enough committee participation: got {participation}, need at least {required}")]
    InsufficientParticipation { participation: u64, required: u64 },
    #[error("Head signature rejected: {source}")]
    InvalidHeadSignature {
        #[source]
        source: ConsensusError,
    },
    #[error("No fork schema supports slot {slot}")]
    UnsupportedFork { slot: u64 },
    #[error("No exec root proof")]
    NoExecutionRootProof,
    #[error("Bad exec root proof")]
    InvalidExecutionRootProof,
    #[error("No proof for execution {field}")]
    NoExecutionFieldProof { field: ExecutionField },
    #[error("Bad proof for execution {field}")]
    InvalidExecutionFieldProof { field: ExecutionField },
    #[error("Unknown anchor block {block_number}")]
    UnknownAnchorBlock { block_number: u64 },
    #[error("Invalid proof length: {length} headers can not be walked back from block {block_number}")]
    InvalidProofLength { block_number: u64, length: usize },
    #[error("Invalid left len for the header of block {block_number}: {actual} bytes")]
    InvalidLeftLength { block_number: u64, actual: usize },
    #[error("Malformed header witness for block {block_number}: {source}")]
    MalformedHeader {
        block_number: u64,
        #[source]
        source: Box<dyn std::error::Error + Sync + Send>,
    },
    #[error("Block hash mismatch for block {block_number}: expected {expected}, got {actual}")]
    BlockHashMismatch {
        block_number: u64,
        expected: String,
        actual: String,
    },
}

impl From<ConsensusError> for AnchorError {
    fn from(error: ConsensusError) -> Self {
        match error {
            ConsensusError::InsufficientParticipation {
                participation,
                required,
            } => AnchorError::InsufficientParticipation {
                participation,
                required,
            },
            source => AnchorError::InvalidHeadSignature { source },
        }
    }
}
