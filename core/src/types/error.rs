// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

use crate::types::block::execution::ExecutionField;
use thiserror::Error;

/// Errors possible during type manipulation.
#[derive(Debug, Error)]
pub enum TypesError {
    #[error("Failed to deserialize {structure}: {source}")]
    DeserializationError {
        structure: String,
        #[source]
        source: Box<dyn std::error::Error + Sync + Send>,
    },
    #[error("Received data of invalid length for {structure}. Expected {expected}, got {actual}.")]
    InvalidLength {
        structure: String,
        expected: usize,
        actual: usize,
    },
    #[error("Invalid value for {structure}: {reason}")]
    InvalidValue { structure: String, reason: String },
}

/// Errors possible while initializing the Light Client store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(
        "Failed to initialize store. Expected bootstrap at checkpoint {expected}, got {actual}"
    )]
    InvalidBootstrap { expected: String, actual: String },
    #[error("Invalid current sync committee proof in the checkpoint")]
    InvalidCurrentCommitteeProof,
    #[error("Invalid execution witnesses in the checkpoint: {source}")]
    InvalidExecutionProof {
        #[source]
        source: Box<dyn std::error::Error + Sync + Send>,
    },
    #[error("No fork schema supports slot {slot}")]
    UnsupportedFork { slot: u64 },
    #[error("Error while manipulating Merkle structure: {source}")]
    MerkleError {
        #[source]
        source: Box<dyn std::error::Error + Sync + Send>,
    },
}

/// Errors possible while verifying the consensus rules. Every check of the update processing has
/// its own variant, and a missing proof is always distinguished from an invalid one.
/// Failures while verifying the execution witnesses attached to a beacon block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExecutionProofError {
    #[error("No execution payload proof")]
    NoPayloadProof,
    #[error("Invalid execution payload proof")]
    InvalidPayloadProof,
    #[error("No execution {field} proof")]
    NoFieldProof { field: ExecutionField },
    #[error("Invalid execution {field} proof")]
    InvalidFieldProof { field: ExecutionField },
}

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("Stale update: attested slot {update_slot} is not newer than {latest_slot}")]
    StaleUpdate { update_slot: u64, latest_slot: u64 },
    #[error("Not relevant: update neither advances finality nor completes the next sync committee")]
    NotRelevant,
    #[error("Invalid timestamp")]
    InvalidTimestamp,
    #[error("Not enough committee participation: got {participation}, need at least {required}")]
    InsufficientParticipation { participation: u64, required: u64 },
    #[error("No finality proof")]
    NoFinalityProof,
    #[error("Invalid finality proof")]
    InvalidFinalityProof,
    #[error("No execution payload proof")]
    NoExecutionPayloadProof,
    #[error("Invalid execution payload proof")]
    InvalidExecutionPayloadProof,
    #[error("No execution {field} proof")]
    NoExecutionFieldProof { field: ExecutionField },
    #[error("Invalid execution {field} proof")]
    InvalidExecutionFieldProof { field: ExecutionField },
    #[error("No next sync committee proof")]
    NoNextSyncCommitteeProof,
    #[error("Invalid next sync committee proof")]
    InvalidNextSyncCommitteeProof,
    #[error("Invalid committee root mapping proof")]
    InvalidCommitteeRootMapping,
    #[error("Invalid period: signature period {signature_period}, store period {store_period}")]
    InvalidPeriod {
        signature_period: u64,
        store_period: u64,
    },
    #[error("Unknown next sync committee")]
    UnknownNextSyncCommittee,
    #[error("Invalid committee poseidon root. Expected {expected}, got {actual}")]
    InvalidCommitteePoseidonRoot { expected: String, actual: String },
    #[error("Invalid signature proof")]
    InvalidSignatureProof,
    #[error("No fork schema supports slot {slot}")]
    UnsupportedFork { slot: u64 },
    #[error("Error while calculating Merkle root: {source}")]
    MerkleError {
        #[source]
        source: Box<dyn std::error::Error + Sync + Send>,
    },
}

impl From<ExecutionProofError> for ConsensusError {
    fn from(error: ExecutionProofError) -> Self {
        match error {
            ExecutionProofError::NoPayloadProof => ConsensusError::NoExecutionPayloadProof,
            ExecutionProofError::InvalidPayloadProof => {
                ConsensusError::InvalidExecutionPayloadProof
            }
            ExecutionProofError::NoFieldProof { field } => {
                ConsensusError::NoExecutionFieldProof { field }
            }
            ExecutionProofError::InvalidFieldProof { field } => {
                ConsensusError::InvalidExecutionFieldProof { field }
            }
        }
    }
}

/// Macro to create a `TypesError::DeserializationError` with the given structure and source.
#[macro_export]
macro_rules! deserialization_error {
    ($structure:expr, $source:expr) => {
        TypesError::DeserializationError {
            structure: String::from($structure),
            source: $source.into(),
        }
    };
}

/// Macro to create a `TypesError::DeserializationError` from a plain message.
#[macro_export]
macro_rules! serde_error {
    ($structure:expr, $msg:expr) => {
        TypesError::DeserializationError {
            structure: String::from($structure),
            source: String::from($msg).into(),
        }
    };
}
