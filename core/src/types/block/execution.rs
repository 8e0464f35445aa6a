// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Execution Block module
//!
//! The light client never sees a full execution payload. It receives the SSZ root of the payload,
//! proven against the body of a beacon block, and the few payload fields it needs, each proven
//! against that root. This module contains the types holding those witnesses.

use crate::merkle::update_proofs::{
    is_execution_field_proof_valid, is_execution_payload_proof_valid,
};
use crate::types::error::{ExecutionProofError, TypesError};
use crate::types::fork::BranchSchema;
use crate::types::{Bytes32, U64_LEN};
use getset::Getters;
use std::fmt;

/// The execution payload fields proven in a light client update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionField {
    StateRoot,
    BlockNumber,
    BlockHash,
}

impl ExecutionField {
    pub const ALL: [ExecutionField; 3] = [
        ExecutionField::StateRoot,
        ExecutionField::BlockNumber,
        ExecutionField::BlockHash,
    ];
}

impl fmt::Display for ExecutionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionField::StateRoot => "state root",
            ExecutionField::BlockNumber => "block number",
            ExecutionField::BlockHash => "block hash",
        };
        f.write_str(name)
    }
}

/// A leaf and the siblings proving it.
#[derive(Debug, Default, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct Witness {
    leaf: Bytes32,
    branch: Vec<Bytes32>,
}

impl Witness {
    pub const fn new(leaf: Bytes32, branch: Vec<Bytes32>) -> Self {
        Self { leaf, branch }
    }
}

/// Witnesses binding the execution payload of a beacon block and three of its fields to the block
/// body root.
#[derive(Debug, Default, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct ExecutionRef {
    payload_root: Witness,
    state_root: Witness,
    block_number: Witness,
    block_hash: Witness,
}

impl ExecutionRef {
    pub const fn new(
        payload_root: Witness,
        state_root: Witness,
        block_number: Witness,
        block_hash: Witness,
    ) -> Self {
        Self {
            payload_root,
            state_root,
            block_number,
            block_hash,
        }
    }

    /// Returns the witness of the given payload field.
    pub const fn field(&self, field: ExecutionField) -> &Witness {
        match field {
            ExecutionField::StateRoot => &self.state_root,
            ExecutionField::BlockNumber => &self.block_number,
            ExecutionField::BlockHash => &self.block_hash,
        }
    }

    /// Decodes the execution block number from its SSZ chunk.
    ///
    /// # Errors
    ///
    /// Returns a `TypesError` if any of the 24 padding bytes of the chunk is set.
    pub fn execution_block_number(&self) -> Result<u64, TypesError> {
        let leaf = &self.block_number.leaf;
        if leaf[U64_LEN..].iter().any(|byte| *byte != 0) {
            return Err(TypesError::InvalidValue {
                structure: "ExecutionRef".into(),
                reason: "block number chunk has non-zero padding".into(),
            });
        }

        let mut le_bytes = [0u8; U64_LEN];
        le_bytes.copy_from_slice(&leaf[..U64_LEN]);

        Ok(u64::from_le_bytes(le_bytes))
    }

    pub const fn execution_block_hash(&self) -> &Bytes32 {
        &self.block_hash.leaf
    }

    pub const fn execution_state_root(&self) -> &Bytes32 {
        &self.state_root.leaf
    }

    /// Verifies the payload root against `body_root`, then each field against the payload root.
    ///
    /// # Errors
    ///
    /// Returns an `ExecutionProofError` naming the first witness that is missing or invalid. A
    /// block number chunk that does not decode to a `u64` is reported as an invalid block number
    /// proof.
    pub fn verify(
        &self,
        body_root: &Bytes32,
        schema: &BranchSchema,
    ) -> Result<(), ExecutionProofError> {
        if self.payload_root.branch.is_empty() {
            return Err(ExecutionProofError::NoPayloadProof);
        }
        let payload_valid = is_execution_payload_proof_valid(
            body_root,
            &self.payload_root.leaf,
            &self.payload_root.branch,
            schema,
        )
        .unwrap_or(false);
        if !payload_valid {
            return Err(ExecutionProofError::InvalidPayloadProof);
        }

        for field in ExecutionField::ALL {
            let witness = self.field(field);
            if witness.branch.is_empty() {
                return Err(ExecutionProofError::NoFieldProof { field });
            }
            let field_valid = is_execution_field_proof_valid(
                &self.payload_root.leaf,
                field,
                &witness.leaf,
                &witness.branch,
                schema,
            )
            .unwrap_or(false);
            if !field_valid {
                return Err(ExecutionProofError::InvalidFieldProof { field });
            }
        }

        self.execution_block_number()
            .map_err(|_| ExecutionProofError::InvalidFieldProof {
                field: ExecutionField::BlockNumber,
            })?;

        Ok(())
    }
}
