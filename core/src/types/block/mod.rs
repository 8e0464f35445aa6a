// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Block module
//!
//! This module contains the data structures used by the Light Client to store block-related
//! data. It is divided in two main modules, `consensus` and `execution`, each with its own
//! specific functionality.
//!
//! ## Sub-modules
//!
//! - `consensus`: This module contains the data structures related to consensus-related blocks.
//! - `execution`: This module contains the witnesses binding execution data to a beacon block.
//!
//! For more detailed information, users should refer to the specific documentation for each sub-module.

use crate::types::block::consensus::BeaconBlockHeader;
use crate::types::block::execution::ExecutionRef;
use crate::types::error::ExecutionProofError;
use crate::types::fork::BranchSchema;
use getset::Getters;

pub mod consensus;
pub mod execution;

/// A beacon block header together with the witnesses of its execution payload.
#[derive(Debug, Default, Clone, Eq, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct HeaderWithExecution {
    beacon: BeaconBlockHeader,
    execution: ExecutionRef,
}

impl HeaderWithExecution {
    pub const fn new(beacon: BeaconBlockHeader, execution: ExecutionRef) -> Self {
        Self { beacon, execution }
    }

    /// Verifies the execution witnesses against the body root of the beacon header.
    pub fn verify_execution(&self, schema: &BranchSchema) -> Result<(), ExecutionProofError> {
        self.execution.verify(self.beacon.body_root(), schema)
    }
}
