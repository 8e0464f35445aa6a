// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

use beacon_lc_core::anchor::AnchorError;
use beacon_lc_core::chunks::ChunkError;
use beacon_lc_core::merkle::error::MerkleError;
use beacon_lc_core::types::error::{ConsensusError, StoreError, TypesError};
use thiserror::Error;

/// The error type for the `feed` module.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Could not parse feed JSON: {source}")]
    Json {
        #[source]
        source: Box<dyn std::error::Error + Sync + Send>,
    },
    #[error("Invalid value for {structure}: {source}")]
    Conversion {
        structure: String,
        #[source]
        source: Box<dyn std::error::Error + Sync + Send>,
    },
}

impl From<TypesError> for FeedError {
    fn from(source: TypesError) -> Self {
        FeedError::Conversion {
            structure: "consensus types".into(),
            source: source.into(),
        }
    }
}

impl From<MerkleError> for FeedError {
    fn from(source: MerkleError) -> Self {
        FeedError::Conversion {
            structure: "ParentHashWitness".into(),
            source: source.into(),
        }
    }
}

/// The error type for the `engine` module.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Could not bootstrap the store: {source}")]
    Bootstrap {
        #[from]
        source: StoreError,
    },
    #[error("Light client update rejected: {source}")]
    Consensus {
        #[from]
        source: ConsensusError,
    },
    #[error("Anchor block update rejected: {source}")]
    Anchor {
        #[from]
        source: AnchorError,
    },
    #[error("Chunk update rejected: {source}")]
    Chunk {
        #[from]
        source: ChunkError,
    },
    #[error("Malformed feed entry: {source}")]
    Feed {
        #[from]
        source: FeedError,
    },
}
