// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Errors possible while storing chunk roots.
#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("Unsupported chain {chain_id}")]
    UnsupportedChain { chain_id: u64 },
    #[error("Malformed chunk proof: {reason}")]
    MalformedProof { reason: String },
    #[error("Invalid chunk range: blocks {start} to {end} are not one chunk")]
    InvalidRange { start: u64, end: u64 },
    #[error("Chunk start {start} is not aligned on a chunk boundary")]
    MisalignedStart { start: u64 },
    #[error("Chunk proof of blocks {start} to {end} rejected by the verifier")]
    InvalidProof { start: u64, end: u64 },
    #[error("No anchor block hash known for block {block_number}")]
    UnknownAnchorBlock { block_number: u64 },
    #[error("End hash of the chunk does not match anchor block {block_number}: expected {expected}, got {actual}")]
    EndHashMismatch {
        block_number: u64,
        expected: String,
        actual: String,
    },
    #[error("Chunk starting at block {start} is already stored")]
    ChunkAlreadyStored { start: u64 },
    #[error("Chunk proof starts at block {actual}, expected {expected}")]
    StartMismatch { expected: u64, actual: u64 },
    #[error("Chunk starting at block {start} is the last one of the block range")]
    LastChunk { start: u64 },
    #[error("No chunk stored at block {start}")]
    UnknownNextChunk { start: u64 },
    #[error("Root of the chunk stored at block {start} does not match the claimed one")]
    NextChunkRootMismatch { start: u64 },
    #[error("Chunk stored at block {start} does not link to the end hash of the proven chunk")]
    PrevHashMismatch { start: u64 },
}
