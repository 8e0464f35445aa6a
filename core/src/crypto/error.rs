// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// The error type for the `crypto` module.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid hash length. Expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("Malformed proof encoding. Expected {expected} bytes, got {actual}")]
    MalformedProof { expected: usize, actual: usize },
}
