// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Cryptographic Utilities for the Beacon Light Client
//!
//! This module contains cryptographic utilities used by the light client.
//!
//! ## Sub-modules
//!
//! - `hash`: The `HashValue` type and the SHA-256 and keccak-256 helpers.
//! - `oracle`: The `ProofOracle` trait standing in front of the succinct proof verifiers, and the
//!   `Groth16Proof` shape they consume.
//! - `error`: This sub-module contains the `CryptoError` error type used throughout the `crypto` module.

pub mod error;
pub mod hash;
pub mod oracle;
