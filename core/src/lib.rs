// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Beacon Light Client Core
//!
//! This crate provides the verification logic that lets a verifier without network access build a
//! trusted mapping from execution block number to block hash, anchored to succinct consensus proofs.
//! It is divided into several sub-modules, each with its own specific functionality.
//!
//! ## Sub-modules
//!
//! - `crypto`: Hashing utilities and the [`crypto::oracle::ProofOracle`] seam to the succinct proof
//!   verifiers.
//! - `merkle`: SSZ branch verification, the keccak chunk tree and the header chain verifier.
//! - `types`: Consensus data structures and the [`types::store::LightClientStore`] state machine.
//! - `anchor`: The [`anchor::AnchorBlocks`] map of chain-verified execution blocks.
//! - `chunks`: The [`chunks::BlockChunks`] store of 128-block chunk roots.
//!
//! For more detailed information, users should refer to the specific documentation for each sub-module.

pub mod anchor;
pub mod chunks;
pub mod crypto;
pub mod merkle;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
