// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Types Module
//!
//! This module provides the core data structures and types used by the light client. Types that
//! travel on the wire implement custom `to_ssz_bytes` and `from_ssz_bytes` methods to keep the
//! dependency footprint small.
//!
//! ## Sub-modules
//!
//! - `block`: Beacon block headers and the execution witnesses attached to them.
//! - `committee`: Sync aggregates and sync committee updates.
//! - `fork`: The fork schedule, the generalized index schema of each fork and signing domains.
//! - `signing_data`: Signing roots for sync committee signatures.
//! - `store`: The `LightClientStore` consensus state machine.
//! - `update`: The light client update variants consumed by the store.
//!
//! For more detailed information, users should refer to the specific
//! documentation for each sub-module.

pub mod block;
pub mod committee;
pub mod error;
pub mod fork;
pub mod signing_data;
pub mod store;
pub mod update;
pub mod utils;

/// Constant number of validators in the sync committee.
pub const SYNC_COMMITTEE_SIZE: usize = 512;

/// Length of a bytes32 array.
pub const BYTES_32_LEN: usize = 32;

/// Length of u64 in bytes.
pub const U64_LEN: usize = (u64::BITS / 8) as usize;

/// A 32-byte array.
pub type Bytes32 = [u8; BYTES_32_LEN];
