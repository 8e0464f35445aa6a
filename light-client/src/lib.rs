// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Light Client
//!
//! This crate wires the verification components of `beacon-lc-core` into a light client that can be
//! configured for a network and fed with updates and proofs.
//!
//! ## Binaries
//!
//! - `replay`: Bootstraps the light client from a configuration file and applies a feed of updates
//!   and proofs, reporting what was accepted.
//!
//! ## Library
//!
//! - [`config`]: Network presets and configuration files.
//! - [`feed`]: JSON encoding of updates, anchor block witnesses and chunk proofs.
//! - [`engine`]: The [`engine::Engine`] routing feed entries to the verification components.
//! - [`error`]: Errors of the feed and the engine.
//!
//! For more detailed information, users should refer to the specific documentation for each
//! sub-module.

pub mod config;
pub mod engine;
pub mod error;
pub mod feed;
