// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

use anyhow::{bail, Context, Result};
use beacon_lc::config::{Config, Network};
use beacon_lc::engine::{Engine, UncheckedOracle};
use beacon_lc::feed::parse_feed;
use beacon_lc_core::crypto::oracle::ConsensusOracles;
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;

/// Replays a feed of light client updates and proofs on top of a trusted checkpoint.
#[derive(Parser)]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long)]
    config: PathBuf,

    /// Path to the JSON feed file.
    #[arg(short, long)]
    feed: PathBuf,

    /// Network whose genesis parameters to use, overriding the configuration file.
    #[arg(short, long, value_enum)]
    network: Option<Network>,

    /// Accept succinct proofs without verifying them. Merkle branches and hash links are still
    /// checked.
    #[arg(long)]
    unchecked_proofs: bool,

    /// Exit with an error if any entry is rejected.
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<()> {
    let Cli {
        config,
        feed,
        network,
        unchecked_proofs,
        strict,
    } = Cli::parse();

    // Initialize the logger.
    env_logger::init();

    if !unchecked_proofs {
        bail!("no succinct proof verifier is available, pass --unchecked-proofs to replay anyway");
    }
    warn!("Succinct proofs are accepted without verification");

    let config = Config::from_file(&config, network)?;
    let feed_json = std::fs::read_to_string(&feed)
        .with_context(|| format!("could not read feed {}", feed.display()))?;
    let entries = parse_feed(&feed_json)?;
    info!("Replaying {} feed entries", entries.len());

    let oracle = Arc::new(UncheckedOracle);
    let mut engine = Engine::new(
        &config,
        ConsensusOracles::new(oracle.clone(), oracle.clone()),
        oracle,
    )?;
    let summary = engine.replay(&entries);

    let store = engine.store();
    println!(
        "finalized slot {} (block {}), optimistic slot {} (block {})",
        store.finalized_header().slot(),
        store.finalized_execution().block_number(),
        store.optimistic_header().slot(),
        store.optimistic_execution().block_number()
    );
    if let (Some((earliest, _)), Some((latest, _))) =
        (engine.anchors().earliest(), engine.anchors().latest())
    {
        println!(
            "{} anchor blocks from {earliest} to {latest}",
            engine.anchors().len()
        );
    }
    println!(
        "{} entries applied, {} rejected, {} unproven block hashes",
        summary.applied(),
        summary.rejected(),
        summary.invalid_block_hashes()
    );

    if strict && (summary.rejected() > 0 || summary.invalid_block_hashes() > 0) {
        bail!("{} feed entries were rejected", summary.rejected());
    }

    Ok(())
}
