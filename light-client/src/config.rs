// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Configuration
//!
//! The light client is configured by a JSON file naming the network (or describing its genesis
//! parameters), the trusted checkpoint the store is bootstrapped from and the chains whose block
//! chunks are synced:
//!
//! ```json
//! {
//!   "network": "mainnet",
//!   "trusted_block_root": "0x…",
//!   "checkpoint": { "header": { … }, "current_committee": { … } },
//!   "chunk_chains": [1]
//! }
//! ```
//!
//! A `genesis` object takes precedence over `network`.

use crate::feed::encoding::{Hex32, HexBytes, Quantity};
use crate::feed::CheckpointJson;
use anyhow::{anyhow, bail, Context, Result};
use beacon_lc_core::types::fork::{
    Fork, ForkName, ForkSchedule, ForkVersion, GenesisConfig, FORK_VERSION_LEN,
};
use beacon_lc_core::types::store::TrustedCheckpoint;
use beacon_lc_core::types::Bytes32;
use clap::ValueEnum;
use getset::Getters;
use serde::Deserialize;
use std::path::Path;

/// Networks whose genesis parameters are built in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Sepolia,
    Goerli,
}

impl Network {
    /// Genesis parameters and fork schedule of the network.
    ///
    /// # Errors
    ///
    /// Returns an error if the built in fork schedule is not well ordered.
    pub fn genesis(&self) -> Result<GenesisConfig> {
        let (genesis_time, genesis_validators_root, forks) = match self {
            Network::Mainnet => (
                1_606_824_023,
                "4b363db94e286120d76eb905340fdd4e54bfe9f06bf33ff6cf5ad27f511bfe95",
                vec![
                    (ForkName::Phase0, 0, [0x00, 0x00, 0x00, 0x00]),
                    (ForkName::Altair, 74_240, [0x01, 0x00, 0x00, 0x00]),
                    (ForkName::Bellatrix, 144_896, [0x02, 0x00, 0x00, 0x00]),
                    (ForkName::Capella, 194_048, [0x03, 0x00, 0x00, 0x00]),
                    (ForkName::Deneb, 269_568, [0x04, 0x00, 0x00, 0x00]),
                    (ForkName::Electra, 364_032, [0x05, 0x00, 0x00, 0x00]),
                ],
            ),
            Network::Sepolia => (
                1_655_733_600,
                "d8ea171f3c94aea21ebc42a1ed61052acf3f9209c00e4efbaaddac09ed9b8078",
                vec![
                    (ForkName::Phase0, 0, [0x90, 0x00, 0x00, 0x69]),
                    (ForkName::Altair, 50, [0x90, 0x00, 0x00, 0x70]),
                    (ForkName::Bellatrix, 100, [0x90, 0x00, 0x00, 0x71]),
                    (ForkName::Capella, 56_832, [0x90, 0x00, 0x00, 0x72]),
                    (ForkName::Deneb, 132_608, [0x90, 0x00, 0x00, 0x73]),
                    (ForkName::Electra, 222_464, [0x90, 0x00, 0x00, 0x74]),
                ],
            ),
            Network::Goerli => (
                1_616_508_000,
                "043db0d9a83813551ee2f33450d23797757d430911a9320530ad8a0eabc43efb",
                vec![
                    (ForkName::Phase0, 0, [0x00, 0x00, 0x10, 0x20]),
                    (ForkName::Altair, 36_660, [0x01, 0x00, 0x10, 0x20]),
                    (ForkName::Bellatrix, 112_260, [0x02, 0x00, 0x10, 0x20]),
                    (ForkName::Capella, 162_304, [0x03, 0x00, 0x10, 0x20]),
                    (ForkName::Deneb, 231_680, [0x04, 0x00, 0x10, 0x20]),
                ],
            ),
        };

        let mut root: Bytes32 = [0; 32];
        hex::decode_to_slice(genesis_validators_root, &mut root)
            .context("invalid built in genesis validators root")?;
        let schedule = ForkSchedule::new(
            forks
                .into_iter()
                .map(|(name, epoch, version)| Fork::new(name, epoch, version))
                .collect(),
        )?;

        Ok(GenesisConfig::new(genesis_time, root, schedule))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ForkJson {
    name: String,
    epoch: Quantity,
    version: HexBytes,
}

#[derive(Debug, Clone, Deserialize)]
struct GenesisJson {
    genesis_time: Quantity,
    genesis_validators_root: Hex32,
    forks: Vec<ForkJson>,
}

impl TryFrom<&GenesisJson> for GenesisConfig {
    type Error = anyhow::Error;

    fn try_from(json: &GenesisJson) -> Result<Self> {
        let forks = json
            .forks
            .iter()
            .map(|fork| -> Result<Fork> {
                let version: ForkVersion = fork.version.0.as_slice().try_into().map_err(|_| {
                    anyhow!(
                        "fork {} version must be {FORK_VERSION_LEN} bytes long",
                        fork.name
                    )
                })?;
                Ok(Fork::new(fork.name.parse()?, fork.epoch.0, version))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(GenesisConfig::new(
            json.genesis_time.0,
            json.genesis_validators_root.0,
            ForkSchedule::new(forks)?,
        ))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    network: Option<Network>,
    #[serde(default)]
    genesis: Option<GenesisJson>,
    trusted_block_root: Hex32,
    checkpoint: CheckpointJson,
    #[serde(default)]
    chunk_chains: Vec<Quantity>,
}

/// Resolved configuration of the light client.
#[derive(Debug, Clone, Getters)]
#[getset(get = "pub")]
pub struct Config {
    genesis: GenesisConfig,
    trusted_block_root: Bytes32,
    checkpoint: TrustedCheckpoint,
    chunk_chains: Vec<u64>,
}

impl Config {
    pub const fn new(
        genesis: GenesisConfig,
        trusted_block_root: Bytes32,
        checkpoint: TrustedCheckpoint,
        chunk_chains: Vec<u64>,
    ) -> Self {
        Self {
            genesis,
            trusted_block_root,
            checkpoint,
            chunk_chains,
        }
    }

    /// Parses a configuration. `network` overrides the network named in the file, but not an
    /// explicit `genesis` object.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or if no genesis parameters can be resolved.
    pub fn from_json(json: &str, network: Option<Network>) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(json).context("invalid configuration")?;

        let genesis = match (&file.genesis, network.or(file.network)) {
            (Some(genesis), _) => {
                GenesisConfig::try_from(genesis).context("invalid genesis parameters")?
            }
            (None, Some(network)) => network.genesis()?,
            (None, None) => {
                bail!("the configuration names neither a network nor genesis parameters")
            }
        };

        Ok(Self {
            genesis,
            trusted_block_root: file.trusted_block_root.0,
            checkpoint: (&file.checkpoint).into(),
            chunk_chains: file.chunk_chains.iter().map(|chain| chain.0).collect(),
        })
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can not be read or is not a valid configuration.
    pub fn from_file(path: impl AsRef<Path>, network: Option<Network>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("could not read configuration {}", path.display()))?;

        Self::from_json(&json, network)
    }
}
