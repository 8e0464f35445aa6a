// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! JSON scalar encodings used by feed and configuration files.
//!
//! Byte strings are `0x` prefixed hex (the prefix is optional). Integers are accepted both as JSON
//! numbers and as decimal strings, the latter being what beacon node APIs return.

use beacon_lc_core::types::Bytes32;
use serde::de::Error;
use serde::{Deserialize, Deserializer};

fn decode_hex<E: Error>(value: &str) -> Result<Vec<u8>, E> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(digits).map_err(|err| E::custom(format!("invalid hex string {value:?}: {err}")))
}

/// A 32-byte value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Hex32(pub Bytes32);

impl<'de> Deserialize<'de> for Hex32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        let bytes = decode_hex::<D::Error>(&value)?;
        let len = bytes.len();

        bytes
            .try_into()
            .map(Hex32)
            .map_err(|_| D::Error::custom(format!("expected 32 bytes, got {len}")))
    }
}

impl From<Hex32> for Bytes32 {
    fn from(value: Hex32) -> Self {
        value.0
    }
}

/// Converts a list of hex values to the branch or proof they encode.
pub fn to_bytes32_vec(values: &[Hex32]) -> Vec<Bytes32> {
    values.iter().map(|value| value.0).collect()
}

/// A byte string of any length.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HexBytes(pub Vec<u8>);

impl<'de> Deserialize<'de> for HexBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        decode_hex::<D::Error>(&value).map(HexBytes)
    }
}

/// An unsigned integer, as a JSON number or a decimal string.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Quantity(pub u64);

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Ok(Quantity(value)),
            Raw::Text(value) => value
                .parse()
                .map(Quantity)
                .map_err(|err| D::Error::custom(format!("invalid integer {value:?}: {err}"))),
        }
    }
}

impl From<Quantity> for u64 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_hex32() {
        let value = format!("\"0x{}\"", "ab".repeat(32));
        assert_eq!(
            serde_json::from_str::<Hex32>(&value).unwrap(),
            Hex32([0xab; 32])
        );

        let unprefixed = format!("\"{}\"", "01".repeat(32));
        assert_eq!(
            serde_json::from_str::<Hex32>(&unprefixed).unwrap(),
            Hex32([1; 32])
        );

        assert!(serde_json::from_str::<Hex32>("\"0xabcd\"").is_err());
        assert!(serde_json::from_str::<Hex32>("\"0xzz\"").is_err());
    }

    #[test]
    fn test_hex_bytes() {
        assert_eq!(
            serde_json::from_str::<HexBytes>("\"0x00ff10\"").unwrap(),
            HexBytes(vec![0, 0xff, 0x10])
        );
        assert_eq!(
            serde_json::from_str::<HexBytes>("\"0x\"").unwrap(),
            HexBytes(vec![])
        );
    }

    #[test]
    fn test_quantity() {
        assert_eq!(serde_json::from_str::<Quantity>("42").unwrap(), Quantity(42));
        assert_eq!(
            serde_json::from_str::<Quantity>("\"6513843\"").unwrap(),
            Quantity(6_513_843)
        );
        assert!(serde_json::from_str::<Quantity>("\"-1\"").is_err());
        assert!(serde_json::from_str::<Quantity>("-1").is_err());
    }
}
