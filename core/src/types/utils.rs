// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

use crate::serde_error;
use crate::types::error::TypesError;
use crate::types::U64_LEN;

/// Number of slots in an epoch.
pub const SLOTS_PER_EPOCH: u64 = 32;

/// Number of epochs a sync committee stays active.
pub const EPOCHS_PER_SYNC_COMMITTEE_PERIOD: u64 = 256;

/// Number of slots in a sync committee period.
pub const SLOTS_PER_SYNC_COMMITTEE_PERIOD: u64 = SLOTS_PER_EPOCH * EPOCHS_PER_SYNC_COMMITTEE_PERIOD;

/// Duration of a slot in seconds.
pub const SECONDS_PER_SLOT: u64 = 12;

/// Calculate the sync committee period a slot belongs to.
pub const fn calc_sync_period(slot: u64) -> u64 {
    slot / SLOTS_PER_SYNC_COMMITTEE_PERIOD
}

/// Calculate the epoch a slot belongs to.
pub const fn calc_epoch(slot: u64) -> u64 {
    slot / SLOTS_PER_EPOCH
}

/// Utility method to extract the N bytes at a given cursor from a byte array.
///
/// # Arguments
///
/// * `structure` - The name of the structure being extracted.
/// * `bytes` - The byte array to extract from.
/// * `cursor` - The current cursor position in the byte array.
///
/// # Returns
///
/// A tuple containing the new cursor position and the extracted bytes.
pub fn extract_fixed_bytes<const N: usize>(
    structure: &str,
    bytes: &[u8],
    cursor: usize,
) -> Result<(usize, [u8; N]), TypesError> {
    if cursor + N > bytes.len() {
        return Err(serde_error!(
            structure,
            "Not enough bytes to extract fixed bytes"
        ));
    }
    let result = bytes[cursor..cursor + N]
        .try_into()
        .map_err(|_| serde_error!(structure, "Invalid fixed bytes"))?;

    Ok((cursor + N, result))
}

/// Utility method to extract a u64 from a little-endian byte array at a given cursor.
///
/// # Arguments
///
/// * `structure` - The name of the structure being extracted.
/// * `bytes` - The byte array to extract from.
/// * `cursor` - The current cursor position in the byte array.
///
/// # Returns
///
/// A tuple containing the new cursor position and the extracted u64.
pub fn extract_u64(
    structure: &str,
    bytes: &[u8],
    cursor: usize,
) -> Result<(usize, u64), TypesError> {
    let (cursor, le_bytes) = extract_fixed_bytes::<U64_LEN>(structure, bytes, cursor)?;

    Ok((cursor, u64::from_le_bytes(le_bytes)))
}
