//! Version 1 (time-based) UUID helpers.
//!
//! The store orders `TimeUUIDType` names by their embedded timestamp. To slice
//! a row by time, a bound instant is turned into the lowest or highest UUID
//! that can carry that timestamp.

use std::cmp::Ordering;

use uuid::Uuid;

/// 100-nanosecond intervals between 1582-10-15 and 1970-01-01.
pub const UUID_EPOCH_OFFSET: u64 = 0x01B2_1DD2_1381_4000;

/// Largest timestamp a version 1 UUID can hold (60 bits).
const MAX_TICKS: u64 = (1 << 60) - 1;

/// Builds a version 1 UUID from its parts.
///
/// `micros` is microseconds since the Unix epoch. The variant bits are forced
/// on `clock_seq`.
pub fn from_micros(micros: i64, clock_seq: u16, node: [u8; 6]) -> Uuid {
    let ticks = ticks_from_micros(micros);
    let time_low = (ticks & 0xFFFF_FFFF) as u32;
    let time_mid = ((ticks >> 32) & 0xFFFF) as u16;
    let time_hi = (((ticks >> 48) & 0x0FFF) as u16) | 0x1000;
    let clock_seq = (clock_seq & 0x3FFF) | 0x8000;

    let mut bytes = [0u8; 16];
    bytes[0..4].copy_from_slice(&time_low.to_be_bytes());
    bytes[4..6].copy_from_slice(&time_mid.to_be_bytes());
    bytes[6..8].copy_from_slice(&time_hi.to_be_bytes());
    bytes[8..10].copy_from_slice(&clock_seq.to_be_bytes());
    bytes[10..16].copy_from_slice(&node);
    Uuid::from_bytes(bytes)
}

/// The smallest TimeUUID carrying the given instant.
pub fn lowest_for_micros(micros: i64) -> Uuid {
    from_micros(micros, 0x0000, [0x00; 6])
}

/// The largest TimeUUID carrying the given instant.
pub fn highest_for_micros(micros: i64) -> Uuid {
    from_micros(micros, 0x3FFF, [0xFF; 6])
}

/// Returns the 60-bit timestamp of a version 1 UUID.
pub fn ticks(uuid: &Uuid) -> Option<u64> {
    if uuid.get_version_num() != 1 {
        return None;
    }
    Some(ticks_of(uuid.as_bytes()))
}

/// Returns the embedded time of a version 1 UUID in microseconds since the
/// Unix epoch.
pub fn micros(uuid: &Uuid) -> Option<i64> {
    let ticks = ticks(uuid)?;
    Some((i128::from(ticks) - i128::from(UUID_EPOCH_OFFSET)).div_euclid(10) as i64)
}

/// Orders encoded TimeUUIDs by timestamp, then by raw bytes.
///
/// Inputs that are not 16 bytes long fall back to byte order.
pub fn compare(a: &[u8], b: &[u8]) -> Ordering {
    match (<&[u8; 16]>::try_from(a), <&[u8; 16]>::try_from(b)) {
        (Ok(x), Ok(y)) => ticks_of(x).cmp(&ticks_of(y)).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}

pub(crate) fn ticks_of(bytes: &[u8; 16]) -> u64 {
    let time_low = u64::from(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]));
    let time_mid = u64::from(u16::from_be_bytes([bytes[4], bytes[5]]));
    let time_hi = u64::from(u16::from_be_bytes([bytes[6], bytes[7]]) & 0x0FFF);
    (time_hi << 48) | (time_mid << 32) | time_low
}

fn ticks_from_micros(micros: i64) -> u64 {
    let ticks = i128::from(micros) * 10 + i128::from(UUID_EPOCH_OFFSET);
    ticks.clamp(0, i128::from(MAX_TICKS)) as u64
}
