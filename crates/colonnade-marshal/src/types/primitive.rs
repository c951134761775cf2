//! Fixed-width and text encodings.

use std::cmp::Ordering;

use bytes::Bytes;
use uuid::Uuid;

use super::{PackContext, SliceEnd};
use crate::error::{MarshalError, MarshalResult};
use crate::time_uuid;
use crate::value::Value;

// =============================================================================
// 64-bit integers
// =============================================================================

/// Encodes a signed 64-bit integer as two big-endian 32-bit words.
pub fn pack_long(value: i64) -> [u8; 8] {
    let hi = (value >> 32) as u32;
    let lo = value as u32;
    let mut out = [0u8; 8];
    out[..4].copy_from_slice(&hi.to_be_bytes());
    out[4..].copy_from_slice(&lo.to_be_bytes());
    out
}

/// Decodes two big-endian 32-bit words into a signed 64-bit integer.
pub fn unpack_long(data: &[u8; 8]) -> i64 {
    let hi = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
    let lo = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
    (i64::from(hi as i32) << 32) | i64::from(lo)
}

pub(super) fn long_to_bytes(type_name: &str, value: &Value) -> MarshalResult<Bytes> {
    let v = match value {
        Value::Long(v) => *v,
        Value::Int(v) => i64::from(*v),
        other => return Err(mismatch(type_name, other)),
    };
    Ok(Bytes::copy_from_slice(&pack_long(v)))
}

pub(super) fn date_to_bytes(value: &Value) -> MarshalResult<Bytes> {
    match value {
        Value::Date(ms) | Value::Long(ms) => Ok(Bytes::copy_from_slice(&pack_long(*ms))),
        other => Err(mismatch("DateType", other)),
    }
}

pub(super) fn fixed<'a, const N: usize>(type_name: &str, data: &'a [u8]) -> MarshalResult<&'a [u8; N]> {
    <&[u8; N]>::try_from(data).map_err(|_| MarshalError::Truncated {
        type_name: type_name.to_string(),
        expected: N,
        actual: data.len(),
    })
}

// =============================================================================
// 32-bit integers
// =============================================================================

/// Packs an unsigned 32-bit value. The canonical form is a `Long` in
/// `0..=u32::MAX`, which is also what unpacking yields.
pub(super) fn int_to_bytes(value: &Value) -> MarshalResult<Bytes> {
    let bits = match value {
        Value::Long(v) => u32::try_from(*v).map_err(|_| {
            MarshalError::invalid_value(
                "IntegerType",
                format!("{} does not fit in 32 unsigned bits", v),
            )
        })?,
        other => return Err(mismatch("IntegerType", other)),
    };
    Ok(Bytes::copy_from_slice(&bits.to_be_bytes()))
}

pub(super) fn int_from_bytes(data: &[u8]) -> MarshalResult<Value> {
    let raw = fixed::<4>("IntegerType", data)?;
    Ok(Value::Long(i64::from(u32::from_be_bytes(*raw))))
}

// =============================================================================
// Booleans
// =============================================================================

pub(super) fn bool_to_bytes(value: &Value) -> MarshalResult<Bytes> {
    match value {
        Value::Boolean(b) => Ok(Bytes::copy_from_slice(&[u8::from(*b)])),
        other => Err(mismatch("BooleanType", other)),
    }
}

pub(super) fn bool_from_bytes(data: &[u8]) -> MarshalResult<Value> {
    let raw = fixed::<1>("BooleanType", data)?;
    Ok(Value::Boolean(raw[0] != 0))
}

// =============================================================================
// Text
// =============================================================================

pub(super) fn ascii_to_bytes(value: &Value) -> MarshalResult<Bytes> {
    let text = text_of("AsciiType", value)?;
    if !text.is_ascii() {
        return Err(MarshalError::invalid_value(
            "AsciiType",
            "contains non-ASCII characters",
        ));
    }
    Ok(Bytes::copy_from_slice(text.as_bytes()))
}

pub(super) fn ascii_from_bytes(data: &[u8]) -> MarshalResult<Value> {
    if !data.is_ascii() {
        return Err(MarshalError::invalid_encoding(
            "AsciiType",
            "contains bytes above 0x7F",
        ));
    }
    utf8_from_bytes(data)
}

pub(super) fn utf8_to_bytes(value: &Value) -> MarshalResult<Bytes> {
    let text = text_of("UTF8Type", value)?;
    Ok(Bytes::copy_from_slice(text.as_bytes()))
}

pub(super) fn utf8_from_bytes(data: &[u8]) -> MarshalResult<Value> {
    std::str::from_utf8(data)
        .map(|s| Value::Text(s.to_string()))
        .map_err(|e| MarshalError::invalid_encoding("UTF8Type", e.to_string()))
}

fn text_of<'a>(type_name: &str, value: &'a Value) -> MarshalResult<&'a str> {
    match value {
        Value::Text(s) => Ok(s),
        Value::Bytes(b) => std::str::from_utf8(b)
            .map_err(|e| MarshalError::invalid_value(type_name, e.to_string())),
        other => Err(mismatch(type_name, other)),
    }
}

pub(super) fn bytes_to_bytes(value: &Value) -> MarshalResult<Bytes> {
    match value {
        Value::Bytes(b) => Ok(b.clone()),
        Value::Text(s) => Ok(Bytes::copy_from_slice(s.as_bytes())),
        other => Err(mismatch("BytesType", other)),
    }
}

// =============================================================================
// UUIDs
// =============================================================================

pub(super) fn uuid_to_bytes(type_name: &str, value: &Value) -> MarshalResult<Bytes> {
    let uuid = uuid_of(type_name, value)?;
    Ok(Bytes::copy_from_slice(uuid.as_bytes()))
}

/// Packs a TimeUUID, turning a time bound into the extreme UUID for that
/// instant when packing a slice end.
pub(super) fn time_uuid_to_bytes(value: &Value, ctx: PackContext) -> MarshalResult<Bytes> {
    let micros = match value {
        Value::Long(micros) => Some(*micros),
        Value::Date(ms) => Some(ms.saturating_mul(1000)),
        _ => None,
    };
    if let Some(micros) = micros {
        let uuid = match (ctx.is_name, ctx.slice) {
            (true, SliceEnd::Start { .. }) => time_uuid::lowest_for_micros(micros),
            (true, SliceEnd::Finish { .. }) => time_uuid::highest_for_micros(micros),
            _ => {
                return Err(MarshalError::invalid_value(
                    "TimeUUIDType",
                    "a timestamp is only accepted as a slice bound",
                ))
            }
        };
        return Ok(Bytes::copy_from_slice(uuid.as_bytes()));
    }

    let uuid = uuid_of("TimeUUIDType", value)?;
    if uuid.get_version_num() != 1 {
        return Err(MarshalError::invalid_value(
            "TimeUUIDType",
            format!("expected a version 1 UUID, got version {}", uuid.get_version_num()),
        ));
    }
    Ok(Bytes::copy_from_slice(uuid.as_bytes()))
}

pub(super) fn uuid_from_bytes(type_name: &str, data: &[u8]) -> MarshalResult<Value> {
    let raw = fixed::<16>(type_name, data)?;
    Ok(Value::Uuid(Uuid::from_bytes(*raw)))
}

fn uuid_of(type_name: &str, value: &Value) -> MarshalResult<Uuid> {
    match value {
        Value::Uuid(u) => Ok(*u),
        Value::Text(s) => {
            Uuid::parse_str(s).map_err(|e| MarshalError::invalid_value(type_name, e.to_string()))
        }
        Value::Bytes(b) => Uuid::from_slice(b)
            .map_err(|e| MarshalError::invalid_value(type_name, e.to_string())),
        other => Err(mismatch(type_name, other)),
    }
}

/// Generic UUID ordering: version first, then time for version 1, then bytes.
pub(super) fn compare_uuid(a: &[u8], b: &[u8]) -> Ordering {
    match (<&[u8; 16]>::try_from(a), <&[u8; 16]>::try_from(b)) {
        (Ok(x), Ok(y)) => {
            let (va, vb) = (x[6] >> 4, y[6] >> 4);
            if va != vb {
                return va.cmp(&vb);
            }
            if va == 1 {
                return time_uuid::compare(a, b);
            }
            a.cmp(b)
        }
        _ => a.cmp(b),
    }
}

// =============================================================================
// Ordering helpers
// =============================================================================

/// Orders two big-endian signed integers of the same width.
pub(super) fn compare_signed(a: &[u8], b: &[u8], width: usize) -> Ordering {
    if a.is_empty() || b.is_empty() || a.len() != width || b.len() != width {
        return a.len().cmp(&b.len()).then_with(|| a.cmp(b));
    }
    // Flip the sign bit so unsigned byte order matches signed order.
    let (sa, sb) = (a[0] ^ 0x80, b[0] ^ 0x80);
    sa.cmp(&sb).then_with(|| a[1..].cmp(&b[1..]))
}

fn mismatch(type_name: &str, value: &Value) -> MarshalError {
    MarshalError::invalid_value(type_name, format!("unexpected {} value", value.kind()))
}
