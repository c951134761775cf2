//! Composite (multi-component) names.
//!
//! Each component is written as `[u16 length][bytes][end-of-component]`. The
//! end-of-component byte is `0x00` for exact names. For slice bounds the last
//! component carries a marker that places the bound before or after every
//! longer name sharing the prefix.

use std::cmp::Ordering;

use bytes::{BufMut, Bytes, BytesMut};
use colonnade_common::constants::{EOC_EXACT, EOC_GREATER, EOC_LESS};

use super::reader::Reader;
use super::{DataType, PackContext, SliceEnd, TypeCodec};
use crate::error::{MarshalError, MarshalResult};
use crate::value::Value;

const TYPE_NAME: &str = "CompositeType";

/// End-of-component byte for the last component of a packed name.
pub fn end_of_component(ctx: PackContext) -> u8 {
    if !ctx.is_name {
        return EOC_EXACT;
    }
    match ctx.slice {
        SliceEnd::None => EOC_EXACT,
        SliceEnd::Start { inclusive: true } | SliceEnd::Finish { inclusive: false } => EOC_LESS,
        SliceEnd::Start { inclusive: false } | SliceEnd::Finish { inclusive: true } => EOC_GREATER,
    }
}

pub(super) fn pack(types: &[DataType], value: &Value, ctx: PackContext) -> MarshalResult<Bytes> {
    let components = match value {
        Value::Composite(c) => c.as_slice(),
        other => {
            return Err(MarshalError::invalid_value(
                TYPE_NAME,
                format!("expected a composite, got {}", other.kind()),
            ))
        }
    };

    if components.is_empty() {
        if ctx.is_name && ctx.slice != SliceEnd::None {
            // An empty bound leaves that end of the slice open.
            return Ok(Bytes::new());
        }
        return Err(MarshalError::invalid_value(TYPE_NAME, "no components"));
    }
    if components.len() > types.len() {
        return Err(MarshalError::invalid_value(
            TYPE_NAME,
            format!(
                "{} components given for {} declared types",
                components.len(),
                types.len()
            ),
        ));
    }

    let last = components.len() - 1;
    let mut out = BytesMut::new();
    for (i, (component, ty)) in components.iter().zip(types).enumerate() {
        // Only the final component of a bound is packed as a bound.
        let inner = if i == last {
            ctx
        } else {
            PackContext::name()
        };
        let packed = ty.pack(component, inner)?;
        let len = u16::try_from(packed.len()).map_err(|_| {
            MarshalError::invalid_value(
                TYPE_NAME,
                format!("component {} is {} bytes long", i, packed.len()),
            )
        })?;
        out.put_u16(len);
        out.put_slice(&packed);
        out.put_u8(if i == last {
            end_of_component(ctx)
        } else {
            EOC_EXACT
        });
    }
    Ok(out.freeze())
}

pub(super) fn unpack(types: &[DataType], data: &[u8]) -> MarshalResult<Value> {
    let mut reader = Reader::new(data, TYPE_NAME);
    let mut components = Vec::with_capacity(types.len());
    while !reader.is_empty() {
        let ty = types.get(components.len()).ok_or_else(|| {
            MarshalError::invalid_encoding(
                TYPE_NAME,
                format!("more than {} components", types.len()),
            )
        })?;
        let bytes = reader.read_short_bytes()?;
        reader.read_u8()?;
        components.push(ty.unpack(bytes)?);
    }
    Ok(Value::Composite(components))
}

/// Orders two packed composites component by component.
///
/// A signed end-of-component byte decides ties between a bound and the names
/// it prefixes: negative sorts before, positive after.
pub(super) fn compare(types: &[DataType], a: &[u8], b: &[u8]) -> Ordering {
    if a.is_empty() || b.is_empty() {
        return (!a.is_empty()).cmp(&!b.is_empty());
    }

    let mut ra = Reader::new(a, TYPE_NAME);
    let mut rb = Reader::new(b, TYPE_NAME);
    let mut i = 0;
    while !ra.is_empty() && !rb.is_empty() {
        let (ca, ea, cb, eb) = match (component(&mut ra), component(&mut rb)) {
            (Some((ca, ea)), Some((cb, eb))) => (ca, ea, cb, eb),
            _ => return a.cmp(b),
        };
        let ordering = match types.get(i) {
            Some(ty) => ty.compare(ca, cb),
            None => ca.cmp(cb),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }

        let (ea, eb) = (ea as i8, eb as i8);
        if ea < 0 {
            if eb >= 0 {
                return Ordering::Less;
            }
        } else if ea > 0 {
            if eb <= 0 {
                return Ordering::Greater;
            }
        } else if eb != 0 {
            return 0i8.cmp(&eb);
        }
        i += 1;
    }

    match (ra.is_empty(), rb.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        _ => Ordering::Greater,
    }
}

fn component<'a>(reader: &mut Reader<'a>) -> Option<(&'a [u8], u8)> {
    let bytes = reader.read_short_bytes().ok()?;
    let eoc = reader.read_u8().ok()?;
    Some((bytes, eoc))
}
