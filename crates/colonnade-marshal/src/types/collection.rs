//! Length-prefixed list and map values.
//!
//! Layout: `[u16 count]` followed by `[u16 length][element]` for every element
//! (for maps, key then value per entry).

use bytes::{BufMut, Bytes, BytesMut};

use super::reader::Reader;
use super::{DataType, PackContext, TypeCodec};
use crate::error::{MarshalError, MarshalResult};
use crate::value::Value;

pub(super) fn pack_list(element: &DataType, value: &Value) -> MarshalResult<Bytes> {
    let items = match value {
        Value::List(items) => items,
        other => {
            return Err(MarshalError::invalid_value(
                "ListType",
                format!("expected a list, got {}", other.kind()),
            ))
        }
    };
    let mut out = BytesMut::new();
    out.put_u16(count("ListType", items.len())?);
    for item in items {
        put_element(&mut out, "ListType", element.pack(item, PackContext::value())?)?;
    }
    Ok(out.freeze())
}

pub(super) fn unpack_list(element: &DataType, data: &[u8]) -> MarshalResult<Value> {
    let mut reader = Reader::new(data, "ListType");
    let n = reader.read_u16()? as usize;
    let mut items = Vec::with_capacity(n);
    for _ in 0..n {
        items.push(element.unpack(reader.read_short_bytes()?)?);
    }
    trailing("ListType", &reader)?;
    Ok(Value::List(items))
}

pub(super) fn pack_map(key: &DataType, val: &DataType, value: &Value) -> MarshalResult<Bytes> {
    let pairs = match value {
        Value::Map(pairs) => pairs,
        other => {
            return Err(MarshalError::invalid_value(
                "MapType",
                format!("expected a map, got {}", other.kind()),
            ))
        }
    };
    let mut out = BytesMut::new();
    out.put_u16(count("MapType", pairs.len())?);
    for (k, v) in pairs {
        put_element(&mut out, "MapType", key.pack(k, PackContext::value())?)?;
        put_element(&mut out, "MapType", val.pack(v, PackContext::value())?)?;
    }
    Ok(out.freeze())
}

pub(super) fn unpack_map(key: &DataType, val: &DataType, data: &[u8]) -> MarshalResult<Value> {
    let mut reader = Reader::new(data, "MapType");
    let n = reader.read_u16()? as usize;
    let mut pairs = Vec::with_capacity(n);
    for _ in 0..n {
        let k = key.unpack(reader.read_short_bytes()?)?;
        let v = val.unpack(reader.read_short_bytes()?)?;
        pairs.push((k, v));
    }
    trailing("MapType", &reader)?;
    Ok(Value::Map(pairs))
}

fn count(type_name: &str, n: usize) -> MarshalResult<u16> {
    u16::try_from(n).map_err(|_| {
        MarshalError::invalid_value(type_name, format!("{} elements exceed the u16 count", n))
    })
}

fn put_element(out: &mut BytesMut, type_name: &str, packed: Bytes) -> MarshalResult<()> {
    let len = u16::try_from(packed.len()).map_err(|_| {
        MarshalError::invalid_value(type_name, format!("element is {} bytes long", packed.len()))
    })?;
    out.put_u16(len);
    out.put_slice(&packed);
    Ok(())
}

fn trailing(type_name: &str, reader: &Reader<'_>) -> MarshalResult<()> {
    if reader.is_empty() {
        Ok(())
    } else {
        Err(MarshalError::invalid_encoding(
            type_name,
            format!("{} trailing bytes", reader.remaining()),
        ))
    }
}
