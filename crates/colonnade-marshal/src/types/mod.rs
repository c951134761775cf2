//! Comparator and validator types.
//!
//! [`DataType`] is the closed set of encodings the store understands. It is
//! chosen once per key, column name and value slot from schema metadata, and
//! every encode, decode and ordering goes through the [`TypeCodec`] trait.

mod collection;
pub mod composite;
pub mod primitive;
mod reader;

use std::cmp::Ordering;
use std::fmt;

use bytes::Bytes;

use crate::error::MarshalResult;
use crate::time_uuid;
use crate::value::Value;

/// Which end of a column slice is being packed.
///
/// `Start` is the lower bound and `Finish` the upper bound in comparator
/// order, regardless of the direction the slice is read in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SliceEnd {
    /// Not a slice bound.
    #[default]
    None,
    /// Lower bound.
    Start {
        /// Whether names equal to the bound are included.
        inclusive: bool,
    },
    /// Upper bound.
    Finish {
        /// Whether names equal to the bound are included.
        inclusive: bool,
    },
}

/// Where a packed value will be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PackContext {
    /// Packing a column or super column name rather than a key or value.
    pub is_name: bool,
    /// Slice bound being packed, if any. Only meaningful for names.
    pub slice: SliceEnd,
}

impl PackContext {
    /// Context for keys and column values.
    pub const fn value() -> Self {
        Self {
            is_name: false,
            slice: SliceEnd::None,
        }
    }

    /// Context for exact column names.
    pub const fn name() -> Self {
        Self {
            is_name: true,
            slice: SliceEnd::None,
        }
    }

    /// Marks the packed value as a slice bound.
    #[must_use]
    pub const fn slice(mut self, slice: SliceEnd) -> Self {
        self.slice = slice;
        self
    }
}

/// Encode, decode and order values of one type.
pub trait TypeCodec {
    /// Encodes a logical value.
    fn pack(&self, value: &Value, ctx: PackContext) -> MarshalResult<Bytes>;

    /// Decodes bytes produced by [`pack`](TypeCodec::pack).
    fn unpack(&self, data: &[u8]) -> MarshalResult<Value>;

    /// Orders two encoded values the way the store sorts them.
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering;
}

/// A comparator or validator type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum DataType {
    /// Opaque bytes.
    #[default]
    Bytes,
    /// 7-bit ASCII text.
    Ascii,
    /// UTF-8 text.
    Utf8,
    /// 64-bit signed integer.
    Long,
    /// 32-bit signed integer.
    Integer,
    /// Single-byte boolean.
    Boolean,
    /// Milliseconds since the Unix epoch, stored as a long.
    Date,
    /// UUID ordered by its bytes.
    LexicalUuid,
    /// Version 1 UUID ordered by its timestamp.
    TimeUuid,
    /// Any UUID, ordered by version and then by time or bytes.
    Uuid,
    /// Counter column value (a long on the wire).
    Counter,
    /// Multi-component name.
    Composite(Vec<DataType>),
    /// List of elements of one type.
    List(Box<DataType>),
    /// Map with typed keys and values.
    Map(Box<DataType>, Box<DataType>),
}

impl DataType {
    /// Short class name, without the package prefix.
    pub fn class_name(&self) -> String {
        match self {
            DataType::Bytes => "BytesType".to_string(),
            DataType::Ascii => "AsciiType".to_string(),
            DataType::Utf8 => "UTF8Type".to_string(),
            DataType::Long => "LongType".to_string(),
            DataType::Integer => "IntegerType".to_string(),
            DataType::Boolean => "BooleanType".to_string(),
            DataType::Date => "DateType".to_string(),
            DataType::LexicalUuid => "LexicalUUIDType".to_string(),
            DataType::TimeUuid => "TimeUUIDType".to_string(),
            DataType::Uuid => "UUIDType".to_string(),
            DataType::Counter => "CounterColumnType".to_string(),
            DataType::Composite(types) => {
                let inner: Vec<String> = types.iter().map(DataType::class_name).collect();
                format!("CompositeType({})", inner.join(","))
            }
            DataType::List(element) => format!("ListType({})", element.class_name()),
            DataType::Map(k, v) => format!("MapType({},{})", k.class_name(), v.class_name()),
        }
    }

    /// Returns true for multi-component names.
    pub fn is_composite(&self) -> bool {
        matches!(self, DataType::Composite(_))
    }

    /// Returns true for the counter validator.
    pub fn is_counter(&self) -> bool {
        matches!(self, DataType::Counter)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.class_name())
    }
}

impl TypeCodec for DataType {
    fn pack(&self, value: &Value, ctx: PackContext) -> MarshalResult<Bytes> {
        match self {
            DataType::Bytes => primitive::bytes_to_bytes(value),
            DataType::Ascii => primitive::ascii_to_bytes(value),
            DataType::Utf8 => primitive::utf8_to_bytes(value),
            DataType::Long => primitive::long_to_bytes("LongType", value),
            DataType::Counter => primitive::long_to_bytes("CounterColumnType", value),
            DataType::Integer => primitive::int_to_bytes(value),
            DataType::Boolean => primitive::bool_to_bytes(value),
            DataType::Date => primitive::date_to_bytes(value),
            DataType::LexicalUuid => primitive::uuid_to_bytes("LexicalUUIDType", value),
            DataType::Uuid => primitive::uuid_to_bytes("UUIDType", value),
            DataType::TimeUuid => primitive::time_uuid_to_bytes(value, ctx),
            DataType::Composite(types) => composite::pack(types, value, ctx),
            DataType::List(element) => collection::pack_list(element, value),
            DataType::Map(k, v) => collection::pack_map(k, v, value),
        }
    }

    fn unpack(&self, data: &[u8]) -> MarshalResult<Value> {
        match self {
            DataType::Bytes => Ok(Value::Bytes(Bytes::copy_from_slice(data))),
            DataType::Ascii => primitive::ascii_from_bytes(data),
            DataType::Utf8 => primitive::utf8_from_bytes(data),
            DataType::Long => {
                primitive::fixed::<8>("LongType", data).map(|raw| Value::Long(primitive::unpack_long(raw)))
            }
            DataType::Counter => primitive::fixed::<8>("CounterColumnType", data)
                .map(|raw| Value::Long(primitive::unpack_long(raw))),
            DataType::Date => {
                primitive::fixed::<8>("DateType", data).map(|raw| Value::Date(primitive::unpack_long(raw)))
            }
            DataType::Integer => primitive::int_from_bytes(data),
            DataType::Boolean => primitive::bool_from_bytes(data),
            DataType::LexicalUuid => primitive::uuid_from_bytes("LexicalUUIDType", data),
            DataType::TimeUuid => primitive::uuid_from_bytes("TimeUUIDType", data),
            DataType::Uuid => primitive::uuid_from_bytes("UUIDType", data),
            DataType::Composite(types) => composite::unpack(types, data),
            DataType::List(element) => collection::unpack_list(element, data),
            DataType::Map(k, v) => collection::unpack_map(k, v, data),
        }
    }

    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        match self {
            DataType::Long | DataType::Counter | DataType::Date => {
                primitive::compare_signed(a, b, 8)
            }
            DataType::TimeUuid => time_uuid::compare(a, b),
            DataType::Uuid => primitive::compare_uuid(a, b),
            DataType::Composite(types) => composite::compare(types, a, b),
            DataType::Bytes
            | DataType::Ascii
            | DataType::Utf8
            | DataType::Integer
            | DataType::Boolean
            | DataType::LexicalUuid
            | DataType::List(_)
            | DataType::Map(..) => a.cmp(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn roundtrip(ty: &DataType, value: Value) {
        let packed = ty.pack(&value, PackContext::value()).unwrap();
        assert_eq!(ty.unpack(&packed).unwrap(), value, "{}", ty);
    }

    #[test]
    fn test_representative_roundtrips() {
        roundtrip(&DataType::Bytes, Value::from(vec![0u8, 1, 255]));
        roundtrip(&DataType::Ascii, Value::from("hello"));
        roundtrip(&DataType::Utf8, Value::from("h\u{e9}llo \u{1F600}"));
        roundtrip(&DataType::Long, Value::Long(-1));
        roundtrip(&DataType::Long, Value::Long(i64::MIN));
        roundtrip(&DataType::Integer, Value::Long(0));
        roundtrip(&DataType::Integer, Value::Long(i64::from(u32::MAX)));
        roundtrip(&DataType::Boolean, Value::Boolean(true));
        roundtrip(&DataType::Date, Value::Date(1_300_000_000_123));
        roundtrip(&DataType::LexicalUuid, Value::Uuid(Uuid::from_u128(42)));
        roundtrip(
            &DataType::TimeUuid,
            Value::Uuid(time_uuid::from_micros(5, 7, [1; 6])),
        );
        roundtrip(&DataType::Counter, Value::Long(12));
        roundtrip(
            &DataType::Composite(vec![DataType::Long, DataType::Ascii, DataType::Long]),
            Value::composite([Value::Long(-3), Value::from("x"), Value::Long(9)]),
        );
        roundtrip(
            &DataType::List(Box::new(DataType::Integer)),
            Value::List(vec![Value::Long(1), Value::Long(4_294_967_295)]),
        );
    }

    #[test]
    fn test_long_minus_one() {
        let packed = DataType::Long.pack(&Value::Long(-1), PackContext::value()).unwrap();
        assert_eq!(packed.as_ref(), &[0xFF; 8]);
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        assert!(DataType::Long.pack(&Value::from("x"), PackContext::value()).is_err());
        assert!(DataType::Boolean.pack(&Value::Int(1), PackContext::value()).is_err());
        assert!(DataType::Long.unpack(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_class_names() {
        let ty = DataType::Composite(vec![
            DataType::Long,
            DataType::Map(Box::new(DataType::Ascii), Box::new(DataType::Utf8)),
        ]);
        assert_eq!(
            ty.class_name(),
            "CompositeType(LongType,MapType(AsciiType,UTF8Type))"
        );
    }

    #[test]
    fn test_long_compare_is_signed() {
        let ty = DataType::Long;
        let a = ty.pack(&Value::Long(-10), PackContext::value()).unwrap();
        let b = ty.pack(&Value::Long(10), PackContext::value()).unwrap();
        assert_eq!(ty.compare(&a, &b), Ordering::Less);
    }

    proptest! {
        #[test]
        fn prop_long_roundtrip(v in any::<i64>()) {
            let packed = DataType::Long.pack(&Value::Long(v), PackContext::value()).unwrap();
            prop_assert_eq!(packed.len(), 8);
            prop_assert_eq!(DataType::Long.unpack(&packed).unwrap(), Value::Long(v));
        }

        #[test]
        fn prop_long_order_matches_bytes_compare(a in any::<i64>(), b in any::<i64>()) {
            let pa = DataType::Long.pack(&Value::Long(a), PackContext::value()).unwrap();
            let pb = DataType::Long.pack(&Value::Long(b), PackContext::value()).unwrap();
            prop_assert_eq!(DataType::Long.compare(&pa, &pb), a.cmp(&b));
        }

        #[test]
        fn prop_int_roundtrip(v in 0..=i64::from(u32::MAX)) {
            let packed = DataType::Integer.pack(&Value::Long(v), PackContext::value()).unwrap();
            prop_assert_eq!(packed.len(), 4);
            prop_assert_eq!(DataType::Integer.unpack(&packed).unwrap(), Value::Long(v));
        }

        #[test]
        fn prop_int_rejects_out_of_range(v in prop_oneof![i64::MIN..0, (1i64 << 32)..=i64::MAX]) {
            prop_assert!(DataType::Integer.pack(&Value::Long(v), PackContext::value()).is_err());
        }

        #[test]
        fn prop_int_order_is_unsigned(a in 0..=i64::from(u32::MAX), b in 0..=i64::from(u32::MAX)) {
            let pa = DataType::Integer.pack(&Value::Long(a), PackContext::value()).unwrap();
            let pb = DataType::Integer.pack(&Value::Long(b), PackContext::value()).unwrap();
            prop_assert_eq!(DataType::Integer.compare(&pa, &pb), a.cmp(&b));
        }

        #[test]
        fn prop_utf8_roundtrip(s in ".*") {
            let packed = DataType::Utf8.pack(&Value::Text(s.clone()), PackContext::value()).unwrap();
            prop_assert_eq!(DataType::Utf8.unpack(&packed).unwrap(), Value::Text(s));
        }

        #[test]
        fn prop_composite_roundtrip(n in any::<i64>(), s in "[a-z]{0,20}", m in 0..=i64::from(u32::MAX)) {
            let ty = DataType::Composite(vec![DataType::Long, DataType::Ascii, DataType::Integer]);
            let value = Value::composite([Value::Long(n), Value::Text(s), Value::Long(m)]);
            let packed = ty.pack(&value, PackContext::name()).unwrap();
            prop_assert_eq!(ty.unpack(&packed).unwrap(), value);
        }

        #[test]
        fn prop_composite_order_follows_components(a in any::<i64>(), b in any::<i64>()) {
            let ty = DataType::Composite(vec![DataType::Long, DataType::Ascii]);
            let pa = ty.pack(&Value::composite([Value::Long(a), Value::from("k")]), PackContext::name()).unwrap();
            let pb = ty.pack(&Value::composite([Value::Long(b), Value::from("k")]), PackContext::name()).unwrap();
            prop_assert_eq!(ty.compare(&pa, &pb), a.cmp(&b));
        }
    }
}
