//! Logical values handled by the codecs.

use std::fmt;

use bytes::Bytes;
use uuid::Uuid;

/// An application-level key, column name or column value.
///
/// Which variants a column accepts is decided by its [`DataType`](crate::DataType).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Raw bytes.
    Bytes(Bytes),
    /// Text (ASCII or UTF-8).
    Text(String),
    /// 64-bit signed integer.
    Long(i64),
    /// 32-bit signed integer.
    Int(i32),
    /// Boolean.
    Boolean(bool),
    /// Milliseconds since the Unix epoch.
    Date(i64),
    /// A UUID of any version.
    Uuid(Uuid),
    /// Components of a composite name or value.
    Composite(Vec<Value>),
    /// Ordered list.
    List(Vec<Value>),
    /// Ordered key/value pairs.
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Builds a composite from its components.
    pub fn composite<I, V>(components: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Composite(components.into_iter().map(Into::into).collect())
    }

    /// Returns the text, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer, widening `Int` and reading `Date` as milliseconds.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Long(v) | Value::Date(v) => Some(*v),
            Value::Int(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// Returns the boolean, if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the UUID, if this is a UUID value.
    pub fn as_uuid(&self) -> Option<&Uuid> {
        match self {
            Value::Uuid(u) => Some(u),
            _ => None,
        }
    }

    /// Returns the raw bytes, if this is a bytes value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the components, if this is a composite value.
    pub fn as_components(&self) -> Option<&[Value]> {
        match self {
            Value::Composite(c) => Some(c),
            _ => None,
        }
    }

    /// Returns true for an empty text or bytes value.
    ///
    /// Empty names are never valid column names.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Bytes(b) => b.is_empty(),
            Value::Text(s) => s.is_empty(),
            Value::Composite(c) | Value::List(c) => c.is_empty(),
            Value::Map(m) => m.is_empty(),
            _ => false,
        }
    }

    /// Short variant name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bytes(_) => "bytes",
            Value::Text(_) => "text",
            Value::Long(_) => "long",
            Value::Int(_) => "int",
            Value::Boolean(_) => "boolean",
            Value::Date(_) => "date",
            Value::Uuid(_) => "uuid",
            Value::Composite(_) => "composite",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Text(s) => write!(f, "{}", s),
            Value::Long(v) | Value::Date(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Uuid(u) => write!(f, "{}", u),
            Value::Composite(c) => {
                write!(f, "(")?;
                for (i, v) in c.iter().enumerate() {
                    if i > 0 {
                        write!(f, ":")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, ")")
            }
            Value::List(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Map(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Value::Uuid(u)
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(Bytes::from(b))
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(Bytes::copy_from_slice(b))
    }
}

impl From<&Value> for Value {
    fn from(v: &Value) -> Self {
        v.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(Value::from("a"), Value::Text("a".to_string()));
        assert_eq!(Value::from(5i64).as_i64(), Some(5));
        assert_eq!(Value::from(5i32).as_i64(), Some(5));
        assert_eq!(Value::Date(7).as_i64(), Some(7));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(vec![1u8, 2]).as_bytes(), Some(&[1u8, 2][..]));
        assert!(Value::from("a").as_i64().is_none());
    }

    #[test]
    fn test_composite_builder() {
        let value = Value::composite([Value::Long(1), Value::from("a")]);
        assert_eq!(value.as_components().map(<[Value]>::len), Some(2));
        assert_eq!(value.to_string(), "(1:a)");
    }

    #[test]
    fn test_is_empty() {
        assert!(Value::from("").is_empty());
        assert!(Value::Bytes(Bytes::new()).is_empty());
        assert!(!Value::Long(0).is_empty());
        assert!(Value::Composite(vec![]).is_empty());
    }
}
