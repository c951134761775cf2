//! Resolution of schema class names to [`DataType`]s.
//!
//! Schema metadata names types by their server-side class, optionally
//! parameterised:
//!
//! ```text
//! org.apache.cassandra.db.marshal.LongType
//! org.apache.cassandra.db.marshal.CompositeType(LongType,AsciiType)
//! ```
//!
//! Only the last dotted segment is significant. Names the registry does not
//! know resolve to [`DataType::Bytes`] so that a client can always read data,
//! even for types it cannot interpret.

use std::collections::HashMap;

use crate::types::DataType;

/// Maps short class names to data types.
///
/// Built once and handed to each table handle; there is no global registry.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: HashMap<String, DataType>,
}

impl TypeRegistry {
    /// Creates a registry that knows no types; everything resolves to bytes.
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Creates a registry with the store's built-in types.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for (name, ty) in [
            ("BytesType", DataType::Bytes),
            ("AsciiType", DataType::Ascii),
            ("UTF8Type", DataType::Utf8),
            ("LongType", DataType::Long),
            ("IntegerType", DataType::Integer),
            ("Int32Type", DataType::Integer),
            ("BooleanType", DataType::Boolean),
            ("DateType", DataType::Date),
            ("LexicalUUIDType", DataType::LexicalUuid),
            ("TimeUUIDType", DataType::TimeUuid),
            ("UUIDType", DataType::Uuid),
            ("CounterColumnType", DataType::Counter),
        ] {
            registry.register(name, ty);
        }
        registry
    }

    /// Adds or replaces a simple (unparameterised) type name.
    pub fn register(&mut self, name: impl Into<String>, ty: DataType) {
        self.types.insert(name.into(), ty);
    }

    /// Returns true if the short name is known.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(short_name(name))
    }

    /// Resolves a class name, falling back to [`DataType::Bytes`].
    pub fn resolve(&self, class_name: &str) -> DataType {
        let class_name = class_name.trim();
        if class_name.is_empty() {
            return DataType::Bytes;
        }

        let Some(open) = class_name.find('(') else {
            return self
                .types
                .get(short_name(class_name))
                .cloned()
                .unwrap_or_default();
        };

        let base = short_name(&class_name[..open]);
        let inner = class_name[open + 1..]
            .strip_suffix(')')
            .unwrap_or(&class_name[open + 1..]);
        let params: Vec<DataType> = split_params(inner)
            .into_iter()
            .map(|p| self.resolve(p))
            .collect();

        match (base, params.as_slice()) {
            ("CompositeType", [_, ..]) => DataType::Composite(params),
            ("ListType", [element]) => DataType::List(Box::new(element.clone())),
            ("MapType", [k, v]) => DataType::Map(Box::new(k.clone()), Box::new(v.clone())),
            _ => self.types.get(base).cloned().unwrap_or_default(),
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Last dotted segment of a class name.
fn short_name(class_name: &str) -> &str {
    let trimmed = class_name.trim();
    trimmed.rsplit('.').next().unwrap_or(trimmed)
}

/// Splits a parameter list on commas that are not nested in parentheses.
fn split_params(inner: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                params.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = inner[start..].trim();
    if !last.is_empty() {
        params.push(last);
    }
    params
}
