//! Schema metadata as reported by `describe_keyspace`.
//!
//! Type names are the store's class-name strings (for example
//! `org.apache.cassandra.db.marshal.LongType`); resolving them to codecs is the
//! job of the marshaling registry.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Whether a table holds flat columns or super columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColumnType {
    /// Flat columns.
    #[default]
    Standard,
    /// Two-level super columns.
    Super,
}

/// Kind of secondary index on a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexType {
    /// Key-based index.
    Keys,
}

/// Metadata for one declared column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Packed column name.
    pub name: Bytes,
    /// Validator class name for values of this column.
    pub validation_class: String,
    /// Secondary index, if any.
    pub index_type: Option<IndexType>,
    /// Secondary index name.
    pub index_name: Option<String>,
}

impl ColumnDef {
    /// Creates a column definition without an index.
    pub fn new(name: impl Into<Bytes>, validation_class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            validation_class: validation_class.into(),
            index_type: None,
            index_name: None,
        }
    }

    /// Adds a keys index to the column.
    #[must_use]
    pub fn indexed(mut self) -> Self {
        self.index_type = Some(IndexType::Keys);
        self
    }

    /// Returns true if the column carries a secondary index.
    pub fn is_indexed(&self) -> bool {
        self.index_type.is_some()
    }
}

/// Metadata for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfDef {
    /// Keyspace name.
    pub keyspace: String,
    /// Table name.
    pub name: String,
    /// Standard or super.
    pub column_type: ColumnType,
    /// Comparator for column names (super column names on super tables).
    pub comparator_type: String,
    /// Comparator for sub-column names on super tables.
    pub subcomparator_type: Option<String>,
    /// Validator applied to values without a column-specific validator.
    pub default_validation_class: String,
    /// Validator for row keys.
    pub key_validation_class: String,
    /// Declared columns.
    pub column_metadata: Vec<ColumnDef>,
}

impl CfDef {
    /// Creates a standard table with bytes types throughout.
    pub fn new(keyspace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            name: name.into(),
            column_type: ColumnType::Standard,
            comparator_type: "BytesType".to_string(),
            subcomparator_type: None,
            default_validation_class: "BytesType".to_string(),
            key_validation_class: "BytesType".to_string(),
            column_metadata: Vec::new(),
        }
    }

    /// Makes this a super table with the given sub-column comparator.
    #[must_use]
    pub fn super_family(mut self, subcomparator_type: impl Into<String>) -> Self {
        self.column_type = ColumnType::Super;
        self.subcomparator_type = Some(subcomparator_type.into());
        self
    }

    /// Sets the column-name comparator.
    #[must_use]
    pub fn comparator(mut self, comparator_type: impl Into<String>) -> Self {
        self.comparator_type = comparator_type.into();
        self
    }

    /// Sets the default value validator.
    #[must_use]
    pub fn default_validation(mut self, class: impl Into<String>) -> Self {
        self.default_validation_class = class.into();
        self
    }

    /// Sets the key validator.
    #[must_use]
    pub fn key_validation(mut self, class: impl Into<String>) -> Self {
        self.key_validation_class = class.into();
        self
    }

    /// Declares a column.
    #[must_use]
    pub fn column(mut self, def: ColumnDef) -> Self {
        self.column_metadata.push(def);
        self
    }

    /// Returns true if this is a super table.
    pub fn is_super(&self) -> bool {
        self.column_type == ColumnType::Super
    }

    /// Looks up a declared column by packed name.
    pub fn column_def(&self, name: &[u8]) -> Option<&ColumnDef> {
        self.column_metadata.iter().find(|c| c.name.as_ref() == name)
    }
}

/// Metadata for a keyspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KsDef {
    /// Keyspace name.
    pub name: String,
    /// Replica placement strategy class.
    pub strategy_class: String,
    /// Replication factor.
    pub replication_factor: u32,
    /// Tables in the keyspace.
    pub cf_defs: Vec<CfDef>,
}

impl KsDef {
    /// Creates an empty keyspace definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strategy_class: "SimpleStrategy".to_string(),
            replication_factor: 1,
            cf_defs: Vec::new(),
        }
    }

    /// Adds a table; its keyspace field is set to this keyspace.
    #[must_use]
    pub fn with_column_family(mut self, mut cf_def: CfDef) -> Self {
        cf_def.keyspace = self.name.clone();
        self.cf_defs.push(cf_def);
        self
    }

    /// Looks up a table by name.
    pub fn column_family(&self, name: &str) -> Option<&CfDef> {
        self.cf_defs.iter().find(|cf| cf.name == name)
    }
}
