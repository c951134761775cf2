//! Table metadata frozen at open time.

use std::collections::HashMap;

use bytes::Bytes;
use colonnade_common::types::CfDef;
use colonnade_marshal::{DataType, TypeRegistry};

use super::ColumnFamilyOptions;

/// Shape of a table, fixed when the table is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// Flat columns.
    Standard,
    /// Columns grouped under super columns.
    Super,
    /// Flat counters.
    Counter,
    /// Counters grouped under super columns.
    SuperCounter,
}

impl TableKind {
    /// Derives the kind from a table definition and its resolved validator.
    pub fn of(def: &CfDef, default_validator: &DataType) -> Self {
        match (def.is_super(), default_validator.is_counter()) {
            (false, false) => TableKind::Standard,
            (true, false) => TableKind::Super,
            (false, true) => TableKind::Counter,
            (true, true) => TableKind::SuperCounter,
        }
    }

    /// Returns true for tables with super columns.
    pub fn is_super(self) -> bool {
        matches!(self, TableKind::Super | TableKind::SuperCounter)
    }

    /// Returns true for counter tables.
    pub fn is_counter(self) -> bool {
        matches!(self, TableKind::Counter | TableKind::SuperCounter)
    }
}

/// Codecs for one table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnFamilySchema {
    /// Table name.
    pub name: String,
    /// Table shape.
    pub kind: TableKind,
    /// Row key type.
    pub key_type: DataType,
    /// Type of leaf column names (sub-column names on super tables).
    pub column_name_type: DataType,
    /// Type of super column names, on super tables.
    pub super_column_name_type: Option<DataType>,
    /// Validator for values without a declared column.
    pub default_validator: DataType,
    /// Validators of declared columns, by packed name.
    pub validators: HashMap<Bytes, DataType>,
}

impl ColumnFamilySchema {
    /// Resolves every type named by `def`.
    ///
    /// Types whose autopack flag is off are treated as raw bytes.
    pub fn new(def: &CfDef, registry: &TypeRegistry, options: &ColumnFamilyOptions) -> Self {
        let resolve = |class: &str, autopack: bool| {
            if autopack {
                registry.resolve(class)
            } else {
                DataType::Bytes
            }
        };

        // The counter validator decides the table kind even with autopacking off.
        let real_validator = registry.resolve(&def.default_validation_class);
        let kind = TableKind::of(def, &real_validator);

        let comparator = resolve(&def.comparator_type, options.autopack_names);
        let (column_name_type, super_column_name_type) = if kind.is_super() {
            let sub = resolve(
                def.subcomparator_type.as_deref().unwrap_or_default(),
                options.autopack_names,
            );
            (sub, Some(comparator))
        } else {
            (comparator, None)
        };

        let default_validator = if kind.is_counter() {
            DataType::Counter
        } else {
            resolve(&def.default_validation_class, options.autopack_values)
        };
        let validators = def
            .column_metadata
            .iter()
            .map(|c| {
                (
                    c.name.clone(),
                    resolve(&c.validation_class, options.autopack_values),
                )
            })
            .collect();

        Self {
            name: def.name.clone(),
            kind,
            key_type: resolve(&def.key_validation_class, options.autopack_keys),
            column_name_type,
            super_column_name_type,
            default_validator,
            validators,
        }
    }

    /// Validator for the value of the column with this packed name.
    pub fn validator(&self, packed_name: &[u8]) -> &DataType {
        self.validators
            .get(packed_name)
            .unwrap_or(&self.default_validator)
    }

    /// Type of the names a slice selects: super column names when reading
    /// a whole super row, leaf column names otherwise.
    pub fn slice_name_type(&self, in_super_column: bool) -> &DataType {
        match &self.super_column_name_type {
            Some(super_type) if !in_super_column => super_type,
            _ => &self.column_name_type,
        }
    }
}
