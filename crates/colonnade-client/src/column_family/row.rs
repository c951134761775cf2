//! Decoded rows and write inputs.

use std::time::{SystemTime, UNIX_EPOCH};

use colonnade_common::types::ConsistencyLevel;
use colonnade_marshal::Value;

/// A decoded column, counter or super column.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// A regular column.
    Column {
        /// Column name.
        name: Value,
        /// Column value.
        value: Value,
        /// Write timestamp in microseconds.
        timestamp: i64,
        /// Seconds to live, if set.
        ttl: Option<i32>,
    },
    /// A counter.
    Counter {
        /// Counter name.
        name: Value,
        /// Current count.
        value: i64,
    },
    /// A super column and its sub-columns or sub-counters.
    Super {
        /// Super column name.
        name: Value,
        /// Sub-columns in comparator order.
        columns: Vec<Cell>,
    },
}

impl Cell {
    /// Returns the name.
    pub fn name(&self) -> &Value {
        match self {
            Cell::Column { name, .. } | Cell::Counter { name, .. } | Cell::Super { name, .. } => {
                name
            }
        }
    }

    /// Returns the value of a regular column.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Cell::Column { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Returns the count of a counter.
    pub fn count(&self) -> Option<i64> {
        match self {
            Cell::Counter { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Returns the write timestamp of a regular column.
    pub fn timestamp(&self) -> Option<i64> {
        match self {
            Cell::Column { timestamp, .. } => Some(*timestamp),
            _ => None,
        }
    }

    /// Returns the sub-columns of a super column.
    pub fn columns(&self) -> &[Cell] {
        match self {
            Cell::Super { columns, .. } => columns,
            _ => &[],
        }
    }

    /// Finds a sub-column of a super column by name.
    pub fn get(&self, name: &Value) -> Option<&Cell> {
        self.columns().iter().find(|c| c.name() == name)
    }
}

/// One row as read from a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Row key.
    pub key: Value,
    /// Cells in comparator order.
    pub cells: Vec<Cell>,
}

impl Row {
    /// Creates a row.
    pub fn new(key: Value, cells: Vec<Cell>) -> Self {
        Self { key, cells }
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if the row has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Finds a cell by name.
    pub fn get(&self, name: impl Into<Value>) -> Option<&Cell> {
        let name = name.into();
        self.cells.iter().find(|c| *c.name() == name)
    }

    /// Returns the value of the named column.
    pub fn value(&self, name: impl Into<Value>) -> Option<&Value> {
        self.get(name).and_then(Cell::value)
    }

    /// Returns the count of the named counter.
    pub fn count(&self, name: impl Into<Value>) -> Option<i64> {
        self.get(name).and_then(Cell::count)
    }

    /// Cell names in order.
    pub fn names(&self) -> impl Iterator<Item = &Value> {
        self.cells.iter().map(Cell::name)
    }

    /// Iterates over the cells.
    pub fn iter(&self) -> std::slice::Iter<'_, Cell> {
        self.cells.iter()
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a Cell;
    type IntoIter = std::slice::Iter<'a, Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

/// Columns to write to one row.
///
/// The variant must match the table: flat columns for standard tables, super
/// columns for super tables.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnMap {
    /// Name and value pairs.
    Standard(Vec<(Value, Value)>),
    /// Super column names with their sub-columns.
    Super(Vec<(Value, Vec<(Value, Value)>)>),
}

impl ColumnMap {
    /// Builds a flat column map.
    pub fn standard<I, N, V>(columns: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<Value>,
        V: Into<Value>,
    {
        ColumnMap::Standard(
            columns
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        )
    }

    /// Builds a map holding one super column.
    pub fn super_column<S, I, N, V>(name: S, columns: I) -> Self
    where
        S: Into<Value>,
        I: IntoIterator<Item = (N, V)>,
        N: Into<Value>,
        V: Into<Value>,
    {
        ColumnMap::Super(Vec::new()).and_super_column(name, columns)
    }

    /// Adds a super column. No effect on a flat map.
    #[must_use]
    pub fn and_super_column<S, I, N, V>(mut self, name: S, columns: I) -> Self
    where
        S: Into<Value>,
        I: IntoIterator<Item = (N, V)>,
        N: Into<Value>,
        V: Into<Value>,
    {
        if let ColumnMap::Super(supers) = &mut self {
            supers.push((
                name.into(),
                columns
                    .into_iter()
                    .map(|(n, v)| (n.into(), v.into()))
                    .collect(),
            ));
        }
        self
    }

    /// Returns true for super column maps.
    pub fn is_super(&self) -> bool {
        matches!(self, ColumnMap::Super(_))
    }

    /// Returns true if nothing would be written.
    pub fn is_empty(&self) -> bool {
        match self {
            ColumnMap::Standard(columns) => columns.is_empty(),
            ColumnMap::Super(supers) => supers.iter().all(|(_, c)| c.is_empty()),
        }
    }
}

/// Per-write settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Timestamp in microseconds. Defaults to the current time.
    pub timestamp: Option<i64>,
    /// Seconds until the written columns expire.
    pub ttl: Option<i32>,
    /// Overrides the table's write consistency.
    pub consistency: Option<ConsistencyLevel>,
}

impl WriteOptions {
    /// Default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timestamp.
    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the time to live.
    pub fn ttl(mut self, seconds: i32) -> Self {
        self.ttl = Some(seconds);
        self
    }

    /// Sets the consistency level.
    pub fn consistency(mut self, level: ConsistencyLevel) -> Self {
        self.consistency = Some(level);
        self
    }

    /// The timestamp to write with.
    pub fn resolve_timestamp(&self) -> i64 {
        self.timestamp.unwrap_or_else(timestamp_micros)
    }
}

/// Microseconds since the Unix epoch.
pub fn timestamp_micros() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_micros()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
