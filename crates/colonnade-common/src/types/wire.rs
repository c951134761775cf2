//! Structures crossing the RPC boundary.

use std::collections::BTreeMap;

use bytes::Bytes;

/// Names the table (and optionally the super column) an operation targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnParent {
    /// Table name.
    pub column_family: String,
    /// Packed super column name, for operations on sub-columns.
    pub super_column: Option<Bytes>,
}

impl ColumnParent {
    /// Creates a parent for a whole table.
    pub fn new(column_family: impl Into<String>) -> Self {
        Self {
            column_family: column_family.into(),
            super_column: None,
        }
    }

    /// Narrows the parent to one super column.
    #[must_use]
    pub fn with_super_column(mut self, super_column: Bytes) -> Self {
        self.super_column = Some(super_column);
        self
    }
}

/// Addresses a row, a super column or a single column for removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPath {
    /// Table name.
    pub column_family: String,
    /// Packed super column name.
    pub super_column: Option<Bytes>,
    /// Packed column name.
    pub column: Option<Bytes>,
}

impl ColumnPath {
    /// Creates a path addressing an entire row.
    pub fn new(column_family: impl Into<String>) -> Self {
        Self {
            column_family: column_family.into(),
            super_column: None,
            column: None,
        }
    }
}

/// A contiguous range of column names.
///
/// Empty `start` or `finish` leaves that end open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceRange {
    /// First name (inclusive).
    pub start: Bytes,
    /// Last name (inclusive).
    pub finish: Bytes,
    /// Iterate from `start` downwards.
    pub reversed: bool,
    /// Maximum number of columns returned per row.
    pub count: i32,
}

/// Which columns to fetch: an explicit name list or a range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlicePredicate {
    /// Exact names.
    pub column_names: Option<Vec<Bytes>>,
    /// Name range.
    pub slice_range: Option<SliceRange>,
}

impl SlicePredicate {
    /// Creates a predicate selecting exactly the given names.
    pub fn names(names: Vec<Bytes>) -> Self {
        Self {
            column_names: Some(names),
            slice_range: None,
        }
    }

    /// Creates a predicate selecting a range of names.
    pub fn range(range: SliceRange) -> Self {
        Self {
            column_names: None,
            slice_range: Some(range),
        }
    }

    /// Creates an unbounded range predicate returning at most `count` columns.
    pub fn full(count: i32) -> Self {
        Self::range(SliceRange {
            start: Bytes::new(),
            finish: Bytes::new(),
            reversed: false,
            count,
        })
    }
}

/// A range of row keys. Both ends are inclusive; empty means open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    /// First key.
    pub start_key: Bytes,
    /// Last key.
    pub end_key: Bytes,
    /// Maximum number of rows returned.
    pub count: i32,
}

/// Comparison applied by a secondary-index expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexOperator {
    /// Equal.
    Eq,
    /// Greater than or equal.
    Gte,
    /// Greater than.
    Gt,
    /// Less than or equal.
    Lte,
    /// Less than.
    Lt,
}

impl IndexOperator {
    /// Returns whether an ordering between a column value and the expression
    /// value satisfies this operator.
    #[must_use]
    pub fn matches(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::{Equal, Greater, Less};
        match self {
            IndexOperator::Eq => ordering == Equal,
            IndexOperator::Gte => ordering != Less,
            IndexOperator::Gt => ordering == Greater,
            IndexOperator::Lte => ordering != Greater,
            IndexOperator::Lt => ordering == Less,
        }
    }
}

/// One `(column, operator, value)` filter of an index query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexExpression {
    /// Packed column name.
    pub column_name: Bytes,
    /// Comparison operator.
    pub op: IndexOperator,
    /// Packed comparison value.
    pub value: Bytes,
}

/// A secondary-index query: every expression must match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexClause {
    /// Filters; at least one must be over an indexed column.
    pub expressions: Vec<IndexExpression>,
    /// First row key considered (inclusive).
    pub start_key: Bytes,
    /// Maximum number of rows returned.
    pub count: i32,
}

/// A standard column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Packed name.
    pub name: Bytes,
    /// Packed value.
    pub value: Bytes,
    /// Write timestamp in microseconds.
    pub timestamp: i64,
    /// Seconds until expiry.
    pub ttl: Option<i32>,
}

/// A named group of columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperColumn {
    /// Packed super column name.
    pub name: Bytes,
    /// Sub-columns in comparator order.
    pub columns: Vec<Column>,
}

/// A server-maintained 64-bit counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterColumn {
    /// Packed name.
    pub name: Bytes,
    /// Current value (or delta, in an `add`).
    pub value: i64,
}

/// A named group of counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterSuperColumn {
    /// Packed super column name.
    pub name: Bytes,
    /// Counters in comparator order.
    pub columns: Vec<CounterColumn>,
}

/// One entry of a row as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnOrSuperColumn {
    /// A standard column.
    Column(Column),
    /// A super column.
    SuperColumn(SuperColumn),
    /// A counter.
    CounterColumn(CounterColumn),
    /// A counter super column.
    CounterSuperColumn(CounterSuperColumn),
}

impl ColumnOrSuperColumn {
    /// Returns the packed name of the entry.
    #[must_use]
    pub fn name(&self) -> &Bytes {
        match self {
            ColumnOrSuperColumn::Column(c) => &c.name,
            ColumnOrSuperColumn::SuperColumn(sc) => &sc.name,
            ColumnOrSuperColumn::CounterColumn(c) => &c.name,
            ColumnOrSuperColumn::CounterSuperColumn(sc) => &sc.name,
        }
    }
}

/// Removal of a row, a super column or a set of columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deletion {
    /// Deletion timestamp in microseconds.
    pub timestamp: Option<i64>,
    /// Restricts the deletion to one super column.
    pub super_column: Option<Bytes>,
    /// Restricts the deletion to the selected columns.
    pub predicate: Option<SlicePredicate>,
}

/// One change within a `batch_mutate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Write a column or super column.
    Insert(ColumnOrSuperColumn),
    /// Remove data.
    Delete(Deletion),
}

/// A row returned by a range or index query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySlice {
    /// Packed row key.
    pub key: Bytes,
    /// Columns matched by the predicate; empty for deleted rows.
    pub columns: Vec<ColumnOrSuperColumn>,
}

/// Mutations grouped by row key, then by table name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationMap {
    rows: BTreeMap<Bytes, BTreeMap<String, Vec<Mutation>>>,
}

impl MutationMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one mutation.
    pub fn push(&mut self, key: Bytes, column_family: &str, mutation: Mutation) {
        self.entry(key, column_family).push(mutation);
    }

    /// Appends several mutations for the same row and table.
    pub fn extend(
        &mut self,
        key: Bytes,
        column_family: &str,
        mutations: impl IntoIterator<Item = Mutation>,
    ) {
        self.entry(key, column_family).extend(mutations);
    }

    fn entry(&mut self, key: Bytes, column_family: &str) -> &mut Vec<Mutation> {
        self.rows
            .entry(key)
            .or_default()
            .entry(column_family.to_string())
            .or_default()
    }

    /// Returns the number of mutations across all rows.
    pub fn len(&self) -> usize {
        self.rows
            .values()
            .flat_map(|tables| tables.values())
            .map(Vec::len)
            .sum()
    }

    /// Returns true if no mutation has been added.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the number of distinct rows touched.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Iterates over `(key, table, mutations)`.
    pub fn iter(&self) -> impl Iterator<Item = (&Bytes, &str, &[Mutation])> {
        self.rows.iter().flat_map(|(key, tables)| {
            tables
                .iter()
                .map(move |(cf, mutations)| (key, cf.as_str(), mutations.as_slice()))
        })
    }

    /// Removes and returns all mutations, leaving the map empty.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    fn column(name: &'static [u8]) -> Mutation {
        Mutation::Insert(ColumnOrSuperColumn::Column(Column {
            name: Bytes::from_static(name),
            value: Bytes::from_static(b"v"),
            timestamp: 1,
            ttl: None,
        }))
    }

    #[test]
    fn test_mutation_map_groups_by_row_and_table() {
        let mut map = MutationMap::new();
        map.push(Bytes::from_static(b"k1"), "Standard1", column(b"a"));
        map.push(Bytes::from_static(b"k1"), "Standard1", column(b"b"));
        map.push(Bytes::from_static(b"k1"), "Standard2", column(b"a"));
        map.push(Bytes::from_static(b"k2"), "Standard1", column(b"a"));

        assert_eq!(map.len(), 4);
        assert_eq!(map.row_count(), 2);

        let groups: Vec<_> = map.iter().map(|(k, cf, m)| (k.clone(), cf, m.len())).collect();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0], (Bytes::from_static(b"k1"), "Standard1", 2));
    }

    #[test]
    fn test_mutation_map_take() {
        let mut map = MutationMap::new();
        map.push(Bytes::from_static(b"k"), "Standard1", column(b"a"));
        let taken = map.take();
        assert!(map.is_empty());
        assert_eq!(taken.len(), 1);
    }

    #[test]
    fn test_index_operator_matches() {
        assert!(IndexOperator::Eq.matches(Ordering::Equal));
        assert!(!IndexOperator::Eq.matches(Ordering::Less));
        assert!(IndexOperator::Gte.matches(Ordering::Greater));
        assert!(IndexOperator::Gte.matches(Ordering::Equal));
        assert!(!IndexOperator::Gt.matches(Ordering::Equal));
        assert!(IndexOperator::Lt.matches(Ordering::Less));
        assert!(!IndexOperator::Lte.matches(Ordering::Greater));
    }

    #[test]
    fn test_full_predicate_is_open() {
        let predicate = SlicePredicate::full(10);
        let range = predicate.slice_range.unwrap();
        assert!(range.start.is_empty());
        assert!(range.finish.is_empty());
        assert_eq!(range.count, 10);
    }
}
