//! Range and secondary-index scans.

use bytes::Bytes;
use colonnade_common::types::{
    ColumnParent, ConsistencyLevel, IndexClause, IndexExpression, KeyRange, KeySlice,
    SlicePredicate,
};
use colonnade_marshal::Value;

use super::{ColumnFamily, Row};
use crate::cursor::{PageCursor, PageSource};
use crate::error::ClientResult;
use crate::pool::ConnectionPool;
use crate::predicate::SliceQuery;

/// A key range scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeQuery {
    /// First key, inclusive. `None` starts at the beginning of the ring.
    pub start: Option<Value>,
    /// Last key, inclusive. `None` runs to the end of the ring.
    pub finish: Option<Value>,
    /// Stop after this many rows.
    pub row_count: Option<usize>,
    /// Rows per page; defaults to the table's `buffer_size`.
    pub buffer_size: Option<usize>,
    /// Columns to read from each row.
    pub slice: SliceQuery,
}

impl RangeQuery {
    /// Scans every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts at `key`.
    pub fn start(mut self, key: impl Into<Value>) -> Self {
        self.start = Some(key.into());
        self
    }

    /// Ends at `key`.
    pub fn finish(mut self, key: impl Into<Value>) -> Self {
        self.finish = Some(key.into());
        self
    }

    /// Caps the rows returned.
    pub fn row_count(mut self, count: usize) -> Self {
        self.row_count = Some(count);
        self
    }

    /// Sets the page size.
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = Some(size);
        self
    }

    /// Sets the columns to read.
    pub fn slice(mut self, slice: SliceQuery) -> Self {
        self.slice = slice;
        self
    }
}

/// Pages of a key range, fetched with `get_range_slices`.
#[derive(Debug)]
pub struct RangePages<'a> {
    pub(super) pool: &'a ConnectionPool,
    pub(super) parent: ColumnParent,
    pub(super) predicate: SlicePredicate,
    pub(super) end_key: Bytes,
    pub(super) consistency: ConsistencyLevel,
}

impl PageSource for RangePages<'_> {
    fn fetch_page(&mut self, start_key: &Bytes, count: usize) -> ClientResult<Vec<KeySlice>> {
        let range = KeyRange {
            start_key: start_key.clone(),
            end_key: self.end_key.clone(),
            count: i32::try_from(count).unwrap_or(i32::MAX),
        };
        let (parent, predicate, cl) = (&self.parent, &self.predicate, self.consistency);
        self.pool.call("get_range_slices", |c| {
            c.get_range_slices(parent, predicate, &range, cl)
        })
    }
}

/// Pages of rows matching an index clause, fetched with `get_indexed_slices`.
#[derive(Debug)]
pub struct IndexPages<'a> {
    pub(super) pool: &'a ConnectionPool,
    pub(super) parent: ColumnParent,
    pub(super) predicate: SlicePredicate,
    pub(super) expressions: Vec<IndexExpression>,
    pub(super) consistency: ConsistencyLevel,
}

impl PageSource for IndexPages<'_> {
    fn fetch_page(&mut self, start_key: &Bytes, count: usize) -> ClientResult<Vec<KeySlice>> {
        let clause = IndexClause {
            expressions: self.expressions.clone(),
            start_key: start_key.clone(),
            count: i32::try_from(count).unwrap_or(i32::MAX),
        };
        let (parent, predicate, cl) = (&self.parent, &self.predicate, self.consistency);
        self.pool.call("get_indexed_slices", |c| {
            c.get_indexed_slices(parent, &clause, predicate, cl)
        })
    }
}

/// Decoded rows of a paged scan.
#[derive(Debug)]
pub struct RowIter<'a, S> {
    column_family: &'a ColumnFamily,
    cursor: PageCursor<S>,
}

/// Rows of a key range scan.
pub type RangeIter<'a> = RowIter<'a, RangePages<'a>>;

/// Rows of a secondary-index scan.
pub type IndexedIter<'a> = RowIter<'a, IndexPages<'a>>;

impl<'a, S: PageSource> RowIter<'a, S> {
    pub(super) fn new(column_family: &'a ColumnFamily, cursor: PageCursor<S>) -> Self {
        Self {
            column_family,
            cursor,
        }
    }

    /// Pages requested so far.
    pub fn pages_fetched(&self) -> usize {
        self.cursor.pages_fetched()
    }

    /// Rows yielded so far.
    pub fn rows_emitted(&self) -> usize {
        self.cursor.rows_emitted()
    }

    fn decode(&self, slice: KeySlice) -> ClientResult<Row> {
        let key = self.column_family.unpack_key(&slice.key)?;
        Ok(Row::new(key, self.column_family.decode(slice.columns)?))
    }
}

impl<S: PageSource> Iterator for RowIter<'_, S> {
    type Item = ClientResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let slice = self.cursor.next()?;
        Some(slice.and_then(|s| self.decode(s)))
    }
}
