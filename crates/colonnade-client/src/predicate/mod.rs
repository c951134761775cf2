//! Column selection.
//!
//! A [`SliceQuery`] says which columns of a row to read in logical values;
//! [`SlicePredicateBuilder`] packs it into the wire [`SlicePredicate`] with
//! the comparator of the names being selected.

use std::ops::Bound;

use bytes::Bytes;
use colonnade_common::constants::DEFAULT_COLUMN_COUNT;
use colonnade_common::types::{ConsistencyLevel, SlicePredicate, SliceRange};
use colonnade_marshal::{DataType, PackContext, SliceEnd, TypeCodec, Value};

use crate::error::{ClientError, ClientResult};

/// Which columns to read from each row.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceQuery {
    /// Exact names to read. Takes precedence over the range fields.
    pub columns: Option<Vec<Value>>,
    /// First name of the slice in iteration order.
    pub start: Bound<Value>,
    /// Last name of the slice in iteration order.
    pub finish: Bound<Value>,
    /// Read names in descending comparator order.
    pub reversed: bool,
    /// Maximum columns per row.
    pub count: i32,
    /// Super column to read sub-columns from.
    pub super_column: Option<Value>,
    /// Overrides the table's read consistency.
    pub read_consistency: Option<ConsistencyLevel>,
}

impl Default for SliceQuery {
    fn default() -> Self {
        Self {
            columns: None,
            start: Bound::Unbounded,
            finish: Bound::Unbounded,
            reversed: false,
            count: DEFAULT_COLUMN_COUNT,
            super_column: None,
            read_consistency: None,
        }
    }
}

impl SliceQuery {
    /// Reads the first `DEFAULT_COLUMN_COUNT` columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads exactly these names.
    pub fn columns<I, V>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.columns = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Starts the slice at `name`, inclusive.
    pub fn start(mut self, name: impl Into<Value>) -> Self {
        self.start = Bound::Included(name.into());
        self
    }

    /// Starts the slice just after `name`. Composite comparators only.
    pub fn start_after(mut self, name: impl Into<Value>) -> Self {
        self.start = Bound::Excluded(name.into());
        self
    }

    /// Ends the slice at `name`, inclusive.
    pub fn finish(mut self, name: impl Into<Value>) -> Self {
        self.finish = Bound::Included(name.into());
        self
    }

    /// Ends the slice just before `name`. Composite comparators only.
    pub fn finish_before(mut self, name: impl Into<Value>) -> Self {
        self.finish = Bound::Excluded(name.into());
        self
    }

    /// Reads in descending order.
    pub fn reversed(mut self, reversed: bool) -> Self {
        self.reversed = reversed;
        self
    }

    /// Caps the columns returned per row.
    pub fn count(mut self, count: i32) -> Self {
        self.count = count;
        self
    }

    /// Reads sub-columns of one super column.
    pub fn super_column(mut self, name: impl Into<Value>) -> Self {
        self.super_column = Some(name.into());
        self
    }

    /// Overrides the read consistency.
    pub fn consistency(mut self, level: ConsistencyLevel) -> Self {
        self.read_consistency = Some(level);
        self
    }
}

/// Packs [`SliceQuery`] selections for one comparator.
#[derive(Debug, Clone, Copy)]
pub struct SlicePredicateBuilder<'a> {
    comparator: &'a DataType,
}

impl<'a> SlicePredicateBuilder<'a> {
    /// Creates a builder for names sorted by `comparator`.
    pub fn new(comparator: &'a DataType) -> Self {
        Self { comparator }
    }

    /// Builds the predicate for a query.
    pub fn build(&self, query: &SliceQuery) -> ClientResult<SlicePredicate> {
        match &query.columns {
            Some(names) => self.names(names),
            None => self.range(&query.start, &query.finish, query.reversed, query.count),
        }
    }

    /// Selects exact names.
    pub fn names(&self, names: &[Value]) -> ClientResult<SlicePredicate> {
        if names.is_empty() {
            return Err(ClientError::InvalidConfig(
                "column name list must not be empty".to_string(),
            ));
        }
        let packed = names
            .iter()
            .map(|name| pack_name(self.comparator, name))
            .collect::<ClientResult<Vec<_>>>()?;
        Ok(SlicePredicate::names(packed))
    }

    /// Selects a contiguous run of names.
    ///
    /// `start` is where reading begins, so for a reversed slice it is the
    /// upper bound in comparator order.
    pub fn range(
        &self,
        start: &Bound<Value>,
        finish: &Bound<Value>,
        reversed: bool,
        count: i32,
    ) -> ClientResult<SlicePredicate> {
        if count < 0 {
            return Err(ClientError::InvalidConfig(format!(
                "column count must not be negative, got {}",
                count
            )));
        }
        Ok(SlicePredicate::range(SliceRange {
            start: self.bound(start, !reversed)?,
            finish: self.bound(finish, reversed)?,
            reversed,
            count,
        }))
    }

    /// Packs one end; `lower` is true for the lower bound in comparator order.
    fn bound(&self, bound: &Bound<Value>, lower: bool) -> ClientResult<Bytes> {
        let (value, inclusive) = match bound {
            Bound::Unbounded => return Ok(Bytes::new()),
            Bound::Included(v) => (v, true),
            Bound::Excluded(v) => (v, false),
        };
        if !inclusive && !self.comparator.is_composite() {
            return Err(ClientError::InvalidConfig(format!(
                "exclusive slice bounds need a composite comparator, not {}",
                self.comparator
            )));
        }
        let end = if lower {
            SliceEnd::Start { inclusive }
        } else {
            SliceEnd::Finish { inclusive }
        };
        let ctx = PackContext::name().slice(end);
        Ok(self.comparator.pack(value, ctx)?)
    }
}

/// Packs an exact column or super column name. Empty names are rejected.
pub fn pack_name(comparator: &DataType, name: &Value) -> ClientResult<Bytes> {
    let packed = comparator.pack(name, PackContext::name())?;
    if packed.is_empty() {
        return Err(ClientError::InvalidConfig(
            "column names must not be empty".to_string(),
        ));
    }
    Ok(packed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use colonnade_common::constants::{EOC_EXACT, EOC_GREATER, EOC_LESS};

    fn composite() -> DataType {
        DataType::Composite(vec![DataType::Long, DataType::Ascii])
    }

    #[test]
    fn test_names_are_packed_individually() {
        let predicate = SlicePredicateBuilder::new(&DataType::Long)
            .build(&SliceQuery::new().columns([1i64, 2]))
            .unwrap();
        let names = predicate.column_names.unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names[1].as_ref(), &[0, 0, 0, 0, 0, 0, 0, 2]);
        assert!(predicate.slice_range.is_none());
    }

    #[test]
    fn test_empty_names_rejected() {
        let builder = SlicePredicateBuilder::new(&DataType::Utf8);
        assert!(matches!(
            builder.build(&SliceQuery::new().columns(Vec::<Value>::new())),
            Err(ClientError::InvalidConfig(_))
        ));
        assert!(matches!(
            builder.build(&SliceQuery::new().columns(["a", ""])),
            Err(ClientError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_open_range() {
        let predicate = SlicePredicateBuilder::new(&DataType::Utf8)
            .build(&SliceQuery::new().count(5))
            .unwrap();
        assert_eq!(predicate, SlicePredicate::full(5));
    }

    #[test]
    fn test_exclusive_bound_needs_composite() {
        let query = SliceQuery::new().start_after("a");
        assert!(matches!(
            SlicePredicateBuilder::new(&DataType::Utf8).build(&query),
            Err(ClientError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_composite_bounds_carry_end_of_component() {
        let query = SliceQuery::new()
            .start(Value::composite([1i64]))
            .finish(Value::composite([2i64]));
        let range = SlicePredicateBuilder::new(&composite())
            .build(&query)
            .unwrap()
            .slice_range
            .unwrap();
        assert_eq!(range.start.last(), Some(&EOC_LESS));
        assert_eq!(range.finish.last(), Some(&EOC_GREATER));

        let exclusive = SliceQuery::new()
            .start_after(Value::composite([1i64]))
            .finish_before(Value::composite([2i64]));
        let range = SlicePredicateBuilder::new(&composite())
            .build(&exclusive)
            .unwrap()
            .slice_range
            .unwrap();
        assert_eq!(range.start.last(), Some(&EOC_GREATER));
        assert_eq!(range.finish.last(), Some(&EOC_LESS));
    }

    #[test]
    fn test_reversed_swaps_bound_kinds() {
        let query = SliceQuery::new()
            .start(Value::composite([2i64]))
            .finish(Value::composite([1i64]))
            .reversed(true);
        let range = SlicePredicateBuilder::new(&composite())
            .build(&query)
            .unwrap()
            .slice_range
            .unwrap();
        assert!(range.reversed);
        // Reading starts at the upper bound, which must sort after 2:*.
        assert_eq!(range.start.last(), Some(&EOC_GREATER));
        assert_eq!(range.finish.last(), Some(&EOC_LESS));
    }

    #[test]
    fn test_exact_composite_name() {
        let packed = pack_name(&composite(), &Value::composite([Value::Long(1), "a".into()])).unwrap();
        assert_eq!(packed.last(), Some(&EOC_EXACT));
    }

    #[test]
    fn test_negative_count_rejected() {
        assert!(SlicePredicateBuilder::new(&DataType::Bytes)
            .build(&SliceQuery::new().count(-1))
            .is_err());
    }
}
