//! Secondary-index queries in logical values.
//!
//! ```rust
//! use colonnade_client::index::{IndexClause, IndexExpression};
//!
//! let clause = IndexClause::new(vec![
//!     IndexExpression::eq("state", "UT"),
//!     IndexExpression::gt("birthdate", 1970i64),
//! ])
//! .unwrap()
//! .count(100);
//! assert_eq!(clause.expressions.len(), 2);
//! ```

use colonnade_common::types::IndexOperator;
use colonnade_marshal::Value;

use crate::error::{ClientError, ClientResult};

/// One `column <op> value` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpression {
    /// Column name.
    pub column: Value,
    /// Comparison.
    pub op: IndexOperator,
    /// Value compared against, packed with the column's validator.
    pub value: Value,
}

impl IndexExpression {
    /// Creates an expression.
    pub fn new(column: impl Into<Value>, value: impl Into<Value>, op: IndexOperator) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// `column == value`
    pub fn eq(column: impl Into<Value>, value: impl Into<Value>) -> Self {
        Self::new(column, value, IndexOperator::Eq)
    }

    /// `column > value`
    pub fn gt(column: impl Into<Value>, value: impl Into<Value>) -> Self {
        Self::new(column, value, IndexOperator::Gt)
    }

    /// `column >= value`
    pub fn gte(column: impl Into<Value>, value: impl Into<Value>) -> Self {
        Self::new(column, value, IndexOperator::Gte)
    }

    /// `column < value`
    pub fn lt(column: impl Into<Value>, value: impl Into<Value>) -> Self {
        Self::new(column, value, IndexOperator::Lt)
    }

    /// `column <= value`
    pub fn lte(column: impl Into<Value>, value: impl Into<Value>) -> Self {
        Self::new(column, value, IndexOperator::Lte)
    }
}

/// A conjunction of index expressions.
///
/// The store requires at least one expression on an indexed column.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexClause {
    /// Conditions every returned row satisfies.
    pub expressions: Vec<IndexExpression>,
    /// First key to consider.
    pub start_key: Option<Value>,
    /// Stop after this many rows.
    pub count: Option<usize>,
    /// Rows per page; defaults to the table's `buffer_size`.
    pub buffer_size: Option<usize>,
}

impl IndexClause {
    /// Creates a clause. Fails if `expressions` is empty.
    pub fn new(expressions: Vec<IndexExpression>) -> ClientResult<Self> {
        if expressions.is_empty() {
            return Err(ClientError::InvalidConfig(
                "an index clause needs at least one expression".to_string(),
            ));
        }
        Ok(Self {
            expressions,
            start_key: None,
            count: None,
            buffer_size: None,
        })
    }

    /// Starts at `key`.
    #[must_use]
    pub fn start_key(mut self, key: impl Into<Value>) -> Self {
        self.start_key = Some(key.into());
        self
    }

    /// Caps the rows returned.
    #[must_use]
    pub fn count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    /// Sets the page size.
    #[must_use]
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = Some(size);
        self
    }
}
