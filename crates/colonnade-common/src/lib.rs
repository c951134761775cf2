//! # colonnade-common
//!
//! Shared types for the colonnade column-store client.
//!
//! This crate holds the request/response shapes exchanged with the remote
//! store and the schema metadata the store describes itself with. It has no
//! behaviour of its own; encoding lives in `colonnade-marshal` and the
//! operations live in `colonnade-client`.
//!
//! - **Types**: `ColumnParent`, `SlicePredicate`, `KeyRange`, `Mutation`, ...
//! - **Schema**: `KsDef`, `CfDef`, `ColumnDef`
//! - **Consistency**: `ConsistencyLevel`
//! - **Constants**: default counts, buffer sizes and pool limits
//!
//! ## Example
//!
//! ```rust
//! use colonnade_common::types::{ColumnParent, SlicePredicate};
//!
//! let parent = ColumnParent::new("Standard1");
//! let predicate = SlicePredicate::full(100);
//! assert!(parent.super_column.is_none());
//! assert!(predicate.slice_range.is_some());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod constants;
pub mod types;

pub use constants::*;
pub use types::{
    CfDef, Column, ColumnDef, ColumnOrSuperColumn, ColumnParent, ColumnPath, ColumnType,
    ConsistencyLevel, CounterColumn, CounterSuperColumn, Deletion, IndexClause, IndexExpression,
    IndexOperator, KeyRange, KeySlice, KsDef, Mutation, MutationMap, SlicePredicate, SliceRange,
    SuperColumn,
};
