//! Request, response and schema types exchanged with the store.
//!
//! All names, values and keys are the packed byte strings produced by the
//! marshaling layer; nothing in here knows about logical types.

mod consistency;
mod schema;
mod wire;

pub use consistency::ConsistencyLevel;
pub use schema::{CfDef, ColumnDef, ColumnType, IndexType, KsDef};
pub use wire::{
    Column, ColumnOrSuperColumn, ColumnParent, ColumnPath, CounterColumn, CounterSuperColumn,
    Deletion, IndexClause, IndexExpression, IndexOperator, KeyRange, KeySlice, Mutation,
    MutationMap, SlicePredicate, SliceRange, SuperColumn,
};
