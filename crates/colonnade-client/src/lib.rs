//! # colonnade-client
//!
//! Client runtime for a remote column-family store.
//!
//! - **Connection Pooling**: a bounded set of sessions spread over the
//!   configured servers, with failover, retry with backoff and recycling
//! - **Table Handles**: typed reads and writes through [`ColumnFamily`]
//! - **Range Scans**: lazy iteration over key ranges and index queries,
//!   one page at a time
//! - **Batches**: many writes in one request with [`Mutator`]
//!
//! The wire protocol is behind the [`Connector`] and [`Cassandra`] traits.
//! [`MemoryCluster`] implements them in process for tests.
//!
//! ## Quick Start
//!
//! ```rust
//! use colonnade_client::{
//!     ColumnFamily, ColumnMap, ConnectionPool, MemoryCluster, PoolConfig, RangeQuery,
//!     WriteOptions,
//! };
//! use colonnade_common::types::{CfDef, KsDef};
//! use colonnade_marshal::TypeRegistry;
//!
//! # fn main() -> colonnade_client::ClientResult<()> {
//! let cluster = MemoryCluster::new(
//!     KsDef::new("Keyspace1")
//!         .with_column_family(CfDef::new("Keyspace1", "Events").key_validation("LongType")),
//! );
//!
//! let config = PoolConfig::new("Keyspace1").servers(["10.0.0.1:9160", "10.0.0.2:9160"]);
//! let pool = ConnectionPool::connect(config, cluster.connector())?;
//! let events = ColumnFamily::open(pool, "Events", &TypeRegistry::standard())?;
//!
//! for id in 1..=10i64 {
//!     events.insert(id, &ColumnMap::standard([("kind", "click")]), &WriteOptions::new())?;
//! }
//!
//! let mut seen = 0;
//! for row in events.get_range(&RangeQuery::new().buffer_size(3))? {
//!     let row = row?;
//!     assert_eq!(row.len(), 1);
//!     seen += 1;
//! }
//! assert_eq!(seen, 10);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Error types.
pub mod error;

/// RPC seam and in-memory backend.
pub mod transport;

/// Connection pool.
pub mod pool;

/// Column selection.
pub mod predicate;

/// Paged iteration.
pub mod cursor;

/// Table handles.
pub mod column_family;

/// Batched writes.
pub mod batch;

/// Secondary-index queries.
pub mod index;

pub use batch::{CfMutator, Mutator};
pub use column_family::{
    timestamp_micros, Cell, ColumnFamily, ColumnFamilyOptions, ColumnFamilySchema, ColumnMap,
    IndexedIter, RangeIter, RangeQuery, Row, TableKind, WriteOptions,
};
pub use cursor::{PageCursor, PageSource};
pub use error::{ClientError, ClientResult};
pub use index::{IndexClause, IndexExpression};
pub use pool::{ConnectionPool, PoolConfig, PoolStats, PooledConnection};
pub use predicate::{SlicePredicateBuilder, SliceQuery};
pub use transport::{
    Cassandra, ConnectParams, Connector, Credentials, MemoryCluster, RpcError, RpcResult,
};
