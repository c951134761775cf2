//! RPC seam between the client and a store node.
//!
//! The pool never speaks a wire protocol itself. It asks a [`Connector`] for
//! a session to one endpoint and drives the session through the
//! [`Cassandra`] trait, one method per remote operation.
//!
//! - `Cassandra`: one open session, owned by one caller at a time
//! - `Connector`: opens sessions for an endpoint
//! - `MemoryCluster`: in-process store for tests and examples
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  acquire  ┌──────────────────┐  connect  ┌───────────┐
//! │ ColumnFamily │──────────▶│  ConnectionPool  │──────────▶│ Connector │
//! └──────────────┘           └──────────────────┘           └─────┬─────┘
//!                                     │ Box<dyn Cassandra>         │
//!                                     ◀────────────────────────────┘
//! ```

pub mod memory;

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use colonnade_common::types::{
    ColumnOrSuperColumn, ColumnParent, ColumnPath, ConsistencyLevel, CounterColumn, IndexClause,
    KeyRange, KeySlice, KsDef, MutationMap, SlicePredicate,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemoryCluster;

/// Errors reported by an RPC session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    /// The request did not complete in time.
    #[error("timed out")]
    TimedOut,

    /// Not enough replicas were available.
    #[error("unavailable")]
    Unavailable,

    /// The connection broke.
    #[error("transport error: {0}")]
    Transport(String),

    /// The requested entity does not exist.
    #[error("not found")]
    NotFound,

    /// The store rejected the request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Login was refused.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
}

impl RpcError {
    /// Returns true if retrying on another connection may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RpcError::TimedOut | RpcError::Unavailable | RpcError::Transport(_)
        )
    }
}

/// Result type for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;

/// Login credentials sent when a session is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// User name.
    pub username: String,
    /// Password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Settings applied to every new session.
#[derive(Debug, Clone)]
pub struct ConnectParams {
    /// Keyspace selected after connecting.
    pub keyspace: String,
    /// Credentials for login, if the cluster requires them.
    pub credentials: Option<Credentials>,
    /// Socket send timeout.
    pub send_timeout: Duration,
    /// Socket receive timeout.
    pub recv_timeout: Duration,
    /// Use the framed transport.
    pub framed: bool,
}

/// One open session with a store node.
///
/// Every byte string crossing this trait is already packed.
pub trait Cassandra: Send {
    /// Reads a slice of one row.
    fn get_slice(
        &mut self,
        key: &Bytes,
        parent: &ColumnParent,
        predicate: &SlicePredicate,
        consistency: ConsistencyLevel,
    ) -> RpcResult<Vec<ColumnOrSuperColumn>>;

    /// Reads the same slice of several rows. Missing rows map to empty lists.
    fn multiget_slice(
        &mut self,
        keys: &[Bytes],
        parent: &ColumnParent,
        predicate: &SlicePredicate,
        consistency: ConsistencyLevel,
    ) -> RpcResult<HashMap<Bytes, Vec<ColumnOrSuperColumn>>>;

    /// Counts the columns of one row matched by the predicate.
    fn get_count(
        &mut self,
        key: &Bytes,
        parent: &ColumnParent,
        predicate: &SlicePredicate,
        consistency: ConsistencyLevel,
    ) -> RpcResult<i32>;

    /// Counts columns across several rows.
    fn multiget_count(
        &mut self,
        keys: &[Bytes],
        parent: &ColumnParent,
        predicate: &SlicePredicate,
        consistency: ConsistencyLevel,
    ) -> RpcResult<HashMap<Bytes, i32>>;

    /// Reads a page of rows in key order.
    fn get_range_slices(
        &mut self,
        parent: &ColumnParent,
        predicate: &SlicePredicate,
        range: &KeyRange,
        consistency: ConsistencyLevel,
    ) -> RpcResult<Vec<KeySlice>>;

    /// Reads a page of rows matching a secondary-index clause.
    fn get_indexed_slices(
        &mut self,
        parent: &ColumnParent,
        clause: &IndexClause,
        predicate: &SlicePredicate,
        consistency: ConsistencyLevel,
    ) -> RpcResult<Vec<KeySlice>>;

    /// Applies inserts and deletions across rows and tables.
    fn batch_mutate(
        &mut self,
        mutations: &MutationMap,
        consistency: ConsistencyLevel,
    ) -> RpcResult<()>;

    /// Removes a row, a super column or a column.
    fn remove(
        &mut self,
        key: &Bytes,
        path: &ColumnPath,
        timestamp: i64,
        consistency: ConsistencyLevel,
    ) -> RpcResult<()>;

    /// Removes a counter or a counter row.
    fn remove_counter(
        &mut self,
        key: &Bytes,
        path: &ColumnPath,
        consistency: ConsistencyLevel,
    ) -> RpcResult<()>;

    /// Increments a counter.
    fn add(
        &mut self,
        key: &Bytes,
        parent: &ColumnParent,
        column: &CounterColumn,
        consistency: ConsistencyLevel,
    ) -> RpcResult<()>;

    /// Removes every row of a table.
    fn truncate(&mut self, column_family: &str) -> RpcResult<()>;

    /// Returns the schema of a keyspace.
    fn describe_keyspace(&mut self, keyspace: &str) -> RpcResult<KsDef>;

    /// Closes the session. Later calls fail with a transport error.
    fn close(&mut self);
}

/// Opens sessions to endpoints.
pub trait Connector: Send + Sync {
    /// Connects to `server` (`host:port`) and selects the keyspace.
    fn connect(&self, server: &str, params: &ConnectParams) -> RpcResult<Box<dyn Cassandra>>;
}
