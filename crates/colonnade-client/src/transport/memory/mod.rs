//! In-memory cluster for testing.
//!
//! `MemoryCluster` keeps one keyspace in process memory and hands out
//! sessions through the [`Connector`] trait, so the pool and every table
//! operation run unmodified against it. It can simulate failures:
//!
//! - endpoints can be taken down and brought back up
//! - the next N calls of an operation can be made to fail with a chosen error
//! - logins can be checked against required credentials

mod store;

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use colonnade_common::types::{
    ColumnOrSuperColumn, ColumnParent, ColumnPath, ConsistencyLevel, CounterColumn, IndexClause,
    KeyRange, KeySlice, KsDef, MutationMap, SlicePredicate,
};
use colonnade_marshal::TypeRegistry;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use self::store::Store;
use super::{Cassandra, ConnectParams, Connector, Credentials, RpcError, RpcResult};

/// Operation name used to inject failures into connection attempts.
pub const CONNECT: &str = "connect";

/// Shared state of the simulated cluster.
#[derive(Debug)]
struct ClusterInner {
    /// Row data.
    store: Mutex<Store>,
    /// Endpoints currently refusing connections and calls.
    down: DashMap<String, ()>,
    /// Queued failures per operation name.
    faults: Mutex<HashMap<String, VecDeque<RpcError>>>,
    /// Calls seen per operation name, failed ones included.
    calls: DashMap<String, u64>,
    /// Credentials every login must present.
    credentials: RwLock<Option<Credentials>>,
    /// Sessions opened so far.
    connections_opened: AtomicU64,
}

impl ClusterInner {
    fn record(&self, operation: &str) {
        *self.calls.entry(operation.to_string()).or_insert(0) += 1;
    }

    fn take_fault(&self, operation: &str) -> Option<RpcError> {
        let mut faults = self.faults.lock();
        let queue = faults.get_mut(operation)?;
        let fault = queue.pop_front();
        if queue.is_empty() {
            faults.remove(operation);
        }
        fault
    }

    fn is_down(&self, server: &str) -> bool {
        self.down.contains_key(server)
    }
}

/// An in-process stand-in for a store cluster.
///
/// Cloning is cheap; clones share the same data and fault settings.
#[derive(Debug, Clone)]
pub struct MemoryCluster {
    inner: Arc<ClusterInner>,
}

impl MemoryCluster {
    /// Creates a cluster serving one keyspace. Every endpoint starts up.
    pub fn new(keyspace: KsDef) -> Self {
        Self::with_registry(keyspace, &TypeRegistry::standard())
    }

    /// Creates a cluster whose comparators and validators resolve through
    /// `registry`.
    pub fn with_registry(keyspace: KsDef, registry: &TypeRegistry) -> Self {
        Self {
            inner: Arc::new(ClusterInner {
                store: Mutex::new(Store::new(keyspace, registry)),
                down: DashMap::new(),
                faults: Mutex::new(HashMap::new()),
                calls: DashMap::new(),
                credentials: RwLock::new(None),
                connections_opened: AtomicU64::new(0),
            }),
        }
    }

    /// Returns this cluster as a connector for a pool.
    pub fn connector(&self) -> Arc<dyn Connector> {
        Arc::new(self.clone())
    }

    /// Makes an endpoint refuse new connections and fail calls on open ones.
    pub fn set_down(&self, server: &str) {
        self.inner.down.insert(server.to_string(), ());
    }

    /// Brings an endpoint back.
    pub fn set_up(&self, server: &str) {
        self.inner.down.remove(server);
    }

    /// Requires every login to present these credentials.
    pub fn require_credentials(&self, credentials: Credentials) {
        *self.inner.credentials.write() = Some(credentials);
    }

    /// Makes the next `times` calls of `operation` fail with `error`.
    ///
    /// Use [`CONNECT`] to fail connection attempts.
    pub fn fail_next(&self, operation: &str, times: usize, error: RpcError) {
        let mut faults = self.inner.faults.lock();
        let queue = faults.entry(operation.to_string()).or_default();
        queue.extend(std::iter::repeat(error).take(times));
    }

    /// Number of injected failures not yet consumed for `operation`.
    pub fn pending_faults(&self, operation: &str) -> usize {
        self.inner
            .faults
            .lock()
            .get(operation)
            .map_or(0, VecDeque::len)
    }

    /// Number of calls of `operation` received so far.
    pub fn calls(&self, operation: &str) -> u64 {
        self.inner.calls.get(operation).map_or(0, |c| *c)
    }

    /// Number of sessions opened so far.
    pub fn connections_opened(&self) -> u64 {
        self.inner.connections_opened.load(Ordering::Relaxed)
    }

    /// Number of stored rows in a table, including rows left empty by
    /// deletions.
    pub fn row_count(&self, column_family: &str) -> usize {
        self.inner.store.lock().row_count(column_family)
    }

    /// Number of rows in a table that still hold columns.
    pub fn live_row_count(&self, column_family: &str) -> usize {
        self.inner.store.lock().live_row_count(column_family)
    }
}

impl Connector for MemoryCluster {
    fn connect(&self, server: &str, params: &ConnectParams) -> RpcResult<Box<dyn Cassandra>> {
        self.inner.record(CONNECT);
        if self.inner.is_down(server) {
            return Err(RpcError::Transport(format!("connection refused by {}", server)));
        }
        if let Some(fault) = self.inner.take_fault(CONNECT) {
            return Err(fault);
        }
        if let Some(required) = self.inner.credentials.read().as_ref() {
            if params.credentials.as_ref() != Some(required) {
                return Err(RpcError::AuthenticationFailed(
                    "invalid username or password".to_string(),
                ));
            }
        }
        let keyspace = self.inner.store.lock().keyspace().name.clone();
        if keyspace != params.keyspace {
            return Err(RpcError::InvalidRequest(format!(
                "keyspace {} does not exist",
                params.keyspace
            )));
        }

        self.inner.connections_opened.fetch_add(1, Ordering::Relaxed);
        debug!(server, keyspace = %params.keyspace, "opened in-memory session");
        Ok(Box::new(MemoryConnection {
            cluster: Arc::clone(&self.inner),
            server: server.to_string(),
            open: true,
        }))
    }
}

/// One session with the in-memory cluster.
#[derive(Debug)]
struct MemoryConnection {
    cluster: Arc<ClusterInner>,
    server: String,
    open: bool,
}

impl MemoryConnection {
    /// Common checks before an operation touches the store.
    fn enter(&self, operation: &str) -> RpcResult<()> {
        self.cluster.record(operation);
        if !self.open {
            return Err(RpcError::Transport("connection closed".to_string()));
        }
        if self.cluster.is_down(&self.server) {
            return Err(RpcError::Transport(format!("{} is down", self.server)));
        }
        match self.cluster.take_fault(operation) {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }
}

impl Cassandra for MemoryConnection {
    fn get_slice(
        &mut self,
        key: &Bytes,
        parent: &ColumnParent,
        predicate: &SlicePredicate,
        _consistency: ConsistencyLevel,
    ) -> RpcResult<Vec<ColumnOrSuperColumn>> {
        self.enter("get_slice")?;
        self.cluster.store.lock().get_slice(key, parent, predicate)
    }

    fn multiget_slice(
        &mut self,
        keys: &[Bytes],
        parent: &ColumnParent,
        predicate: &SlicePredicate,
        _consistency: ConsistencyLevel,
    ) -> RpcResult<HashMap<Bytes, Vec<ColumnOrSuperColumn>>> {
        self.enter("multiget_slice")?;
        let store = self.cluster.store.lock();
        keys.iter()
            .map(|key| Ok((key.clone(), store.get_slice(key, parent, predicate)?)))
            .collect()
    }

    fn get_count(
        &mut self,
        key: &Bytes,
        parent: &ColumnParent,
        predicate: &SlicePredicate,
        _consistency: ConsistencyLevel,
    ) -> RpcResult<i32> {
        self.enter("get_count")?;
        let columns = self.cluster.store.lock().get_slice(key, parent, predicate)?;
        Ok(i32::try_from(columns.len()).unwrap_or(i32::MAX))
    }

    fn multiget_count(
        &mut self,
        keys: &[Bytes],
        parent: &ColumnParent,
        predicate: &SlicePredicate,
        _consistency: ConsistencyLevel,
    ) -> RpcResult<HashMap<Bytes, i32>> {
        self.enter("multiget_count")?;
        let store = self.cluster.store.lock();
        keys.iter()
            .map(|key| {
                let n = store.get_slice(key, parent, predicate)?.len();
                Ok((key.clone(), i32::try_from(n).unwrap_or(i32::MAX)))
            })
            .collect()
    }

    fn get_range_slices(
        &mut self,
        parent: &ColumnParent,
        predicate: &SlicePredicate,
        range: &KeyRange,
        _consistency: ConsistencyLevel,
    ) -> RpcResult<Vec<KeySlice>> {
        self.enter("get_range_slices")?;
        self.cluster
            .store
            .lock()
            .range_slices(parent, predicate, range)
    }

    fn get_indexed_slices(
        &mut self,
        parent: &ColumnParent,
        clause: &IndexClause,
        predicate: &SlicePredicate,
        _consistency: ConsistencyLevel,
    ) -> RpcResult<Vec<KeySlice>> {
        self.enter("get_indexed_slices")?;
        self.cluster
            .store
            .lock()
            .indexed_slices(parent, clause, predicate)
    }

    fn batch_mutate(
        &mut self,
        mutations: &MutationMap,
        _consistency: ConsistencyLevel,
    ) -> RpcResult<()> {
        self.enter("batch_mutate")?;
        self.cluster.store.lock().batch_mutate(mutations)
    }

    fn remove(
        &mut self,
        key: &Bytes,
        path: &ColumnPath,
        timestamp: i64,
        _consistency: ConsistencyLevel,
    ) -> RpcResult<()> {
        self.enter("remove")?;
        self.cluster.store.lock().remove(key, path, Some(timestamp))
    }

    fn remove_counter(
        &mut self,
        key: &Bytes,
        path: &ColumnPath,
        _consistency: ConsistencyLevel,
    ) -> RpcResult<()> {
        self.enter("remove_counter")?;
        self.cluster.store.lock().remove(key, path, None)
    }

    fn add(
        &mut self,
        key: &Bytes,
        parent: &ColumnParent,
        column: &CounterColumn,
        _consistency: ConsistencyLevel,
    ) -> RpcResult<()> {
        self.enter("add")?;
        self.cluster.store.lock().add(key, parent, column)
    }

    fn truncate(&mut self, column_family: &str) -> RpcResult<()> {
        self.enter("truncate")?;
        self.cluster.store.lock().truncate(column_family)
    }

    fn describe_keyspace(&mut self, keyspace: &str) -> RpcResult<KsDef> {
        self.enter("describe_keyspace")?;
        let store = self.cluster.store.lock();
        if store.keyspace().name != keyspace {
            return Err(RpcError::NotFound);
        }
        Ok(store.keyspace().clone())
    }

    fn close(&mut self) {
        if self.open {
            debug!(server = %self.server, "closed in-memory session");
        }
        self.open = false;
    }
}
