//! Batched writes.
//!
//! A [`Mutator`] collects inserts, deletions and counter increments for any
//! number of tables and rows and sends them as one `batch_mutate` call.
//! [`CfMutator`] does the same for a single table.

use std::sync::Arc;

use colonnade_common::types::{ConsistencyLevel, MutationMap};
use colonnade_marshal::Value;
use tracing::debug;

use crate::column_family::{ColumnFamily, ColumnMap, WriteOptions};
use crate::error::ClientResult;
use crate::pool::ConnectionPool;

/// Buffers mutations across tables.
#[derive(Debug)]
pub struct Mutator {
    pool: Arc<ConnectionPool>,
    mutations: MutationMap,
    consistency: ConsistencyLevel,
    /// Send automatically once this many mutations are buffered.
    queue_size: Option<usize>,
}

impl Mutator {
    /// Creates an empty batch.
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self {
            pool,
            mutations: MutationMap::new(),
            consistency: ConsistencyLevel::default(),
            queue_size: None,
        }
    }

    /// Sets the consistency level the batch is sent with.
    #[must_use]
    pub fn consistency(mut self, level: ConsistencyLevel) -> Self {
        self.consistency = level;
        self
    }

    /// Sends the batch whenever `size` mutations are buffered.
    #[must_use]
    pub fn queue_size(mut self, size: usize) -> Self {
        self.queue_size = Some(size);
        self
    }

    /// Number of buffered mutations.
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Returns true if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Queues a write of `columns` to one row.
    pub fn insert(
        &mut self,
        column_family: &ColumnFamily,
        key: impl Into<Value>,
        columns: &ColumnMap,
        options: &WriteOptions,
    ) -> ClientResult<()> {
        let key = column_family.pack_key(&key.into())?;
        let mutations = column_family.insert_mutations(
            columns,
            options.resolve_timestamp(),
            options.ttl,
        )?;
        self.mutations.extend(key, column_family.name(), mutations);
        self.maybe_send()
    }

    /// Queues removal of a row, some of its columns, or (part of) a super
    /// column.
    pub fn remove(
        &mut self,
        column_family: &ColumnFamily,
        key: impl Into<Value>,
        columns: Option<&[Value]>,
        super_column: Option<&Value>,
        options: &WriteOptions,
    ) -> ClientResult<()> {
        let key = column_family.pack_key(&key.into())?;
        let deletion =
            column_family.deletion(columns, super_column, options.resolve_timestamp())?;
        self.mutations.push(key, column_family.name(), deletion);
        self.maybe_send()
    }

    /// Queues a counter increment.
    pub fn add(
        &mut self,
        column_family: &ColumnFamily,
        key: impl Into<Value>,
        column: impl Into<Value>,
        amount: i64,
        super_column: Option<&Value>,
    ) -> ClientResult<()> {
        let key = column_family.pack_key(&key.into())?;
        let mutation = column_family.counter_mutation(&column.into(), amount, super_column)?;
        self.mutations.push(key, column_family.name(), mutation);
        self.maybe_send()
    }

    /// Sends every buffered mutation in one request.
    ///
    /// The buffer is cleared even if the request fails.
    pub fn send(&mut self) -> ClientResult<()> {
        if self.mutations.is_empty() {
            return Ok(());
        }
        let mutations = self.mutations.take();
        debug!(
            mutations = mutations.len(),
            rows = mutations.row_count(),
            "sending batch"
        );
        let cl = self.consistency;
        self.pool
            .call("batch_mutate", |c| c.batch_mutate(&mutations, cl))
    }

    fn maybe_send(&mut self) -> ClientResult<()> {
        match self.queue_size {
            Some(size) if self.mutations.len() >= size => self.send(),
            _ => Ok(()),
        }
    }
}

/// Buffers mutations for one table.
#[derive(Debug)]
pub struct CfMutator<'a> {
    column_family: &'a ColumnFamily,
    mutator: Mutator,
}

impl<'a> CfMutator<'a> {
    /// Creates an empty batch using the table's write consistency.
    pub fn new(column_family: &'a ColumnFamily) -> Self {
        let mutator = Mutator::new(Arc::clone(column_family.pool()))
            .consistency(column_family.options().write_consistency);
        Self {
            column_family,
            mutator,
        }
    }

    /// Sends the batch whenever `size` mutations are buffered.
    #[must_use]
    pub fn queue_size(mut self, size: usize) -> Self {
        self.mutator = self.mutator.queue_size(size);
        self
    }

    /// Number of buffered mutations.
    pub fn len(&self) -> usize {
        self.mutator.len()
    }

    /// Returns true if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.mutator.is_empty()
    }

    /// Queues a write to one row.
    pub fn insert(
        &mut self,
        key: impl Into<Value>,
        columns: &ColumnMap,
        options: &WriteOptions,
    ) -> ClientResult<()> {
        self.mutator
            .insert(self.column_family, key, columns, options)
    }

    /// Queues a removal.
    pub fn remove(
        &mut self,
        key: impl Into<Value>,
        columns: Option<&[Value]>,
        options: &WriteOptions,
    ) -> ClientResult<()> {
        self.mutator
            .remove(self.column_family, key, columns, None, options)
    }

    /// Queues a counter increment.
    pub fn add(
        &mut self,
        key: impl Into<Value>,
        column: impl Into<Value>,
        amount: i64,
    ) -> ClientResult<()> {
        self.mutator
            .add(self.column_family, key, column, amount, None)
    }

    /// Sends the batch.
    pub fn send(&mut self) -> ClientResult<()> {
        self.mutator.send()
    }
}
