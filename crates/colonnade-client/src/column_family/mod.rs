//! Row-level API for one table.
//!
//! A [`ColumnFamily`] is opened once against a pool. It reads the table's
//! metadata with `describe_keyspace`, freezes the resulting codecs in a
//! [`ColumnFamilySchema`], and from then on packs every key, name and value
//! it sends and unpacks everything it receives.
//!
//! # Example
//!
//! ```rust
//! use colonnade_client::{
//!     ColumnFamily, ColumnMap, ConnectionPool, MemoryCluster, PoolConfig, SliceQuery,
//!     WriteOptions,
//! };
//! use colonnade_common::types::{CfDef, KsDef};
//! use colonnade_marshal::{TypeRegistry, Value};
//!
//! # fn main() -> colonnade_client::ClientResult<()> {
//! let cluster = MemoryCluster::new(
//!     KsDef::new("Keyspace1").with_column_family(
//!         CfDef::new("Keyspace1", "Users").comparator("UTF8Type").key_validation("UTF8Type"),
//!     ),
//! );
//! let pool = ConnectionPool::connect(PoolConfig::new("Keyspace1"), cluster.connector())?;
//! let users = ColumnFamily::open(pool, "Users", &TypeRegistry::standard())?;
//!
//! users.insert("jsmith", &ColumnMap::standard([("first", "John")]), &WriteOptions::new())?;
//! let row = users.get("jsmith", &SliceQuery::new())?;
//! assert_eq!(row.value("first"), Some(&Value::Bytes("John".into())));
//! # Ok(())
//! # }
//! ```

mod iter;
mod row;
mod schema;

use std::sync::Arc;

use bytes::Bytes;
use colonnade_common::constants::{DEFAULT_BUFFER_SIZE, DEFAULT_MULTIGET_BUFFER_SIZE, MIN_BUFFER_SIZE};
use colonnade_common::types::{
    Column, ColumnOrSuperColumn, ColumnParent, ColumnPath, ConsistencyLevel, CounterColumn,
    CounterSuperColumn, Deletion, IndexExpression as WireIndexExpression, Mutation, MutationMap,
    SlicePredicate, SuperColumn,
};
use colonnade_marshal::{PackContext, TypeCodec, TypeRegistry, Value};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::batch::CfMutator;
use crate::cursor::PageCursor;
use crate::error::{ClientError, ClientResult};
use crate::index::IndexClause;
use crate::pool::ConnectionPool;
use crate::predicate::{pack_name, SlicePredicateBuilder, SliceQuery};

pub use iter::{IndexPages, IndexedIter, RangeIter, RangePages, RangeQuery, RowIter};
pub use row::{timestamp_micros, Cell, ColumnMap, Row, WriteOptions};
pub use schema::{ColumnFamilySchema, TableKind};

// =============================================================================
// Options
// =============================================================================

/// Table handle settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnFamilyOptions {
    /// Pack column and super column names with the table comparators.
    pub autopack_names: bool,
    /// Pack values with the table validators.
    pub autopack_values: bool,
    /// Pack row keys with the key validator.
    pub autopack_keys: bool,
    /// Default consistency for reads.
    pub read_consistency: ConsistencyLevel,
    /// Default consistency for writes.
    pub write_consistency: ConsistencyLevel,
    /// Rows per page in range and index scans.
    pub buffer_size: usize,
    /// Keys per `multiget_slice` request.
    pub multiget_buffer_size: usize,
}

impl Default for ColumnFamilyOptions {
    fn default() -> Self {
        Self {
            autopack_names: true,
            autopack_values: true,
            autopack_keys: true,
            read_consistency: ConsistencyLevel::One,
            write_consistency: ConsistencyLevel::One,
            buffer_size: DEFAULT_BUFFER_SIZE,
            multiget_buffer_size: DEFAULT_MULTIGET_BUFFER_SIZE,
        }
    }
}

impl ColumnFamilyOptions {
    /// Default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Turns name, value and key packing on or off together.
    pub fn autopack(mut self, enabled: bool) -> Self {
        self.autopack_names = enabled;
        self.autopack_values = enabled;
        self.autopack_keys = enabled;
        self
    }

    /// Sets the read consistency.
    pub fn read_consistency(mut self, level: ConsistencyLevel) -> Self {
        self.read_consistency = level;
        self
    }

    /// Sets the write consistency.
    pub fn write_consistency(mut self, level: ConsistencyLevel) -> Self {
        self.write_consistency = level;
        self
    }

    /// Sets the scan page size.
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Sets the multiget chunk size.
    pub fn multiget_buffer_size(mut self, size: usize) -> Self {
        self.multiget_buffer_size = size;
        self
    }

    /// Validates the options.
    pub fn validate(&self) -> ClientResult<()> {
        if self.buffer_size < MIN_BUFFER_SIZE {
            return Err(ClientError::InvalidConfig(format!(
                "buffer_size must be at least {}",
                MIN_BUFFER_SIZE
            )));
        }
        if self.multiget_buffer_size == 0 {
            return Err(ClientError::InvalidConfig(
                "multiget_buffer_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Table Handle
// =============================================================================

/// Handle to one table.
#[derive(Debug, Clone)]
pub struct ColumnFamily {
    pool: Arc<ConnectionPool>,
    schema: ColumnFamilySchema,
    options: ColumnFamilyOptions,
}

impl ColumnFamily {
    /// Opens a table with default options.
    pub fn open(pool: Arc<ConnectionPool>, name: &str, registry: &TypeRegistry) -> ClientResult<Self> {
        Self::open_with(pool, name, registry, ColumnFamilyOptions::default())
    }

    /// Opens a table.
    ///
    /// Fails with `NotFound` if the keyspace has no table of that name.
    pub fn open_with(
        pool: Arc<ConnectionPool>,
        name: &str,
        registry: &TypeRegistry,
        options: ColumnFamilyOptions,
    ) -> ClientResult<Self> {
        options.validate()?;
        let keyspace = pool.describe_keyspace()?;
        let def = keyspace.column_family(name).ok_or(ClientError::NotFound)?;
        let schema = ColumnFamilySchema::new(def, registry, &options);
        debug!(
            column_family = name,
            kind = ?schema.kind,
            comparator = %schema.slice_name_type(false),
            "opened column family"
        );
        Ok(Self {
            pool,
            schema,
            options,
        })
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// Frozen table metadata.
    pub fn schema(&self) -> &ColumnFamilySchema {
        &self.schema
    }

    /// Handle settings.
    pub fn options(&self) -> &ColumnFamilyOptions {
        &self.options
    }

    /// The pool this handle sends through.
    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    /// Starts a batch of writes to this table.
    pub fn batch(&self) -> CfMutator<'_> {
        CfMutator::new(self)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Reads one row, or `None` if no columns matched.
    pub fn get_opt(&self, key: impl Into<Value>, query: &SliceQuery) -> ClientResult<Option<Row>> {
        let key = key.into();
        let packed = self.pack_key(&key)?;
        let parent = self.parent(query.super_column.as_ref())?;
        let predicate = self.predicate(query)?;
        let cl = self.read_consistency(query);

        let columns = self
            .pool
            .call("get_slice", |c| c.get_slice(&packed, &parent, &predicate, cl))?;
        if columns.is_empty() {
            return Ok(None);
        }
        Ok(Some(Row::new(key, self.decode(columns)?)))
    }

    /// Reads one row. Fails with `NotFound` if no columns matched.
    pub fn get(&self, key: impl Into<Value>, query: &SliceQuery) -> ClientResult<Row> {
        self.get_opt(key, query)?.ok_or(ClientError::NotFound)
    }

    /// Reads the sub-columns of one super column.
    pub fn get_super_column(
        &self,
        key: impl Into<Value>,
        super_column: impl Into<Value>,
        query: &SliceQuery,
    ) -> ClientResult<Cell> {
        let name = super_column.into();
        let query = query.clone().super_column(name.clone());
        let row = self.get(key, &query)?;
        Ok(Cell::Super {
            name,
            columns: row.cells,
        })
    }

    /// Reads several rows, in the order the keys were given.
    ///
    /// Rows with no matching columns are left out. Keys are sent in chunks
    /// of `multiget_buffer_size`.
    pub fn multiget(&self, keys: &[Value], query: &SliceQuery) -> ClientResult<Vec<Row>> {
        let packed = self.pack_keys(keys)?;
        let parent = self.parent(query.super_column.as_ref())?;
        let predicate = self.predicate(query)?;
        let cl = self.read_consistency(query);

        let mut rows = Vec::new();
        for (chunk, keys) in packed
            .chunks(self.options.multiget_buffer_size)
            .zip(keys.chunks(self.options.multiget_buffer_size))
        {
            let mut found = self.pool.call("multiget_slice", |c| {
                c.multiget_slice(chunk, &parent, &predicate, cl)
            })?;
            for (packed_key, key) in chunk.iter().zip(keys) {
                match found.remove(packed_key) {
                    Some(columns) if !columns.is_empty() => {
                        rows.push(Row::new(key.clone(), self.decode(columns)?));
                    }
                    _ => {}
                }
            }
        }
        Ok(rows)
    }

    /// Counts the columns of one row matched by the query.
    pub fn get_count(&self, key: impl Into<Value>, query: &SliceQuery) -> ClientResult<usize> {
        let packed = self.pack_key(&key.into())?;
        let parent = self.parent(query.super_column.as_ref())?;
        let predicate = self.predicate(query)?;
        let cl = self.read_consistency(query);

        let count = self
            .pool
            .call("get_count", |c| c.get_count(&packed, &parent, &predicate, cl))?;
        column_count(count)
    }

    /// Counts columns across several rows, in the order the keys were given.
    pub fn multiget_count(
        &self,
        keys: &[Value],
        query: &SliceQuery,
    ) -> ClientResult<Vec<(Value, usize)>> {
        let packed = self.pack_keys(keys)?;
        let parent = self.parent(query.super_column.as_ref())?;
        let predicate = self.predicate(query)?;
        let cl = self.read_consistency(query);

        let mut counts = Vec::with_capacity(keys.len());
        for (chunk, keys) in packed
            .chunks(self.options.multiget_buffer_size)
            .zip(keys.chunks(self.options.multiget_buffer_size))
        {
            let found = self.pool.call("multiget_count", |c| {
                c.multiget_count(chunk, &parent, &predicate, cl)
            })?;
            for (packed_key, key) in chunk.iter().zip(keys) {
                let count = found.get(packed_key).copied().unwrap_or(0);
                counts.push((key.clone(), column_count(count)?));
            }
        }
        Ok(counts)
    }

    /// Scans a key range lazily, one page at a time.
    pub fn get_range(&self, range: &RangeQuery) -> ClientResult<RangeIter<'_>> {
        let start = range
            .start
            .as_ref()
            .map(|k| self.pack_key(k))
            .transpose()?
            .unwrap_or_default();
        let end_key = range
            .finish
            .as_ref()
            .map(|k| self.pack_key(k))
            .transpose()?
            .unwrap_or_default();
        let pages = RangePages {
            pool: &self.pool,
            parent: self.parent(range.slice.super_column.as_ref())?,
            predicate: self.predicate(&range.slice)?,
            end_key,
            consistency: self.read_consistency(&range.slice),
        };
        let buffer_size = range.buffer_size.unwrap_or(self.options.buffer_size);
        let cursor = PageCursor::new(pages, start, buffer_size)?.row_count(range.row_count);
        Ok(RowIter::new(self, cursor))
    }

    /// Scans rows matching a secondary-index clause lazily.
    ///
    /// Each expression value is packed with the validator of its column.
    pub fn get_indexed_slices(
        &self,
        clause: &IndexClause,
        query: &SliceQuery,
    ) -> ClientResult<IndexedIter<'_>> {
        let expressions = clause
            .expressions
            .iter()
            .map(|e| -> ClientResult<WireIndexExpression> {
                let column_name = pack_name(&self.schema.column_name_type, &e.column)?;
                let value = self
                    .schema
                    .validator(&column_name)
                    .pack(&e.value, PackContext::value())?;
                Ok(WireIndexExpression {
                    column_name,
                    op: e.op,
                    value,
                })
            })
            .collect::<ClientResult<Vec<_>>>()?;
        let start = clause
            .start_key
            .as_ref()
            .map(|k| self.pack_key(k))
            .transpose()?
            .unwrap_or_default();

        let pages = IndexPages {
            pool: &self.pool,
            parent: self.parent(None)?,
            predicate: self.predicate(query)?,
            expressions,
            consistency: self.read_consistency(query),
        };
        let buffer_size = clause.buffer_size.unwrap_or(self.options.buffer_size);
        let cursor = PageCursor::new(pages, start, buffer_size)?.row_count(clause.count);
        Ok(RowIter::new(self, cursor))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Writes columns to one row. Returns the timestamp used.
    pub fn insert(
        &self,
        key: impl Into<Value>,
        columns: &ColumnMap,
        options: &WriteOptions,
    ) -> ClientResult<i64> {
        let timestamp = options.resolve_timestamp();
        let mut mutations = MutationMap::new();
        mutations.extend(
            self.pack_key(&key.into())?,
            self.name(),
            self.insert_mutations(columns, timestamp, options.ttl)?,
        );
        self.send(&mutations, options)?;
        Ok(timestamp)
    }

    /// Writes columns to several rows in one request. Returns the timestamp
    /// used.
    pub fn batch_insert(
        &self,
        rows: &[(Value, ColumnMap)],
        options: &WriteOptions,
    ) -> ClientResult<i64> {
        let timestamp = options.resolve_timestamp();
        let mut mutations = MutationMap::new();
        for (key, columns) in rows {
            mutations.extend(
                self.pack_key(key)?,
                self.name(),
                self.insert_mutations(columns, timestamp, options.ttl)?,
            );
        }
        if !mutations.is_empty() {
            self.send(&mutations, options)?;
        }
        Ok(timestamp)
    }

    /// Removes a whole row, or only the named columns (super columns on a
    /// super table). Returns the timestamp used.
    pub fn remove(
        &self,
        key: impl Into<Value>,
        columns: Option<&[Value]>,
        options: &WriteOptions,
    ) -> ClientResult<i64> {
        self.remove_from(key.into(), None, columns, options)
    }

    /// Removes a super column, or only the named sub-columns of it.
    pub fn remove_super_column(
        &self,
        key: impl Into<Value>,
        super_column: impl Into<Value>,
        columns: Option<&[Value]>,
        options: &WriteOptions,
    ) -> ClientResult<i64> {
        self.remove_from(key.into(), Some(super_column.into()), columns, options)
    }

    /// Removes every row of the table.
    pub fn truncate(&self) -> ClientResult<()> {
        let name = self.schema.name.clone();
        self.pool.call("truncate", |c| c.truncate(&name))
    }

    // =========================================================================
    // Counters
    // =========================================================================

    /// Adds `amount` to a counter. Retried increments may be counted twice.
    pub fn add(
        &self,
        key: impl Into<Value>,
        column: impl Into<Value>,
        amount: i64,
        super_column: Option<Value>,
    ) -> ClientResult<()> {
        self.require_counter(true)?;
        let packed = self.pack_key(&key.into())?;
        let parent = self.parent(super_column.as_ref())?;
        let counter = CounterColumn {
            name: pack_name(&self.schema.column_name_type, &column.into())?,
            value: amount,
        };
        let cl = self.options.write_consistency;
        self.pool
            .call("add", |c| c.add(&packed, &parent, &counter, cl))
    }

    /// Removes a counter.
    pub fn remove_counter(
        &self,
        key: impl Into<Value>,
        column: impl Into<Value>,
        super_column: Option<Value>,
    ) -> ClientResult<()> {
        self.require_counter(true)?;
        let packed = self.pack_key(&key.into())?;
        let mut path = ColumnPath::new(self.name());
        path.super_column = self.pack_super_column(super_column.as_ref())?;
        path.column = Some(pack_name(&self.schema.column_name_type, &column.into())?);
        let cl = self.options.write_consistency;
        self.pool
            .call("remove_counter", |c| c.remove_counter(&packed, &path, cl))
    }

    // =========================================================================
    // Packing
    // =========================================================================

    /// Packs a row key. Empty keys are rejected.
    pub fn pack_key(&self, key: &Value) -> ClientResult<Bytes> {
        let packed = self.schema.key_type.pack(key, PackContext::value())?;
        if packed.is_empty() {
            return Err(ClientError::InvalidConfig(
                "row keys must not be empty".to_string(),
            ));
        }
        Ok(packed)
    }

    /// Unpacks a row key.
    pub fn unpack_key(&self, key: &[u8]) -> ClientResult<Value> {
        Ok(self.schema.key_type.unpack(key)?)
    }

    fn pack_keys(&self, keys: &[Value]) -> ClientResult<Vec<Bytes>> {
        keys.iter().map(|k| self.pack_key(k)).collect()
    }

    fn pack_super_column(&self, super_column: Option<&Value>) -> ClientResult<Option<Bytes>> {
        let Some(name) = super_column else {
            return Ok(None);
        };
        match &self.schema.super_column_name_type {
            Some(super_type) => Ok(Some(pack_name(super_type, name)?)),
            None => Err(ClientError::InvalidConfig(format!(
                "{} is not a super column family",
                self.name()
            ))),
        }
    }

    fn parent(&self, super_column: Option<&Value>) -> ClientResult<ColumnParent> {
        let mut parent = ColumnParent::new(self.name());
        parent.super_column = self.pack_super_column(super_column)?;
        Ok(parent)
    }

    fn predicate(&self, query: &SliceQuery) -> ClientResult<SlicePredicate> {
        let comparator = self.schema.slice_name_type(query.super_column.is_some());
        SlicePredicateBuilder::new(comparator).build(query)
    }

    fn read_consistency(&self, query: &SliceQuery) -> ConsistencyLevel {
        query.read_consistency.unwrap_or(self.options.read_consistency)
    }

    fn require_counter(&self, counter: bool) -> ClientResult<()> {
        match (self.schema.kind.is_counter(), counter) {
            (true, false) => Err(ClientError::InvalidConfig(format!(
                "{} is a counter column family",
                self.name()
            ))),
            (false, true) => Err(ClientError::InvalidConfig(format!(
                "{} is not a counter column family",
                self.name()
            ))),
            _ => Ok(()),
        }
    }

    fn send(&self, mutations: &MutationMap, options: &WriteOptions) -> ClientResult<()> {
        let cl = options.consistency.unwrap_or(self.options.write_consistency);
        self.pool
            .call("batch_mutate", |c| c.batch_mutate(mutations, cl))
    }

    fn remove_from(
        &self,
        key: Value,
        super_column: Option<Value>,
        columns: Option<&[Value]>,
        options: &WriteOptions,
    ) -> ClientResult<i64> {
        self.require_counter(false)?;
        let timestamp = options.resolve_timestamp();
        let packed = self.pack_key(&key)?;
        let cl = options.consistency.unwrap_or(self.options.write_consistency);

        let path = match columns {
            None => {
                let mut path = ColumnPath::new(self.name());
                path.super_column = self.pack_super_column(super_column.as_ref())?;
                Some(path)
            }
            Some([name]) => {
                let mut path = ColumnPath::new(self.name());
                let name = pack_name(self.schema.slice_name_type(super_column.is_some()), name)?;
                if self.schema.kind.is_super() && super_column.is_none() {
                    path.super_column = Some(name);
                } else {
                    path.super_column = self.pack_super_column(super_column.as_ref())?;
                    path.column = Some(name);
                }
                Some(path)
            }
            Some(_) => None,
        };

        match path {
            Some(path) => self
                .pool
                .call("remove", |c| c.remove(&packed, &path, timestamp, cl))?,
            None => {
                let mut mutations = MutationMap::new();
                mutations.push(
                    packed,
                    self.name(),
                    self.deletion(columns, super_column.as_ref(), timestamp)?,
                );
                self.send(&mutations, options)?;
            }
        }
        Ok(timestamp)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Builds the insert mutations for one row.
    pub(crate) fn insert_mutations(
        &self,
        columns: &ColumnMap,
        timestamp: i64,
        ttl: Option<i32>,
    ) -> ClientResult<Vec<Mutation>> {
        self.require_counter(false)?;
        if columns.is_super() != self.schema.kind.is_super() {
            return Err(ClientError::InvalidConfig(format!(
                "{} columns cannot be written to {:?} column family {}",
                if columns.is_super() { "super" } else { "standard" },
                self.schema.kind,
                self.name()
            )));
        }
        if columns.is_empty() {
            return Err(ClientError::InvalidConfig("no columns to insert".to_string()));
        }

        match columns {
            ColumnMap::Standard(pairs) => pairs
                .iter()
                .map(|(n, v)| {
                    self.pack_column(n, v, timestamp, ttl)
                        .map(|c| Mutation::Insert(ColumnOrSuperColumn::Column(c)))
                })
                .collect(),
            ColumnMap::Super(supers) => supers
                .iter()
                .filter(|(_, pairs)| !pairs.is_empty())
                .map(|(sc, pairs)| -> ClientResult<Mutation> {
                    let name = self.pack_super_column(Some(sc))?.unwrap_or_default();
                    let columns = pairs
                        .iter()
                        .map(|(n, v)| self.pack_column(n, v, timestamp, ttl))
                        .collect::<ClientResult<Vec<_>>>()?;
                    Ok(Mutation::Insert(ColumnOrSuperColumn::SuperColumn(
                        SuperColumn { name, columns },
                    )))
                })
                .collect(),
        }
    }

    /// Builds a deletion of a row, some columns, or (part of) a super column.
    pub(crate) fn deletion(
        &self,
        columns: Option<&[Value]>,
        super_column: Option<&Value>,
        timestamp: i64,
    ) -> ClientResult<Mutation> {
        let predicate = match columns {
            Some(names) => Some(
                SlicePredicateBuilder::new(self.schema.slice_name_type(super_column.is_some()))
                    .names(names)?,
            ),
            None => None,
        };
        Ok(Mutation::Delete(Deletion {
            timestamp: Some(timestamp),
            super_column: self.pack_super_column(super_column)?,
            predicate,
        }))
    }

    /// Builds a counter increment.
    pub(crate) fn counter_mutation(
        &self,
        column: &Value,
        amount: i64,
        super_column: Option<&Value>,
    ) -> ClientResult<Mutation> {
        self.require_counter(true)?;
        let counter = CounterColumn {
            name: pack_name(&self.schema.column_name_type, column)?,
            value: amount,
        };
        let cosc = match self.pack_super_column(super_column)? {
            Some(name) => ColumnOrSuperColumn::CounterSuperColumn(CounterSuperColumn {
                name,
                columns: vec![counter],
            }),
            None if self.schema.kind.is_super() => {
                return Err(ClientError::InvalidConfig(
                    "super counter increments need a super column".to_string(),
                ))
            }
            None => ColumnOrSuperColumn::CounterColumn(counter),
        };
        Ok(Mutation::Insert(cosc))
    }

    fn pack_column(
        &self,
        name: &Value,
        value: &Value,
        timestamp: i64,
        ttl: Option<i32>,
    ) -> ClientResult<Column> {
        let name = pack_name(&self.schema.column_name_type, name)?;
        let value = self
            .schema
            .validator(&name)
            .pack(value, PackContext::value())?;
        Ok(Column {
            name,
            value,
            timestamp,
            ttl,
        })
    }

    // =========================================================================
    // Decoding
    // =========================================================================

    /// Decodes the columns of one row.
    pub(crate) fn decode(&self, columns: Vec<ColumnOrSuperColumn>) -> ClientResult<Vec<Cell>> {
        columns.into_iter().map(|c| self.decode_one(c)).collect()
    }

    fn decode_one(&self, cosc: ColumnOrSuperColumn) -> ClientResult<Cell> {
        match cosc {
            ColumnOrSuperColumn::Column(c) => self.decode_column(c),
            ColumnOrSuperColumn::CounterColumn(c) => self.decode_counter(c),
            ColumnOrSuperColumn::SuperColumn(sc) => Ok(Cell::Super {
                name: self.schema.slice_name_type(false).unpack(&sc.name)?,
                columns: sc
                    .columns
                    .into_iter()
                    .map(|c| self.decode_column(c))
                    .collect::<ClientResult<_>>()?,
            }),
            ColumnOrSuperColumn::CounterSuperColumn(sc) => Ok(Cell::Super {
                name: self.schema.slice_name_type(false).unpack(&sc.name)?,
                columns: sc
                    .columns
                    .into_iter()
                    .map(|c| self.decode_counter(c))
                    .collect::<ClientResult<_>>()?,
            }),
        }
    }

    fn decode_column(&self, column: Column) -> ClientResult<Cell> {
        Ok(Cell::Column {
            name: self.schema.column_name_type.unpack(&column.name)?,
            value: self.schema.validator(&column.name).unpack(&column.value)?,
            timestamp: column.timestamp,
            ttl: column.ttl,
        })
    }

    fn decode_counter(&self, counter: CounterColumn) -> ClientResult<Cell> {
        Ok(Cell::Counter {
            name: self.schema.column_name_type.unpack(&counter.name)?,
            value: counter.value,
        })
    }
}

/// Converts a column count from the store, which must not be negative.
fn column_count(count: i32) -> ClientResult<usize> {
    usize::try_from(count).map_err(|_| {
        ClientError::InvalidRequest(format!("store returned a negative column count: {}", count))
    })
}
