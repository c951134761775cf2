//! Row storage behind [`MemoryCluster`](super::MemoryCluster).
//!
//! Rows are kept in byte order of their keys. Columns within a row are kept
//! sorted by the table comparator, so slices behave the way they do on a
//! real node. Deleting columns never deletes the row itself: a row whose
//! columns are all gone stays behind as an empty "ghost" until the table is
//! truncated.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;

use bytes::Bytes;
use colonnade_common::types::{
    CfDef, Column, ColumnDef, ColumnOrSuperColumn, ColumnParent, ColumnPath, CounterColumn,
    CounterSuperColumn, Deletion, IndexClause, KeyRange, KeySlice, KsDef, Mutation, MutationMap,
    SlicePredicate, SuperColumn,
};
use colonnade_marshal::{DataType, TypeCodec, TypeRegistry};

use crate::transport::{RpcError, RpcResult};

// =============================================================================
// Sorted column lists
// =============================================================================

#[derive(Debug, Clone)]
enum Val {
    Cell {
        value: Bytes,
        timestamp: i64,
        ttl: Option<i32>,
    },
    Counter(i64),
}

impl Val {
    /// Whether a deletion at `timestamp` shadows this value.
    fn shadowed_by(&self, timestamp: Option<i64>) -> bool {
        match (self, timestamp) {
            (Val::Cell { timestamp: ts, .. }, Some(deleted_at)) => *ts <= deleted_at,
            _ => true,
        }
    }
}

/// Name-ordered entries under one comparator.
#[derive(Debug, Clone)]
struct Sorted<V> {
    entries: Vec<(Bytes, V)>,
}

impl<V> Default for Sorted<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> Sorted<V> {
    fn position(&self, cmp: &DataType, name: &[u8]) -> Result<usize, usize> {
        self.entries.binary_search_by(|(n, _)| cmp.compare(n, name))
    }

    fn get(&self, cmp: &DataType, name: &[u8]) -> Option<&V> {
        self.position(cmp, name).ok().map(|i| &self.entries[i].1)
    }

    fn get_or_insert_with(&mut self, cmp: &DataType, name: &Bytes, default: impl FnOnce() -> V) -> &mut V {
        let idx = match self.position(cmp, name) {
            Ok(i) => i,
            Err(i) => {
                self.entries.insert(i, (name.clone(), default()));
                i
            }
        };
        &mut self.entries[idx].1
    }

    /// Entries matched by a predicate, in the order the predicate asks for.
    fn select(&self, cmp: &DataType, predicate: &SlicePredicate) -> Vec<&(Bytes, V)> {
        if let Some(names) = &predicate.column_names {
            let mut found: Vec<usize> = names
                .iter()
                .filter_map(|n| self.position(cmp, n).ok())
                .collect();
            found.sort_unstable();
            found.dedup();
            return found.into_iter().map(|i| &self.entries[i]).collect();
        }

        let Some(range) = &predicate.slice_range else {
            return self.entries.iter().collect();
        };
        let count = usize::try_from(range.count).unwrap_or(0);
        let (low, high) = if range.reversed {
            (&range.finish, &range.start)
        } else {
            (&range.start, &range.finish)
        };
        let in_range = |name: &Bytes| {
            (low.is_empty() || cmp.compare(name, low) != Ordering::Less)
                && (high.is_empty() || cmp.compare(name, high) != Ordering::Greater)
        };

        if range.reversed {
            self.entries
                .iter()
                .rev()
                .filter(|(n, _)| in_range(n))
                .take(count)
                .collect()
        } else {
            self.entries
                .iter()
                .filter(|(n, _)| in_range(n))
                .take(count)
                .collect()
        }
    }

    fn selected_names(&self, cmp: &DataType, predicate: Option<&SlicePredicate>) -> HashSet<Bytes> {
        match predicate {
            Some(p) => self.select(cmp, p).into_iter().map(|(n, _)| n.clone()).collect(),
            None => self.entries.iter().map(|(n, _)| n.clone()).collect(),
        }
    }
}

impl Sorted<Val> {
    fn delete(&mut self, cmp: &DataType, predicate: Option<&SlicePredicate>, timestamp: Option<i64>) {
        let doomed = self.selected_names(cmp, predicate);
        self.entries
            .retain(|(n, v)| !(doomed.contains(n) && v.shadowed_by(timestamp)));
    }

    fn put(&mut self, cmp: &DataType, column: &Column) {
        let slot = self.get_or_insert_with(cmp, &column.name, || Val::Cell {
            value: Bytes::new(),
            timestamp: i64::MIN,
            ttl: None,
        });
        if let Val::Cell { timestamp, .. } = &*slot {
            if *timestamp > column.timestamp {
                return;
            }
        }
        *slot = Val::Cell {
            value: column.value.clone(),
            timestamp: column.timestamp,
            ttl: column.ttl,
        };
    }

    fn increment(&mut self, cmp: &DataType, column: &CounterColumn) {
        let slot = self.get_or_insert_with(cmp, &column.name, || Val::Counter(0));
        match slot {
            Val::Counter(v) => *v = v.wrapping_add(column.value),
            other => *other = Val::Counter(column.value),
        }
    }

    fn split_wire(&self) -> (Vec<Column>, Vec<CounterColumn>) {
        let mut columns = Vec::new();
        let mut counters = Vec::new();
        for (name, val) in &self.entries {
            match to_wire(name, val) {
                ColumnOrSuperColumn::Column(c) => columns.push(c),
                ColumnOrSuperColumn::CounterColumn(c) => counters.push(c),
                _ => {}
            }
        }
        (columns, counters)
    }
}

fn to_wire(name: &Bytes, val: &Val) -> ColumnOrSuperColumn {
    match val {
        Val::Cell {
            value,
            timestamp,
            ttl,
        } => ColumnOrSuperColumn::Column(Column {
            name: name.clone(),
            value: value.clone(),
            timestamp: *timestamp,
            ttl: *ttl,
        }),
        Val::Counter(v) => ColumnOrSuperColumn::CounterColumn(CounterColumn {
            name: name.clone(),
            value: *v,
        }),
    }
}

// =============================================================================
// Tables
// =============================================================================

#[derive(Debug, Clone)]
enum RowData {
    Flat(Sorted<Val>),
    Super(Sorted<Sorted<Val>>),
}

impl RowData {
    fn is_empty(&self) -> bool {
        match self {
            RowData::Flat(cols) => cols.entries.is_empty(),
            RowData::Super(scs) => scs.entries.is_empty(),
        }
    }
}

#[derive(Debug)]
struct Table {
    def: CfDef,
    counter: bool,
    comparator: DataType,
    subcomparator: DataType,
    default_validator: DataType,
    validators: HashMap<Bytes, DataType>,
    rows: BTreeMap<Bytes, RowData>,
}

impl Table {
    fn new(def: CfDef, registry: &TypeRegistry) -> Self {
        let default_validator = registry.resolve(&def.default_validation_class);
        let validators = def
            .column_metadata
            .iter()
            .map(|c| (c.name.clone(), registry.resolve(&c.validation_class)))
            .collect();
        Self {
            counter: default_validator.is_counter(),
            comparator: registry.resolve(&def.comparator_type),
            subcomparator: registry.resolve(def.subcomparator_type.as_deref().unwrap_or_default()),
            default_validator,
            validators,
            rows: BTreeMap::new(),
            def,
        }
    }

    fn validator(&self, name: &[u8]) -> &DataType {
        self.validators.get(name).unwrap_or(&self.default_validator)
    }

    /// Comparator for the names a flat write or read addresses.
    fn column_comparator(&self) -> &DataType {
        if self.def.is_super() {
            &self.subcomparator
        } else {
            &self.comparator
        }
    }

    fn check_parent(&self, super_column: Option<&Bytes>) -> RpcResult<()> {
        if super_column.is_some() && !self.def.is_super() {
            return Err(RpcError::InvalidRequest(format!(
                "{} is a standard column family; super_column is not allowed",
                self.def.name
            )));
        }
        Ok(())
    }

    fn require_counter(&self, counter: bool) -> RpcResult<()> {
        match (self.counter, counter) {
            (true, false) => Err(RpcError::InvalidRequest(format!(
                "{} holds counters; use add or remove_counter",
                self.def.name
            ))),
            (false, true) => Err(RpcError::InvalidRequest(format!(
                "{} does not hold counters",
                self.def.name
            ))),
            _ => Ok(()),
        }
    }

    fn validate_name(&self, cmp: &DataType, name: &Bytes) -> RpcResult<()> {
        if name.is_empty() {
            return Err(RpcError::InvalidRequest(
                "column name must not be empty".to_string(),
            ));
        }
        cmp.unpack(name)
            .map(|_| ())
            .map_err(|e| RpcError::InvalidRequest(format!("invalid column name: {}", e)))
    }

    fn validate_column(&self, cmp: &DataType, column: &Column) -> RpcResult<()> {
        self.validate_name(cmp, &column.name)?;
        self.validator(&column.name)
            .unpack(&column.value)
            .map(|_| ())
            .map_err(|e| RpcError::InvalidRequest(format!("invalid column value: {}", e)))
    }

    fn row_mut(&mut self, key: &Bytes) -> RpcResult<&mut RowData> {
        if key.is_empty() {
            return Err(RpcError::InvalidRequest("key may not be empty".to_string()));
        }
        let is_super = self.def.is_super();
        Ok(self.rows.entry(key.clone()).or_insert_with(|| {
            if is_super {
                RowData::Super(Sorted::default())
            } else {
                RowData::Flat(Sorted::default())
            }
        }))
    }

    fn slice(
        &self,
        row: &RowData,
        super_column: Option<&Bytes>,
        predicate: &SlicePredicate,
    ) -> Vec<ColumnOrSuperColumn> {
        match (row, super_column) {
            (RowData::Flat(cols), _) => cols
                .select(&self.comparator, predicate)
                .into_iter()
                .map(|(n, v)| to_wire(n, v))
                .collect(),
            (RowData::Super(scs), None) => scs
                .select(&self.comparator, predicate)
                .into_iter()
                .map(|(name, sub)| self.super_to_wire(name, sub))
                .collect(),
            (RowData::Super(scs), Some(sc)) => match scs.get(&self.comparator, sc) {
                Some(sub) => sub
                    .select(&self.subcomparator, predicate)
                    .into_iter()
                    .map(|(n, v)| to_wire(n, v))
                    .collect(),
                None => Vec::new(),
            },
        }
    }

    fn super_to_wire(&self, name: &Bytes, sub: &Sorted<Val>) -> ColumnOrSuperColumn {
        let (columns, counters) = sub.split_wire();
        if self.counter {
            ColumnOrSuperColumn::CounterSuperColumn(CounterSuperColumn {
                name: name.clone(),
                columns: counters,
            })
        } else {
            ColumnOrSuperColumn::SuperColumn(SuperColumn {
                name: name.clone(),
                columns,
            })
        }
    }

    fn apply(&mut self, key: &Bytes, mutation: &Mutation) -> RpcResult<()> {
        match mutation {
            Mutation::Insert(ColumnOrSuperColumn::Column(column)) => {
                self.require_counter(false)?;
                if self.def.is_super() {
                    return Err(RpcError::InvalidRequest(
                        "a super column family needs a super column mutation".to_string(),
                    ));
                }
                self.validate_column(&self.comparator, column)?;
                let cmp = self.comparator.clone();
                if let RowData::Flat(cols) = self.row_mut(key)? {
                    cols.put(&cmp, column);
                }
            }
            Mutation::Insert(ColumnOrSuperColumn::SuperColumn(sc)) => {
                self.require_counter(false)?;
                self.check_super(&sc.name)?;
                for column in &sc.columns {
                    self.validate_column(&self.subcomparator, column)?;
                }
                let (cmp, sub_cmp) = (self.comparator.clone(), self.subcomparator.clone());
                if let RowData::Super(scs) = self.row_mut(key)? {
                    let sub = scs.get_or_insert_with(&cmp, &sc.name, Sorted::default);
                    for column in &sc.columns {
                        sub.put(&sub_cmp, column);
                    }
                }
            }
            Mutation::Insert(ColumnOrSuperColumn::CounterColumn(counter)) => {
                self.increment(key, None, counter)?;
            }
            Mutation::Insert(ColumnOrSuperColumn::CounterSuperColumn(sc)) => {
                for counter in &sc.columns {
                    self.increment(key, Some(&sc.name), counter)?;
                }
            }
            Mutation::Delete(deletion) => self.delete(key, deletion)?,
        }
        Ok(())
    }

    fn check_super(&self, name: &Bytes) -> RpcResult<()> {
        if !self.def.is_super() {
            return Err(RpcError::InvalidRequest(format!(
                "{} is a standard column family",
                self.def.name
            )));
        }
        self.validate_name(&self.comparator, name)
    }

    fn increment(
        &mut self,
        key: &Bytes,
        super_column: Option<&Bytes>,
        counter: &CounterColumn,
    ) -> RpcResult<()> {
        self.require_counter(true)?;
        self.check_parent(super_column)?;
        if self.def.is_super() && super_column.is_none() {
            return Err(RpcError::InvalidRequest(
                "a super counter column family needs a super column".to_string(),
            ));
        }
        self.validate_name(self.column_comparator(), &counter.name)?;
        let (cmp, sub_cmp) = (self.comparator.clone(), self.subcomparator.clone());
        match (self.row_mut(key)?, super_column) {
            (RowData::Flat(cols), _) => cols.increment(&cmp, counter),
            (RowData::Super(scs), Some(sc)) => scs
                .get_or_insert_with(&cmp, sc, Sorted::default)
                .increment(&sub_cmp, counter),
            (RowData::Super(_), None) => {}
        }
        Ok(())
    }

    fn delete(&mut self, key: &Bytes, deletion: &Deletion) -> RpcResult<()> {
        self.check_parent(deletion.super_column.as_ref())?;
        let (cmp, sub_cmp) = (self.comparator.clone(), self.subcomparator.clone());
        let Some(row) = self.rows.get_mut(key) else {
            return Ok(());
        };
        let predicate = deletion.predicate.as_ref();
        let timestamp = deletion.timestamp;
        match (row, deletion.super_column.as_ref()) {
            (RowData::Flat(cols), _) => cols.delete(&cmp, predicate, timestamp),
            (RowData::Super(scs), None) => {
                let doomed = scs.selected_names(&cmp, predicate);
                for (name, sub) in &mut scs.entries {
                    if doomed.contains(name) {
                        sub.delete(&sub_cmp, None, timestamp);
                    }
                }
                scs.entries.retain(|(_, sub)| !sub.entries.is_empty());
            }
            (RowData::Super(scs), Some(sc)) => {
                if let Ok(i) = scs.position(&cmp, sc) {
                    scs.entries[i].1.delete(&sub_cmp, predicate, timestamp);
                    if scs.entries[i].1.entries.is_empty() {
                        scs.entries.remove(i);
                    }
                }
            }
        }
        Ok(())
    }

    fn matches(&self, row: &RowData, clause: &IndexClause) -> bool {
        let RowData::Flat(cols) = row else {
            return false;
        };
        clause.expressions.iter().all(|expr| {
            match cols.get(&self.comparator, &expr.column_name) {
                Some(Val::Cell { value, .. }) => expr
                    .op
                    .matches(self.validator(&expr.column_name).compare(value, &expr.value)),
                _ => false,
            }
        })
    }
}

// =============================================================================
// Keyspace
// =============================================================================

/// All tables of one keyspace.
#[derive(Debug)]
pub(super) struct Store {
    keyspace: KsDef,
    tables: HashMap<String, Table>,
}

impl Store {
    pub(super) fn new(keyspace: KsDef, registry: &TypeRegistry) -> Self {
        let tables = keyspace
            .cf_defs
            .iter()
            .map(|def| (def.name.clone(), Table::new(def.clone(), registry)))
            .collect();
        Self { keyspace, tables }
    }

    pub(super) fn keyspace(&self) -> &KsDef {
        &self.keyspace
    }

    fn table(&self, name: &str) -> RpcResult<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| RpcError::InvalidRequest(format!("unconfigured column family {}", name)))
    }

    fn table_mut(&mut self, name: &str) -> RpcResult<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| RpcError::InvalidRequest(format!("unconfigured column family {}", name)))
    }

    pub(super) fn get_slice(
        &self,
        key: &Bytes,
        parent: &ColumnParent,
        predicate: &SlicePredicate,
    ) -> RpcResult<Vec<ColumnOrSuperColumn>> {
        let table = self.table(&parent.column_family)?;
        table.check_parent(parent.super_column.as_ref())?;
        Ok(table
            .rows
            .get(key)
            .map(|row| table.slice(row, parent.super_column.as_ref(), predicate))
            .unwrap_or_default())
    }

    pub(super) fn range_slices(
        &self,
        parent: &ColumnParent,
        predicate: &SlicePredicate,
        range: &KeyRange,
    ) -> RpcResult<Vec<KeySlice>> {
        let table = self.table(&parent.column_family)?;
        table.check_parent(parent.super_column.as_ref())?;
        if !range.start_key.is_empty()
            && !range.end_key.is_empty()
            && range.start_key > range.end_key
        {
            return Err(RpcError::InvalidRequest(
                "start key must sort before end key".to_string(),
            ));
        }
        let count = usize::try_from(range.count).unwrap_or(0);
        Ok(table
            .rows
            .range((bound(&range.start_key), bound(&range.end_key)))
            .take(count)
            .map(|(key, row)| KeySlice {
                key: key.clone(),
                columns: table.slice(row, parent.super_column.as_ref(), predicate),
            })
            .collect())
    }

    pub(super) fn indexed_slices(
        &self,
        parent: &ColumnParent,
        clause: &IndexClause,
        predicate: &SlicePredicate,
    ) -> RpcResult<Vec<KeySlice>> {
        let table = self.table(&parent.column_family)?;
        if table.def.is_super() {
            return Err(RpcError::InvalidRequest(
                "secondary indexes are not supported on super column families".to_string(),
            ));
        }
        let indexed = clause.expressions.iter().any(|e| {
            table
                .def
                .column_def(&e.column_name)
                .map_or(false, ColumnDef::is_indexed)
        });
        if !indexed {
            return Err(RpcError::InvalidRequest(
                "no indexed columns present in index clause".to_string(),
            ));
        }
        let count = usize::try_from(clause.count).unwrap_or(0);
        Ok(table
            .rows
            .range((bound(&clause.start_key), Bound::Unbounded))
            .filter(|(_, row)| table.matches(row, clause))
            .take(count)
            .map(|(key, row)| KeySlice {
                key: key.clone(),
                columns: table.slice(row, None, predicate),
            })
            .collect())
    }

    pub(super) fn batch_mutate(&mut self, mutations: &MutationMap) -> RpcResult<()> {
        // Reject the whole batch before applying any of it.
        for (_, cf, _) in mutations.iter() {
            self.table(cf)?;
        }
        for (key, cf, list) in mutations.iter() {
            let table = self.table_mut(cf)?;
            for mutation in list {
                table.apply(key, mutation)?;
            }
        }
        Ok(())
    }

    pub(super) fn remove(
        &mut self,
        key: &Bytes,
        path: &ColumnPath,
        timestamp: Option<i64>,
    ) -> RpcResult<()> {
        let table = self.table_mut(&path.column_family)?;
        table.require_counter(timestamp.is_none())?;
        table.check_parent(path.super_column.as_ref())?;
        let deletion = match (&path.super_column, &path.column) {
            (None, None) => Deletion {
                timestamp,
                super_column: None,
                predicate: None,
            },
            (Some(sc), None) => Deletion {
                timestamp,
                super_column: None,
                predicate: Some(SlicePredicate::names(vec![sc.clone()])),
            },
            (sc, Some(column)) => Deletion {
                timestamp,
                super_column: sc.clone(),
                predicate: Some(SlicePredicate::names(vec![column.clone()])),
            },
        };
        table.delete(key, &deletion)
    }

    pub(super) fn add(
        &mut self,
        key: &Bytes,
        parent: &ColumnParent,
        column: &CounterColumn,
    ) -> RpcResult<()> {
        self.table_mut(&parent.column_family)?
            .increment(key, parent.super_column.as_ref(), column)
    }

    pub(super) fn truncate(&mut self, column_family: &str) -> RpcResult<()> {
        self.table_mut(column_family)?.rows.clear();
        Ok(())
    }

    /// Number of stored rows, ghosts included.
    pub(super) fn row_count(&self, column_family: &str) -> usize {
        self.tables.get(column_family).map_or(0, |t| t.rows.len())
    }

    /// Number of rows that still hold data.
    pub(super) fn live_row_count(&self, column_family: &str) -> usize {
        self.tables
            .get(column_family)
            .map_or(0, |t| t.rows.values().filter(|r| !r.is_empty()).count())
    }
}

fn bound(key: &Bytes) -> Bound<Bytes> {
    if key.is_empty() {
        Bound::Unbounded
    } else {
        Bound::Included(key.clone())
    }
}
