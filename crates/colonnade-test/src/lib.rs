//! # colonnade-test
//!
//! End-to-end tests for the colonnade client.
//!
//! Everything runs against [`MemoryCluster`], so the pool, the codecs and
//! the table handles are exercised exactly as they would be against a real
//! cluster, including injected failures.

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::sync::{Arc, Once};
use std::time::Duration;

use bytes::Bytes;
use colonnade_client::{
    ColumnFamily, ColumnFamilyOptions, ConnectionPool, MemoryCluster, PoolConfig,
};
use colonnade_common::types::{CfDef, ColumnDef, KsDef};
use colonnade_marshal::TypeRegistry;

/// Keyspace every fixture table lives in.
pub const KEYSPACE: &str = "Keyspace1";

/// Servers the fixture pools connect to.
pub const SERVERS: [&str; 3] = ["node1:9160", "node2:9160", "node3:9160"];

/// The fixture keyspace.
///
/// | table | shape |
/// |---|---|
/// | `Standard1` | UTF-8 names, keys and values |
/// | `Super1` | long super column names, UTF-8 sub-columns |
/// | `Counter1` | ASCII counters |
/// | `SuperCounter1` | ASCII counters under ASCII super columns |
/// | `Indexed1` | `birthdate` (long, indexed) and `state` (ASCII) |
/// | `Composite1` | `(long, ascii)` composite names |
/// | `LongKeys` | long keys and values |
/// | `Timeline` | TimeUUID names |
pub fn keyspace() -> KsDef {
    KsDef::new(KEYSPACE)
        .with_column_family(
            CfDef::new(KEYSPACE, "Standard1")
                .comparator("UTF8Type")
                .key_validation("UTF8Type")
                .default_validation("UTF8Type"),
        )
        .with_column_family(
            CfDef::new(KEYSPACE, "Super1")
                .super_family("UTF8Type")
                .comparator("LongType")
                .key_validation("UTF8Type")
                .default_validation("UTF8Type"),
        )
        .with_column_family(
            CfDef::new(KEYSPACE, "Counter1")
                .comparator("AsciiType")
                .key_validation("AsciiType")
                .default_validation("CounterColumnType"),
        )
        .with_column_family(
            CfDef::new(KEYSPACE, "SuperCounter1")
                .super_family("AsciiType")
                .comparator("AsciiType")
                .key_validation("AsciiType")
                .default_validation("CounterColumnType"),
        )
        .with_column_family(
            CfDef::new(KEYSPACE, "Indexed1")
                .comparator("UTF8Type")
                .key_validation("UTF8Type")
                .column(ColumnDef::new(Bytes::from_static(b"birthdate"), "LongType").indexed())
                .column(ColumnDef::new(Bytes::from_static(b"state"), "AsciiType")),
        )
        .with_column_family(
            CfDef::new(KEYSPACE, "Composite1")
                .comparator("CompositeType(LongType,AsciiType)")
                .key_validation("UTF8Type")
                .default_validation("UTF8Type"),
        )
        .with_column_family(
            CfDef::new(KEYSPACE, "LongKeys")
                .comparator("AsciiType")
                .key_validation("LongType")
                .default_validation("LongType"),
        )
        .with_column_family(
            CfDef::new(KEYSPACE, "Timeline")
                .comparator("TimeUUIDType")
                .key_validation("UTF8Type")
                .default_validation("UTF8Type"),
        )
}

/// A pool configuration that retries quickly.
pub fn fast_config() -> PoolConfig {
    PoolConfig::new(KEYSPACE)
        .servers(SERVERS)
        .base_backoff(Duration::from_millis(1))
        .max_backoff(Duration::from_millis(4))
        .pool_timeout(Duration::from_millis(500))
}

/// Installs a log subscriber once. Honors `RUST_LOG`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        // Another test binary may already own the global subscriber.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A cluster plus a pool connected to it.
pub struct Harness {
    /// The simulated cluster.
    pub cluster: MemoryCluster,
    /// Pool bound to [`KEYSPACE`].
    pub pool: Arc<ConnectionPool>,
    /// Registry tables are opened with.
    pub registry: TypeRegistry,
}

impl Harness {
    /// Connects with [`fast_config`].
    pub fn new() -> Self {
        Self::with_config(fast_config())
    }

    /// Connects with a custom pool configuration.
    ///
    /// # Panics
    ///
    /// Panics if the pool cannot connect.
    pub fn with_config(config: PoolConfig) -> Self {
        init_tracing();
        let cluster = MemoryCluster::new(keyspace());
        let pool = match ConnectionPool::connect(config, cluster.connector()) {
            Ok(pool) => pool,
            Err(e) => panic!("fixture pool failed to connect: {e}"),
        };
        Self {
            cluster,
            pool,
            registry: TypeRegistry::standard(),
        }
    }

    /// Opens a fixture table with default options.
    ///
    /// # Panics
    ///
    /// Panics if the table does not exist.
    pub fn open(&self, name: &str) -> ColumnFamily {
        self.open_with(name, ColumnFamilyOptions::default())
    }

    /// Opens a fixture table.
    ///
    /// # Panics
    ///
    /// Panics if the table does not exist or the options are invalid.
    pub fn open_with(&self, name: &str, options: ColumnFamilyOptions) -> ColumnFamily {
        match ColumnFamily::open_with(Arc::clone(&self.pool), name, &self.registry, options) {
            Ok(cf) => cf,
            Err(e) => panic!("failed to open {name}: {e}"),
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Zero-padded string key, so byte order matches numeric order.
pub fn key(i: usize) -> String {
    format!("key{:05}", i)
}
