//! Client-wide constants.
//!
//! Defaults shared by the pool, the table handle and the range iterators.

// =============================================================================
// Read Limits
// =============================================================================

/// Default maximum number of rows returned by a range read.
pub const DEFAULT_ROW_COUNT: usize = 100;

/// Default maximum number of columns fetched per row.
pub const DEFAULT_COLUMN_COUNT: i32 = 100;

/// Largest column count the store accepts (2^31 - 1).
///
/// Used by the count operations, which must see every column.
pub const MAX_COUNT: i32 = i32::MAX;

/// Default number of rows fetched per page during a range scan.
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Smallest usable page size.
///
/// Each follow-up page repeats the previous page's last key, so a page of one
/// row can never make progress.
pub const MIN_BUFFER_SIZE: usize = 2;

/// Default number of keys sent in a single `multiget_slice` call.
pub const DEFAULT_MULTIGET_BUFFER_SIZE: usize = 16;

// =============================================================================
// Connection Pool
// =============================================================================

/// Default RPC port of a store node.
pub const DEFAULT_PORT: u16 = 9160;

/// Default endpoint when none is configured.
pub const DEFAULT_SERVER: &str = "localhost:9160";

/// Default number of attempts made by a pooled call.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default number of operations a connection serves before it is recycled.
pub const DEFAULT_RECYCLE: u64 = 10_000;

/// Default socket send timeout in milliseconds.
pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 5_000;

/// Default socket receive timeout in milliseconds.
pub const DEFAULT_RECV_TIMEOUT_MS: u64 = 5_000;

/// Default first retry delay in milliseconds.
pub const DEFAULT_BASE_BACKOFF_MS: u64 = 10;

/// Default ceiling on a single retry delay in milliseconds.
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 1_000;

/// Default time a caller waits for a free connection, in milliseconds.
pub const DEFAULT_POOL_TIMEOUT_MS: u64 = 30_000;

// =============================================================================
// Composite Encoding
// =============================================================================

/// End-of-component byte for an exact component.
pub const EOC_EXACT: u8 = 0x00;

/// End-of-component byte that sorts before every longer composite sharing the
/// prefix.
pub const EOC_LESS: u8 = 0xFF;

/// End-of-component byte that sorts after every longer composite sharing the
/// prefix.
pub const EOC_GREATER: u8 = 0x01;
