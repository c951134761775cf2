//! Connection pool for managing sessions with store nodes.
//!
//! The pool keeps up to `pool_size` sessions open, spread over a shuffled
//! copy of the configured server list. Every store operation goes through
//! [`ConnectionPool::call`], which retries transient failures on a fresh
//! session with exponential backoff. Sessions are recycled after a fixed
//! number of uses so that load rebalances when nodes join the cluster.
//!
//! ```text
//!            acquire                      release
//!   free ─────────────▶ checked-out ─────────────────▶ free
//!                           │  transient failure
//!                           │  or use_count ≥ recycle
//!                           ▼
//!                          dead (closed, never reused)
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use colonnade_common::constants::{
    DEFAULT_BASE_BACKOFF_MS, DEFAULT_MAX_BACKOFF_MS, DEFAULT_MAX_RETRIES, DEFAULT_POOL_TIMEOUT_MS,
    DEFAULT_RECV_TIMEOUT_MS, DEFAULT_RECYCLE, DEFAULT_SEND_TIMEOUT_MS, DEFAULT_SERVER,
};
use colonnade_common::types::KsDef;
use parking_lot::{Condvar, Mutex, MutexGuard};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};
use crate::transport::{Cassandra, ConnectParams, Connector, Credentials, RpcResult};

/// Connection pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Keyspace every session selects.
    pub keyspace: String,
    /// Endpoints as `host:port`.
    pub servers: Vec<String>,
    /// Number of sessions to keep. Defaults to the number of servers.
    pub pool_size: Option<usize>,
    /// Attempts made by one call before giving up.
    pub max_retries: u32,
    /// Delay before the first retry; doubles with every attempt.
    pub base_backoff: Duration,
    /// Ceiling on a single retry delay.
    pub max_backoff: Duration,
    /// Uses after which a session is closed and replaced.
    pub recycle: u64,
    /// Socket send timeout.
    pub send_timeout: Duration,
    /// Socket receive timeout.
    pub recv_timeout: Duration,
    /// How long to wait for a free session when all are checked out.
    pub pool_timeout: Duration,
    /// Login credentials.
    pub credentials: Option<Credentials>,
    /// Use the framed transport.
    pub framed_transport: bool,
    /// Open every session when the pool is created.
    pub prefill: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            keyspace: String::new(),
            servers: vec![DEFAULT_SERVER.to_string()],
            pool_size: None,
            max_retries: DEFAULT_MAX_RETRIES,
            base_backoff: Duration::from_millis(DEFAULT_BASE_BACKOFF_MS),
            max_backoff: Duration::from_millis(DEFAULT_MAX_BACKOFF_MS),
            recycle: DEFAULT_RECYCLE,
            send_timeout: Duration::from_millis(DEFAULT_SEND_TIMEOUT_MS),
            recv_timeout: Duration::from_millis(DEFAULT_RECV_TIMEOUT_MS),
            pool_timeout: Duration::from_millis(DEFAULT_POOL_TIMEOUT_MS),
            credentials: None,
            framed_transport: true,
            prefill: true,
        }
    }
}

impl PoolConfig {
    /// Creates a configuration for a keyspace with default settings.
    pub fn new(keyspace: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            ..Self::default()
        }
    }

    /// Sets the server list.
    pub fn servers<I, S>(mut self, servers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.servers = servers.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the number of sessions.
    pub fn pool_size(mut self, size: usize) -> Self {
        self.pool_size = Some(size);
        self
    }

    /// Sets the attempts per call.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sets the first retry delay.
    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    /// Sets the retry delay ceiling.
    pub fn max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }

    /// Sets the recycle threshold.
    pub fn recycle(mut self, uses: u64) -> Self {
        self.recycle = uses;
        self
    }

    /// Sets the send and receive timeouts.
    pub fn timeouts(mut self, send: Duration, recv: Duration) -> Self {
        self.send_timeout = send;
        self.recv_timeout = recv;
        self
    }

    /// Sets the acquisition timeout.
    pub fn pool_timeout(mut self, timeout: Duration) -> Self {
        self.pool_timeout = timeout;
        self
    }

    /// Sets login credentials.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Chooses between the framed and buffered transport.
    pub fn framed_transport(mut self, framed: bool) -> Self {
        self.framed_transport = framed;
        self
    }

    /// Chooses whether sessions are opened eagerly.
    pub fn prefill(mut self, prefill: bool) -> Self {
        self.prefill = prefill;
        self
    }

    /// Number of sessions the pool keeps.
    pub fn effective_pool_size(&self) -> usize {
        self.pool_size.unwrap_or(self.servers.len())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        if self.keyspace.is_empty() {
            return Err(ClientError::InvalidConfig(
                "keyspace must not be empty".to_string(),
            ));
        }
        if self.servers.is_empty() {
            return Err(ClientError::InvalidConfig(
                "at least one server is required".to_string(),
            ));
        }
        if self.effective_pool_size() == 0 {
            return Err(ClientError::InvalidConfig(
                "pool_size must be greater than 0".to_string(),
            ));
        }
        if self.max_retries == 0 {
            return Err(ClientError::InvalidConfig(
                "max_retries must be greater than 0".to_string(),
            ));
        }
        if self.recycle == 0 {
            return Err(ClientError::InvalidConfig(
                "recycle must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    fn connect_params(&self) -> ConnectParams {
        ConnectParams {
            keyspace: self.keyspace.clone(),
            credentials: self.credentials.clone(),
            send_timeout: self.send_timeout,
            recv_timeout: self.recv_timeout,
            framed: self.framed_transport,
        }
    }
}

/// An open session owned by the pool.
struct Connection {
    /// The session.
    client: Box<dyn Cassandra>,
    /// Endpoint the session is connected to.
    server: String,
    /// When the session was opened.
    created_at: Instant,
    /// Number of times the session has been returned.
    use_count: u64,
}

impl Connection {
    fn new(client: Box<dyn Cassandra>, server: String) -> Self {
        Self {
            client,
            server,
            created_at: Instant::now(),
            use_count: 0,
        }
    }

    fn close(mut self) {
        self.client.close();
        debug!(server = %self.server, uses = self.use_count, "closed connection");
    }
}

/// Pool statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Sessions opened.
    pub created: u64,
    /// Calls that failed with a transient error.
    pub failed: u64,
    /// Sessions closed after reaching the recycle threshold.
    pub recycled: u64,
    /// Sessions closed for any reason.
    pub closed: u64,
    /// Total acquisitions.
    pub acquisitions: u64,
    /// Total releases.
    pub releases: u64,
    /// Acquisition timeouts.
    pub timeouts: u64,
    /// Sessions currently open.
    pub current_size: usize,
    /// Sessions waiting in the free set.
    pub idle_connections: usize,
    /// Sessions currently checked out.
    pub active_connections: usize,
}

/// Shared pool state.
struct PoolState {
    /// Free sessions, least recently used first.
    free: VecDeque<Connection>,
    /// Sessions open, free or checked out, plus slots being opened.
    live: usize,
    /// Whether the pool is closed.
    closed: bool,
}

/// A bounded, retrying pool of store sessions.
pub struct ConnectionPool {
    /// Pool configuration.
    config: PoolConfig,
    /// Target number of sessions.
    pool_size: usize,
    /// Opens sessions.
    connector: Arc<dyn Connector>,
    /// Server list in connection order.
    servers: Vec<String>,
    /// Next server to try.
    next_server: AtomicUsize,
    /// Pool state.
    state: Mutex<PoolState>,
    /// Signalled when a session is released or a slot frees up.
    released: Condvar,
    /// Statistics.
    stats: Mutex<PoolStats>,
}

impl ConnectionPool {
    /// Creates a pool without opening any session.
    pub fn new(config: PoolConfig, connector: Arc<dyn Connector>) -> ClientResult<Self> {
        config.validate()?;

        let mut servers = config.servers.clone();
        servers.shuffle(&mut rand::thread_rng());

        Ok(Self {
            pool_size: config.effective_pool_size(),
            connector,
            servers,
            next_server: AtomicUsize::new(0),
            state: Mutex::new(PoolState {
                free: VecDeque::new(),
                live: 0,
                closed: false,
            }),
            released: Condvar::new(),
            stats: Mutex::new(PoolStats::default()),
            config,
        })
    }

    /// Creates a pool and, if `prefill` is set, opens every session.
    pub fn connect(config: PoolConfig, connector: Arc<dyn Connector>) -> ClientResult<Arc<Self>> {
        let prefill = config.prefill;
        let pool = Self::new(config, connector)?;
        if prefill {
            pool.initialize()?;
        }
        Ok(Arc::new(pool))
    }

    /// Opens sessions until the pool is at capacity.
    pub fn initialize(&self) -> ClientResult<()> {
        loop {
            {
                let mut state = self.state.lock();
                if state.closed {
                    return Err(ClientError::PoolClosed);
                }
                if state.live >= self.pool_size {
                    return Ok(());
                }
                state.live += 1;
            }
            match self.open_connection() {
                Ok(conn) => {
                    self.state.lock().free.push_back(conn);
                    self.released.notify_one();
                }
                Err(e) => {
                    self.state.lock().live -= 1;
                    return Err(e);
                }
            }
        }
    }

    /// Checks out a session, opening one if the pool is below capacity.
    ///
    /// Waits up to `pool_timeout` when every session is in use.
    pub fn acquire(&self) -> ClientResult<PooledConnection<'_>> {
        let deadline = Instant::now() + self.config.pool_timeout;
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return Err(ClientError::PoolClosed);
            }

            if let Some(conn) = state.free.pop_front() {
                drop(state);
                return Ok(self.checked_out(conn));
            }

            if state.live < self.pool_size {
                state.live += 1;
                let opened = MutexGuard::unlocked(&mut state, || self.open_connection());
                return match opened {
                    Ok(conn) => {
                        drop(state);
                        Ok(self.checked_out(conn))
                    }
                    Err(e) => {
                        state.live -= 1;
                        self.released.notify_one();
                        Err(e)
                    }
                };
            }

            if self.released.wait_until(&mut state, deadline).timed_out() {
                self.stats.lock().timeouts += 1;
                return Err(ClientError::PoolTimeout(
                    self.config.pool_timeout.as_millis() as u64,
                ));
            }
        }
    }

    /// Runs `operation` on a pooled session, retrying transient failures.
    ///
    /// A transient failure closes the session, replaces it, waits
    /// `min(base_backoff * 2^attempt, max_backoff)` and tries again on
    /// another session. Any other error is returned at once and the session
    /// goes back to the pool.
    pub fn call<T, F>(&self, operation: &str, mut f: F) -> ClientResult<T>
    where
        F: FnMut(&mut dyn Cassandra) -> RpcResult<T>,
    {
        let mut last_error = None;
        for attempt in 0..self.config.max_retries {
            let mut conn = self.acquire()?;
            match f(conn.client_mut()) {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    warn!(
                        operation,
                        attempt,
                        server = conn.server(),
                        error = %e,
                        "transient failure"
                    );
                    conn.discard();
                    last_error = Some(e);
                    if attempt + 1 < self.config.max_retries {
                        std::thread::sleep(self.backoff(attempt));
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(ClientError::MaxRetriesExceeded {
            operation: operation.to_string(),
            attempts: self.config.max_retries,
            last_error,
        })
    }

    /// Fetches the schema of the configured keyspace.
    pub fn describe_keyspace(&self) -> ClientResult<KsDef> {
        let keyspace = self.config.keyspace.clone();
        self.call("describe_keyspace", |c| c.describe_keyspace(&keyspace))
    }

    /// Delay before retry number `attempt + 1`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.config
            .base_backoff
            .checked_mul(factor)
            .unwrap_or(self.config.max_backoff)
            .min(self.config.max_backoff)
    }

    /// Returns pool statistics.
    pub fn stats(&self) -> PoolStats {
        let mut stats = self.stats.lock().clone();
        let state = self.state.lock();
        stats.current_size = state.live;
        stats.idle_connections = state.free.len();
        stats.active_connections = state.live - state.free.len();
        stats
    }

    /// Returns the number of open sessions.
    pub fn size(&self) -> usize {
        self.state.lock().live
    }

    /// Returns the number of free sessions.
    pub fn available(&self) -> usize {
        self.state.lock().free.len()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Returns the keyspace the pool is bound to.
    pub fn keyspace(&self) -> &str {
        &self.config.keyspace
    }

    /// Closes the pool and every free session. Checked-out sessions are
    /// closed when they are returned.
    pub fn close(&self) {
        let connections = {
            let mut state = self.state.lock();
            state.closed = true;
            let drained = std::mem::take(&mut state.free);
            state.live -= drained.len();
            drained
        };
        self.released.notify_all();

        self.stats.lock().closed += connections.len() as u64;
        for conn in connections {
            conn.close();
        }
        info!(keyspace = %self.config.keyspace, "connection pool closed");
    }

    /// Returns true if the pool is closed.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    // =========================================================================
    // Internal Methods
    // =========================================================================

    fn checked_out(&self, conn: Connection) -> PooledConnection<'_> {
        self.stats.lock().acquisitions += 1;
        PooledConnection {
            pool: self,
            connection: Some(conn),
        }
    }

    /// Opens a session, rotating through the servers.
    ///
    /// Tries up to twice the number of servers before giving up.
    fn open_connection(&self) -> ClientResult<Connection> {
        let params = self.config.connect_params();
        let attempts = self.servers.len() * 2;
        for _ in 0..attempts {
            let idx = self.next_server.fetch_add(1, Ordering::Relaxed) % self.servers.len();
            let server = &self.servers[idx];
            match self.connector.connect(server, &params) {
                Ok(client) => {
                    self.stats.lock().created += 1;
                    debug!(server = %server, "opened connection");
                    return Ok(Connection::new(client, server.clone()));
                }
                Err(e) if e.is_transient() => {
                    warn!(server = %server, error = %e, "failed to connect");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(ClientError::NoServerAvailable { attempts })
    }

    /// Takes back a session after use.
    fn release(&self, mut conn: Connection) {
        conn.use_count += 1;
        self.stats.lock().releases += 1;

        let mut state = self.state.lock();
        if state.closed {
            state.live -= 1;
            drop(state);
            self.stats.lock().closed += 1;
            conn.close();
            return;
        }

        if conn.use_count >= self.config.recycle {
            state.live -= 1;
            drop(state);
            self.released.notify_one();
            {
                let mut stats = self.stats.lock();
                stats.recycled += 1;
                stats.closed += 1;
            }
            info!(server = %conn.server, uses = conn.use_count, "recycling connection");
            conn.close();
            return;
        }

        state.free.push_back(conn);
        drop(state);
        self.released.notify_one();
    }

    /// Closes a failed session and tries to open its replacement.
    fn replace(&self, conn: Connection) {
        {
            let mut stats = self.stats.lock();
            stats.failed += 1;
            stats.releases += 1;
            stats.closed += 1;
        }
        conn.close();

        {
            let mut state = self.state.lock();
            if state.closed {
                state.live -= 1;
                return;
            }
        }
        // The failed session's slot is reused for its replacement.
        match self.open_connection() {
            Ok(fresh) => {
                let mut state = self.state.lock();
                if state.closed {
                    // Closed while the replacement was opening.
                    state.live -= 1;
                    drop(state);
                    self.stats.lock().closed += 1;
                    fresh.close();
                    return;
                }
                state.free.push_back(fresh);
            }
            Err(e) => {
                warn!(error = %e, "could not replace failed connection");
                self.state.lock().live -= 1;
            }
        }
        self.released.notify_one();
    }
}

impl fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("keyspace", &self.config.keyspace)
            .field("pool_size", &self.pool_size)
            .field("current_size", &self.size())
            .field("available", &self.available())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// A session checked out of the pool.
///
/// When dropped, the session is returned to the pool.
pub struct PooledConnection<'a> {
    /// Owning pool.
    pool: &'a ConnectionPool,
    /// The session; `None` once discarded.
    connection: Option<Connection>,
}

impl<'a> PooledConnection<'a> {
    /// Returns the session.
    pub fn client_mut(&mut self) -> &mut dyn Cassandra {
        match self.connection.as_mut() {
            Some(conn) => conn.client.as_mut(),
            None => unreachable!("pooled connection used after discard"),
        }
    }

    /// Returns the endpoint the session is connected to.
    pub fn server(&self) -> &str {
        self.connection.as_ref().map_or("", |c| c.server.as_str())
    }

    /// Returns how long the session has been open.
    pub fn connection_age(&self) -> Duration {
        self.connection
            .as_ref()
            .map(|c| c.created_at.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    /// Returns how many times the session has been used.
    pub fn use_count(&self) -> u64 {
        self.connection.as_ref().map(|c| c.use_count).unwrap_or(0)
    }

    /// Marks the session dead: it is closed instead of returned, and the
    /// pool opens a replacement.
    pub fn discard(mut self) {
        if let Some(conn) = self.connection.take() {
            self.pool.replace(conn);
        }
    }
}

impl<'a> Drop for PooledConnection<'a> {
    fn drop(&mut self) {
        if let Some(conn) = self.connection.take() {
            self.pool.release(conn);
        }
    }
}

impl<'a> fmt::Debug for PooledConnection<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("server", &self.server())
            .field("connection_age", &self.connection_age())
            .field("use_count", &self.use_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MemoryCluster, RpcError};
    use colonnade_common::types::CfDef;
    use std::sync::Weak;

    fn cluster() -> MemoryCluster {
        MemoryCluster::new(
            KsDef::new("Keyspace1").with_column_family(CfDef::new("Keyspace1", "Standard1")),
        )
    }

    fn config() -> PoolConfig {
        PoolConfig::new("Keyspace1")
            .servers(["a:9160", "b:9160"])
            .base_backoff(Duration::from_millis(1))
            .max_backoff(Duration::from_millis(2))
            .pool_timeout(Duration::from_millis(50))
    }

    #[test]
    fn test_pool_config() {
        let config = PoolConfig::new("Keyspace1")
            .servers(["a:9160", "b:9160", "c:9160"])
            .max_retries(3)
            .recycle(100);

        assert_eq!(config.effective_pool_size(), 3);
        assert_eq!(config.pool_size(1).effective_pool_size(), 1);
        assert!(PoolConfig::new("Keyspace1").validate().is_ok());
    }

    #[test]
    fn test_pool_config_invalid() {
        assert!(PoolConfig::default().validate().is_err());
        assert!(PoolConfig::new("Keyspace1").servers(Vec::<String>::new()).validate().is_err());
        assert!(PoolConfig::new("Keyspace1").pool_size(0).validate().is_err());
        assert!(PoolConfig::new("Keyspace1").max_retries(0).validate().is_err());
        assert!(PoolConfig::new("Keyspace1").recycle(0).validate().is_err());
    }

    #[test]
    fn test_pool_config_serde_defaults() {
        let config: PoolConfig =
            serde_json::from_str(r#"{"keyspace":"Keyspace1","max_retries":2}"#).unwrap();
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.servers, vec![DEFAULT_SERVER.to_string()]);
        assert_eq!(config.recycle, DEFAULT_RECYCLE);
    }

    #[test]
    fn test_prefill_and_stats() {
        let cluster = cluster();
        let pool = ConnectionPool::connect(config(), cluster.connector()).unwrap();
        assert_eq!(pool.size(), 2);
        assert_eq!(pool.available(), 2);

        let conn = pool.acquire().unwrap();
        assert_eq!(pool.stats().active_connections, 1);
        drop(conn);

        let stats = pool.stats();
        assert_eq!(stats.created, 2);
        assert_eq!(stats.acquisitions, 1);
        assert_eq!(stats.releases, 1);
        assert_eq!(stats.idle_connections, 2);
    }

    #[test]
    fn test_lazy_pool_opens_on_demand() {
        let cluster = cluster();
        let pool = ConnectionPool::connect(config().prefill(false), cluster.connector()).unwrap();
        assert_eq!(pool.size(), 0);
        pool.call("truncate", |c| c.truncate("Standard1")).unwrap();
        assert_eq!(pool.size(), 1);
        assert_eq!(cluster.connections_opened(), 1);
    }

    #[test]
    fn test_acquire_times_out_when_exhausted() {
        let cluster = cluster();
        let pool = ConnectionPool::connect(config().pool_size(1), cluster.connector()).unwrap();
        let held = pool.acquire().unwrap();
        assert!(matches!(pool.acquire(), Err(ClientError::PoolTimeout(50))));
        assert_eq!(pool.stats().timeouts, 1);
        drop(held);
        assert!(pool.acquire().is_ok());
    }

    #[test]
    fn test_fails_over_to_live_server() {
        let cluster = cluster();
        cluster.set_down("a:9160");
        let pool = ConnectionPool::connect(config(), cluster.connector()).unwrap();
        assert_eq!(pool.size(), 2);
        for _ in 0..4 {
            assert_eq!(pool.acquire().unwrap().server(), "b:9160");
        }
    }

    #[test]
    fn test_no_server_available() {
        let cluster = cluster();
        cluster.set_down("a:9160");
        cluster.set_down("b:9160");
        let err = ConnectionPool::connect(config(), cluster.connector()).unwrap_err();
        assert!(matches!(err, ClientError::NoServerAvailable { attempts: 4 }));
    }

    #[test]
    fn test_authentication_failure_is_not_retried() {
        let cluster = cluster();
        cluster.require_credentials(Credentials::new("jsmith", "havebadpass"));
        let err = ConnectionPool::connect(config(), cluster.connector()).unwrap_err();
        assert!(matches!(err, ClientError::AuthenticationFailed(_)));
        assert_eq!(cluster.calls(crate::transport::memory::CONNECT), 1);

        let config = config().credentials(Credentials::new("jsmith", "havebadpass"));
        assert!(ConnectionPool::connect(config, cluster.connector()).is_ok());
    }

    /// Closes the pool the next time a session is opened.
    struct ClosingConnector {
        inner: Arc<dyn Connector>,
        pool: Mutex<Weak<ConnectionPool>>,
    }

    impl Connector for ClosingConnector {
        fn connect(&self, server: &str, params: &ConnectParams) -> RpcResult<Box<dyn Cassandra>> {
            let pool = std::mem::take(&mut *self.pool.lock());
            if let Some(pool) = pool.upgrade() {
                pool.close();
            }
            self.inner.connect(server, params)
        }
    }

    #[test]
    fn test_replacement_after_close_is_not_kept() {
        let cluster = cluster();
        let connector = Arc::new(ClosingConnector {
            inner: cluster.connector(),
            pool: Mutex::new(Weak::new()),
        });
        let pool = ConnectionPool::connect(config().pool_size(1), connector.clone()).unwrap();
        let conn = pool.acquire().unwrap();
        *connector.pool.lock() = Arc::downgrade(&pool);

        conn.discard();

        assert!(pool.is_closed());
        assert_eq!(pool.size(), 0);
        assert_eq!(pool.available(), 0);
        let stats = pool.stats();
        assert_eq!(stats.created, 2);
        assert_eq!(stats.closed, 2);
    }

    #[test]
    fn test_retry_then_succeed() {
        let cluster = cluster();
        let pool = ConnectionPool::connect(config(), cluster.connector()).unwrap();
        cluster.fail_next("truncate", 2, RpcError::TimedOut);

        pool.call("truncate", |c| c.truncate("Standard1")).unwrap();
        let stats = pool.stats();
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.current_size, 2);
        assert_eq!(cluster.calls("truncate"), 3);
    }

    #[test]
    fn test_retry_exhaustion() {
        let cluster = cluster();
        let pool = ConnectionPool::connect(config().max_retries(3), cluster.connector()).unwrap();
        cluster.fail_next("truncate", 3, RpcError::Unavailable);

        let err = pool.call("truncate", |c| c.truncate("Standard1")).unwrap_err();
        match err {
            ClientError::MaxRetriesExceeded {
                operation,
                attempts,
                last_error,
            } => {
                assert_eq!(operation, "truncate");
                assert_eq!(attempts, 3);
                assert_eq!(last_error, Some(RpcError::Unavailable));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(pool.size(), 2);
        assert_eq!(pool.stats().failed, 3);
    }

    #[test]
    fn test_non_transient_error_keeps_connection() {
        let cluster = cluster();
        let pool = ConnectionPool::connect(config(), cluster.connector()).unwrap();
        let err = pool
            .call("truncate", |c| c.truncate("Missing"))
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
        assert_eq!(pool.stats().failed, 0);
        assert_eq!(pool.available(), 2);
        assert_eq!(cluster.connections_opened(), 2);
    }

    #[test]
    fn test_recycle() {
        let cluster = cluster();
        let pool = ConnectionPool::connect(
            config().servers(["a", "b", "c", "d", "e"]).recycle(10),
            cluster.connector(),
        )
        .unwrap();
        for _ in 0..50 {
            pool.call("truncate", |c| c.truncate("Standard1")).unwrap();
        }
        let stats = pool.stats();
        assert_eq!(stats.recycled, 5);
        assert_eq!(stats.created, 5);

        pool.call("truncate", |c| c.truncate("Standard1")).unwrap();
        assert_eq!(pool.stats().created, 6);
    }

    #[test]
    fn test_backoff_is_capped() {
        let pool = ConnectionPool::new(
            config()
                .base_backoff(Duration::from_millis(10))
                .max_backoff(Duration::from_millis(100)),
            cluster().connector(),
        )
        .unwrap();
        assert_eq!(pool.backoff(0), Duration::from_millis(10));
        assert_eq!(pool.backoff(2), Duration::from_millis(40));
        assert_eq!(pool.backoff(4), Duration::from_millis(100));
        assert_eq!(pool.backoff(40), Duration::from_millis(100));
    }

    #[test]
    fn test_pool_close() {
        let cluster = cluster();
        let pool = ConnectionPool::connect(config(), cluster.connector()).unwrap();
        let held = pool.acquire().unwrap();
        pool.close();
        assert!(pool.is_closed());
        assert!(matches!(pool.acquire(), Err(ClientError::PoolClosed)));
        drop(held);
        assert_eq!(pool.size(), 0);
    }

    #[test]
    fn test_describe_keyspace() {
        let cluster = cluster();
        let pool = ConnectionPool::connect(config(), cluster.connector()).unwrap();
        let ks = pool.describe_keyspace().unwrap();
        assert_eq!(ks.name, "Keyspace1");
    }
}
