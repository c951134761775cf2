//! Pool behavior seen through table operations.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use colonnade_client::{
    ClientError, ColumnFamily, ColumnMap, ConnectionPool, Credentials, MemoryCluster, RpcError,
    SliceQuery, WriteOptions,
};
use colonnade_marshal::Value;
use colonnade_test::{fast_config, key, keyspace, Harness, SERVERS};

#[test]
fn test_transient_failures_are_retried() {
    let harness = Harness::new();
    let cf = harness.open("Standard1");
    cf.insert("k", &ColumnMap::standard([("a", "1")]), &WriteOptions::new())
        .unwrap();

    harness.cluster.fail_next("get_slice", 3, RpcError::TimedOut);
    let row = cf.get("k", &SliceQuery::new()).unwrap();
    assert_eq!(row.value("a"), Some(&Value::from("1")));

    assert_eq!(harness.cluster.pending_faults("get_slice"), 0);
    assert_eq!(harness.cluster.calls("get_slice"), 4);
    let stats = harness.pool.stats();
    assert_eq!(stats.failed, 3);
    // Every failed session was replaced.
    assert_eq!(stats.current_size, SERVERS.len());
}

#[test]
fn test_retries_exhausted() {
    let harness = Harness::with_config(fast_config().max_retries(3));
    let cf = harness.open("Standard1");
    let size = harness.pool.size();

    harness.cluster.fail_next("get_slice", 5, RpcError::Unavailable);
    match cf.get("k", &SliceQuery::new()) {
        Err(ClientError::MaxRetriesExceeded {
            operation,
            attempts,
            last_error,
        }) => {
            assert_eq!(operation, "get_slice");
            assert_eq!(attempts, 3);
            assert!(matches!(last_error, Some(RpcError::Unavailable)));
        }
        other => panic!("expected MaxRetriesExceeded, got {:?}", other),
    }
    assert_eq!(harness.cluster.pending_faults("get_slice"), 2);
    assert_eq!(harness.pool.size(), size);
    assert_eq!(harness.pool.stats().failed, 3);
}

#[test]
fn test_request_errors_are_not_retried() {
    let harness = Harness::new();
    let cf = harness.open("Standard1");

    harness
        .cluster
        .fail_next("get_slice", 1, RpcError::InvalidRequest("bad slice".to_string()));
    assert!(matches!(
        cf.get("k", &SliceQuery::new()),
        Err(ClientError::InvalidRequest(_))
    ));
    assert_eq!(harness.cluster.calls("get_slice"), 1);
    assert_eq!(harness.pool.stats().failed, 0);
}

#[test]
fn test_missing_row_is_not_found() {
    let harness = Harness::new();
    let cf = harness.open("Standard1");

    let err = cf.get("nobody", &SliceQuery::new()).unwrap_err();
    assert!(err.is_not_found());
    assert!(cf.get_opt("nobody", &SliceQuery::new()).unwrap().is_none());
    // Not a failure as far as the pool is concerned.
    assert_eq!(harness.pool.stats().failed, 0);
}

#[test]
fn test_sessions_are_recycled() {
    let harness = Harness::with_config(fast_config().pool_size(1).recycle(4));
    // Opening the table already used the session once.
    let cf = harness.open("Standard1");

    for _ in 0..10 {
        assert_eq!(cf.get_count("k", &SliceQuery::new()).unwrap(), 0);
    }

    let stats = harness.pool.stats();
    assert_eq!(stats.recycled, 2);
    assert_eq!(stats.created, 3);
    assert_eq!(stats.acquisitions, 11);
    assert_eq!(stats.releases, 11);
    assert_eq!(harness.cluster.connections_opened(), 3);
    assert!(stats.current_size <= 1);
}

#[test]
fn test_failover_to_live_servers() {
    let harness = Harness::new();
    let cf = harness.open("Standard1");
    cf.insert("k", &ColumnMap::standard([("a", "1")]), &WriteOptions::new())
        .unwrap();

    harness.cluster.set_down(SERVERS[0]);
    for _ in 0..6 {
        let row = cf.get("k", &SliceQuery::new()).unwrap();
        assert_eq!(row.len(), 1);
    }
    assert_eq!(harness.pool.stats().failed, 1);

    let held: Vec<_> = (0..SERVERS.len())
        .map(|_| harness.pool.acquire().unwrap())
        .collect();
    assert!(held.iter().all(|conn| conn.server() != SERVERS[0]));
    drop(held);

    harness.cluster.set_up(SERVERS[0]);
    assert_eq!(cf.get("k", &SliceQuery::new()).unwrap().len(), 1);
}

#[test]
fn test_no_server_available() {
    let cluster = MemoryCluster::new(keyspace());
    for server in SERVERS {
        cluster.set_down(server);
    }

    match ConnectionPool::connect(fast_config(), cluster.connector()) {
        Err(ClientError::NoServerAvailable { attempts }) => {
            assert_eq!(attempts, SERVERS.len() * 2)
        }
        other => panic!("expected NoServerAvailable, got {:?}", other),
    }

    // A lazy pool connects fine and fails on first use.
    let pool = ConnectionPool::connect(fast_config().prefill(false), cluster.connector()).unwrap();
    assert_eq!(pool.size(), 0);
    assert!(matches!(
        pool.describe_keyspace(),
        Err(ClientError::NoServerAvailable { .. })
    ));
    assert_eq!(pool.size(), 0);

    cluster.set_up(SERVERS[1]);
    assert_eq!(pool.describe_keyspace().unwrap().name, "Keyspace1");
    assert_eq!(pool.size(), 1);
}

#[test]
fn test_credentials() {
    let cluster = MemoryCluster::new(keyspace());
    cluster.require_credentials(Credentials::new("jsmith", "havebadpass"));

    assert!(matches!(
        ConnectionPool::connect(fast_config(), cluster.connector()),
        Err(ClientError::AuthenticationFailed(_))
    ));

    let config = fast_config().credentials(Credentials::new("jsmith", "havebadpass"));
    let pool = ConnectionPool::connect(config, cluster.connector()).unwrap();
    assert_eq!(pool.size(), SERVERS.len());
}

#[test]
fn test_pool_timeout() {
    let harness = Harness::with_config(
        fast_config()
            .pool_size(1)
            .pool_timeout(Duration::from_millis(20)),
    );
    let cf = harness.open("Standard1");

    let held = harness.pool.acquire().unwrap();
    assert!(matches!(
        cf.get_count("k", &SliceQuery::new()),
        Err(ClientError::PoolTimeout(20))
    ));
    drop(held);

    assert_eq!(cf.get_count("k", &SliceQuery::new()).unwrap(), 0);
    assert_eq!(harness.pool.stats().timeouts, 1);
}

#[test]
fn test_closed_pool() {
    let harness = Harness::new();
    let cf = harness.open("Standard1");
    harness.pool.close();

    assert!(harness.pool.is_closed());
    assert_eq!(harness.pool.size(), 0);
    assert!(matches!(
        cf.get("k", &SliceQuery::new()),
        Err(ClientError::PoolClosed)
    ));
}

#[test]
fn test_concurrent_tables_share_the_pool() {
    let harness = Harness::with_config(
        fast_config()
            .pool_size(2)
            .pool_timeout(Duration::from_secs(5)),
    );
    let cf: Arc<ColumnFamily> = Arc::new(harness.open("Standard1"));

    let workers: Vec<_> = (0..8)
        .map(|t| {
            let cf = Arc::clone(&cf);
            thread::spawn(move || {
                for i in 0..25 {
                    let row_key = key(t * 100 + i);
                    cf.insert(
                        row_key.clone(),
                        &ColumnMap::standard([("thread", t.to_string())]),
                        &WriteOptions::new(),
                    )
                    .unwrap();
                    let row = cf.get(row_key, &SliceQuery::new()).unwrap();
                    assert_eq!(row.value("thread"), Some(&Value::from(t.to_string())));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let stats = harness.pool.stats();
    assert_eq!(stats.acquisitions, stats.releases);
    assert!(stats.current_size <= 2);
    assert_eq!(stats.active_connections, 0);
    assert_eq!(harness.cluster.live_row_count("Standard1"), 200);
}
