//! Table handles against every fixture table shape.

use std::sync::Arc;

use colonnade_client::{
    Cell, ClientError, ColumnFamily, ColumnFamilyOptions, ColumnMap, Mutator, Row, SliceQuery,
    WriteOptions,
};
use colonnade_marshal::{time_uuid, Value};
use colonnade_test::Harness;

fn composite(n: i64, s: &str) -> Value {
    Value::composite(vec![Value::Long(n), Value::from(s)])
}

fn prefix(n: i64) -> Value {
    Value::composite([n])
}

fn names(row: &Row) -> Vec<Value> {
    row.names().cloned().collect()
}

fn composite_harness() -> (Harness, ColumnFamily) {
    let harness = Harness::new();
    let cf = harness.open("Composite1");
    let columns = ColumnMap::standard(
        [(1, "a"), (1, "b"), (2, "a"), (2, "b"), (3, "a")]
            .into_iter()
            .map(|(n, s)| (composite(n, s), format!("{}:{}", n, s))),
    );
    cf.insert("row", &columns, &WriteOptions::new()).unwrap();
    (harness, cf)
}

#[test]
fn test_composite_inclusive_prefix_slice() {
    let (_harness, cf) = composite_harness();
    let row = cf
        .get("row", &SliceQuery::new().start(prefix(1)).finish(prefix(2)))
        .unwrap();
    assert_eq!(
        names(&row),
        vec![
            composite(1, "a"),
            composite(1, "b"),
            composite(2, "a"),
            composite(2, "b")
        ]
    );
    assert_eq!(row.value(composite(2, "a")), Some(&Value::from("2:a")));
}

#[test]
fn test_composite_exclusive_bounds() {
    let (_harness, cf) = composite_harness();

    let row = cf
        .get("row", &SliceQuery::new().start_after(prefix(1)).finish(prefix(2)))
        .unwrap();
    assert_eq!(names(&row), vec![composite(2, "a"), composite(2, "b")]);

    let row = cf
        .get("row", &SliceQuery::new().finish_before(prefix(2)))
        .unwrap();
    assert_eq!(names(&row), vec![composite(1, "a"), composite(1, "b")]);

    let err = cf
        .get("row", &SliceQuery::new().start_after(prefix(3)))
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_composite_reversed_slice() {
    let (_harness, cf) = composite_harness();
    let row = cf
        .get(
            "row",
            &SliceQuery::new()
                .start(prefix(2))
                .finish(prefix(1))
                .reversed(true),
        )
        .unwrap();
    assert_eq!(
        names(&row),
        vec![
            composite(2, "b"),
            composite(2, "a"),
            composite(1, "b"),
            composite(1, "a")
        ]
    );

    let row = cf
        .get("row", &SliceQuery::new().reversed(true).count(2))
        .unwrap();
    assert_eq!(names(&row), vec![composite(3, "a"), composite(2, "b")]);
}

#[test]
fn test_composite_exact_names() {
    let (_harness, cf) = composite_harness();
    let row = cf
        .get(
            "row",
            &SliceQuery::new().columns([composite(3, "a"), composite(1, "b"), composite(9, "z")]),
        )
        .unwrap();
    assert_eq!(names(&row), vec![composite(1, "b"), composite(3, "a")]);
}

#[test]
fn test_exclusive_bound_needs_composite_comparator() {
    let harness = Harness::new();
    let cf = harness.open("Standard1");
    assert!(matches!(
        cf.get("row", &SliceQuery::new().start_after("a")),
        Err(ClientError::InvalidConfig(_))
    ));
}

#[test]
fn test_super_columns() {
    let harness = Harness::new();
    let cf = harness.open("Super1");
    assert!(cf.schema().kind.is_super());

    let columns = ColumnMap::super_column(1i64, [("name", "alice")])
        .and_super_column(2i64, [("name", "bob"), ("age", "30")])
        .and_super_column(3i64, [("name", "carol")]);
    cf.insert("users", &columns, &WriteOptions::new()).unwrap();

    let row = cf.get("users", &SliceQuery::new()).unwrap();
    assert_eq!(
        names(&row),
        vec![Value::Long(1), Value::Long(2), Value::Long(3)]
    );
    let bob = row.get(2i64).unwrap();
    assert_eq!(bob.columns().len(), 2);
    assert_eq!(bob.get(&Value::from("age")).and_then(Cell::value), Some(&Value::from("30")));

    // Slices over super column names use the long comparator.
    let row = cf
        .get("users", &SliceQuery::new().start(2i64).finish(3i64))
        .unwrap();
    assert_eq!(names(&row), vec![Value::Long(2), Value::Long(3)]);

    let cell = cf
        .get_super_column("users", 2i64, &SliceQuery::new().columns(["name"]))
        .unwrap();
    assert_eq!(cell.name(), &Value::Long(2));
    assert_eq!(cell.columns().len(), 1);
    assert_eq!(cell.columns()[0].value(), Some(&Value::from("bob")));

    cf.remove_super_column("users", 2i64, Some(&["age".into()]), &WriteOptions::new())
        .unwrap();
    let cell = cf
        .get_super_column("users", 2i64, &SliceQuery::new())
        .unwrap();
    assert_eq!(cell.columns().len(), 1);

    cf.remove_super_column("users", 1i64, None, &WriteOptions::new())
        .unwrap();
    let err = cf
        .get_super_column("users", 1i64, &SliceQuery::new())
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(
        names(&cf.get("users", &SliceQuery::new()).unwrap()),
        vec![Value::Long(2), Value::Long(3)]
    );

    // A flat column map does not fit a super table.
    assert!(matches!(
        cf.insert("users", &ColumnMap::standard([("name", "x")]), &WriteOptions::new()),
        Err(ClientError::InvalidConfig(_))
    ));
}

#[test]
fn test_counters() {
    let harness = Harness::new();
    let cf = harness.open("Counter1");
    assert!(cf.schema().kind.is_counter());

    cf.add("page", "views", 3, None).unwrap();
    cf.add("page", "views", 4, None).unwrap();
    cf.add("page", "likes", -2, None).unwrap();

    let row = cf.get("page", &SliceQuery::new()).unwrap();
    assert_eq!(row.count("views"), Some(7));
    assert_eq!(row.count("likes"), Some(-2));
    assert_eq!(cf.get_count("page", &SliceQuery::new()).unwrap(), 2);

    cf.remove_counter("page", "likes", None).unwrap();
    let row = cf.get("page", &SliceQuery::new()).unwrap();
    assert_eq!(names(&row), vec![Value::from("views")]);

    assert!(matches!(
        cf.insert("page", &ColumnMap::standard([("views", "1")]), &WriteOptions::new()),
        Err(ClientError::InvalidConfig(_))
    ));
    assert!(harness.open("Standard1").add("page", "views", 1, None).is_err());
}

#[test]
fn test_super_counters() {
    let harness = Harness::new();
    let cf = harness.open("SuperCounter1");

    cf.add("site", "hits", 2, Some("home".into())).unwrap();
    cf.add("site", "hits", 5, Some("about".into())).unwrap();
    cf.add("site", "hits", 1, Some("home".into())).unwrap();

    let home = cf
        .get_super_column("site", "home", &SliceQuery::new())
        .unwrap();
    assert_eq!(home.columns()[0].count(), Some(3));

    let row = cf.get("site", &SliceQuery::new()).unwrap();
    assert_eq!(names(&row), vec![Value::from("about"), Value::from("home")]);

    cf.remove_counter("site", "hits", Some("about".into())).unwrap();
    assert!(cf
        .get_super_column("site", "about", &SliceQuery::new())
        .unwrap_err()
        .is_not_found());
}

#[test]
fn test_time_uuid_slices() {
    let harness = Harness::new();
    let cf = harness.open("Timeline");
    let node = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
    let events: Vec<_> = [1_000i64, 2_000, 3_000]
        .iter()
        .map(|&micros| time_uuid::from_micros(micros, 0x0101, node))
        .collect();
    let columns = ColumnMap::standard(
        events
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, format!("event{}", i))),
    );
    cf.insert("stream", &columns, &WriteOptions::new()).unwrap();

    // Plain numbers become the lowest and highest UUIDs of that instant.
    let row = cf
        .get(
            "stream",
            &SliceQuery::new().start(1_500i64).finish(2_500i64),
        )
        .unwrap();
    assert_eq!(names(&row), vec![Value::Uuid(events[1])]);
    assert_eq!(row.value(events[1]), Some(&Value::from("event1")));

    // Dates are milliseconds.
    let row = cf
        .get(
            "stream",
            &SliceQuery::new()
                .start(Value::Date(2))
                .finish(Value::Date(3)),
        )
        .unwrap();
    assert_eq!(names(&row).len(), 2);

    // Inclusive on both ends at the exact instant.
    let row = cf
        .get(
            "stream",
            &SliceQuery::new().start(3_000i64).finish(3_000i64),
        )
        .unwrap();
    assert_eq!(names(&row), vec![Value::Uuid(events[2])]);

    assert!(matches!(
        cf.get("stream", &SliceQuery::new().start("yesterday")),
        Err(ClientError::Marshal(_))
    ));
}

#[test]
fn test_write_options() {
    let harness = Harness::new();
    let cf = harness.open("Standard1");

    let ts = cf
        .insert(
            "k",
            &ColumnMap::standard([("a", "1")]),
            &WriteOptions::new().timestamp(42).ttl(3600),
        )
        .unwrap();
    assert_eq!(ts, 42);
    let row = cf.get("k", &SliceQuery::new()).unwrap();
    assert_eq!(row.get("a").and_then(Cell::timestamp), Some(42));

    let ts = cf
        .insert("k", &ColumnMap::standard([("b", "2")]), &WriteOptions::new())
        .unwrap();
    assert!(ts > 42);
}

#[test]
fn test_batch_across_tables() {
    let harness = Harness::new();
    let standard = harness.open("Standard1");
    let counters = harness.open("Counter1");
    let supers = harness.open("Super1");
    standard
        .insert("old", &ColumnMap::standard([("a", "1")]), &WriteOptions::new().timestamp(1))
        .unwrap();

    let mut batch = Mutator::new(Arc::clone(&harness.pool));
    let opts = WriteOptions::new().timestamp(10);
    batch
        .insert(&standard, "new", &ColumnMap::standard([("a", "1")]), &opts)
        .unwrap();
    batch
        .insert(&supers, "new", &ColumnMap::super_column(7i64, [("x", "y")]), &opts)
        .unwrap();
    batch.add(&counters, "new", "hits", 9, None).unwrap();
    batch.remove(&standard, "old", None, None, &opts).unwrap();
    assert_eq!(batch.len(), 4);
    batch.send().unwrap();

    assert_eq!(harness.cluster.calls("batch_mutate"), 2);
    assert!(standard.get_opt("old", &SliceQuery::new()).unwrap().is_none());
    assert_eq!(standard.get("new", &SliceQuery::new()).unwrap().len(), 1);
    assert_eq!(counters.get("new", &SliceQuery::new()).unwrap().count("hits"), Some(9));
    let cell = supers
        .get_super_column("new", 7i64, &SliceQuery::new())
        .unwrap();
    assert_eq!(cell.columns()[0].value(), Some(&Value::from("y")));
}

#[test]
fn test_batch_queue_size() {
    let harness = Harness::new();
    let cf = harness.open("Standard1");
    let mut batch = cf.batch().queue_size(3);
    for i in 0..7 {
        batch
            .insert(
                format!("k{}", i),
                &ColumnMap::standard([("a", "1")]),
                &WriteOptions::new(),
            )
            .unwrap();
    }
    assert_eq!(harness.cluster.calls("batch_mutate"), 2);
    assert_eq!(batch.len(), 1);
    batch.send().unwrap();
    assert_eq!(harness.cluster.live_row_count("Standard1"), 7);
}

#[test]
fn test_long_keys_multiget() {
    let harness = Harness::new();
    let cf = harness.open_with("LongKeys", ColumnFamilyOptions::new());
    for id in [1i64, 2, 3, -4] {
        cf.insert(id, &ColumnMap::standard([("n", id)]), &WriteOptions::new())
            .unwrap();
    }

    let keys: Vec<Value> = [3i64, 1, 99, -4, 2].into_iter().map(Value::from).collect();
    let rows = cf.multiget(&keys, &SliceQuery::new()).unwrap();
    let got: Vec<Value> = rows.iter().map(|r| r.key.clone()).collect();
    assert_eq!(
        got,
        vec![Value::Long(3), Value::Long(1), Value::Long(-4), Value::Long(2)]
    );
    assert_eq!(rows[2].value("n"), Some(&Value::Long(-4)));

    let counts = cf.multiget_count(&keys, &SliceQuery::new()).unwrap();
    assert_eq!(counts.len(), 5);
    assert_eq!(counts[2], (Value::Long(99), 0));
    assert_eq!(counts[0], (Value::Long(3), 1));

    assert!(matches!(
        cf.insert("not a number", &ColumnMap::standard([("n", 1i64)]), &WriteOptions::new()),
        Err(ClientError::Marshal(_))
    ));
}

#[test]
fn test_multiget_in_small_chunks() {
    let harness = Harness::new();
    let cf = harness.open_with("Standard1", ColumnFamilyOptions::new().multiget_buffer_size(2));
    for i in 0..5 {
        cf.insert(format!("k{}", i), &ColumnMap::standard([("a", "1")]), &WriteOptions::new())
            .unwrap();
    }

    let keys: Vec<Value> = (0..5).rev().map(|i| Value::from(format!("k{}", i))).collect();
    let rows = cf.multiget(&keys, &SliceQuery::new()).unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0].key, Value::from("k4"));
    assert_eq!(harness.cluster.calls("multiget_slice"), 3);
}

#[test]
fn test_autopack_off() {
    let harness = Harness::new();
    let cf = harness.open_with("Standard1", ColumnFamilyOptions::new().autopack(false));

    cf.insert(
        b"raw-key".to_vec(),
        &ColumnMap::standard([(b"name".to_vec(), b"value".to_vec())]),
        &WriteOptions::new(),
    )
    .unwrap();

    let row = cf.get(b"raw-key".to_vec(), &SliceQuery::new()).unwrap();
    assert_eq!(row.key, Value::from(b"raw-key".to_vec()));
    assert_eq!(
        row.value(b"name".to_vec()),
        Some(&Value::from(b"value".to_vec()))
    );

    // The same bytes read back as text with autopacking on.
    let typed = harness.open("Standard1");
    let row = typed.get("raw-key", &SliceQuery::new()).unwrap();
    assert_eq!(row.value("name"), Some(&Value::from("value")));
}

#[test]
fn test_truncate() {
    let harness = Harness::new();
    let cf = harness.open("Standard1");
    cf.insert("k", &ColumnMap::standard([("a", "1")]), &WriteOptions::new())
        .unwrap();
    cf.truncate().unwrap();
    assert_eq!(harness.cluster.row_count("Standard1"), 0);
    assert!(cf.get_opt("k", &SliceQuery::new()).unwrap().is_none());
}
