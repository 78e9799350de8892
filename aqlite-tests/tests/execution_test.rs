use aqlite_api::{Executor, Outcome};
use aqlite_core::{EngineConfig, Error, Key, StoreClient, Value};
use aqlite_test_utils::*;
use std::sync::Arc;

fn executor_over(store: Arc<FlakyStore>) -> Executor {
    Executor::new(store)
}

#[test]
fn test_select_all_returns_metadata_and_bins() {
    let executor = Executor::new(Arc::new(sample_store()));
    let rows = match executor.execute("SELECT * FROM test.users").unwrap() {
        Outcome::Rows(rows) => rows,
        other => panic!("Expected rows, got {:?}", other),
    };

    assert_eq!(rows.len(), 3);
    let first = &rows[0];
    assert_string_eq(&first["Key"], "u1");
    assert_string_eq(&first["Namespace"], "test");
    assert_string_eq(&first["Set"], "users");
    assert_int_eq(&first["TTL"], -1);
    assert_string_eq(&first["name"], "Ann");
}

#[test]
fn test_select_projection_and_filter() {
    let executor = Executor::new(Arc::new(sample_store()));
    let rows = match executor
        .execute("SELECT name FROM test.users WHERE age = 30")
        .unwrap()
    {
        Outcome::Rows(rows) => rows,
        other => panic!("Expected rows, got {:?}", other),
    };

    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert!(row.contains_key("name"));
        assert!(!row.contains_key("age"));
        assert!(!row.contains_key("city"));
    }
}

#[test]
fn test_insert_generates_key() {
    let store = sample_store();
    let executor = Executor::new(Arc::new(store.clone()));

    let key = match executor
        .execute("INSERT INTO test.users (name, age) VALUES ('John Doe', 30)")
        .unwrap()
    {
        Outcome::Inserted { key } => key,
        other => panic!("Expected insert, got {:?}", other),
    };

    let record = store.get(&key, None).unwrap().unwrap();
    assert_string_eq(&record.bins["name"], "John Doe");
    assert_int_eq(&record.bins["age"], 30);
    assert_string_eq(&record.bins["PK"], &key.user_key);
    assert!(!record.bins.contains_key("KEY"));
}

#[test]
fn test_insert_with_explicit_pk_twice_keeps_one_record() {
    let store = sample_store();
    let executor = Executor::new(Arc::new(store.clone()));
    let before = store.len();

    executor
        .execute("INSERT INTO test.users (Pk, name) VALUES ('p1', 'first')")
        .unwrap();
    executor
        .execute("INSERT INTO test.users (Pk, name) VALUES ('p1', 'second')")
        .unwrap();

    assert_eq!(store.len(), before + 1);
    let record = store.get(&Key::new("test", "users", "p1"), None).unwrap().unwrap();
    assert_string_eq(&record.bins["name"], "second");
    assert_eq!(record.generation, 2);
}

#[test]
fn test_numeric_delete_rejected_before_store_call() {
    let store = Arc::new(FlakyStore::new(sample_store()));
    let executor = executor_over(Arc::clone(&store));

    let err = executor
        .execute("DELETE FROM test.users WHERE age = 30")
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "DELETE WHERE value must be a string for this basic implementation."
    );
    assert!(store.calls().is_empty());
    assert_eq!(store.inner().len(), 4);
}

#[test]
fn test_partial_delete_continues_past_failure() {
    let store = Arc::new(FlakyStore::new(city_store(5)));
    store.fail_delete("k3");
    let executor = executor_over(Arc::clone(&store));

    let report = match executor
        .execute("DELETE FROM test.people WHERE city = 'Paris'")
        .unwrap()
    {
        Outcome::Deleted(report) => report,
        other => panic!("Expected delete report, got {:?}", other),
    };

    assert_eq!(report.matched, 5);
    assert_eq!(report.deleted, 4);
    assert_eq!(
        store.calls_of("delete"),
        vec!["delete:k1", "delete:k2", "delete:k3", "delete:k4", "delete:k5"]
    );
    assert_eq!(report.failure_messages(), vec!["Error deleting key k3: Timeout"]);
    assert_eq!(
        report.summary(),
        "4 records deleted from test.people where city='Paris'"
    );
    assert_eq!(store.inner().len(), 1);
}

#[test]
fn test_scan_fault_deletes_nothing() {
    let store = Arc::new(FlakyStore::new(city_store(5)));
    store.fail_query_after(3);
    let executor = executor_over(Arc::clone(&store));

    let err = executor
        .execute("DELETE FROM test.people WHERE city = 'Paris'")
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error scanning for delete: Connection reset by peer"
    );
    assert!(store.calls_of("delete").is_empty());
    assert_eq!(store.inner().len(), 5);
}

#[test]
fn test_select_fault_mid_stream_discards_rows() {
    let store = Arc::new(FlakyStore::new(city_store(4)));
    store.fail_query_after(2);
    let executor = executor_over(store);

    let err = executor.execute("SELECT * FROM test.people").unwrap_err();
    assert!(matches!(err, Error::Store(_)));
    assert_eq!(err.to_string(), "AQL Query Error: Connection reset by peer");
}

#[test]
fn test_update_narrows_to_existing_integer() {
    let store = sample_store();
    let executor = Executor::new(Arc::new(store.clone()));

    let report = match executor
        .execute("UPDATE test.users SET age = '31' WHERE pk = 'u1'")
        .unwrap()
    {
        Outcome::Updated(report) => report,
        other => panic!("Expected update report, got {:?}", other),
    };

    assert!(report.fallbacks.is_empty());
    let record = store.get(&Key::new("test", "users", "u1"), None).unwrap().unwrap();
    assert_eq!(record.bins["age"], Value::Int(31));
    assert_string_eq(&record.bins["name"], "Ann");
}

#[test]
fn test_update_type_fallback_stores_text() {
    let store = sample_store();
    let executor = Executor::new(Arc::new(store.clone()));

    let report = match executor
        .execute("UPDATE test.users SET age = 3.5, nick = 'annie' WHERE pk = 'u1'")
        .unwrap()
    {
        Outcome::Updated(report) => report,
        other => panic!("Expected update report, got {:?}", other),
    };

    assert_eq!(report.fallbacks.len(), 1);
    assert_eq!(
        report.fallbacks[0].to_string(),
        "Cannot update age (Integer) with '3.5'. Treating as String."
    );
    let record = store.get(&Key::new("test", "users", "u1"), None).unwrap().unwrap();
    assert_string_eq(&record.bins["age"], "3.5");
    assert_string_eq(&record.bins["nick"], "annie");
}

#[test]
fn test_update_rereads_text_as_written() {
    let store = sample_store();
    let executor = Executor::new(Arc::new(store.clone()));

    executor
        .execute("UPDATE test.users SET name = 007, zip = 007 WHERE pk = 'u1'")
        .unwrap();
    let record = store.get(&Key::new("test", "users", "u1"), None).unwrap().unwrap();
    assert_string_eq(&record.bins["name"], "007");
    // No existing bin: the literal keeps its own type
    assert_int_eq(&record.bins["zip"], 7);

    let report = match executor
        .execute("UPDATE test.users SET age = 3.50 WHERE pk = 'u2'")
        .unwrap()
    {
        Outcome::Updated(report) => report,
        other => panic!("Expected update report, got {:?}", other),
    };
    assert_eq!(
        report.fallbacks[0].to_string(),
        "Cannot update age (Integer) with '3.50'. Treating as String."
    );
    let record = store.get(&Key::new("test", "users", "u2"), None).unwrap().unwrap();
    assert_string_eq(&record.bins["age"], "3.50");
}

#[test]
fn test_repeated_where_rejected_before_store_call() {
    let store = Arc::new(FlakyStore::new(sample_store()));
    let executor = executor_over(Arc::clone(&store));

    let err = executor
        .execute("DELETE FROM test.users WHERE city = Oslo WHERE name = Ann")
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid WHERE clause in DELETE.");

    let err = executor
        .execute("UPDATE test.users SET age = 1 WHERE pk = u1 WHERE z")
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid WHERE clause in UPDATE.");

    assert!(store.calls().is_empty());
    assert!(store.inner().get(&Key::new("test", "users", "u1 WHERE z"), None).unwrap().is_none());
}

#[test]
fn test_update_without_narrowing_keeps_literal_types() {
    let store = sample_store();
    let executor = Executor::with_config(
        Arc::new(store.clone()),
        EngineConfig::new().with_narrow_updates(false),
    );

    executor
        .execute("UPDATE test.users SET age = '31' WHERE pk = 'u1'")
        .unwrap();
    let record = store.get(&Key::new("test", "users", "u1"), None).unwrap().unwrap();
    assert_string_eq(&record.bins["age"], "31");
}

#[test]
fn test_disconnected_store_rejects_statements() {
    let store = sample_store();
    let executor = Executor::new(Arc::new(store.clone()));
    store.disconnect();

    let err = executor.execute("SELECT * FROM test.users").unwrap_err();
    assert_eq!(err.code(), "NOT_CONNECTED");

    store.reconnect();
    assert!(executor.execute("SELECT * FROM test.users").is_ok());
}
