/// Test utilities and helpers for AQL-lite testing
///
/// Seeded stores, a fault-injecting store wrapper and an engine harness that
/// waits for each request's deliveries.

use aqlite_api::{recv_request, Delivery, Engine, Request, Row};
use aqlite_core::aql::IndexQuery;
use aqlite_core::{
    Bins, Catalogue, EngineConfig, Error, Key, MemoryStore, Record, RecordStream, Result,
    StoreClient, Value,
};
use crossbeam::channel::{unbounded, Receiver};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

/// Store seeded with `test.users` (u1..u3) and `test.orders` (o1)
pub fn sample_store() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .load_json(&json!({
            "test": {
                "users": {
                    "u1": {"name": "Ann", "age": 30, "city": "Oslo"},
                    "u2": {"name": "Bob", "age": 41, "city": "Rome"},
                    "u3": {"name": "Cid", "age": 30, "active": true}
                },
                "orders": {
                    "o1": {"total": 9.5, "user": "u1"}
                }
            }
        }))
        .expect("Failed to seed store");
    store
}

/// Store with `count` records k1..kN in `test.people`, all with `city = 'Paris'`
pub fn city_store(count: usize) -> MemoryStore {
    let store = MemoryStore::new();
    for i in 1..=count {
        let mut bins = Bins::new();
        bins.insert("city".to_string(), Value::string("Paris"));
        bins.insert("n".to_string(), Value::Int(i as i64));
        store
            .put(&Key::new("test", "people", format!("k{}", i)), &bins)
            .expect("Failed to write");
    }
    store
}

/// Store wrapper that fails chosen calls and records every call made
pub struct FlakyStore {
    inner: MemoryStore,
    failing_deletes: Mutex<HashSet<String>>,
    query_fault_after: Mutex<Option<usize>>,
    calls: Mutex<Vec<String>>,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            failing_deletes: Mutex::new(HashSet::new()),
            query_fault_after: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Make deleting this user key fail
    pub fn fail_delete(&self, user_key: &str) {
        self.failing_deletes.lock().insert(user_key.to_string());
    }

    /// Make index queries fault after yielding `n` records
    pub fn fail_query_after(&self, n: usize) {
        *self.query_fault_after.lock() = Some(n);
    }

    /// Every call so far, as `op` or `op:key`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Calls of one operation, e.g. `"delete"`
    pub fn calls_of(&self, op: &str) -> Vec<String> {
        let prefix = format!("{}:", op);
        self.calls()
            .into_iter()
            .filter(|c| c == op || c.starts_with(&prefix))
            .collect()
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

impl StoreClient for FlakyStore {
    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    fn query(&self, query: &IndexQuery) -> Result<RecordStream> {
        self.record("query".to_string());
        let stream = self.inner.query(query)?;
        let fault_after = *self.query_fault_after.lock();
        match fault_after {
            Some(n) => Ok(Box::new(
                stream
                    .take(n)
                    .chain(std::iter::once(Err(Error::store("Connection reset by peer")))),
            )),
            None => Ok(stream),
        }
    }

    fn get(&self, key: &Key, bins: Option<&[String]>) -> Result<Option<Record>> {
        self.record(format!("get:{}", key.user_key));
        self.inner.get(key, bins)
    }

    fn put(&self, key: &Key, bins: &Bins) -> Result<()> {
        self.record(format!("put:{}", key.user_key));
        self.inner.put(key, bins)
    }

    fn delete(&self, key: &Key) -> Result<bool> {
        self.record(format!("delete:{}", key.user_key));
        if self.failing_deletes.lock().contains(&key.user_key) {
            return Err(Error::store("Timeout"));
        }
        self.inner.delete(key)
    }

    fn scan_all(&self, namespace: &str, set: Option<&str>, visitor: &mut dyn FnMut(Record)) -> Result<()> {
        self.record("scan_all".to_string());
        self.inner.scan_all(namespace, set, visitor)
    }

    fn truncate(&self, namespace: &str, set: &str) -> Result<()> {
        self.record("truncate".to_string());
        self.inner.truncate(namespace, set)
    }

    fn catalogue(&self) -> Result<Catalogue> {
        self.record("catalogue".to_string());
        self.inner.catalogue()
    }
}

/// Running engine whose deliveries are collected per request
pub struct TestEngine {
    pub engine: Engine,
    receiver: Receiver<Delivery>,
}

impl TestEngine {
    pub fn start(store: Arc<dyn StoreClient>) -> Self {
        Self::with_config(store, EngineConfig::new().with_thread_prefix("aqlite-test"))
    }

    pub fn with_config(store: Arc<dyn StoreClient>, config: EngineConfig) -> Self {
        let (sender, receiver) = unbounded();
        let engine = Engine::start(store, config, sender).expect("Failed to start engine");
        Self { engine, receiver }
    }

    /// Submit one request and wait for all of its deliveries
    pub fn run(&self, request: Request) -> Vec<Delivery> {
        self.engine.submit(request).expect("Failed to submit");
        recv_request(&self.receiver)
    }

    pub fn run_aql(&self, aql: &str) -> Vec<Delivery> {
        self.run(Request::aql(aql))
    }

    pub fn receiver(&self) -> &Receiver<Delivery> {
        &self.receiver
    }
}

/// The row batch a request delivered first
pub fn rows_of(deliveries: &[Delivery]) -> Vec<Row> {
    match deliveries {
        [Delivery::Rows(rows), ..] => rows.clone(),
        other => panic!("Expected rows, got {:?}", other),
    }
}

/// The messages of every error delivery
pub fn errors_of(deliveries: &[Delivery]) -> Vec<String> {
    deliveries
        .iter()
        .filter_map(|d| match d {
            Delivery::Error(message) => Some(message.clone()),
            _ => None,
        })
        .collect()
}

/// The messages of every status delivery
pub fn statuses_of(deliveries: &[Delivery]) -> Vec<String> {
    deliveries
        .iter()
        .filter_map(|d| match d {
            Delivery::Status(message) => Some(message.clone()),
            _ => None,
        })
        .collect()
}

/// Assert that a value is a string with expected value
pub fn assert_string_eq(value: &Value, expected: &str) {
    match value {
        Value::Str(s) => assert_eq!(s, expected),
        _ => panic!("Expected string, got {:?}", value),
    }
}

/// Assert that a value is an integer with expected value
pub fn assert_int_eq(value: &Value, expected: i64) {
    match value {
        Value::Int(n) => assert_eq!(*n, expected),
        _ => panic!("Expected integer, got {:?}", value),
    }
}
