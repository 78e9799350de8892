/// In-memory store client for tests, demos and offline use
///
/// Behaves like a single-node cluster: records live in per-set ordered maps,
/// so scans and index queries return records in user-key order.

use crate::aql::planner::{Filter, FilterValue, IndexQuery};
use crate::config::ClientConfig;
use crate::store::{Catalogue, RecordStream, StoreClient};
use crate::types::{Bins, Key, Record, Value};
use crate::{Error, Result};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

type SetId = (String, String);

#[derive(Default)]
struct MemoryInner {
    /// Declared namespaces, including ones without sets
    namespaces: BTreeSet<String>,
    /// Records per (namespace, set), keyed by user key
    sets: BTreeMap<SetId, BTreeMap<String, Record>>,
}

/// In-memory store client
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
    connected: Arc<AtomicBool>,
    config: ClientConfig,
}

impl MemoryStore {
    /// Create a connected store with default settings
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryInner::default())),
            connected: Arc::new(AtomicBool::new(true)),
            config: ClientConfig::default(),
        }
    }

    /// Create a connected store after validating the client configuration
    pub fn connect(config: ClientConfig) -> Result<Self> {
        config.validate().map_err(Error::InvalidArgument)?;

        let hosts: Vec<String> = config.hosts.iter().map(|h| h.to_string()).collect();
        info!(
            hosts = %hosts.join(","),
            authenticated = config.credentials().is_some(),
            "Connected to in-memory cluster"
        );

        Ok(Self {
            config,
            ..Self::new()
        })
    }

    /// Drop the connection. Subsequent calls fail until [`reconnect`](Self::reconnect).
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        info!("Disconnected from in-memory cluster");
    }

    pub fn reconnect(&self) {
        self.connected.store(true, Ordering::SeqCst);
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Declare a namespace so it shows up in the catalogue before it holds data
    pub fn with_namespace(self, namespace: &str) -> Self {
        self.inner.write().namespaces.insert(namespace.to_string());
        self
    }

    /// Load records from JSON shaped `{ns: {set: {user_key: {bin: value}}}}`.
    ///
    /// Returns the number of records written.
    pub fn load_json(&self, seed: &serde_json::Value) -> Result<usize> {
        let namespaces = seed
            .as_object()
            .ok_or_else(|| Error::InvalidArgument("seed must be an object of namespaces".into()))?;

        let mut count = 0;
        for (namespace, sets) in namespaces {
            self.inner.write().namespaces.insert(namespace.clone());
            let sets = sets.as_object().ok_or_else(|| {
                Error::InvalidArgument(format!("namespace '{}' must map to an object of sets", namespace))
            })?;

            for (set, records) in sets {
                let records = records.as_object().ok_or_else(|| {
                    Error::InvalidArgument(format!("set '{}.{}' must map to an object of records", namespace, set))
                })?;

                for (user_key, bins) in records {
                    let bins = match Value::from_json(bins) {
                        Value::Map(map) => map.into_iter().collect::<Bins>(),
                        _ => {
                            return Err(Error::InvalidArgument(format!(
                                "record '{}.{}.{}' must be an object of bins",
                                namespace, set, user_key
                            )))
                        }
                    };
                    self.write_record(&Key::new(namespace, set, user_key), &bins);
                    count += 1;
                }
            }
        }

        debug!(records = count, "Loaded seed data");
        Ok(count)
    }

    /// Number of records across all sets
    pub fn len(&self) -> usize {
        self.inner.read().sets.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }

    fn write_record(&self, key: &Key, bins: &Bins) {
        let mut inner = self.inner.write();
        inner.namespaces.insert(key.namespace.clone());
        let set = inner
            .sets
            .entry((key.namespace.clone(), key.set.clone()))
            .or_default();

        let record = set
            .entry(key.user_key.clone())
            .and_modify(|r| r.generation += 1)
            .or_insert_with(|| Record::new(key.clone(), Bins::new()));

        for (name, value) in bins {
            // Writing nil removes the bin
            if *value == Value::Nil {
                record.bins.remove(name);
            } else {
                record.bins.insert(name.clone(), value.clone());
            }
        }
        record.ttl = self.config.default_ttl;
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_filter(record: &Record, filter: &Filter) -> bool {
    match (record.bins.get(&filter.bin), &filter.value) {
        (Some(Value::Str(actual)), FilterValue::Str(expected)) => actual == expected,
        (Some(Value::Int(actual)), FilterValue::Int(expected) | FilterValue::NarrowedFloat(expected)) => {
            actual == expected
        }
        _ => false,
    }
}

fn project(record: &Record, bins: Option<&[String]>) -> Record {
    match bins {
        None => record.clone(),
        Some(names) => Record {
            bins: record
                .bins
                .iter()
                .filter(|(name, _)| names.contains(*name))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            ..record.clone()
        },
    }
}

impl StoreClient for MemoryStore {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn query(&self, query: &IndexQuery) -> Result<RecordStream> {
        self.ensure_connected()?;

        let inner = self.inner.read();
        let set_id = (query.namespace.clone(), query.set.clone());
        let records: Vec<Result<Record>> = inner
            .sets
            .get(&set_id)
            .map(|records| {
                records
                    .values()
                    .filter(|r| query.filter.as_ref().map_or(true, |f| matches_filter(r, f)))
                    .map(|r| Ok(project(r, query.bins.as_deref())))
                    .collect()
            })
            .unwrap_or_default();

        debug!(
            namespace = %query.namespace,
            set = %query.set,
            matched = records.len(),
            "Index query"
        );
        Ok(Box::new(records.into_iter()))
    }

    fn get(&self, key: &Key, bins: Option<&[String]>) -> Result<Option<Record>> {
        self.ensure_connected()?;

        let inner = self.inner.read();
        Ok(inner
            .sets
            .get(&(key.namespace.clone(), key.set.clone()))
            .and_then(|records| records.get(&key.user_key))
            .map(|r| project(r, bins)))
    }

    fn put(&self, key: &Key, bins: &Bins) -> Result<()> {
        self.ensure_connected()?;
        self.write_record(key, bins);
        Ok(())
    }

    fn delete(&self, key: &Key) -> Result<bool> {
        self.ensure_connected()?;

        let mut inner = self.inner.write();
        Ok(inner
            .sets
            .get_mut(&(key.namespace.clone(), key.set.clone()))
            .and_then(|records| records.remove(&key.user_key))
            .is_some())
    }

    fn scan_all(&self, namespace: &str, set: Option<&str>, visitor: &mut dyn FnMut(Record)) -> Result<()> {
        self.ensure_connected()?;

        // Snapshot first so the visitor may call back into the store
        let snapshot: Vec<Record> = {
            let inner = self.inner.read();
            inner
                .sets
                .iter()
                .filter(|((ns, s), _)| ns == namespace && set.map_or(true, |wanted| wanted == s))
                .flat_map(|(_, records)| records.values().cloned())
                .collect()
        };

        for record in snapshot {
            visitor(record);
        }
        Ok(())
    }

    fn truncate(&self, namespace: &str, set: &str) -> Result<()> {
        self.ensure_connected()?;

        let mut inner = self.inner.write();
        let removed = inner
            .sets
            .remove(&(namespace.to_string(), set.to_string()))
            .map(|records| records.len())
            .unwrap_or(0);
        info!(namespace, set, removed, "Truncated set");
        Ok(())
    }

    fn catalogue(&self) -> Result<Catalogue> {
        self.ensure_connected()?;

        let inner = self.inner.read();
        let mut catalogue: Catalogue = inner
            .namespaces
            .iter()
            .map(|ns| (ns.clone(), BTreeSet::new()))
            .collect();
        for (ns, set) in inner.sets.keys() {
            catalogue.entry(ns.clone()).or_default().insert(set.clone());
        }
        Ok(catalogue)
    }
}
