/// Synchronous statement execution against a store client
///
/// Every method makes blocking store calls and returns once the operation
/// is complete. The engine wraps these in worker queues; tests and one-shot
/// tools call them directly.

use crate::narrow::{narrow_assignment, narrow_raw, TypeFallback};
use crate::row::{query_row, scan_row, Row};
use aqlite_core::aql::{
    plan, plan_delete, DeleteStatement, InsertStatement, SelectStatement, Statement,
    StatementBuilder, UpdateStatement,
};
use aqlite_core::{Bins, Catalogue, EngineConfig, Error, Key, Result, StoreClient, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of one AQL statement
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Rows(Vec<Row>),
    Inserted { key: Key },
    Deleted(DeleteReport),
    Updated(UpdateReport),
}

/// Two-phase delete summary
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteReport {
    pub namespace: String,
    pub set: String,
    pub bin: String,
    pub value: String,
    /// Keys the index query returned
    pub matched: usize,
    /// Keys actually removed
    pub deleted: usize,
    /// Keys whose delete faulted, with the store's message
    pub failures: Vec<(Key, String)>,
}

impl DeleteReport {
    pub fn summary(&self) -> String {
        format!(
            "{} records deleted from {}.{} where {}='{}'",
            self.deleted, self.namespace, self.set, self.bin, self.value
        )
    }

    /// One message per failed key
    pub fn failure_messages(&self) -> Vec<String> {
        self.failures
            .iter()
            .map(|(key, msg)| format!("Error deleting key {}: {}", key.user_key, msg))
            .collect()
    }
}

/// Update summary
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateReport {
    pub key: Key,
    /// Values written, after narrowing
    pub written: BTreeMap<String, Value>,
    pub fallbacks: Vec<TypeFallback>,
}

impl UpdateReport {
    pub fn summary(&self) -> String {
        format!("Record updated: {}", self.key)
    }
}

/// Single-cell edit summary
#[derive(Debug, Clone, PartialEq)]
pub struct BinEdit {
    pub key: Key,
    pub bin: String,
    /// Type the value was stored as
    pub stored_as: &'static str,
    pub fallback: Option<TypeFallback>,
}

impl BinEdit {
    pub fn summary(&self) -> String {
        format!("Record updated: {} ({} as {})", self.key, self.bin, self.stored_as)
    }
}

/// Statement executor
#[derive(Clone)]
pub struct Executor {
    store: Arc<dyn StoreClient>,
    config: EngineConfig,
}

impl Executor {
    pub fn new(store: Arc<dyn StoreClient>) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: Arc<dyn StoreClient>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<dyn StoreClient> {
        &self.store
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.store.is_connected() {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }

    /// Parse and run one AQL statement
    pub fn execute(&self, aql: &str) -> Result<Outcome> {
        if aql.trim().is_empty() {
            return Err(Error::EmptyQuery);
        }
        self.ensure_connected()?;

        let statement = StatementBuilder::build(aql)?;
        debug!(command = %statement.command(), "Executing statement");

        match statement {
            Statement::Select(stmt) => self.select(&stmt).map(Outcome::Rows),
            Statement::Insert(stmt) => self.insert(&stmt).map(|key| Outcome::Inserted { key }),
            Statement::Delete(stmt) => self.delete(&stmt).map(Outcome::Deleted),
            Statement::Update(stmt) => self.update(&stmt).map(Outcome::Updated),
        }
    }

    /// Run a SELECT. Rows are only returned once the stream is exhausted;
    /// a fault part way through discards what was read.
    pub fn select(&self, stmt: &SelectStatement) -> Result<Vec<Row>> {
        let query = plan(stmt);
        let context = "AQL Query Error";

        let stream = self.store.query(&query).map_err(|e| e.with_context(context))?;
        let mut rows = Vec::new();
        for record in stream {
            let record = record.map_err(|e| e.with_context(context))?;
            rows.push(query_row(&record));
        }

        debug!(namespace = %stmt.namespace, set = %stmt.set, rows = rows.len(), "Select complete");
        Ok(rows)
    }

    /// Run an INSERT, returning the resolved key
    pub fn insert(&self, stmt: &InsertStatement) -> Result<Key> {
        let write = stmt.resolve_write();
        self.store
            .put(&write.key, &write.bins)
            .map_err(|e| e.with_context("Error inserting record"))?;

        debug!(key = %write.key, bins = write.bins.len(), "Record inserted");
        Ok(write.key)
    }

    /// Run a DELETE: collect every matching key, then delete them one by one.
    ///
    /// A fault while collecting aborts before anything is deleted. A fault on
    /// one key is recorded and the sweep moves on.
    pub fn delete(&self, stmt: &DeleteStatement) -> Result<DeleteReport> {
        let query = plan_delete(stmt);
        let context = "Error scanning for delete";

        let mut keys = Vec::new();
        let stream = self.store.query(&query).map_err(|e| e.with_context(context))?;
        for record in stream {
            keys.push(record.map_err(|e| e.with_context(context))?.key);
        }

        let mut report = DeleteReport {
            namespace: stmt.namespace.clone(),
            set: stmt.set.clone(),
            bin: stmt.predicate.bin.clone(),
            value: stmt.predicate.value.text(),
            matched: keys.len(),
            deleted: 0,
            failures: Vec::new(),
        };

        for key in keys {
            match self.store.delete(&key) {
                Ok(true) => report.deleted += 1,
                Ok(false) => debug!(key = %key, "Record already gone"),
                Err(e) => {
                    warn!(key = %key, error = %e, "Delete failed, continuing");
                    report.failures.push((key, e.to_string()));
                }
            }
        }

        Ok(report)
    }

    /// Run an UPDATE against the record keyed by the WHERE value
    pub fn update(&self, stmt: &UpdateStatement) -> Result<UpdateReport> {
        let key = stmt.key();
        let context = "Error updating record";

        let existing = if self.config.narrow_updates {
            self.store
                .get(&key, Some(stmt.bin_names().as_slice()))
                .map_err(|e| e.with_context(context))?
                .map(|record| record.bins)
                .unwrap_or_default()
        } else {
            Bins::new()
        };

        let mut written = BTreeMap::new();
        let mut fallbacks = Vec::new();
        for (bin, assignment) in &stmt.assignments {
            let narrowed = narrow_assignment(bin, assignment, existing.get(bin));
            if let Some(fallback) = narrowed.fallback {
                warn!(%fallback, "Type fallback");
                fallbacks.push(fallback);
            }
            written.insert(bin.clone(), narrowed.value);
        }

        let bins: Bins = written.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        self.store.put(&key, &bins).map_err(|e| e.with_context(context))?;

        debug!(key = %key, bins = bins.len(), "Record updated");
        Ok(UpdateReport {
            key,
            written,
            fallbacks,
        })
    }

    /// Scan a namespace, or one set within it
    pub fn browse(&self, namespace: &str, set: Option<&str>) -> Result<Vec<Row>> {
        self.ensure_connected()?;

        let mut rows = Vec::new();
        self.store
            .scan_all(namespace, set, &mut |record| rows.push(scan_row(&record)))
            .map_err(|e| e.with_context("Error during scan"))?;
        Ok(rows)
    }

    /// Delete one record, returning whether it existed
    pub fn delete_record(&self, key: &Key) -> Result<bool> {
        self.ensure_connected()?;
        self.store
            .delete(key)
            .map_err(|e| e.with_context("Error during deletion"))
    }

    /// Overwrite one bin from raw text, keeping the bin's current type when
    /// the text allows it
    pub fn edit_bin(&self, key: &Key, bin: &str, raw: &str) -> Result<BinEdit> {
        self.ensure_connected()?;
        let context = "Error during update";

        let names = [bin.to_string()];
        let existing = self
            .store
            .get(key, Some(&names[..]))
            .map_err(|e| e.with_context(context))?
            .and_then(|mut record| record.bins.remove(bin));

        let narrowed = narrow_raw(bin, raw, existing.as_ref());
        let stored_as = narrowed.value.type_name();

        let mut bins = Bins::new();
        bins.insert(bin.to_string(), narrowed.value);
        self.store.put(key, &bins).map_err(|e| e.with_context(context))?;

        Ok(BinEdit {
            key: key.clone(),
            bin: bin.to_string(),
            stored_as,
            fallback: narrowed.fallback,
        })
    }

    /// Remove every record in a set
    pub fn truncate(&self, namespace: &str, set: &str) -> Result<()> {
        self.ensure_connected()?;
        self.store
            .truncate(namespace, set)
            .map_err(|e| e.with_context("Error deleting set"))
    }

    /// Namespaces and their sets
    pub fn catalogue(&self) -> Result<Catalogue> {
        self.ensure_connected()?;
        self.store
            .catalogue()
            .map_err(|e| e.with_context("Error retrieving namespaces and sets"))
    }
}
