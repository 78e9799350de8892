//! AQL-lite execution
//!
//! [`Executor`] runs statements synchronously against a [`StoreClient`];
//! [`Engine`] puts the executor behind named worker queues and reports
//! every outcome to a [`ResultSink`].

use aqlite_core::Bins;

pub use aqlite_core::{
    ClientConfig, EngineConfig, Error as AqliteError, Key, MemoryStore, Record, Result, StoreClient,
    Value,
};

pub mod engine;
pub mod executor;
pub mod narrow;
pub mod queue;
pub mod row;
pub mod sink;

pub use engine::{Engine, QueueKind, Request};
pub use executor::{BinEdit, DeleteReport, Executor, Outcome, UpdateReport};
pub use narrow::TypeFallback;
pub use row::{column_union, row_to_json, Row};
pub use sink::{recv_request, Delivery, ResultSink};

/// Builder for bin maps
pub struct BinsBuilder {
    bins: Bins,
}

impl BinsBuilder {
    pub fn new() -> Self {
        Self { bins: Bins::new() }
    }

    pub fn string(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.bins.insert(name.into(), Value::string(value));
        self
    }

    pub fn int(mut self, name: impl Into<String>, value: i64) -> Self {
        self.bins.insert(name.into(), Value::Int(value));
        self
    }

    pub fn float(mut self, name: impl Into<String>, value: f64) -> Self {
        self.bins.insert(name.into(), Value::Float(value));
        self
    }

    pub fn bool(mut self, name: impl Into<String>, value: bool) -> Self {
        self.bins.insert(name.into(), Value::Bool(value));
        self
    }

    pub fn build(self) -> Bins {
        self.bins
    }
}

impl Default for BinsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bins_builder() {
        let bins = BinsBuilder::new()
            .string("name", "Alice")
            .int("age", 30)
            .float("score", 1.5)
            .bool("active", true)
            .build();

        assert_eq!(bins.len(), 4);
        assert_eq!(bins["name"], Value::string("Alice"));
        assert_eq!(bins["age"], Value::Int(30));
        assert_eq!(bins["active"], Value::Bool(true));
    }

    #[test]
    fn test_builder_round_trip_through_store() {
        let store = MemoryStore::new();
        let key = Key::new("test", "users", "alice");
        let bins = BinsBuilder::new().string("name", "Alice").build();
        store.put(&key, &bins).unwrap();
        assert_eq!(store.get(&key, None).unwrap().unwrap().bins, bins);
    }
}
