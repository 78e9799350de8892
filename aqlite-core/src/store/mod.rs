/// Store client seam
///
/// Everything above this trait is cluster agnostic. Calls block the calling
/// thread; the engine only ever makes them from its worker queues.

pub mod memory;

pub use memory::MemoryStore;

use crate::aql::planner::IndexQuery;
use crate::types::{Bins, Key, Record};
use crate::Result;
use std::collections::{BTreeMap, BTreeSet};

/// Records produced by an index query. Each item may fail independently,
/// so a fault can surface after some records were already yielded.
pub type RecordStream = Box<dyn Iterator<Item = Result<Record>> + Send>;

/// Namespaces and the sets they contain, sorted
pub type Catalogue = BTreeMap<String, BTreeSet<String>>;

/// Client of a clustered key-value store
pub trait StoreClient: Send + Sync {
    /// True while the client holds a live cluster connection
    fn is_connected(&self) -> bool;

    /// Secondary-index query with optional equality filter and projection
    fn query(&self, query: &IndexQuery) -> Result<RecordStream>;

    /// Point read, optionally restricted to some bins
    fn get(&self, key: &Key, bins: Option<&[String]>) -> Result<Option<Record>>;

    /// Upsert. Bins not named are left untouched; generation increments.
    fn put(&self, key: &Key, bins: &Bins) -> Result<()>;

    /// Delete one record, returning whether it existed
    fn delete(&self, key: &Key) -> Result<bool>;

    /// Visit every record of a namespace, or of one set within it
    fn scan_all(&self, namespace: &str, set: Option<&str>, visitor: &mut dyn FnMut(Record)) -> Result<()>;

    /// Remove every record of a set
    fn truncate(&self, namespace: &str, set: &str) -> Result<()>;

    /// Namespaces and their sets
    fn catalogue(&self) -> Result<Catalogue>;
}
