pub mod error;
pub mod types;
pub mod config;
pub mod aql; // statement front end: splitter, builder, planner
pub mod store; // store client seam + in-memory cluster

pub use error::{Error, Result};
pub use types::*;
pub use config::{parse_hosts, ClientConfig, EngineConfig, Host};
pub use store::{Catalogue, MemoryStore, RecordStream, StoreClient};
