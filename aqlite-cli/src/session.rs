/// Connected engine plus the channel its outcomes arrive on
///
/// The CLI runs one request at a time: submit, then block until the engine
/// signals that every outcome of that request was delivered. Records live in
/// a process-local [`MemoryStore`]; nothing is sent over the network.

use anyhow::{Context, Result};
use aqlite_api::{recv_request, Delivery, Engine, Request};
use aqlite_core::{ClientConfig, EngineConfig, MemoryStore};
use crossbeam::channel::{unbounded, Receiver};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// How the shell names the backing store
pub const STORE_LABEL: &str = "in-memory store";

pub struct Session {
    store: MemoryStore,
    engine: Engine,
    receiver: Receiver<Delivery>,
}

impl Session {
    /// Open the in-memory store and start the engine, optionally seeding the
    /// store from a JSON file shaped `{namespace: {set: {key: {bin: value}}}}`
    pub fn open(config: ClientConfig, seed: Option<&Path>) -> Result<Self> {
        let store = MemoryStore::connect(config).context("Failed to open the in-memory store")?;

        if let Some(path) = seed {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read seed file {}", path.display()))?;
            let json: serde_json::Value =
                serde_json::from_str(&text).context("Seed file is not valid JSON")?;
            let loaded = store.load_json(&json).context("Failed to load seed data")?;
            info!(records = loaded, path = %path.display(), "Seeded store");
        }

        let (sender, receiver) = unbounded();
        let engine = Engine::start(Arc::new(store.clone()), EngineConfig::default(), sender)
            .context("Failed to start execution engine")?;

        Ok(Self {
            store,
            engine,
            receiver,
        })
    }

    /// Run one request and collect everything it delivered
    pub fn run(&self, request: Request) -> Vec<Delivery> {
        match self.engine.submit(request) {
            Ok(_) => recv_request(&self.receiver),
            Err(e) => vec![Delivery::Error(e.to_string())],
        }
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Reattach the store and report it
    pub fn connect(&self) -> String {
        self.store.reconnect();
        format!("Connected to the {}", STORE_LABEL)
    }

    /// Detach the store; requests fail with "not connected" until `connect`
    pub fn disconnect(&self) -> String {
        self.store.disconnect();
        format!("Disconnected from the {}", STORE_LABEL)
    }

    pub fn close(mut self) {
        self.engine.shutdown();
    }
}
