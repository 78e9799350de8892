/// Asynchronous execution engine
///
/// Requests are routed to one of two named single-worker queues: `query`
/// for reads and scans (SELECT, the DELETE sweep, browse) and `write` for
/// everything that mutates a single record or the catalogue. Each finished
/// request produces deliveries that a separate delivery thread hands to the
/// sink. Ordering holds within a queue only; a SELECT submitted after an
/// INSERT may run before the INSERT lands.

use crate::executor::{Executor, Outcome};
use crate::queue::TaskQueue;
use crate::row::{Row, NAMESPACE_COLUMN, SET_COLUMN};
use crate::sink::{Delivery, ResultSink};
use aqlite_core::aql::Command;
use aqlite_core::{EngineConfig, Error, Key, Result, StoreClient, Value};
use crossbeam::channel::{unbounded, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Queue a request runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    Query,
    Write,
}

impl QueueKind {
    pub fn for_command(command: Command) -> Self {
        match command {
            Command::Select | Command::Delete => QueueKind::Query,
            Command::Insert | Command::Update => QueueKind::Write,
        }
    }
}

/// Work the engine accepts
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// One AQL statement
    Aql(String),
    /// Scan a namespace or one of its sets
    Browse { namespace: String, set: Option<String> },
    /// Delete one record
    DeleteRecord(Key),
    /// Overwrite one bin from raw text
    EditBin { key: Key, bin: String, raw: String },
    /// Remove every record of a set
    Truncate { namespace: String, set: String },
    /// List namespaces and sets
    Catalogue,
}

impl Request {
    pub fn aql(text: impl Into<String>) -> Self {
        Request::Aql(text.into())
    }

    /// Statements that fail classification are rejected on the query queue.
    pub fn queue(&self) -> QueueKind {
        match self {
            Request::Aql(text) => Command::classify(text)
                .map(QueueKind::for_command)
                .unwrap_or(QueueKind::Query),
            Request::Browse { .. } => QueueKind::Query,
            Request::DeleteRecord(_)
            | Request::EditBin { .. }
            | Request::Truncate { .. }
            | Request::Catalogue => QueueKind::Write,
        }
    }
}

fn error_message(err: &Error) -> String {
    err.to_string()
}

/// Run a request to completion and turn its outcome into deliveries
pub fn run_request(executor: &Executor, request: Request) -> Vec<Delivery> {
    match request {
        Request::Aql(text) => match executor.execute(&text) {
            Ok(outcome) => outcome_deliveries(outcome),
            Err(e) => vec![Delivery::Error(error_message(&e))],
        },
        Request::Browse { namespace, set } => match executor.browse(&namespace, set.as_deref()) {
            Ok(rows) => vec![Delivery::Rows(rows), Delivery::Status("Scan completed.".into())],
            Err(e) => vec![Delivery::Error(error_message(&e))],
        },
        Request::DeleteRecord(key) => match executor.delete_record(&key) {
            Ok(true) => vec![Delivery::Status(format!(
                "Record with key '{}' deleted.",
                key.user_key
            ))],
            Ok(false) => vec![Delivery::Status(format!(
                "Record with key '{}' not found.",
                key.user_key
            ))],
            Err(e) => vec![Delivery::Error(error_message(&e))],
        },
        Request::EditBin { key, bin, raw } => match executor.edit_bin(&key, &bin, &raw) {
            Ok(edit) => {
                let mut out: Vec<Delivery> = edit
                    .fallback
                    .iter()
                    .map(|f| Delivery::Status(f.to_string()))
                    .collect();
                out.push(Delivery::Status(edit.summary()));
                out
            }
            Err(e) => vec![Delivery::Error(error_message(&e))],
        },
        Request::Truncate { namespace, set } => match executor.truncate(&namespace, &set) {
            Ok(()) => vec![Delivery::Status(format!("Set deleted: {}.{}", namespace, set))],
            Err(e) => vec![Delivery::Error(error_message(&e))],
        },
        Request::Catalogue => match executor.catalogue() {
            Ok(catalogue) => {
                let mut rows = Vec::new();
                for (namespace, sets) in catalogue {
                    if sets.is_empty() {
                        let mut row = Row::new();
                        row.insert(NAMESPACE_COLUMN.to_string(), Value::string(&namespace));
                        rows.push(row);
                    }
                    for set in sets {
                        let mut row = Row::new();
                        row.insert(NAMESPACE_COLUMN.to_string(), Value::string(&namespace));
                        row.insert(SET_COLUMN.to_string(), Value::string(set));
                        rows.push(row);
                    }
                }
                vec![
                    Delivery::Rows(rows),
                    Delivery::Status("Namespaces and sets loaded.".into()),
                ]
            }
            Err(e) => vec![Delivery::Error(error_message(&e))],
        },
    }
}

fn outcome_deliveries(outcome: Outcome) -> Vec<Delivery> {
    match outcome {
        Outcome::Rows(rows) => vec![Delivery::Rows(rows)],
        Outcome::Inserted { key } => vec![Delivery::Status(format!("Record inserted: {}", key))],
        Outcome::Deleted(report) => {
            let mut out: Vec<Delivery> = report
                .failure_messages()
                .into_iter()
                .map(Delivery::Error)
                .collect();
            out.push(Delivery::Status(report.summary()));
            out
        }
        Outcome::Updated(report) => {
            let mut out: Vec<Delivery> = report
                .fallbacks
                .iter()
                .map(|f| Delivery::Status(f.to_string()))
                .collect();
            out.push(Delivery::Status(report.summary()));
            out
        }
    }
}

/// Execution engine: two worker queues plus a delivery thread
pub struct Engine {
    executor: Arc<Executor>,
    query_queue: TaskQueue,
    write_queue: TaskQueue,
    delivery: Option<Sender<Delivery>>,
    delivery_handle: Option<JoinHandle<()>>,
}

impl Engine {
    /// Start the queues and the delivery thread
    pub fn start<S: ResultSink>(store: Arc<dyn StoreClient>, config: EngineConfig, sink: S) -> Result<Self> {
        config.validate().map_err(Error::InvalidArgument)?;

        let (delivery, receiver) = unbounded::<Delivery>();
        let delivery_name = config.delivery_name.clone();
        let delivery_handle = thread::Builder::new().name(delivery_name.clone()).spawn(move || {
            let mut sink = sink;
            debug!(thread = %delivery_name, "Delivery thread started");
            for item in receiver.iter() {
                item.deliver(&mut sink);
            }
            debug!(thread = %delivery_name, "Delivery thread stopped");
        })?;

        let query_queue = TaskQueue::spawn(&config.query_queue_name)?;
        let write_queue = TaskQueue::spawn(&config.write_queue_name)?;

        info!(
            query = %config.query_queue_name,
            write = %config.write_queue_name,
            "Engine started"
        );

        Ok(Self {
            executor: Arc::new(Executor::with_config(store, config)),
            query_queue,
            write_queue,
            delivery: Some(delivery),
            delivery_handle: Some(delivery_handle),
        })
    }

    pub fn executor(&self) -> &Arc<Executor> {
        &self.executor
    }

    /// Queue a request. Never blocks and never runs the request inline.
    pub fn submit(&self, request: Request) -> Result<QueueKind> {
        let kind = request.queue();
        let delivery = self
            .delivery
            .clone()
            .ok_or_else(|| Error::Internal("engine is shut down".into()))?;
        let executor = Arc::clone(&self.executor);

        let task = Box::new(move || {
            let mut items = run_request(&executor, request);
            items.push(Delivery::Finished);
            for item in items {
                if delivery.send(item).is_err() {
                    warn!("Delivery thread gone, dropping outcome");
                    break;
                }
            }
        });

        let queue = match kind {
            QueueKind::Query => &self.query_queue,
            QueueKind::Write => &self.write_queue,
        };
        if !queue.push(task) {
            return Err(Error::Internal(format!("queue '{}' is closed", queue.name())));
        }
        Ok(kind)
    }

    /// Queue one AQL statement
    pub fn submit_aql(&self, aql: &str) -> Result<QueueKind> {
        self.submit(Request::aql(aql))
    }

    /// Finish queued work, deliver its outcomes and stop every thread
    pub fn shutdown(&mut self) {
        self.query_queue.shutdown();
        self.write_queue.shutdown();

        // Queued tasks held the other senders; dropping ours closes the channel
        self.delivery.take();
        if let Some(handle) = self.delivery_handle.take() {
            if let Err(e) = handle.join() {
                warn!("Delivery thread panicked: {:?}", e);
            }
            info!("Engine stopped");
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
