/// Result delivery to the presentation layer
use crate::row::Row;
use crossbeam::channel::{Receiver, Sender};

/// Receiver of statement outcomes.
///
/// Called from the engine's single delivery thread, one call per outcome, in
/// the order the queues completed them.
pub trait ResultSink: Send + 'static {
    /// Rows of a SELECT or browse scan
    fn on_rows(&mut self, rows: Vec<Row>);

    /// Terminal failure or per-key failure, as operator-facing text
    fn on_error(&mut self, message: String);

    /// Completion status of anything that is not a row batch
    fn on_status(&mut self, message: String);

    /// Every outcome of one request has been delivered
    fn on_finished(&mut self) {}
}

/// One delivered outcome
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Rows(Vec<Row>),
    Error(String),
    Status(String),
    /// Marks the end of one request's deliveries
    Finished,
}

impl Delivery {
    /// Hand this outcome to a sink
    pub fn deliver(self, sink: &mut dyn ResultSink) {
        match self {
            Delivery::Rows(rows) => sink.on_rows(rows),
            Delivery::Error(message) => sink.on_error(message),
            Delivery::Status(message) => sink.on_status(message),
            Delivery::Finished => sink.on_finished(),
        }
    }
}

/// Forwards every outcome into a channel. Used by the shell and by tests to
/// wait for results on another thread.
impl ResultSink for Sender<Delivery> {
    fn on_rows(&mut self, rows: Vec<Row>) {
        let _ = self.send(Delivery::Rows(rows));
    }

    fn on_error(&mut self, message: String) {
        let _ = self.send(Delivery::Error(message));
    }

    fn on_status(&mut self, message: String) {
        let _ = self.send(Delivery::Status(message));
    }

    fn on_finished(&mut self) {
        let _ = self.send(Delivery::Finished);
    }
}

/// Receive the deliveries of one request from a channel sink, up to and
/// excluding its `Finished` marker. Stops early if the channel closes.
pub fn recv_request(receiver: &Receiver<Delivery>) -> Vec<Delivery> {
    let mut out = Vec::new();
    for delivery in receiver.iter() {
        if delivery == Delivery::Finished {
            break;
        }
        out.push(delivery);
    }
    out
}
