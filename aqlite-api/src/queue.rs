/// Named single-worker task queue
///
/// One OS thread drains an unbounded channel of boxed tasks in submission
/// order. Closing the channel lets the worker finish what is queued and exit.

use aqlite_core::Result;
use crossbeam::channel::{unbounded, Sender};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Single-worker queue backed by a named thread
pub struct TaskQueue {
    name: String,
    sender: Option<Sender<Task>>,
    handle: Option<JoinHandle<()>>,
}

impl TaskQueue {
    /// Spawn the worker thread
    pub fn spawn(name: &str) -> Result<Self> {
        let (sender, receiver) = unbounded::<Task>();
        let thread_name = name.to_string();

        let handle = thread::Builder::new().name(thread_name.clone()).spawn(move || {
            debug!(queue = %thread_name, "Queue worker started");
            // Ends once every sender is dropped and the backlog is drained
            for task in receiver.iter() {
                task();
            }
            debug!(queue = %thread_name, "Queue worker stopped");
        })?;

        Ok(Self {
            name: name.to_string(),
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enqueue a task. Never blocks; returns false once the queue is shut down.
    pub fn push(&self, task: Task) -> bool {
        match &self.sender {
            Some(sender) => sender.send(task).is_ok(),
            None => false,
        }
    }

    /// Tasks waiting to run
    pub fn backlog(&self) -> usize {
        self.sender.as_ref().map_or(0, Sender::len)
    }

    /// Stop accepting tasks, run the backlog and join the worker
    pub fn shutdown(&mut self) {
        self.sender.take();

        if let Some(handle) = self.handle.take() {
            debug!(queue = %self.name, "Waiting for queue worker to exit");
            if let Err(e) = handle.join() {
                warn!(queue = %self.name, "Queue worker panicked: {:?}", e);
            }
        }
    }
}

impl Drop for TaskQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}
