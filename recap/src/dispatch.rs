//! Delivery of caller callbacks onto the context that owns the UI.
//!
//! Ad SDK callbacks arrive on arbitrary threads. Whatever the caller wants to
//! run afterwards (usually starting playback) goes through a [`Dispatcher`]
//! so it lands where the caller expects it.

use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};

pub type Task = Box<dyn FnOnce() + Send>;

pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, task: Task);
}

/// Runs every task immediately on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineDispatcher;

impl Dispatcher for InlineDispatcher {
    fn dispatch(&self, task: Task) {
        task();
    }
}

/// Queues tasks until the owning thread drains them with [`run_pending`].
///
/// [`run_pending`]: QueueDispatcher::run_pending
pub struct QueueDispatcher {
    tx: Mutex<Sender<Task>>,
    rx: Mutex<Receiver<Task>>,
}

impl QueueDispatcher {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx: Mutex::new(tx),
            rx: Mutex::new(rx),
        }
    }

    /// Runs queued tasks in FIFO order and returns how many ran. Tasks queued
    /// while draining run in the same call.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = {
                let rx = self.rx.lock().unwrap_or_else(|e| e.into_inner());
                rx.try_recv().ok()
            };
            match next {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }
}

impl Default for QueueDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher for QueueDispatcher {
    fn dispatch(&self, task: Task) {
        let tx = self.tx.lock().unwrap_or_else(|e| e.into_inner());
        // The receiver lives as long as self, so send cannot fail here.
        let _ = tx.send(task);
    }
}
