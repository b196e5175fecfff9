//! Bounded action buffer with detached batch flushes
//!
//! Ingestion never blocks on sink I/O: once the buffer grows past the
//! flush threshold, a full batch is handed to a detached thread and the
//! pass keeps fetching. Every flush handle is owned here and joined in
//! [`ActionQueue::drain`], so no flush is ever silently dropped.

use std::sync::Arc;
use std::thread::JoinHandle;

use crate::models::Action;
use crate::storage::ActionSink;

/// Buffered actions above which a batch is handed to the sink
pub const FLUSH_THRESHOLD: usize = 2000;

/// Order-preserving buffer of normalized actions for one account's pass
pub struct ActionQueue {
    buffer: Vec<Action>,
    capacity: usize,
    sink: Arc<dyn ActionSink>,
    inflight: Vec<JoinHandle<()>>,
    pushed: usize,
}

impl ActionQueue {
    pub fn new(sink: Arc<dyn ActionSink>) -> Self {
        Self::with_capacity(sink, FLUSH_THRESHOLD)
    }

    pub fn with_capacity(sink: Arc<dyn ActionSink>, capacity: usize) -> Self {
        Self {
            buffer: Vec::new(),
            capacity,
            sink,
            inflight: Vec::new(),
            pushed: 0,
        }
    }

    /// Append an action; once the buffer exceeds the capacity, a batch of
    /// exactly `capacity` actions is flushed on a detached thread and the
    /// overflow stays buffered.
    pub fn push(&mut self, action: Action) {
        self.buffer.push(action);
        self.pushed += 1;

        if self.buffer.len() > self.capacity {
            // The flush thread takes the batch outright; the overflow
            // becomes a fresh buffer so nothing aliases in-flight data.
            let overflow = self.buffer.split_off(self.capacity);
            let batch = std::mem::replace(&mut self.buffer, overflow);
            let sink = Arc::clone(&self.sink);
            self.inflight.push(std::thread::spawn(move || {
                deliver(sink.as_ref(), &batch);
            }));
        }
    }

    /// Actions currently buffered (not yet handed to the sink)
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Total actions pushed over this queue's lifetime
    pub fn pushed(&self) -> usize {
        self.pushed
    }

    /// Wait for every in-flight flush, then deliver whatever remains in
    /// the buffer synchronously. Afterwards the buffer is empty and every
    /// action ever pushed has been offered to the sink exactly once.
    pub fn drain(&mut self) {
        for handle in self.inflight.drain(..) {
            if handle.join().is_err() {
                log::error!("action flush thread panicked");
            }
        }

        if !self.buffer.is_empty() {
            let batch = std::mem::take(&mut self.buffer);
            deliver(self.sink.as_ref(), &batch);
        }
    }
}

/// Hand a batch to the sink; delivery is best-effort and failures are
/// logged, never retried.
fn deliver(sink: &dyn ActionSink, batch: &[Action]) {
    log::info!("delivering {} actions to the sink", batch.len());
    if let Err(err) = sink.accept(batch) {
        log::error!("failed to deliver {} actions: {err:#}", batch.len());
    }
}
