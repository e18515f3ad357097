//! Event sink port
//!
//! Consumers (UIs, transcript writers) observe a session exclusively
//! through this interface. Appends are atomic; implementations must be
//! safe to call from the coordinator while tasks run concurrently.

use std::sync::Mutex;

use plenum_domain::DeliberationEvent;

/// Receiver for the session event stream
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &DeliberationEvent);
}

/// Sink for callers that do not observe progress
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &DeliberationEvent) {}
}

/// Sink that buffers every event, mainly for tests and batch consumers
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<DeliberationEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far
    pub fn events(&self) -> Vec<DeliberationEvent> {
        self.events.lock().expect("sink lock poisoned").clone()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: &DeliberationEvent) {
        self.events
            .lock()
            .expect("sink lock poisoned")
            .push(event.clone());
    }
}
