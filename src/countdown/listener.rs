//! Outbound notifications from the countdown engine.
//!
//! The engine owns one [`CountdownListener`] for its whole life. It carries
//! the network-failed and finished callbacks plus the snapshot stream the
//! presentation layer renders.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use crate::types::CountdownSnapshot;

// ============================================================================
// CountdownEvent
// ============================================================================

/// Events emitted by a channel-backed listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CountdownEvent {
    /// Start was refused because the host reported no connectivity
    NetworkFailed,
    /// The countdown entered Over
    Finished,
    /// Status or remaining seconds changed
    Changed {
        /// New snapshot
        #[serde(flatten)]
        snapshot: CountdownSnapshot,
    },
}

// ============================================================================
// CountdownListener
// ============================================================================

/// Receiver of countdown notifications.
///
/// Every method has a no-op default so hosts implement only what they need.
pub trait CountdownListener {
    /// Asked before a start is attempted. Returning false cancels the
    /// start without any further notification.
    fn should_start(&mut self) -> bool {
        true
    }

    /// Called when a start is refused because the device is offline.
    fn on_network_failed(&mut self) {}

    /// Called on every transition into Over.
    fn on_finished(&mut self) {}

    /// Called whenever the rendered snapshot changes.
    fn on_change(&mut self, _snapshot: CountdownSnapshot) {}
}

impl CountdownListener for mpsc::UnboundedSender<CountdownEvent> {
    fn on_network_failed(&mut self) {
        forward(self, CountdownEvent::NetworkFailed);
    }

    fn on_finished(&mut self) {
        forward(self, CountdownEvent::Finished);
    }

    fn on_change(&mut self, snapshot: CountdownSnapshot) {
        forward(self, CountdownEvent::Changed { snapshot });
    }
}

fn forward(tx: &mpsc::UnboundedSender<CountdownEvent>, event: CountdownEvent) {
    if tx.send(event).is_err() {
        debug!(?event, "Countdown event receiver dropped");
    }
}

// ============================================================================
// MockCountdownListener
// ============================================================================

#[derive(Debug)]
struct MockRecord {
    allow_start: bool,
    should_start_calls: usize,
    network_failed: usize,
    finished: usize,
    changes: Vec<CountdownSnapshot>,
}

/// Mock listener for testing.
///
/// Clones share their records, so a test keeps one clone and hands the
/// other to the engine.
#[derive(Debug, Clone)]
pub struct MockCountdownListener {
    record: Arc<Mutex<MockRecord>>,
}

impl Default for MockCountdownListener {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCountdownListener {
    #[must_use]
    pub fn new() -> Self {
        Self {
            record: Arc::new(Mutex::new(MockRecord {
                allow_start: true,
                should_start_calls: 0,
                network_failed: 0,
                finished: 0,
                changes: Vec::new(),
            })),
        }
    }

    /// Sets the answer returned from `should_start`.
    pub fn set_allow_start(&self, allow: bool) {
        self.record.lock().unwrap().allow_start = allow;
    }

    #[must_use]
    pub fn should_start_count(&self) -> usize {
        self.record.lock().unwrap().should_start_calls
    }

    #[must_use]
    pub fn network_failed_count(&self) -> usize {
        self.record.lock().unwrap().network_failed
    }

    #[must_use]
    pub fn finished_count(&self) -> usize {
        self.record.lock().unwrap().finished
    }

    #[must_use]
    pub fn changes(&self) -> Vec<CountdownSnapshot> {
        self.record.lock().unwrap().changes.clone()
    }

    #[must_use]
    pub fn last_change(&self) -> Option<CountdownSnapshot> {
        self.record.lock().unwrap().changes.last().copied()
    }

    pub fn clear(&self) {
        let mut record = self.record.lock().unwrap();
        record.should_start_calls = 0;
        record.network_failed = 0;
        record.finished = 0;
        record.changes.clear();
    }
}

impl CountdownListener for MockCountdownListener {
    fn should_start(&mut self) -> bool {
        let mut record = self.record.lock().unwrap();
        record.should_start_calls += 1;
        record.allow_start
    }

    fn on_network_failed(&mut self) {
        self.record.lock().unwrap().network_failed += 1;
    }

    fn on_finished(&mut self) {
        self.record.lock().unwrap().finished += 1;
    }

    fn on_change(&mut self, snapshot: CountdownSnapshot) {
        self.record.lock().unwrap().changes.push(snapshot);
    }
}
