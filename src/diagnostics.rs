//! Bounded diagnostic ring.
//!
//! Holds up to [`LOG_RECORD_COUNT`] events for the host to pull. There is no
//! log level filter; everything is recorded, and when the ring is full the
//! least important record makes room:
//!
//! 1. find the lowest level present;
//! 2. if it is above the incoming event's level, drop the incoming event;
//! 3. otherwise evict the oldest record at that level.
//!
//! Either loss sets the `ejected` flag, which the host reads (and clears)
//! with its next status poll.

use crate::app::events::DiagnosticEvent;
use crate::app::ports::DiagnosticSink;

/// Ring capacity.
pub const LOG_RECORD_COUNT: usize = 46;

/// Fixed-capacity event store, oldest first.
#[derive(Debug, Default)]
pub struct DiagnosticRing {
    records: heapless::Vec<DiagnosticEvent, LOG_RECORD_COUNT>,
    ejected: bool,
}

impl DiagnosticRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Remove and return the oldest event.
    pub fn pop_oldest(&mut self) -> Option<DiagnosticEvent> {
        if self.records.is_empty() {
            None
        } else {
            Some(self.records.remove(0))
        }
    }

    /// Oldest-first view without consuming.
    pub fn iter(&self) -> impl Iterator<Item = &DiagnosticEvent> {
        self.records.iter()
    }

    /// Whether any event was lost since the last call; clears the flag.
    pub fn take_ejected(&mut self) -> bool {
        core::mem::take(&mut self.ejected)
    }

    fn push(&mut self, event: DiagnosticEvent) {
        if self.records.is_full() {
            let Some(lowest) = self.records.iter().map(|e| e.level).min() else {
                return;
            };
            self.ejected = true;
            if lowest > event.level {
                return;
            }
            if let Some(pos) = self.records.iter().position(|e| e.level == lowest) {
                self.records.remove(pos);
            }
        }
        // Room made above.
        let _ = self.records.push(event);
    }
}

impl DiagnosticSink for DiagnosticRing {
    fn record(&mut self, event: &DiagnosticEvent) {
        self.push(event.clone());
    }
}

/// Read side of a sink that buffers events for the host.
pub trait LogBuffer {
    fn pop_oldest(&mut self) -> Option<DiagnosticEvent>;

    fn take_ejected(&mut self) -> bool;
}

impl LogBuffer for DiagnosticRing {
    fn pop_oldest(&mut self) -> Option<DiagnosticEvent> {
        DiagnosticRing::pop_oldest(self)
    }

    fn take_ejected(&mut self) -> bool {
        DiagnosticRing::take_ejected(self)
    }
}

/// Console sink paired with the ring: the ring serves the host.
impl<A: DiagnosticSink> LogBuffer for (A, DiagnosticRing) {
    fn pop_oldest(&mut self) -> Option<DiagnosticEvent> {
        self.1.pop_oldest()
    }

    fn take_ejected(&mut self) -> bool {
        self.1.take_ejected()
    }
}
