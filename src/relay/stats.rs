//! Emission counters and their point-in-time snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::strategies::Delivery;

/// Snapshot of a relay's counters, returned by [`Relay::stats`](crate::Relay::stats).
///
/// Counters are monotonic; `subscribers` and `pending` are gauges read at snapshot time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Total `emit` calls.
    pub emitted: u64,
    /// Events accepted into the retained buffer.
    pub enqueued: u64,
    /// Events handed to the broadcast dispatch worker.
    pub dispatched: u64,
    /// Broadcast events dropped because nobody was subscribed.
    pub suppressed: u64,
    /// Events rejected with an [`EmitError`](crate::EmitError).
    pub failed: u64,
    /// Live subscriptions.
    pub subscribers: usize,
    /// Undelivered events waiting in the retained buffer.
    pub pending: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    emitted: AtomicU64,
    enqueued: AtomicU64,
    dispatched: AtomicU64,
    suppressed: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    pub(crate) fn record(&self, outcome: Result<Delivery, ()>) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            Ok(Delivery::Enqueued) => &self.enqueued,
            Ok(Delivery::Dispatched) => &self.dispatched,
            Ok(Delivery::Suppressed) => &self.suppressed,
            Err(()) => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, subscribers: usize, pending: usize) -> RelayStats {
        RelayStats {
            emitted: self.emitted.load(Ordering::Relaxed),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            subscribers,
            pending,
        }
    }
}
