//! Producer metrics

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Counters shared between a producer task and its owner
#[derive(Debug, Default)]
pub struct SourceMetrics {
    /// Items accepted by the flow channel
    pub items_produced: AtomicU64,

    /// Sends that found the flow channel full and had to wait
    pub sends_blocked: AtomicU64,

    /// Set once the producer task has exited
    pub finished: AtomicBool,
}

impl SourceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_produced(&self) {
        self.items_produced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_blocked(&self) {
        self.sends_blocked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn mark_finished(&self) {
        self.finished.store(true, Ordering::Release);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            items_produced: self.items_produced.load(Ordering::Relaxed),
            sends_blocked: self.sends_blocked.load(Ordering::Relaxed),
            finished: self.finished.load(Ordering::Acquire),
        }
    }
}

/// Point-in-time copy of `SourceMetrics`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub items_produced: u64,
    pub sends_blocked: u64,
    pub finished: bool,
}
