//! Collector counters.
//!
//! Plain atomics updated on the search path; the optional Prometheus
//! exporter reads snapshots of them at scrape time.

#[cfg(feature = "metrics")]
pub mod prometheus;

use crate::buffer::BatchType;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectorMetricsSnapshot {
    pub events_added: u64,
    pub events_dropped: u64,
    pub events_flushed: u64,
    pub size_flushes: u64,
    pub time_flushes: u64,
    pub shutdown_flushes: u64,
    pub skipped_flushes: u64,
    pub serialization_failures: u64,
}

impl CollectorMetricsSnapshot {
    pub fn total_flushes(&self) -> u64 {
        self.size_flushes + self.time_flushes + self.shutdown_flushes
    }
}

#[derive(Debug, Default)]
pub struct CollectorMetrics {
    events_added: AtomicU64,
    events_dropped: AtomicU64,
    events_flushed: AtomicU64,
    size_flushes: AtomicU64,
    time_flushes: AtomicU64,
    shutdown_flushes: AtomicU64,
    skipped_flushes: AtomicU64,
    serialization_failures: AtomicU64,
}

impl CollectorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_added(&self) {
        self.events_added.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the running total of dropped events.
    pub fn record_dropped(&self, count: u64) -> u64 {
        self.events_dropped.fetch_add(count, Ordering::Relaxed) + count
    }

    pub fn record_flush(&self, batch_type: BatchType, event_count: usize) {
        self.events_flushed
            .fetch_add(event_count as u64, Ordering::Relaxed);

        let counter = match batch_type {
            BatchType::SizeBased => &self.size_flushes,
            BatchType::TimeBased => &self.time_flushes,
            BatchType::Shutdown => &self.shutdown_flushes,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped_flush(&self) {
        self.skipped_flushes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_serialization_failure(&self) {
        self.serialization_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CollectorMetricsSnapshot {
        CollectorMetricsSnapshot {
            events_added: self.events_added.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            events_flushed: self.events_flushed.load(Ordering::Relaxed),
            size_flushes: self.size_flushes.load(Ordering::Relaxed),
            time_flushes: self.time_flushes.load(Ordering::Relaxed),
            shutdown_flushes: self.shutdown_flushes.load(Ordering::Relaxed),
            skipped_flushes: self.skipped_flushes.load(Ordering::Relaxed),
            serialization_failures: self.serialization_failures.load(Ordering::Relaxed),
        }
    }
}
