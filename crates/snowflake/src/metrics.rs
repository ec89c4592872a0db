//! Connector metrics
//!
//! Atomic counters for buffering, flushing and statement execution.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for the Snowflake connector
#[derive(Debug, Default)]
pub struct ConnectorMetrics {
    /// Records accepted into the write cache
    pub records_buffered: AtomicU64,

    /// Records written by a successful partition flush
    pub records_flushed: AtomicU64,

    /// Records discarded because no statement could be built for them
    pub records_dropped: AtomicU64,

    /// Flush passes that found buffered records
    pub flush_count: AtomicU64,

    /// Partitions that failed to flush and stayed buffered
    pub flush_errors: AtomicU64,

    /// Statements the warehouse accepted
    pub statements_executed: AtomicU64,

    /// Statements that failed
    pub statement_errors: AtomicU64,
}

impl ConnectorMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            records_buffered: AtomicU64::new(0),
            records_flushed: AtomicU64::new(0),
            records_dropped: AtomicU64::new(0),
            flush_count: AtomicU64::new(0),
            flush_errors: AtomicU64::new(0),
            statements_executed: AtomicU64::new(0),
            statement_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_buffered(&self) {
        self.records_buffered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_flushed(&self, count: u64) {
        self.records_flushed.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dropped(&self, count: u64) {
        self.records_dropped.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_flush(&self) {
        self.flush_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_flush_error(&self) {
        self.flush_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one statement
    #[inline]
    pub fn record_statement(&self, ok: bool) {
        let counter = if ok {
            &self.statements_executed
        } else {
            &self.statement_errors
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_buffered: self.records_buffered.load(Ordering::Relaxed),
            records_flushed: self.records_flushed.load(Ordering::Relaxed),
            records_dropped: self.records_dropped.load(Ordering::Relaxed),
            flush_count: self.flush_count.load(Ordering::Relaxed),
            flush_errors: self.flush_errors.load(Ordering::Relaxed),
            statements_executed: self.statements_executed.load(Ordering::Relaxed),
            statement_errors: self.statement_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub records_buffered: u64,
    pub records_flushed: u64,
    pub records_dropped: u64,
    pub flush_count: u64,
    pub flush_errors: u64,
    pub statements_executed: u64,
    pub statement_errors: u64,
}
