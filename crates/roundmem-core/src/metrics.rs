//! Global atomic counters for memory lifecycle observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at process shutdown).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters — no allocations, no locking.
pub struct Metrics {
    rounds_recorded: AtomicU64,
    compressions: AtomicU64,
    compression_failures: AtomicU64,
    facts_evicted: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            rounds_recorded: AtomicU64::new(0),
            compressions: AtomicU64::new(0),
            compression_failures: AtomicU64::new(0),
            facts_evicted: AtomicU64::new(0),
        }
    }

    pub fn inc_rounds_recorded(&self) {
        self.rounds_recorded.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "rounds_recorded", "counter incremented");
    }

    pub fn inc_compressions(&self) {
        self.compressions.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "compressions", "counter incremented");
    }

    pub fn inc_compression_failures(&self) {
        self.compression_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "compression_failures", "counter incremented");
    }

    /// Add `n` to the facts-evicted counter.
    pub fn add_facts_evicted(&self, n: u64) {
        self.facts_evicted.fetch_add(n, Ordering::Relaxed);
        tracing::trace!(metric = "facts_evicted", n = n, "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            rounds_recorded = self.rounds_recorded(),
            compressions = self.compressions(),
            compression_failures = self.compression_failures(),
            facts_evicted = self.facts_evicted(),
        );
    }

    pub fn rounds_recorded(&self) -> u64 {
        self.rounds_recorded.load(Ordering::Relaxed)
    }

    pub fn compressions(&self) -> u64 {
        self.compressions.load(Ordering::Relaxed)
    }

    pub fn compression_failures(&self) -> u64 {
        self.compression_failures.load(Ordering::Relaxed)
    }

    pub fn facts_evicted(&self) -> u64 {
        self.facts_evicted.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.rounds_recorded.store(0, Ordering::Relaxed);
        self.compressions.store(0, Ordering::Relaxed);
        self.compression_failures.store(0, Ordering::Relaxed);
        self.facts_evicted.store(0, Ordering::Relaxed);
    }
}
