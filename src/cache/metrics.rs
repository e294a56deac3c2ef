//! Cache Metrics Collection
//!
//! Counters and latency averages for monitoring cache effectiveness.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Cache metrics collector
#[derive(Debug, Default)]
pub struct CacheMetrics {
    // Lookups
    memory_hits: AtomicU64,
    file_hits: AtomicU64,
    misses: AtomicU64,
    computes: AtomicU64,

    // Tier movement
    promotions: AtomicU64,
    demotions: AtomicU64,

    // File tier
    file_reads: AtomicU64,
    file_writes: AtomicU64,
    gc_batches: AtomicU64,
    files_collected: AtomicU64,

    // Occupancy
    memory_entries: AtomicU64,
    file_entries: AtomicU64,

    // Latencies (microseconds, exponential moving average)
    compute_latency_us: AtomicU64,
    file_read_latency_us: AtomicU64,
    file_write_latency_us: AtomicU64,
}

impl CacheMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_memory_hit(&self) {
        self.memory_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_file_hit(&self, read_latency: Duration) {
        self.file_hits.fetch_add(1, Ordering::Relaxed);
        self.file_reads.fetch_add(1, Ordering::Relaxed);
        self.update_latency_ema(&self.file_read_latency_us, read_latency);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_compute(&self, latency: Duration) {
        self.computes.fetch_add(1, Ordering::Relaxed);
        self.update_latency_ema(&self.compute_latency_us, latency);
    }

    pub fn record_promotion(&self) {
        self.promotions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_demotion(&self) {
        self.demotions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_file_write(&self, latency: Duration) {
        self.file_writes.fetch_add(1, Ordering::Relaxed);
        self.update_latency_ema(&self.file_write_latency_us, latency);
    }

    pub fn record_collection(&self, batches: usize, files: usize) {
        self.gc_batches.fetch_add(batches as u64, Ordering::Relaxed);
        self.files_collected
            .fetch_add(files as u64, Ordering::Relaxed);
    }

    pub fn update_entries(&self, memory: usize, file: usize) {
        self.memory_entries.store(memory as u64, Ordering::Relaxed);
        self.file_entries.store(file as u64, Ordering::Relaxed);
    }

    pub fn memory_hits(&self) -> u64 {
        self.memory_hits.load(Ordering::Relaxed)
    }

    pub fn file_hits(&self) -> u64 {
        self.file_hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn computes(&self) -> u64 {
        self.computes.load(Ordering::Relaxed)
    }

    pub fn file_writes(&self) -> u64 {
        self.file_writes.load(Ordering::Relaxed)
    }

    fn update_latency_ema(&self, target: &AtomicU64, duration: Duration) {
        let new_us = duration.as_micros() as u64;
        let alpha = 0.1; // EMA smoothing factor

        loop {
            let current = target.load(Ordering::Relaxed);
            let updated = if current == 0 {
                new_us
            } else {
                ((1.0 - alpha) * current as f64 + alpha * new_us as f64) as u64
            };

            if target
                .compare_exchange_weak(current, updated, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                break;
            }
        }
    }

    pub fn compute_latency(&self) -> Duration {
        Duration::from_micros(self.compute_latency_us.load(Ordering::Relaxed))
    }

    pub fn file_read_latency(&self) -> Duration {
        Duration::from_micros(self.file_read_latency_us.load(Ordering::Relaxed))
    }

    pub fn file_write_latency(&self) -> Duration {
        Duration::from_micros(self.file_write_latency_us.load(Ordering::Relaxed))
    }

    /// Fraction of lookups answered without computing
    pub fn hit_ratio(&self) -> f64 {
        let hits = self.memory_hits() + self.file_hits();
        let total = hits + self.misses();

        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            memory_hits: self.memory_hits(),
            file_hits: self.file_hits(),
            misses: self.misses(),
            computes: self.computes(),
            hit_ratio: self.hit_ratio(),

            promotions: self.promotions.load(Ordering::Relaxed),
            demotions: self.demotions.load(Ordering::Relaxed),

            file_reads: self.file_reads.load(Ordering::Relaxed),
            file_writes: self.file_writes(),
            gc_batches: self.gc_batches.load(Ordering::Relaxed),
            files_collected: self.files_collected.load(Ordering::Relaxed),

            memory_entries: self.memory_entries.load(Ordering::Relaxed),
            file_entries: self.file_entries.load(Ordering::Relaxed),

            compute_latency: self.compute_latency(),
            file_read_latency: self.file_read_latency(),
            file_write_latency: self.file_write_latency(),
        }
    }

    /// Reset all counters (occupancy is left alone)
    pub fn reset(&self) {
        for counter in [
            &self.memory_hits,
            &self.file_hits,
            &self.misses,
            &self.computes,
            &self.promotions,
            &self.demotions,
            &self.file_reads,
            &self.file_writes,
            &self.gc_batches,
            &self.files_collected,
            &self.compute_latency_us,
            &self.file_read_latency_us,
            &self.file_write_latency_us,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Snapshot of all cache metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    // Lookups
    pub memory_hits: u64,
    pub file_hits: u64,
    pub misses: u64,
    pub computes: u64,
    pub hit_ratio: f64,

    // Tier movement
    pub promotions: u64,
    pub demotions: u64,

    // File tier
    pub file_reads: u64,
    pub file_writes: u64,
    pub gc_batches: u64,
    pub files_collected: u64,

    // Occupancy
    pub memory_entries: u64,
    pub file_entries: u64,

    // Latency
    pub compute_latency: Duration,
    pub file_read_latency: Duration,
    pub file_write_latency: Duration,
}

/// Latency tracker helper
pub struct LatencyTracker {
    start: Instant,
}

impl LatencyTracker {
    /// Start tracking latency
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

// =============================================================================
// Tests
// =============================================================================
