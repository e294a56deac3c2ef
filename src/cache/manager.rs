//! Tiered Cache - Unified Two-Tier Cache
//!
//! Orchestrates the memory tier and the file tier: lookups fall through
//! memory then file then compute, overflow demotes the least recently used
//! value to file, and file hits are promoted back into memory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Error, Result};

use super::codec::{Codec, JsonCodec};
use super::file::FileTier;
use super::key::validate_key;
use super::memory::MemoryTier;
use super::metrics::{CacheMetrics, LatencyTracker, MetricsSnapshot};
use super::path::{CachePath, LocalPath};
use super::policy::GcPolicy;
use super::{DEFAULT_FILE_GC_RATIO, DEFAULT_IN_MEMORY_LIMIT};

/// Cache tier enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheTier {
    /// Live values in process memory
    Memory,
    /// Persisted values in the cache directory
    File,
}

impl std::fmt::Display for CacheTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheTier::Memory => write!(f, "memory"),
            CacheTier::File => write!(f, "file"),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of values kept in memory (0 disables the memory tier)
    pub in_memory_limit: usize,
    /// Maximum number of persisted files (None = unbounded)
    pub file_limit: Option<usize>,
    /// Fraction of the file tier deleted per garbage-collection batch, in (0, 1]
    pub file_gc_ratio: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            in_memory_limit: DEFAULT_IN_MEMORY_LIMIT,
            file_limit: None,
            file_gc_ratio: DEFAULT_FILE_GC_RATIO,
        }
    }
}

impl CacheConfig {
    /// Create a configuration
    pub fn new(in_memory_limit: usize, file_limit: Option<usize>, file_gc_ratio: f64) -> Self {
        Self {
            in_memory_limit,
            file_limit,
            file_gc_ratio,
        }
    }

    /// Garbage collection policy of the file tier
    pub fn gc_policy(&self) -> GcPolicy {
        GcPolicy {
            file_limit: self.file_limit,
            ratio: self.file_gc_ratio,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.gc_policy().validate()
    }
}

/// Two-tier cache
///
/// Single-threaded: every operation takes `&mut self` and completes its
/// promotion, demotion and collection before returning. Wrap it in a
/// [`SharedCache`](super::SharedCache) to use it from several threads.
pub struct TieredCache<T, C = JsonCodec> {
    /// Memory tier
    memory: MemoryTier<T>,
    /// File tier
    files: FileTier<C>,
    /// Configuration
    config: CacheConfig,
    /// Metrics collector
    metrics: Arc<CacheMetrics>,
}

impl<T> TieredCache<T, JsonCodec>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Create a JSON-backed cache in a local directory
    ///
    /// The directory is created if missing and any `<key>.json` files already
    /// in it are adopted into the file tier.
    pub fn new(
        directory: impl Into<PathBuf>,
        in_memory_limit: usize,
        file_limit: Option<usize>,
        file_gc_ratio: f64,
    ) -> Result<Self> {
        Self::with_config(
            &LocalPath::new(directory),
            CacheConfig::new(in_memory_limit, file_limit, file_gc_ratio),
            JsonCodec,
        )
    }
}

impl<T, C> TieredCache<T, C>
where
    T: Serialize + DeserializeOwned + Clone,
    C: Codec,
{
    /// Create a cache with custom configuration, location and codec
    pub fn with_config<P>(path: &P, config: CacheConfig, codec: C) -> Result<Self>
    where
        P: CachePath + ?Sized,
    {
        config.validate()?;
        let directory = path.resolve()?;
        let files = FileTier::open(directory, codec, config.gc_policy())?;

        let cache = Self {
            memory: MemoryTier::new(config.in_memory_limit),
            files,
            config,
            metrics: Arc::new(CacheMetrics::new()),
        };
        cache.update_stats();
        Ok(cache)
    }

    /// Get the value for `key`, computing and storing it on a miss
    ///
    /// `compute` runs only when `key` is in neither tier.
    pub fn fetch<F>(&mut self, key: &str, compute: F) -> Result<T>
    where
        F: FnOnce() -> T,
    {
        self.try_fetch(key, || Ok::<T, Error>(compute()))
    }

    /// Like [`fetch`](Self::fetch) with a fallible `compute`
    ///
    /// An error from `compute` is returned unchanged and leaves the cache
    /// untouched.
    pub fn try_fetch<F, E>(&mut self, key: &str, compute: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> std::result::Result<T, E>,
        E: From<Error>,
    {
        let result = self.lookup_or_compute(key, compute);
        self.update_stats();
        result
    }

    /// Store `value` in memory, demoting the least recently used value to
    /// file if memory overflows
    ///
    /// With a zero in-memory limit the value goes straight to file.
    pub fn put(&mut self, key: &str, value: T) -> Result<T> {
        validate_key(key, self.files.extension())?;
        let result = self.store(key, value, false);
        self.update_stats();
        result
    }

    /// Store `value` directly in the file tier, bypassing memory
    pub fn put_to_file(&mut self, key: &str, value: T) -> Result<T> {
        validate_key(key, self.files.extension())?;
        let result = self.store(key, value, true);
        self.update_stats();
        result
    }

    /// Remove `key` from whichever tier holds it
    pub fn remove(&mut self, key: &str) -> Result<bool> {
        let removed = if self.memory.remove(key).is_some() {
            true
        } else {
            self.files.remove(key)?
        };
        self.update_stats();
        Ok(removed)
    }

    /// Demote every in-memory value to the file tier, oldest first
    ///
    /// Returns the number of values written. File-tier limits still apply,
    /// so with a small file limit some flushed values may be collected.
    pub fn flush(&mut self) -> Result<usize> {
        let mut flushed = 0;
        while let Some((key, value)) = self.memory.pop_oldest() {
            self.metrics.record_demotion();
            let result = self.write_file(&key, &value);
            if let Err(e) = result {
                self.update_stats();
                return Err(e);
            }
            flushed += 1;
        }
        debug!(flushed, "flushed memory tier to file tier");
        self.update_stats();
        Ok(flushed)
    }

    fn lookup_or_compute<F, E>(&mut self, key: &str, compute: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> std::result::Result<T, E>,
        E: From<Error>,
    {
        validate_key(key, self.files.extension())?;

        if let Some(value) = self.memory.get(key) {
            self.metrics.record_memory_hit();
            trace!(key, "memory hit");
            return Ok(value.clone());
        }

        if self.files.contains(key) {
            let tracker = LatencyTracker::start();
            let value: T = self.files.read(key)?;
            self.metrics.record_file_hit(tracker.elapsed());

            if self.memory.is_disabled() {
                self.files.touch(key);
                trace!(key, "file hit");
                return Ok(value);
            }

            self.files.remove(key)?;
            self.metrics.record_promotion();
            debug!(key, "promoting file entry to memory");
            return Ok(self.insert_in_memory(key, value)?);
        }

        self.metrics.record_miss();
        let tracker = LatencyTracker::start();
        let value = compute()?;
        self.metrics.record_compute(tracker.elapsed());
        trace!(key, "computed value");

        Ok(self.store(key, value, false)?)
    }

    fn store(&mut self, key: &str, value: T, to_file: bool) -> Result<T> {
        if to_file || self.memory.is_disabled() {
            self.write_file(key, &value)?;
            self.memory.remove(key);
            return Ok(value);
        }

        // A key lives in one tier only
        self.files.remove(key)?;
        self.insert_in_memory(key, value)
    }

    fn insert_in_memory(&mut self, key: &str, value: T) -> Result<T> {
        let stored = value.clone();
        if let Some((evicted, evicted_value)) = self.memory.insert(key.to_string(), value) {
            self.metrics.record_demotion();
            debug!(key = %evicted, "demoting least recently used entry to file tier");
            self.write_file(&evicted, &evicted_value)?;
        }
        Ok(stored)
    }

    fn write_file(&mut self, key: &str, value: &T) -> Result<()> {
        let tracker = LatencyTracker::start();
        let report = self.files.write(key, value)?;
        self.metrics.record_file_write(tracker.elapsed());

        if !report.is_empty() {
            self.metrics
                .record_collection(report.batches, report.collected.len());
        }
        Ok(())
    }

    /// Update occupancy gauges
    fn update_stats(&self) {
        self.metrics
            .update_entries(self.memory.len(), self.files.len());
    }

    /// Check if `key` is in either tier
    pub fn contains(&self, key: &str) -> bool {
        self.memory.contains(key) || self.files.contains(key)
    }

    /// Tier currently holding `key`
    pub fn tier_of(&self, key: &str) -> Option<CacheTier> {
        if self.memory.contains(key) {
            Some(CacheTier::Memory)
        } else if self.files.contains(key) {
            Some(CacheTier::File)
        } else {
            None
        }
    }

    /// In-memory keys, least recently touched first
    pub fn in_memory_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.memory.keys()
    }

    /// Persisted keys, least recently touched first
    pub fn file_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.files.keys()
    }

    /// Get number of in-memory entries
    pub fn in_memory_len(&self) -> usize {
        self.memory.len()
    }

    /// Get number of persisted entries
    pub fn file_len(&self) -> usize {
        self.files.len()
    }

    /// Path of the file that persists (or would persist) `key`
    pub fn file_path(&self, key: &str) -> PathBuf {
        self.files.path_for(key)
    }

    /// Get the resolved cache directory
    pub fn directory(&self) -> &Path {
        self.files.directory()
    }

    /// Get configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get metrics snapshot
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Shared handle to the live metrics collector
    pub fn metrics_handle(&self) -> Arc<CacheMetrics> {
        Arc::clone(&self.metrics)
    }
}

impl<T, C> std::fmt::Debug for TieredCache<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredCache")
            .field("memory", &self.memory)
            .field("files", &self.files)
            .field("config", &self.config)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
