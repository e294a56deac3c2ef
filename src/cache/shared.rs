//! Shared Cache - Thread-Safe Wrapper
//!
//! Serializes every operation on a [`TieredCache`] behind one lock. The
//! compute closure runs while the lock is held, so concurrent fetches of the
//! same missing key compute it exactly once.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

use super::codec::{Codec, JsonCodec};
use super::manager::{CacheConfig, CacheTier, TieredCache};
use super::metrics::{CacheMetrics, MetricsSnapshot};
use super::path::CachePath;

/// Tiered cache usable from several threads through `&self`
pub struct SharedCache<T, C = JsonCodec> {
    inner: Mutex<TieredCache<T, C>>,
    /// Readable without taking the cache lock
    metrics: Arc<CacheMetrics>,
}

impl<T> SharedCache<T, JsonCodec>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Create a JSON-backed shared cache in a local directory
    pub fn new(
        directory: impl Into<PathBuf>,
        in_memory_limit: usize,
        file_limit: Option<usize>,
        file_gc_ratio: f64,
    ) -> Result<Self> {
        TieredCache::new(directory, in_memory_limit, file_limit, file_gc_ratio).map(Self::from)
    }
}

impl<T, C> SharedCache<T, C>
where
    T: Serialize + DeserializeOwned + Clone,
    C: Codec,
{
    /// Create a shared cache with custom configuration, location and codec
    pub fn with_config<P>(path: &P, config: CacheConfig, codec: C) -> Result<Self>
    where
        P: CachePath + ?Sized,
    {
        TieredCache::with_config(path, config, codec).map(Self::from)
    }

    /// See [`TieredCache::fetch`]
    pub fn fetch<F>(&self, key: &str, compute: F) -> Result<T>
    where
        F: FnOnce() -> T,
    {
        self.inner.lock().fetch(key, compute)
    }

    /// See [`TieredCache::try_fetch`]
    pub fn try_fetch<F, E>(&self, key: &str, compute: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> std::result::Result<T, E>,
        E: From<Error>,
    {
        self.inner.lock().try_fetch(key, compute)
    }

    /// See [`TieredCache::put`]
    pub fn put(&self, key: &str, value: T) -> Result<T> {
        self.inner.lock().put(key, value)
    }

    /// See [`TieredCache::put_to_file`]
    pub fn put_to_file(&self, key: &str, value: T) -> Result<T> {
        self.inner.lock().put_to_file(key, value)
    }

    /// See [`TieredCache::remove`]
    pub fn remove(&self, key: &str) -> Result<bool> {
        self.inner.lock().remove(key)
    }

    /// See [`TieredCache::flush`]
    pub fn flush(&self) -> Result<usize> {
        self.inner.lock().flush()
    }

    /// Check if `key` is in either tier
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().contains(key)
    }

    /// Tier currently holding `key`
    pub fn tier_of(&self, key: &str) -> Option<CacheTier> {
        self.inner.lock().tier_of(key)
    }

    /// Run `f` with exclusive access to the underlying cache
    pub fn with<R>(&self, f: impl FnOnce(&mut TieredCache<T, C>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Get metrics snapshot
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Unwrap the underlying cache
    pub fn into_inner(self) -> TieredCache<T, C> {
        self.inner.into_inner()
    }
}

impl<T, C> From<TieredCache<T, C>> for SharedCache<T, C>
where
    T: Serialize + DeserializeOwned + Clone,
    C: Codec,
{
    fn from(cache: TieredCache<T, C>) -> Self {
        let metrics = cache.metrics_handle();
        Self {
            inner: Mutex::new(cache),
            metrics,
        }
    }
}

impl<T, C> std::fmt::Debug for SharedCache<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedCache")
            .field("inner", &self.inner)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
