//! Two-Tier Cache System
//!
//! Recency-ordered in-memory tier backed by a capacity-bounded file tier.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                           Tiered Cache                                    │
//! ├──────────────────────────────────────────────────────────────────────────┤
//! │  Memory Tier                        │ File Tier                           │
//! │  ┌──────────────────────────────┐   │ ┌────────────────────────────────┐  │
//! │  │ LRU list (key -> value)      │   │ │ LRU list (key)                 │  │
//! │  │ bounded by in_memory_limit   │   │ │ <dir>/<key>.<ext> via Codec    │  │
//! │  │                              │   │ │ bounded by file_limit (GC)     │  │
//! │  └──────────────────────────────┘   │ └────────────────────────────────┘  │
//! │                 │                   │                 │                   │
//! │                 └──── demotion ─────┴──── promotion ──┘                   │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key lifecycle
//!
//! ```text
//! Absent ──▶ InMemory ◀──▶ OnFile ──▶ Deleted
//!    └────────────────────────▲
//! ```
//!
//! A key lives in at most one tier. Entries only reach the file tier through
//! demotion or a direct-to-file store, and only leave it through promotion,
//! explicit removal, or garbage collection.
//!
//! # Example
//!
//! ```no_run
//! use tiercache::TieredCache;
//!
//! let mut cache: TieredCache<Vec<u64>> =
//!     TieredCache::new("/var/cache/primes", 16, Some(1024), 0.1)?;
//!
//! let primes = cache.fetch("below-100", || {
//!     (2..100u64).filter(|n| (2..*n).all(|d| n % d != 0)).collect()
//! })?;
//! assert_eq!(primes.len(), 25);
//! # Ok::<(), tiercache::Error>(())
//! ```

pub mod codec;
mod file;
mod key;
mod manager;
mod memory;
mod metrics;
pub mod path;
mod policy;
mod shared;

#[cfg(test)]
mod proptest;

pub use codec::{Codec, JsonCodec, Lz4Codec};
pub use file::{FileTier, GcReport};
pub use key::{file_name, key_from_file_name, validate_key};
pub use manager::{CacheConfig, CacheTier, TieredCache};
pub use memory::MemoryTier;
pub use metrics::{CacheMetrics, LatencyTracker, MetricsSnapshot};
pub use path::{CachePath, LocalPath};
pub use policy::GcPolicy;
pub use shared::SharedCache;

/// Default number of values kept in memory
pub const DEFAULT_IN_MEMORY_LIMIT: usize = 128;

/// Default fraction of the file tier removed by one garbage-collection batch
pub const DEFAULT_FILE_GC_RATIO: f64 = 0.1;

/// Longest file name most filesystems accept
pub const MAX_FILE_NAME_LEN: usize = 255;

/// Suffix of in-flight writes; such files are never adopted
pub const TEMP_FILE_SUFFIX: &str = ".partial";

// =============================================================================
// Tests
// =============================================================================
