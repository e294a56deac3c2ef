//! tiercache - Two-Tier Memoizing Cache
//!
//! Keeps a bounded number of recently used values live in memory and spills
//! the rest to a directory of per-key files. The file tier is bounded too:
//! when it overflows, the least recently used files are deleted in batches.
//!
//! # Architecture
//!
//! ```text
//! fetch(key) ──▶ Memory Tier ──miss──▶ File Tier ──miss──▶ compute()
//!                    ▲   │                 ▲   │
//!                    │   └──── demote ─────┘   └──▶ batch GC
//!                    └──────── promote ────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`] - Memory tier, file tier, codecs and the tiered cache
//! - [`error`] - Error types

pub mod cache;
pub mod error;

// Re-export commonly used types
pub use cache::{
    CacheConfig, CacheMetrics, CachePath, CacheTier, Codec, GcPolicy, JsonCodec, LocalPath,
    Lz4Codec, MetricsSnapshot, SharedCache, TieredCache,
};
pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
