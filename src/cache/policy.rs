//! File-Tier Garbage Collection Policy
//!
//! Decides when the file tier has overflowed and how many of its least
//! recently used files one collection batch deletes.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::DEFAULT_FILE_GC_RATIO;

/// Garbage collection policy for the file tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GcPolicy {
    /// Maximum number of persisted files (None = unbounded)
    pub file_limit: Option<usize>,
    /// Fraction of the current file count deleted per batch, in (0, 1]
    pub ratio: f64,
}

impl Default for GcPolicy {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl GcPolicy {
    /// Create a validated policy
    pub fn new(file_limit: Option<usize>, ratio: f64) -> Result<Self> {
        let policy = Self { file_limit, ratio };
        policy.validate()?;
        Ok(policy)
    }

    /// Policy that never deletes files
    pub fn unbounded() -> Self {
        Self {
            file_limit: None,
            ratio: DEFAULT_FILE_GC_RATIO,
        }
    }

    /// Check the ratio lies in (0, 1]
    pub fn validate(&self) -> Result<()> {
        // NaN fails both comparisons
        if !(self.ratio > 0.0 && self.ratio <= 1.0) {
            return Err(Error::Config(format!(
                "file_gc_ratio must be in (0, 1], got {}",
                self.ratio
            )));
        }
        Ok(())
    }

    /// Check whether `file_count` files exceed the limit
    #[inline]
    pub fn needs_collection(&self, file_count: usize) -> bool {
        matches!(self.file_limit, Some(limit) if file_count > limit)
    }

    /// Number of files one batch deletes when `file_count` files are present
    ///
    /// `floor(ratio * file_count)` clamped to `[1, file_count]`.
    pub fn batch_size(&self, file_count: usize) -> usize {
        if file_count == 0 {
            return 0;
        }
        let scaled = (self.ratio * file_count as f64).floor() as usize;
        scaled.clamp(1, file_count)
    }
}
