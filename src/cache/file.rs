//! File Tier - Warm Cache
//!
//! Persisted values, one file per key, in a single directory.
//!
//! # Design
//!
//! - Recency list of keys; the directory holds exactly one `<key>.<ext>`
//!   file per listed key
//! - Files already in the directory are adopted when the tier opens
//! - Writes go to a uniquely named temporary file that is renamed over the
//!   target, so a crash never leaves a truncated file behind to be adopted
//! - Overflow past the file limit deletes least recently touched files in
//!   batches sized by [`GcPolicy::batch_size`]

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use lru::LruCache;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::error::{Error, Result};

use super::codec::Codec;
use super::key::{file_name, key_from_file_name};
use super::memory::oldest_first;
use super::policy::GcPolicy;
use super::TEMP_FILE_SUFFIX;

/// Outcome of garbage collection after a write
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GcReport {
    /// Number of batches run
    pub batches: usize,
    /// Keys whose files were deleted, oldest first
    pub collected: Vec<String>,
}

impl GcReport {
    /// Check if anything was collected
    pub fn is_empty(&self) -> bool {
        self.collected.is_empty()
    }
}

/// File tier - directory of persisted values
pub struct FileTier<C> {
    /// Resolved cache directory
    directory: PathBuf,
    /// Value codec
    codec: C,
    /// Persisted keys, most recently touched at the front
    keys: LruCache<String, ()>,
    /// Garbage collection policy
    policy: GcPolicy,
}

impl<C: Codec> FileTier<C> {
    /// Open a file tier over an existing directory, adopting persisted files
    ///
    /// Adopted files are ordered by modification time, oldest first, ties
    /// broken by key. Leftover temporary files from interrupted writes are
    /// removed.
    pub fn open(directory: PathBuf, codec: C, policy: GcPolicy) -> Result<Self> {
        policy.validate()?;

        let mut keys = LruCache::unbounded();
        for key in scan(&directory, codec.extension())? {
            keys.put(key, ());
        }

        let tier = Self {
            directory,
            codec,
            keys,
            policy,
        };

        debug!(
            directory = %tier.directory.display(),
            adopted = tier.len(),
            "opened file tier"
        );
        if tier.policy.needs_collection(tier.len()) {
            warn!(
                adopted = tier.len(),
                file_limit = ?tier.policy.file_limit,
                "adopted files exceed the file limit; the next write will collect"
            );
        }

        Ok(tier)
    }

    /// Path of the file persisting `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.directory.join(file_name(key, self.codec.extension()))
    }

    /// Check if `key` is persisted
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Mark `key` most recently touched
    pub fn touch(&mut self, key: &str) {
        self.keys.promote(key);
    }

    /// Read and decode the value persisted for `key` without touching it
    ///
    /// A file that exists but cannot be decoded is reported as
    /// [`Error::CorruptFile`].
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let path = self.path_for(key);
        let data = fs::read(&path).map_err(|e| Error::file_io(&path, e))?;

        self.codec.decode(&data).map_err(|e| Error::CorruptFile {
            path,
            reason: e.to_string(),
        })
    }

    /// Persist `value` under `key` as the most recently touched entry,
    /// then collect if the tier overflowed
    pub fn write<T: Serialize>(&mut self, key: &str, value: &T) -> Result<GcReport> {
        let data = self.codec.encode(value)?;
        let path = self.path_for(key);
        let temp = self.directory.join(temp_file_name());

        fs::write(&temp, &data).map_err(|e| Error::file_io(&temp, e))?;
        if let Err(e) = fs::rename(&temp, &path) {
            let _ = fs::remove_file(&temp);
            return Err(Error::file_io(&path, e));
        }
        trace!(key, bytes = data.len(), "persisted value");

        // put moves an existing key to the front
        self.keys.put(key.to_string(), ());
        self.collect()
    }

    /// Remove `key` and delete its file
    ///
    /// The key stays listed if its file cannot be deleted.
    pub fn remove(&mut self, key: &str) -> Result<bool> {
        if !self.keys.contains(key) {
            return Ok(false);
        }
        self.delete_file(key)?;
        self.keys.pop(key);
        Ok(true)
    }

    /// Delete least recently touched files until the tier is within its limit
    fn collect(&mut self) -> Result<GcReport> {
        let mut report = GcReport::default();

        while self.policy.needs_collection(self.keys.len()) {
            let file_count = self.keys.len();
            let batch = self.policy.batch_size(file_count);

            for _ in 0..batch {
                let Some((key, ())) = self.keys.peek_lru() else {
                    break;
                };
                let key = key.clone();
                // Unlisted only once its file is gone
                self.delete_file(&key)?;
                self.keys.pop(&key);
                report.collected.push(key);
            }
            report.batches += 1;

            debug!(
                file_count,
                deleted = batch,
                remaining = self.keys.len(),
                "collected file tier batch"
            );
        }

        Ok(report)
    }

    fn delete_file(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(key, path = %path.display(), "persisted file already gone");
                Ok(())
            }
            Err(e) => Err(Error::file_io(path, e)),
        }
    }

    /// Keys, least recently touched first
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        oldest_first(&self.keys).map(String::as_str)
    }

    /// Get number of persisted entries
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if tier is empty
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Get the cache directory
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File extension of persisted values
    pub fn extension(&self) -> &str {
        self.codec.extension()
    }
}

impl<C> std::fmt::Debug for FileTier<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileTier")
            .field("directory", &self.directory)
            .field("len", &self.keys.len())
            .field("policy", &self.policy)
            .finish()
    }
}

/// Temporary file name this tier generates: `.<simple uuid>.partial`
fn temp_file_name() -> String {
    format!(".{}{}", Uuid::new_v4().simple(), TEMP_FILE_SUFFIX)
}

/// Check whether `name` is a temporary file this tier could have written
fn is_temp_file(name: &str) -> bool {
    name.strip_prefix('.')
        .and_then(|rest| rest.strip_suffix(TEMP_FILE_SUFFIX))
        .is_some_and(|id| id.len() == 32 && Uuid::try_parse(id).is_ok())
}

/// List persisted keys in `directory`, oldest modification first
fn scan(directory: &Path, extension: &str) -> Result<Vec<String>> {
    let entries = fs::read_dir(directory).map_err(|e| Error::file_io(directory, e))?;

    let mut found: Vec<(Option<SystemTime>, String)> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::file_io(directory, e))?;
        let metadata = match entry.metadata() {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => continue,
        };

        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };

        if is_temp_file(name) {
            warn!(file = name, "removing interrupted write");
            if let Err(e) = fs::remove_file(entry.path()) {
                warn!(file = name, error = %e, "failed to remove interrupted write");
            }
            continue;
        }

        if let Some(key) = key_from_file_name(name, extension) {
            found.push((metadata.modified().ok(), key.to_string()));
        }
    }

    found.sort();
    Ok(found.into_iter().map(|(_, key)| key).collect())
}

// =============================================================================
// Tests
// =============================================================================
