//! Cache Path Setup
//!
//! Maps a logical cache location to a ready-to-use directory.
//!
//! # Design
//!
//! - Pluggable backend (local filesystem today; mounted object stores,
//!   scratch volumes, etc. implement [`CachePath`])
//! - Resolution happens once, when the cache is constructed

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Path-setup collaborator trait
pub trait CachePath {
    /// Create the location if needed and return it as an existing, absolute,
    /// normalized directory without a trailing separator
    fn resolve(&self) -> Result<PathBuf>;
}

impl<P: CachePath + ?Sized> CachePath for &P {
    fn resolve(&self) -> Result<PathBuf> {
        (**self).resolve()
    }
}

/// Local filesystem cache location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPath {
    location: PathBuf,
}

impl LocalPath {
    /// Create a new local location (nothing is touched until [`CachePath::resolve`])
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// Get the unresolved location
    pub fn location(&self) -> &Path {
        &self.location
    }
}

impl CachePath for LocalPath {
    fn resolve(&self) -> Result<PathBuf> {
        if self.location.as_os_str().is_empty() {
            return Err(Error::Config("cache directory must not be empty".into()));
        }

        fs::create_dir_all(&self.location).map_err(|e| {
            Error::Config(format!(
                "cannot create cache directory {:?}: {}",
                self.location, e
            ))
        })?;

        // canonicalize yields an absolute path with `.`/`..` and the trailing
        // separator removed
        let resolved = fs::canonicalize(&self.location).map_err(|e| {
            Error::Config(format!(
                "cannot resolve cache directory {:?}: {}",
                self.location, e
            ))
        })?;

        if !resolved.is_dir() {
            return Err(Error::Config(format!(
                "cache location {:?} is not a directory",
                resolved
            )));
        }

        Ok(resolved)
    }
}

// =============================================================================
// Tests
// =============================================================================
