//! Error types for the tiered cache

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or operating a cache
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid construction parameters or unusable cache directory
    #[error("Configuration error: {0}")]
    Config(String),

    /// Key cannot be used as a file name component
    #[error("Invalid cache key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// Filesystem operation failed
    #[error("I/O error on {path:?}: {source}")]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Codec could not serialize a value
    #[error("Failed to encode value: {0}")]
    Encode(String),

    /// Codec could not deserialize bytes
    #[error("Failed to decode value: {0}")]
    Decode(String),

    /// A persisted file could not be turned back into a value
    #[error("Corrupt cache file {path:?}: {reason}")]
    CorruptFile { path: PathBuf, reason: String },

    // =========================================================================
    // Compression Errors
    // =========================================================================
    /// Compression failed
    #[error("Compression with {algorithm} failed: {reason}")]
    CompressionFailed { algorithm: String, reason: String },

    /// Decompression failed
    #[error("Decompression with {algorithm} failed: {reason}")]
    DecompressionFailed { algorithm: String, reason: String },
}

impl Error {
    /// Build an [`Error::FileIo`] for `path`
    pub fn file_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::FileIo {
            path: path.into(),
            source,
        }
    }

    /// Returns true for invalid configuration
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Returns true for failures of the persistence path (filesystem or codec)
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Error::FileIo { .. }
                | Error::Encode(_)
                | Error::Decode(_)
                | Error::CorruptFile { .. }
                | Error::CompressionFailed { .. }
                | Error::DecompressionFailed { .. }
        )
    }
}
