//! Value Codecs
//!
//! Turn cached values into file contents and back. JSON is the default;
//! [`Lz4Codec`] wraps any codec with LZ4 block compression.
//!
//! # Example
//!
//! ```
//! use tiercache::cache::codec::{Codec, JsonCodec, Lz4Codec};
//!
//! let codec = Lz4Codec::new(JsonCodec);
//! assert_eq!(codec.extension(), "json.lz4");
//!
//! let values = vec![42u32; 256];
//! let bytes = codec.encode(&values).unwrap();
//! let decoded: Vec<u32> = codec.decode(&bytes).unwrap();
//! assert_eq!(decoded, values);
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

// =============================================================================
// Codec Trait
// =============================================================================

/// Serialization collaborator for the file tier
pub trait Codec: Send + Sync {
    /// File extension (without the leading dot) of persisted values
    fn extension(&self) -> &str;

    /// Serialize a value
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>>;

    /// Deserialize a value
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T>;
}

// =============================================================================
// JSON Codec
// =============================================================================

/// `serde_json` codec, persisted as `<key>.json`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn extension(&self) -> &str {
        "json"
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| Error::Encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T> {
        serde_json::from_slice(data).map_err(|e| Error::Decode(e.to_string()))
    }
}

// =============================================================================
// LZ4 Codec
// =============================================================================

/// LZ4 block compression around an inner codec, persisted as `<key>.<inner>.lz4`
#[derive(Debug, Clone)]
pub struct Lz4Codec<C = JsonCodec> {
    inner: C,
    level: i32,
    extension: String,
}

impl<C: Codec> Lz4Codec<C> {
    /// Wrap `inner` with the default compression level
    pub fn new(inner: C) -> Self {
        Self::with_level(inner, 4)
    }

    /// Wrap `inner` with a custom high-compression level
    pub fn with_level(inner: C, level: i32) -> Self {
        let extension = format!("{}.lz4", inner.extension());
        Self {
            inner,
            level,
            extension,
        }
    }

    /// Get the wrapped codec
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Get the compression level
    pub fn level(&self) -> i32 {
        self.level
    }
}

impl Default for Lz4Codec<JsonCodec> {
    fn default() -> Self {
        Self::new(JsonCodec)
    }
}

impl<C: Codec> Codec for Lz4Codec<C> {
    fn extension(&self) -> &str {
        &self.extension
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        let raw = self.inner.encode(value)?;
        lz4::block::compress(
            &raw,
            Some(lz4::block::CompressionMode::HIGHCOMPRESSION(self.level)),
            true,
        )
        .map_err(|e| Error::CompressionFailed {
            algorithm: "LZ4".into(),
            reason: e.to_string(),
        })
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T> {
        let raw = lz4::block::decompress(data, None).map_err(|e| Error::DecompressionFailed {
            algorithm: "LZ4".into(),
            reason: e.to_string(),
        })?;
        self.inner.decode(&raw)
    }
}
