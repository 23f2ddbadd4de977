//! Encoding of cached query results.
//!
//! The query cache is heterogeneous: one map holds user pages, album pages,
//! photo details and album counts. Values are stored as postcard bytes inside
//! a versioned envelope and decoded back into the type the caller asks for.
//!
//! ```text
//! ┌─────────────────┬─────────────────┬──────────────────────────┐
//! │  MAGIC (4 bytes)│VERSION (varint) │POSTCARD PAYLOAD (N bytes)│
//! └─────────────────┴─────────────────┴──────────────────────────┘
//!   "GKIT"              u32               postcard::to_allocvec(T)
//! ```
//!
//! A lookup that decodes into the wrong type, or into bytes written by an
//! older model layout, fails with a typed error instead of returning garbage;
//! the cache then drops the entry and reloads it.
//!
//! Types stored here must round-trip through a non self-describing format, so
//! cached models avoid `skip_serializing_if` and untagged enums.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Magic header for cached entries.
pub const CACHE_MAGIC: [u8; 4] = *b"GKIT";

/// Layout version of cached models.
///
/// Bump when a cached model (`User`, `Album`, `Photo`, `PageData`) changes shape.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Versioned wrapper around a cached payload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CacheEnvelope<T> {
    pub magic: [u8; 4],
    pub version: u32,
    pub payload: T,
}

impl<T> CacheEnvelope<T> {
    pub fn new(payload: T) -> Self {
        Self {
            magic: CACHE_MAGIC,
            version: CURRENT_SCHEMA_VERSION,
            payload,
        }
    }
}

/// Encode a query result for storage in the cache.
///
/// # Errors
///
/// Returns `Error::Serialization` if postcard cannot encode the value.
pub fn serialize_for_cache<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let envelope = CacheEnvelope::new(value);
    postcard::to_allocvec(&envelope).map_err(|e| {
        error!("Cache serialization failed: {}", e);
        Error::Serialization(e.to_string())
    })
}

/// Decode a cached query result, checking magic and schema version first.
///
/// # Errors
///
/// - `Error::InvalidCacheEntry`: magic header mismatch
/// - `Error::VersionMismatch`: entry written by another schema version
/// - `Error::Deserialization`: payload does not decode as `T`
pub fn deserialize_from_cache<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    // Header first, so a foreign payload reports the right error.
    let ((magic, version), _): (([u8; 4], u32), _) = postcard::take_from_bytes(bytes)
        .map_err(|e| Error::InvalidCacheEntry(e.to_string()))?;

    if magic != CACHE_MAGIC {
        warn!(
            "Invalid cache entry: expected magic {:?}, got {:?}",
            CACHE_MAGIC, magic
        );
        return Err(Error::InvalidCacheEntry(format!(
            "Invalid magic: expected {:?}, got {:?}",
            CACHE_MAGIC, magic
        )));
    }

    if version != CURRENT_SCHEMA_VERSION {
        warn!(
            "Cache version mismatch: expected {}, got {}",
            CURRENT_SCHEMA_VERSION, version
        );
        return Err(Error::VersionMismatch {
            expected: CURRENT_SCHEMA_VERSION,
            found: version,
        });
    }

    let envelope: CacheEnvelope<T> = postcard::from_bytes(bytes).map_err(|e| {
        error!("Cache deserialization failed: {}", e);
        Error::Deserialization(e.to_string())
    })?;

    Ok(envelope.payload)
}
