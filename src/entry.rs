//! Persisted cache entry format.
//!
//! Every entry is stored as one JSON object:
//!
//! ```text
//! { "data": <json>, "timestamp": <epoch millis>, "version": "<string>", "key": "<logical key>" }
//! ```

use serde::{Deserialize, Serialize};

/// One cached value with its write metadata.
///
/// Entries are written whole and never patched in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The cached payload
    pub data: T,
    /// Write time in epoch milliseconds
    pub timestamp: u64,
    /// Version tag the entry was written with
    pub version: String,
    /// Logical (unprefixed) key
    pub key: String,
}

impl<T> CacheEntry<T> {
    pub fn new(key: impl Into<String>, data: T, timestamp: u64, version: impl Into<String>) -> Self {
        CacheEntry {
            data,
            timestamp,
            version: version.into(),
            key: key.into(),
        }
    }

    /// Age of the entry at `now`. Saturates at zero for entries from the future.
    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.timestamp)
    }

    /// Whether the entry is older than `ttl_millis`. Exactly-at-TTL is still fresh.
    pub fn is_expired(&self, now: u64, ttl_millis: u64) -> bool {
        self.age(now) > ttl_millis
    }
}

/// Entry metadata reported by [`CacheStore::get_info`](crate::CacheStore::get_info).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryInfo {
    pub timestamp: u64,
    pub version: String,
    /// Byte length of the stored JSON text
    pub size: usize,
}

/// Metadata-only view of a stored entry, used where the payload is irrelevant.
#[derive(Deserialize)]
pub(crate) struct EntryHeader {
    pub timestamp: u64,
    pub version: String,
}
