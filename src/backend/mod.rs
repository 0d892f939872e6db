//! Storage media the cache store writes to.

use crate::error::Result;

#[cfg(feature = "file")]
pub mod file;
#[cfg(feature = "inmemory")]
pub mod inmemory;

#[cfg(feature = "file")]
pub use file::FileBackend;
#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryBackend;

/// Trait for persistent key-value storage media.
///
/// Models a browser-style local storage: string keys, string values, synchronous
/// calls. The store layers prefixing, entry envelopes and TTL handling on top.
///
/// **IMPORTANT:** All methods use `&self`. Implementations use interior mutability
/// so one medium can be shared by any number of stores and subscriptions.
///
/// **SYNC:** Calls never suspend. The only suspension points in the cache layer
/// are the caller-supplied fetch operations.
pub trait CacheBackend: Send + Sync + Clone {
    /// Read the raw value stored under `key`.
    ///
    /// # Returns
    /// - `Ok(Some(text))` - Value present
    /// - `Ok(None)` - Key not present
    ///
    /// # Errors
    /// Returns `Err` if the medium is unavailable or unreadable
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns `Err` if the medium is unavailable or the write exceeds its quota
    fn set(&self, key: &str, value: String) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    /// Returns `Err` if the medium is unavailable
    fn remove(&self, key: &str) -> Result<()>;

    /// Enumerate every key held by the medium, including keys that do not
    /// belong to the cache.
    ///
    /// # Errors
    /// Returns `Err` if the medium is unavailable
    fn keys(&self) -> Result<Vec<String>>;

    /// Number of keys held by the medium.
    ///
    /// # Errors
    /// Returns `Err` if the medium is unavailable
    fn len(&self) -> Result<usize> {
        Ok(self.keys()?.len())
    }

    /// Whether the medium holds no keys at all.
    ///
    /// # Errors
    /// Returns `Err` if the medium is unavailable
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
