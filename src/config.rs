//! Store configuration and per-call options.
//!
//! Setup-time settings live in [`StoreConfig`] and apply to every call made
//! through a store. [`CacheOptions`] and [`FetchOptions`] override them for a
//! single call or subscription.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Prefix put in front of every logical key in the storage medium.
pub const DEFAULT_PREFIX: &str = "cache_";

/// Default time-to-live for entries: 24 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Display-floor TTL for schedule data.
pub const SCHEDULE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Display-floor TTL for marks data.
pub const MARKS_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Setup-time configuration for a [`CacheStore`](crate::CacheStore).
///
/// Deserializable so it can be embedded in an application's own config file;
/// missing fields fall back to the defaults.
///
/// # Example
///
/// ```
/// use portal_cache::config::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_prefix("portal_")
///     .with_default_ttl(Duration::from_secs(600));
/// assert_eq!(config.default_ttl(), Duration::from_secs(600));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Namespace prefix for storage keys
    pub prefix: String,
    /// TTL applied when a call does not pass one, in milliseconds
    pub default_ttl_ms: u64,
    /// Version tag written into entries when a call does not pass one
    pub version: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            prefix: DEFAULT_PREFIX.to_string(),
            default_ttl_ms: duration_millis(DEFAULT_TTL),
            version: crate::VERSION.to_string(),
        }
    }
}

impl StoreConfig {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl_ms = duration_millis(ttl);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    /// Reject configurations that would make `clear` touch unrelated keys.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` for an empty prefix or version
    pub fn validate(&self) -> Result<()> {
        if self.prefix.is_empty() {
            return Err(Error::ConfigError(
                "prefix must not be empty: clear() would remove unrelated keys".to_string(),
            ));
        }
        if self.version.is_empty() {
            return Err(Error::ConfigError("version must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Per-call overrides for [`CacheStore::set`](crate::CacheStore::set) and
/// [`CacheStore::get`](crate::CacheStore::get).
///
/// On `set`, `version` is the tag written into the entry. On `get`, a `version`
/// is a requirement: entries carrying any other tag are evicted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheOptions {
    pub ttl: Option<Duration>,
    pub version: Option<String>,
}

impl CacheOptions {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Shorthand for `CacheOptions::default().with_ttl(ttl)`.
    pub fn ttl(ttl: Duration) -> Self {
        Self::default().with_ttl(ttl)
    }
}

/// Options for a [`CachedFetch`](crate::CachedFetch) subscription.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchOptions {
    /// TTL for reads and write-through; `None` uses the store default
    pub ttl: Option<Duration>,
    /// When false, no fetch is performed and existing state is kept
    pub enabled: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        FetchOptions {
            ttl: None,
            enabled: true,
        }
    }
}

impl FetchOptions {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub(crate) fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            ttl: self.ttl,
            version: None,
        }
    }
}

pub(crate) fn duration_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
