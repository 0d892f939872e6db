//! Key-value cache store: versioned, timestamped entries with lazy TTL expiry.
//!
//! The store is a best-effort optimization layer. Every public method swallows
//! storage failures (quota exceeded, storage disabled, corrupt entries), logs
//! them, and degrades to "no cached data". The fallible `try_*` methods expose
//! the underlying `Result` for callers that want to see what went wrong.
//!
//! Expiry is lazy: an expired entry occupies storage until the next read of
//! that exact key, or until [`CacheStore::sweep_expired`] is called.

use crate::backend::CacheBackend;
use crate::clock::{Clock, SystemClock};
use crate::config::{duration_millis, CacheOptions, StoreConfig};
use crate::entry::{CacheEntry, EntryHeader, EntryInfo};
use crate::error::{Error, Result};
use crate::key::CacheKeyBuilder;
use crate::observability::{CacheMetrics, NoOpMetrics};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared cache store over an injected storage medium.
///
/// Cloning is cheap and clones share the medium, clock and metrics.
///
/// # Example
///
/// ```
/// use portal_cache::{CacheStore, CacheOptions, backend::InMemoryBackend};
/// use std::time::Duration;
///
/// let store = CacheStore::new(InMemoryBackend::new());
/// store.set("group_1", &serde_json::json!({"numberGroup": 2991}), &CacheOptions::default());
///
/// let group: Option<serde_json::Value> =
///     store.get("group_1", &CacheOptions::ttl(Duration::from_secs(1)));
/// assert!(group.is_some());
/// ```
#[derive(Clone)]
pub struct CacheStore<B: CacheBackend> {
    backend: B,
    config: Arc<StoreConfig>,
    clock: Arc<dyn Clock>,
    metrics: Arc<dyn CacheMetrics>,
}

impl<B: CacheBackend> CacheStore<B> {
    /// Create a store with the default configuration and wall-clock time.
    pub fn new(backend: B) -> Self {
        CacheStore {
            backend,
            config: Arc::new(StoreConfig::default()),
            clock: Arc::new(SystemClock),
            metrics: Arc::new(NoOpMetrics),
        }
    }

    /// Create a store with a custom configuration.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if the configuration is invalid
    pub fn from_config(backend: B, config: StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(CacheStore {
            config: Arc::new(config),
            ..Self::new(backend)
        })
    }

    /// Set the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Arc<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Get backend reference (for advanced use).
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub(crate) fn metrics(&self) -> &dyn CacheMetrics {
        self.metrics.as_ref()
    }

    /// Current time according to the store's clock.
    pub fn now_millis(&self) -> u64 {
        self.clock.now_millis()
    }

    /// Storage key for a logical key.
    pub fn storage_key(&self, key: &str) -> String {
        CacheKeyBuilder::storage_key(&self.config.prefix, key)
    }

    fn ttl_millis(&self, options: &CacheOptions) -> u64 {
        options
            .ttl
            .map(duration_millis)
            .unwrap_or(self.config.default_ttl_ms)
    }

    // ------------------------------------------------------------------------
    // Public, never-failing API
    // ------------------------------------------------------------------------

    /// Write `data` under `key`, stamped with the current time.
    ///
    /// `options.version` overrides the configured version tag; `options.ttl`
    /// is not stored, TTL is applied on read. Failures are logged and dropped.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, data: &T, options: &CacheOptions) {
        let timer = Instant::now();
        match self.try_set(key, data, options) {
            Ok(()) => self.metrics.record_set(key, timer.elapsed()),
            Err(e) => {
                warn!("Cache write for {} skipped: {}", key, e);
                self.metrics.record_error(key, &e.to_string());
            }
        }
    }

    /// Read live data under `key`.
    ///
    /// Returns `None` if the entry is absent, unreadable, older than the TTL
    /// (default 24 h), or tagged with a version other than `options.version`.
    /// Expired and version-mismatched entries are deleted as a side effect.
    pub fn get<T: DeserializeOwned>(&self, key: &str, options: &CacheOptions) -> Option<T> {
        let timer = Instant::now();
        match self.try_get(key, options) {
            Ok(Some(data)) => {
                self.metrics.record_hit(key, timer.elapsed());
                Some(data)
            }
            Ok(None) => {
                self.metrics.record_miss(key, timer.elapsed());
                None
            }
            Err(e) => {
                warn!("Cache read for {} failed, treating as miss: {}", key, e);
                self.metrics.record_error(key, &e.to_string());
                None
            }
        }
    }

    /// Delete the entry under `key`. Idempotent.
    pub fn remove(&self, key: &str) {
        match self.try_remove(key) {
            Ok(()) => self.metrics.record_delete(key),
            Err(e) => {
                warn!("Cache remove for {} failed: {}", key, e);
                self.metrics.record_error(key, &e.to_string());
            }
        }
    }

    /// Delete every entry under the store prefix. Unrelated keys are untouched.
    pub fn clear(&self) {
        match self.try_clear() {
            Ok(removed) => debug!("✓ Cache cleared ({} entries)", removed),
            Err(e) => {
                warn!("Cache clear failed: {}", e);
                self.metrics.record_error(&self.config.prefix, &e.to_string());
            }
        }
    }

    /// Whether live data exists under `key`.
    ///
    /// This is a full read with the default TTL: it may delete an expired
    /// entry as a side effect.
    pub fn has(&self, key: &str) -> bool {
        self.get::<serde_json::Value>(key, &CacheOptions::default())
            .is_some()
    }

    /// Entry metadata without TTL or version checks. For diagnostics.
    pub fn get_info(&self, key: &str) -> Option<EntryInfo> {
        match self.try_get_info(key) {
            Ok(info) => info,
            Err(e) => {
                warn!("Cache info for {} unavailable: {}", key, e);
                None
            }
        }
    }

    /// Remove every prefixed entry older than `ttl` (default TTL if `None`),
    /// and every prefixed entry that cannot be parsed. Returns the count.
    pub fn sweep_expired(&self, ttl: Option<Duration>) -> usize {
        let ttl_ms = ttl.map(duration_millis).unwrap_or(self.config.default_ttl_ms);
        match self.try_sweep(ttl_ms) {
            Ok(removed) => {
                debug!("✓ Cache sweep removed {} entries", removed);
                removed
            }
            Err(e) => {
                warn!("Cache sweep failed: {}", e);
                0
            }
        }
    }

    /// Remove every entry whose logical key starts with `key_prefix`.
    ///
    /// Used for invalidation cascades, e.g. dropping `document_*` after an edit.
    pub fn invalidate_prefix(&self, key_prefix: &str) -> usize {
        let keys = self.keys();
        let mut removed = 0;
        for key in keys.iter().filter(|k| k.starts_with(key_prefix)) {
            match self.try_remove(key) {
                Ok(()) => {
                    self.metrics.record_delete(key);
                    removed += 1;
                }
                Err(e) => warn!("Cache invalidate for {} failed: {}", key, e),
            }
        }
        debug!("✓ Invalidated {} entries matching {}*", removed, key_prefix);
        removed
    }

    /// Logical keys currently stored under the prefix.
    pub fn keys(&self) -> Vec<String> {
        match self.backend.keys() {
            Ok(keys) => keys
                .iter()
                .filter_map(|k| CacheKeyBuilder::logical_key(&self.config.prefix, k))
                .map(str::to_string)
                .collect(),
            Err(e) => {
                warn!("Cache key listing failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Entry count and stored bytes under the prefix.
    pub fn stats(&self) -> StoreStats {
        let mut stats = StoreStats::default();
        for key in self.keys() {
            if let Ok(Some(raw)) = self.backend.get(&self.storage_key(&key)) {
                stats.entries += 1;
                stats.total_bytes += raw.len();
            }
        }
        stats
    }

    // ------------------------------------------------------------------------
    // Fallible API
    // ------------------------------------------------------------------------

    /// Write an entry, reporting failures.
    ///
    /// # Errors
    /// Returns `Error::SerializationError` or any backend error
    pub fn try_set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        data: &T,
        options: &CacheOptions,
    ) -> Result<()> {
        let version = options
            .version
            .as_deref()
            .unwrap_or(self.config.version.as_str());
        let entry = CacheEntry::new(key, data, self.clock.now_millis(), version);
        let text =
            serde_json::to_string(&entry).map_err(|e| Error::SerializationError(e.to_string()))?;
        self.backend.set(&self.storage_key(key), text)?;
        debug!("✓ Cache SET {} (version {})", key, version);
        Ok(())
    }

    /// Read an entry, reporting failures.
    ///
    /// # Errors
    /// Returns `Error::DeserializationError` for corrupt entries (left in
    /// place) or any backend error
    pub fn try_get<T: DeserializeOwned>(
        &self,
        key: &str,
        options: &CacheOptions,
    ) -> Result<Option<T>> {
        let storage_key = self.storage_key(key);
        let raw = match self.backend.get(&storage_key)? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let entry: CacheEntry<serde_json::Value> = serde_json::from_str(&raw)?;

        let now = self.clock.now_millis();
        let ttl_ms = self.ttl_millis(options);
        if entry.is_expired(now, ttl_ms) {
            debug!(
                "Cache entry {} expired (age {} ms > ttl {} ms)",
                key,
                entry.age(now),
                ttl_ms
            );
            self.backend.remove(&storage_key)?;
            self.metrics.record_expired(key);
            return Ok(None);
        }

        if let Some(expected) = options.version.as_deref() {
            if entry.version != expected {
                let mismatch = Error::VersionMismatch {
                    expected: expected.to_string(),
                    found: entry.version.clone(),
                };
                debug!("Cache entry {} evicted: {}", key, mismatch);
                self.backend.remove(&storage_key)?;
                self.metrics.record_expired(key);
                return Ok(None);
            }
        }

        Ok(Some(serde_json::from_value(entry.data)?))
    }

    /// Delete an entry, reporting failures.
    ///
    /// # Errors
    /// Returns any backend error
    pub fn try_remove(&self, key: &str) -> Result<()> {
        self.backend.remove(&self.storage_key(key))
    }

    /// Delete every prefixed entry, returning the count.
    ///
    /// # Errors
    /// Returns the first backend error encountered
    pub fn try_clear(&self) -> Result<usize> {
        let prefixed: Vec<String> = self
            .backend
            .keys()?
            .into_iter()
            .filter(|k| k.starts_with(&self.config.prefix))
            .collect();
        for key in &prefixed {
            self.backend.remove(key)?;
        }
        Ok(prefixed.len())
    }

    /// Entry metadata, reporting failures.
    ///
    /// # Errors
    /// Returns `Error::DeserializationError` for corrupt entries or any backend error
    pub fn try_get_info(&self, key: &str) -> Result<Option<EntryInfo>> {
        let raw = match self.backend.get(&self.storage_key(key))? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        let header: EntryHeader = serde_json::from_str(&raw)?;
        Ok(Some(EntryInfo {
            timestamp: header.timestamp,
            version: header.version,
            size: raw.len(),
        }))
    }

    fn try_sweep(&self, ttl_ms: u64) -> Result<usize> {
        let now = self.clock.now_millis();
        let mut removed = 0;
        for storage_key in self.backend.keys()? {
            let Some(key) = CacheKeyBuilder::logical_key(&self.config.prefix, &storage_key) else {
                continue;
            };
            let stale = match self.backend.get(&storage_key)? {
                Some(raw) => match serde_json::from_str::<EntryHeader>(&raw) {
                    Ok(header) => now.saturating_sub(header.timestamp) > ttl_ms,
                    Err(_) => true,
                },
                None => false,
            };
            if stale {
                self.backend.remove(&storage_key)?;
                self.metrics.record_expired(key);
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Store statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub entries: usize,
    pub total_bytes: usize,
}
