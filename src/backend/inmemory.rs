//! In-memory storage medium (default, thread-safe).
//!
//! Uses DashMap for lock-free concurrent access with per-key sharding.
//! Can be given a byte quota and switched off at runtime, which is how the
//! store's degradation paths are exercised in tests.

use super::CacheBackend;
use crate::error::{Error, Result};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Thread-safe in-memory storage medium.
///
/// Clones share the same map, so a clone handed to a store and a clone kept
/// by a test observe the same keys.
///
/// # Example
///
/// ```
/// use portal_cache::backend::{CacheBackend, InMemoryBackend};
///
/// let backend = InMemoryBackend::new();
/// backend.set("theme", "dark".to_string()).unwrap();
/// assert_eq!(backend.get("theme").unwrap(), Some("dark".to_string()));
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryBackend {
    store: Arc<DashMap<String, String>>,
    quota_bytes: Option<usize>,
    disabled: Arc<AtomicBool>,
}

impl InMemoryBackend {
    /// Create a new unbounded in-memory medium.
    pub fn new() -> Self {
        InMemoryBackend {
            store: Arc::new(DashMap::new()),
            quota_bytes: None,
            disabled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a medium that rejects writes once keys plus values exceed `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        InMemoryBackend {
            quota_bytes: Some(bytes),
            ..Self::new()
        }
    }

    /// Make every subsequent call fail with `StorageUnavailable`.
    pub fn disable(&self) {
        self.disabled.store(true, Ordering::SeqCst);
        warn!("⚠ InMemory storage disabled");
    }

    /// Undo [`disable`](Self::disable).
    pub fn enable(&self) {
        self.disabled.store(false, Ordering::SeqCst);
    }

    /// Get memory statistics.
    pub fn stats(&self) -> BackendStats {
        let total_bytes = self.used_bytes();
        BackendStats {
            total_keys: self.store.len(),
            total_bytes,
        }
    }

    fn used_bytes(&self) -> usize {
        self.store
            .iter()
            .map(|entry| entry.key().len() + entry.value().len())
            .sum()
    }

    fn ensure_enabled(&self) -> Result<()> {
        if self.disabled.load(Ordering::SeqCst) {
            return Err(Error::StorageUnavailable(
                "in-memory storage is disabled".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBackend for InMemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.ensure_enabled()?;
        let value = self.store.get(key).map(|v| v.value().clone());
        debug!(
            "✓ InMemory GET {} -> {}",
            key,
            if value.is_some() { "HIT" } else { "MISS" }
        );
        Ok(value)
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        self.ensure_enabled()?;

        if let Some(limit) = self.quota_bytes {
            let replaced = self
                .store
                .get(key)
                .map(|v| key.len() + v.value().len())
                .unwrap_or(0);
            let requested = self.used_bytes() - replaced + key.len() + value.len();
            if requested > limit {
                return Err(Error::QuotaExceeded { requested, limit });
            }
        }

        self.store.insert(key.to_string(), value);
        debug!("✓ InMemory SET {}", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.ensure_enabled()?;
        self.store.remove(key);
        debug!("✓ InMemory REMOVE {}", key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        self.ensure_enabled()?;
        Ok(self.store.iter().map(|entry| entry.key().clone()).collect())
    }

    fn len(&self) -> Result<usize> {
        self.ensure_enabled()?;
        Ok(self.store.len())
    }
}

/// Storage statistics.
#[derive(Clone, Debug)]
pub struct BackendStats {
    pub total_keys: usize,
    pub total_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inmemory_backend_set_get() {
        let backend = InMemoryBackend::new();

        backend
            .set("key1", "value1".to_string())
            .expect("Failed to set");

        let result = backend.get("key1").expect("Failed to get");
        assert_eq!(result, Some("value1".to_string()));
    }

    #[test]
    fn test_inmemory_backend_miss() {
        let backend = InMemoryBackend::new();

        let result = backend.get("nonexistent").expect("Failed to get");
        assert_eq!(result, None);
    }

    #[test]
    fn test_inmemory_backend_remove_is_idempotent() {
        let backend = InMemoryBackend::new();

        backend
            .set("key1", "value1".to_string())
            .expect("Failed to set");
        backend.remove("key1").expect("Failed to remove");
        backend.remove("key1").expect("Second remove should succeed");

        assert!(backend.get("key1").expect("Failed to get").is_none());
    }

    #[test]
    fn test_inmemory_backend_keys() {
        let backend = InMemoryBackend::new();
        backend.set("a", "1".to_string()).expect("Failed to set");
        backend.set("b", "2".to_string()).expect("Failed to set");

        let mut keys = backend.keys().expect("Failed to list keys");
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_inmemory_backend_quota() {
        let backend = InMemoryBackend::with_quota(10);

        backend.set("k", "12345".to_string()).expect("Fits in quota");
        let err = backend
            .set("k2", "123456789".to_string())
            .expect_err("Should exceed quota");
        assert!(matches!(err, Error::QuotaExceeded { limit: 10, .. }));

        // Overwriting an existing key only counts the difference
        backend
            .set("k", "123456789".to_string())
            .expect("Replacement fits in quota");
    }

    #[test]
    fn test_inmemory_backend_disabled() {
        let backend = InMemoryBackend::new();
        backend.disable();

        assert!(matches!(
            backend.get("key"),
            Err(Error::StorageUnavailable(_))
        ));
        assert!(backend.set("key", "v".to_string()).is_err());

        backend.enable();
        assert!(backend.set("key", "v".to_string()).is_ok());
    }

    #[test]
    fn test_inmemory_backend_stats() {
        let backend = InMemoryBackend::new();
        backend
            .set("key1", "value_with_data".to_string())
            .expect("Failed to set");
        backend.set("key2", "data".to_string()).expect("Failed to set");

        let stats = backend.stats();
        assert_eq!(stats.total_keys, 2);
        assert_eq!(stats.total_bytes, 4 + 15 + 4 + 4);
    }

    #[test]
    fn test_inmemory_backend_clone_shares_store() {
        let backend1 = InMemoryBackend::new();
        backend1
            .set("key", "value".to_string())
            .expect("Failed to set");

        let backend2 = backend1.clone();
        assert_eq!(
            backend2.get("key").expect("Failed to get"),
            Some("value".to_string())
        );
    }

    #[tokio::test]
    async fn test_inmemory_backend_thread_safe() {
        let backend = InMemoryBackend::new();
        let mut handles = vec![];

        for i in 0..10 {
            let b = backend.clone();
            handles.push(tokio::spawn(async move {
                b.set(&format!("key_{}", i), format!("value_{}", i))
                    .expect("Failed to set");
            }));
        }

        for handle in handles {
            handle.await.expect("Task failed");
        }

        assert_eq!(backend.len().expect("Failed to count"), 10);
    }
}
