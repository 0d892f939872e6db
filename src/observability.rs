//! Metrics hooks for cache operations.
//!
//! Implement [`CacheMetrics`] to feed hit/miss/eviction counts into a monitoring
//! system:
//!
//! ```ignore
//! use portal_cache::observability::CacheMetrics;
//! use std::time::Duration;
//!
//! struct PrometheusMetrics;
//!
//! impl CacheMetrics for PrometheusMetrics {
//!     fn record_hit(&self, _key: &str, _duration: Duration) {
//!         // counter!("cache_hits").inc();
//!     }
//! }
//!
//! // let store = CacheStore::new(backend).with_metrics(Arc::new(PrometheusMetrics));
//! ```
//!
//! The default is [`NoOpMetrics`]. [`LogMetrics`] forwards every event to the
//! `log` facade, which is what the trait's provided methods do as well.
//!
//! | Hook | Fired when |
//! |------|------------|
//! | `record_hit` | `get` returned live data |
//! | `record_miss` | `get` found nothing usable |
//! | `record_expired` | `get` or a sweep deleted a stale or version-mismatched entry |
//! | `record_set` | an entry was written |
//! | `record_delete` | an entry was removed explicitly |
//! | `record_error` | a storage failure was swallowed |
//! | `record_revalidation` | a revalidation finished, with whether content changed |

use std::time::Duration;

/// Trait for cache metrics collection.
pub trait CacheMetrics: Send + Sync {
    /// Record a cache hit.
    fn record_hit(&self, key: &str, duration: Duration) {
        debug!("Cache HIT: {} took {:?}", key, duration);
    }

    /// Record a cache miss.
    fn record_miss(&self, key: &str, duration: Duration) {
        debug!("Cache MISS: {} took {:?}", key, duration);
    }

    /// Record a lazily evicted entry.
    fn record_expired(&self, key: &str) {
        debug!("Cache EXPIRED: {}", key);
    }

    /// Record a cache set operation.
    fn record_set(&self, key: &str, duration: Duration) {
        debug!("Cache SET: {} took {:?}", key, duration);
    }

    /// Record a cache delete operation.
    fn record_delete(&self, key: &str) {
        debug!("Cache DELETE: {}", key);
    }

    /// Record a swallowed storage error.
    fn record_error(&self, key: &str, error: &str) {
        warn!("Cache ERROR for {}: {}", key, error);
    }

    /// Record the outcome of a revalidation.
    fn record_revalidation(&self, key: &str, changed: bool) {
        debug!(
            "Cache REVALIDATE: {} ({})",
            key,
            if changed { "changed" } else { "unchanged" }
        );
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Debug, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _key: &str, _duration: Duration) {}
    fn record_miss(&self, _key: &str, _duration: Duration) {}
    fn record_expired(&self, _key: &str) {}
    fn record_set(&self, _key: &str, _duration: Duration) {}
    fn record_delete(&self, _key: &str) {}
    fn record_error(&self, _key: &str, _error: &str) {}
    fn record_revalidation(&self, _key: &str, _changed: bool) {}
}

/// Metrics implementation that only logs.
#[derive(Clone, Debug, Default)]
pub struct LogMetrics;

impl CacheMetrics for LogMetrics {}
