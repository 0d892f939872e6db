//! Cached-fetch orchestrator: one key, one fetcher, one observable state.
//!
//! A [`CachedFetch`] decides whether to serve cached data or run its fetcher,
//! writes fresh results through to the store, and publishes every state
//! transition on a `tokio::sync::watch` channel.
//!
//! ```text
//! idle ──load()──► loading ──hit──────────► success (is_cached = true)
//!                     │
//!                     └─miss─► fetch ──ok──► success (is_cached = false, written through)
//!                                   └─err─► error   (prior data kept)
//! ```
//!
//! After [`CachedFetch::teardown`] (or drop), no further state mutation is
//! applied, even if a fetch that was already in flight resolves later. The
//! write-through to the shared store still happens: the value is valid data
//! for other subscribers.

use crate::backend::CacheBackend;
use crate::config::{CacheOptions, FetchOptions};
use crate::fetch::Fetcher;
use crate::store::CacheStore;
use crate::strategy::CacheStrategy;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Observable state of one subscription.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
    /// Whether `data` came from the cache rather than a fetch
    pub is_cached: bool,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        FetchState {
            data: None,
            loading: false,
            error: None,
            is_cached: false,
        }
    }
}

/// Detachable handle that tears a subscription down from elsewhere.
#[derive(Clone, Debug)]
pub struct TeardownHandle {
    alive: Arc<AtomicBool>,
}

impl TeardownHandle {
    pub fn teardown(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

/// Cache-aware subscription to one key.
///
/// # Example
///
/// ```ignore
/// let store = CacheStore::new(InMemoryBackend::new());
/// let documents = CachedFetch::new(
///     store.clone(),
///     Some("all_documents".to_string()),
///     || async { api.documents().await },
///     FetchOptions::default(),
/// );
///
/// documents.load().await;
/// let state = documents.state();
/// ```
pub struct CachedFetch<T, F, B: CacheBackend> {
    store: CacheStore<B>,
    fetcher: F,
    key: Option<String>,
    options: FetchOptions,
    state: watch::Sender<FetchState<T>>,
    alive: Arc<AtomicBool>,
}

impl<T, F, B> CachedFetch<T, F, B>
where
    T: Serialize + DeserializeOwned + Clone,
    F: Fetcher<T>,
    B: CacheBackend,
{
    /// Create an idle subscription. Nothing is read or fetched until
    /// [`load`](Self::load) is awaited.
    pub fn new(store: CacheStore<B>, key: Option<String>, fetcher: F, options: FetchOptions) -> Self {
        let (state, _) = watch::channel(FetchState::default());
        CachedFetch {
            store,
            fetcher,
            key,
            options,
            state,
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> FetchState<T> {
        self.state.borrow().clone()
    }

    /// Receive every subsequent state transition.
    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.state.subscribe()
    }

    pub fn teardown_handle(&self) -> TeardownHandle {
        TeardownHandle {
            alive: self.alive.clone(),
        }
    }

    /// Stop applying state updates.
    pub fn teardown(&self) {
        self.alive.store(false, Ordering::SeqCst);
        debug!("Subscription for {:?} torn down", self.key);
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Serve from cache, fetching on a miss.
    pub async fn load(&self) -> FetchState<T> {
        self.execute(CacheStrategy::CacheFirst).await
    }

    /// Fetch unconditionally, bypassing the cache read but writing through.
    pub async fn refresh(&self) -> FetchState<T> {
        self.execute(CacheStrategy::Bypass).await
    }

    /// Remove the cached entry and clear in-memory data, without refetching.
    pub fn clear_cache(&self) {
        if let Some(key) = self.key.as_deref() {
            self.store.remove(key);
        }
        self.update(|s| {
            s.data = None;
            s.is_cached = false;
        });
    }

    /// Switch to another key: state is reset and the new key is loaded.
    /// Setting the current key again does nothing.
    pub async fn set_key(&mut self, key: Option<String>) -> FetchState<T> {
        if self.key == key {
            return self.state();
        }
        self.key = key;
        self.update(|s| *s = FetchState::default());
        self.load().await
    }

    /// Enable or disable fetching. Existing state is kept either way.
    pub async fn set_enabled(&mut self, enabled: bool) -> FetchState<T> {
        if self.options.enabled == enabled {
            return self.state();
        }
        self.options.enabled = enabled;
        self.load().await
    }

    /// Replace the fetch operation: state is reset and the key reloaded.
    pub async fn replace_fetcher(&mut self, fetcher: F) -> FetchState<T> {
        self.fetcher = fetcher;
        self.update(|s| *s = FetchState::default());
        self.load().await
    }

    /// Run one operation under `strategy`.
    pub async fn execute(&self, strategy: CacheStrategy) -> FetchState<T> {
        let key = match (self.key.as_deref(), self.options.enabled) {
            (Some(key), true) => key.to_string(),
            _ => {
                self.update(|s| s.loading = false);
                return self.state();
            }
        };

        debug!("» Cached fetch for key: {} (strategy: {})", key, strategy);
        self.update(|s| {
            s.loading = true;
            s.error = None;
        });

        let cache_options = self.options.cache_options();

        if strategy == CacheStrategy::Invalidate {
            self.store.remove(&key);
        }

        if strategy.reads_cache() {
            if let Some(data) = self.store.get::<T>(&key, &cache_options) {
                debug!("✓ Serving {} from cache", key);
                self.update(|s| {
                    s.data = Some(data);
                    s.is_cached = true;
                    s.loading = false;
                });
                return self.state();
            }
            if !strategy.fetches_on_miss() {
                debug!("✗ Cache miss for {} ({}), not fetching", key, strategy);
                self.update(|s| s.loading = false);
                return self.state();
            }
        }

        match self.fetcher.fetch().await {
            Ok(data) => {
                self.store.set(&key, &data, &CacheOptions::default());
                self.update(|s| {
                    s.data = Some(data);
                    s.is_cached = false;
                    s.loading = false;
                });
                info!("✓ Fetched fresh data for {}", key);
            }
            Err(e) => {
                warn!("Fetch for {} failed: {}", key, e);
                self.update(|s| {
                    s.error = Some(e.to_string());
                    s.loading = false;
                });
            }
        }

        self.state()
    }

    /// Apply a state change if the subscription is still alive.
    fn update(&self, change: impl FnOnce(&mut FetchState<T>)) -> bool {
        if !self.is_alive() {
            debug!("Dropping state update for torn-down subscription {:?}", self.key);
            return false;
        }
        self.state.send_modify(change);
        true
    }
}

impl<T, F, B: CacheBackend> Drop for CachedFetch<T, F, B> {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}
