//! # portal-cache
//!
//! A TTL- and content-hash-aware client-side cache with stale-while-revalidate
//! semantics, built for list data fetched from a remote service.
//!
//! ## Features
//!
//! - **Typed Entries:** Cache any `T: Serialize + DeserializeOwned` under a string key
//! - **TTL and Versions:** Entries expire on read and are rejected on version mismatch
//! - **Backend Agnostic:** In-memory and file-backed media, or your own [`CacheBackend`]
//! - **Cached Fetch:** Observable `{data, loading, error, is_cached}` state per key
//! - **No Flicker:** Revalidation only replaces displayed data when its content hash changes
//! - **Never Fatal:** Storage failures are logged and degrade to cache misses
//!
//! ## Quick Start
//!
//! ### Cached fetch
//!
//! ```ignore
//! use portal_cache::{CacheStore, CachedFetch, FetchOptions, backend::InMemoryBackend};
//! use std::time::Duration;
//!
//! let store = CacheStore::new(InMemoryBackend::new());
//! let fetcher = || async { api.documents().await.map_err(|e| e.to_string().into()) };
//!
//! let docs = CachedFetch::new(
//!     store,
//!     Some("all_documents".to_string()),
//!     fetcher,
//!     FetchOptions::default().with_ttl(Duration::from_secs(600)),
//! );
//! let state = docs.load().await;          // served from cache on a hit
//! let state = docs.refresh().await;       // always hits the source
//! ```
//!
//! ### Stale-while-revalidate
//!
//! ```ignore
//! use portal_cache::{DatasetSpec, Revalidator};
//!
//! let schedule = Revalidator::new(store, DatasetSpec::schedule(), &user_id);
//! let mut view = schedule.subscribe();
//! schedule.load(&fetch_schedule).await;   // cached copy first, then the live one
//! ```

#[macro_use]
extern crate log;

pub mod backend;
pub mod clock;
pub mod config;
pub mod domain;
pub mod entry;
pub mod error;
pub mod fetch;
pub mod hash;
pub mod key;
pub mod observability;
pub mod revalidate;
pub mod store;
pub mod strategy;
pub mod subscription;

// Re-exports for convenience
pub use backend::CacheBackend;
pub use config::{CacheOptions, FetchOptions, StoreConfig};
pub use error::{Error, Result};
pub use fetch::Fetcher;
pub use hash::{content_hash, ContentHash};
pub use revalidate::{DatasetSpec, Outcome, Revalidator, View};
pub use store::CacheStore;
pub use strategy::CacheStrategy;
pub use subscription::{CachedFetch, FetchState, TeardownHandle};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
