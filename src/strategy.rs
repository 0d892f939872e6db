//! Cache strategies for fetch operations.
//!
//! Every [`CachedFetch`](crate::CachedFetch) operation runs under one of four
//! strategies:
//!
//! | Strategy | Cache Hit | Cache Miss | Used by |
//! |----------|-----------|-----------|---------|
//! | **CacheFirst** | Return | Fetch, write through | `load()` (default) |
//! | **CacheOnly** | Return | Empty, no fetch | offline display |
//! | **Invalidate** | Delete, fetch | Fetch, write through | after a mutation |
//! | **Bypass** | Ignore, fetch | Fetch, write through | `refresh()` |
//!
//! A hit never schedules a background refetch. Revalidating displayed data is
//! the job of [`Revalidator`](crate::Revalidator).

/// Strategy enum controlling cache read / fetch behavior.
///
/// # Examples
///
/// ```
/// use portal_cache::strategy::CacheStrategy;
///
/// assert_eq!(CacheStrategy::default(), CacheStrategy::CacheFirst);
/// assert!(CacheStrategy::Bypass.fetches_on_hit());
/// assert!(!CacheStrategy::CacheOnly.fetches_on_miss());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CacheStrategy {
    /// Serve a live entry if present, otherwise fetch and write through.
    #[default]
    CacheFirst,

    /// Serve a live entry if present, never fetch.
    CacheOnly,

    /// Delete the entry, then fetch and write through.
    Invalidate,

    /// Skip the cache read, fetch and write through.
    Bypass,
}

impl CacheStrategy {
    /// Whether the strategy reads the cache before fetching.
    pub fn reads_cache(self) -> bool {
        matches!(self, CacheStrategy::CacheFirst | CacheStrategy::CacheOnly)
    }

    /// Whether a fetch runs even when a live entry exists.
    pub fn fetches_on_hit(self) -> bool {
        matches!(self, CacheStrategy::Invalidate | CacheStrategy::Bypass)
    }

    /// Whether a fetch runs when no live entry exists.
    pub fn fetches_on_miss(self) -> bool {
        !matches!(self, CacheStrategy::CacheOnly)
    }
}

impl std::fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheStrategy::CacheFirst => write!(f, "CacheFirst"),
            CacheStrategy::CacheOnly => write!(f, "CacheOnly"),
            CacheStrategy::Invalidate => write!(f, "Invalidate"),
            CacheStrategy::Bypass => write!(f, "Bypass"),
        }
    }
}
