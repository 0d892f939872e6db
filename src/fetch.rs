//! Fetch operations: the network side of the cache.
//!
//! The `Fetcher` trait decouples the cache from whatever produces the data
//! (an HTTP client, a database, a test double). Any
//! `Fn() -> impl Future<Output = Result<T>>` closure is a fetcher.
//!
//! ```ignore
//! let fetcher = move || {
//!     let client = client.clone();
//!     async move {
//!         let resp = client.get(url).send().await.map_err(|e| e.to_string())?;
//!         resp.json::<Vec<Document>>().await.map_err(|e| e.to_string().into())
//!     }
//! };
//! ```
//!
//! Return `Err` for network failures, non-success statuses and malformed
//! bodies. The error message is what subscribers see.

use crate::error::Result;
use std::future::Future;

/// Trait for data-producing async operations.
#[allow(async_fn_in_trait)]
pub trait Fetcher<T>: Send + Sync {
    /// Produce a fresh value from the source of truth.
    ///
    /// # Errors
    /// Returns `Err` if the source is unavailable or returns bad data
    async fn fetch(&self) -> Result<T>;
}

impl<T, F, Fut> Fetcher<T> for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T>> + Send,
{
    async fn fetch(&self) -> Result<T> {
        (self)().await
    }
}

// ============================================================================
// Test Fetchers
// ============================================================================

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Fetcher that replays a script of responses, for tests.
///
/// Each call pops the next response; once the script is exhausted the last
/// response repeats. Counts every call.
///
/// ```
/// use portal_cache::fetch::ScriptedFetcher;
///
/// let fetcher = ScriptedFetcher::new(vec![Ok(1u32), Err("offline".into())]);
/// assert_eq!(fetcher.calls(), 0);
/// ```
pub struct ScriptedFetcher<T: Clone> {
    script: Mutex<VecDeque<Result<T>>>,
    last: Mutex<Option<Result<T>>>,
    calls: AtomicUsize,
}

impl<T: Clone> ScriptedFetcher<T> {
    pub fn new(script: Vec<Result<T>>) -> Self {
        ScriptedFetcher {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fetcher that always succeeds with `value`.
    pub fn always(value: T) -> Self {
        Self::new(vec![Ok(value)])
    }

    /// Number of times `fetch` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        match script.pop_front() {
            Some(response) => {
                *last = Some(response.clone());
                response
            }
            None => last
                .clone()
                .unwrap_or_else(|| Err("scripted fetcher has no responses".into())),
        }
    }
}

impl<T: Clone + Send> Fetcher<T> for ScriptedFetcher<T> {
    async fn fetch(&self) -> Result<T> {
        self.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[tokio::test]
    async fn test_closure_fetcher() {
        let fetcher = || async { Ok::<_, Error>(vec![1u32, 2, 3]) };
        assert_eq!(fetcher.fetch().await.expect("fetch"), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_closure_fetcher_error() {
        let fetcher = || async { Err::<u32, _>(Error::FetchError("HTTP 503".into())) };
        let err = fetcher.fetch().await.expect_err("should fail");
        assert_eq!(err.to_string(), "HTTP 503");
    }

    #[tokio::test]
    async fn test_scripted_fetcher_replays_then_repeats() {
        let fetcher = ScriptedFetcher::new(vec![Ok(1u32), Err("offline".into())]);

        assert_eq!(fetcher.fetch().await.expect("first"), 1);
        assert!(fetcher.fetch().await.is_err());
        assert!(fetcher.fetch().await.is_err());
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test]
    async fn test_scripted_fetcher_empty_script() {
        let fetcher: ScriptedFetcher<u32> = ScriptedFetcher::new(vec![]);
        assert!(fetcher.fetch().await.is_err());
    }
}
