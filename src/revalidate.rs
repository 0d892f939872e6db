//! Stale-while-revalidate merge policy for time-sensitive list data.
//!
//! A [`Revalidator`] owns the displayed copy of one owner's dataset (a user's
//! schedule, a user's marks). Loading it:
//!
//! 1. reads the cached payload synchronously and displays it, flagged as
//!    `using_cache`;
//! 2. fetches the live payload;
//! 3. compares content hashes of the displayed and fresh payloads. A new or
//!    different payload is written to the store and replaces the displayed
//!    data. An identical payload is written to the store (bumping its
//!    timestamp) and the view is left exactly as it was: same `Arc`, no
//!    notification;
//! 4. on fetch failure keeps a displayed payload in place, or surfaces the
//!    error when nothing is displayed.
//!
//! [`Revalidator::refresh`] drops the cached entry first, so the comparison
//! baseline is gone and the fetched payload always replaces the view.
//!
//! The cached payload is always the raw source records. Anything derived from
//! them (per-week schedule views, averages) is recomputed by the caller.

use crate::backend::CacheBackend;
use crate::config::{CacheOptions, MARKS_TTL, SCHEDULE_TTL};
use crate::fetch::Fetcher;
use crate::hash::{content_hash, ContentHash};
use crate::key::{tags, CacheKeyBuilder};
use crate::store::CacheStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// A dataset namespace and how long its cache may be displayed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetSpec {
    pub namespace: String,
    /// Display-floor TTL: older cached payloads are not shown
    pub ttl: Duration,
}

impl DatasetSpec {
    pub fn new(namespace: impl Into<String>, ttl: Duration) -> Self {
        DatasetSpec {
            namespace: namespace.into(),
            ttl,
        }
    }

    /// Weekly schedule entries, shown from cache for up to 24 hours.
    pub fn schedule() -> Self {
        Self::new(tags::SCHEDULE, SCHEDULE_TTL)
    }

    /// Mark records, shown from cache for up to 2 hours.
    pub fn marks() -> Self {
        Self::new(tags::MARKS, MARKS_TTL)
    }

    /// Cache key for one owner's dataset.
    pub fn key(&self, owner: &dyn Display) -> String {
        CacheKeyBuilder::build(&self.namespace, owner)
    }
}

/// What a consumer displays.
#[derive(Debug)]
pub struct View<T> {
    /// Displayed payload; the `Arc` only changes when content changes
    pub data: Option<Arc<T>>,
    /// Whether `data` came from the cache and has not been confirmed yet
    pub using_cache: bool,
    /// A fetch is running and nothing is displayed
    pub loading: bool,
    /// Fetch error shown when there is nothing to display
    pub error: Option<String>,
}

impl<T> Default for View<T> {
    fn default() -> Self {
        View {
            data: None,
            using_cache: false,
            loading: false,
            error: None,
        }
    }
}

impl<T> Clone for View<T> {
    fn clone(&self) -> Self {
        View {
            data: self.data.clone(),
            using_cache: self.using_cache,
            loading: self.loading,
            error: self.error.clone(),
        }
    }
}

impl<T> View<T> {
    /// Whether a retry action should be offered.
    pub fn can_retry(&self) -> bool {
        self.data.is_none() && self.error.is_some()
    }
}

/// Result of one revalidation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Fresh payload differed (or nothing was displayed) and replaced the view.
    Replaced,
    /// Fresh payload matched the displayed one; only the cache timestamp moved.
    Unchanged,
    /// Fetch failed; the displayed cached payload stays.
    KeptStale,
    /// Fetch failed with nothing to display; the view shows the error.
    Failed,
}

/// Stale-while-revalidate view of one owner's dataset.
pub struct Revalidator<T, B: CacheBackend> {
    store: CacheStore<B>,
    spec: DatasetSpec,
    key: String,
    view: watch::Sender<View<T>>,
    baseline: Mutex<Option<ContentHash>>,
}

impl<T, B> Revalidator<T, B>
where
    T: Serialize + DeserializeOwned,
    B: CacheBackend,
{
    pub fn new(store: CacheStore<B>, spec: DatasetSpec, owner: &dyn Display) -> Self {
        let key = spec.key(owner);
        let (view, _) = watch::channel(View::default());
        Revalidator {
            store,
            spec,
            key,
            view,
            baseline: Mutex::new(None),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn spec(&self) -> &DatasetSpec {
        &self.spec
    }

    /// Snapshot of the current view.
    pub fn view(&self) -> View<T> {
        self.view.borrow().clone()
    }

    /// Receive view changes. Unchanged revalidations do not notify.
    pub fn subscribe(&self) -> watch::Receiver<View<T>> {
        self.view.subscribe()
    }

    /// Display the cached payload, if one younger than the dataset TTL exists.
    ///
    /// A cached payload identical to the displayed one leaves the view as is.
    pub fn prime(&self) -> bool {
        let Some(cached) = self
            .store
            .get::<T>(&self.key, &CacheOptions::ttl(self.spec.ttl))
        else {
            debug!("No cached payload for {}", self.key);
            return false;
        };

        let cached_hash = content_hash(&cached).ok();
        let displayed = self.view.borrow().data.is_some();
        if displayed
            && cached_hash.is_some()
            && *self.baseline.lock().unwrap_or_else(|e| e.into_inner()) == cached_hash
        {
            debug!("Cached payload for {} already displayed", self.key);
            return true;
        }

        self.set_baseline(cached_hash);
        self.view.send_modify(|v| {
            v.data = Some(Arc::new(cached));
            v.using_cache = true;
            v.loading = false;
            v.error = None;
        });
        debug!("✓ Displaying cached payload for {}", self.key);
        true
    }

    /// Show cache immediately, then revalidate against the source.
    pub async fn load<F: Fetcher<T>>(&self, fetcher: &F) -> Outcome {
        self.prime();
        self.revalidate(fetcher).await
    }

    /// Same as [`load`](Self::load); offered after a `Failed` outcome.
    pub async fn retry<F: Fetcher<T>>(&self, fetcher: &F) -> Outcome {
        self.load(fetcher).await
    }

    /// Drop the cached entry, then revalidate from a clean baseline.
    pub async fn refresh<F: Fetcher<T>>(&self, fetcher: &F) -> Outcome {
        self.store.remove(&self.key);
        self.set_baseline(None);
        self.revalidate(fetcher).await
    }

    /// Fetch the live payload and merge it into the view.
    pub async fn revalidate<F: Fetcher<T>>(&self, fetcher: &F) -> Outcome {
        self.view.send_if_modified(|v| {
            if v.data.is_none() && !v.loading {
                v.loading = true;
                true
            } else {
                false
            }
        });

        match fetcher.fetch().await {
            Ok(fresh) => self.merge(fresh),
            Err(e) => {
                if self.view.borrow().data.is_some() {
                    warn!(
                        "Revalidation of {} failed, keeping displayed data: {}",
                        self.key, e
                    );
                    Outcome::KeptStale
                } else {
                    warn!("Revalidation of {} failed: {}", self.key, e);
                    self.view.send_modify(|v| {
                        v.loading = false;
                        v.error = Some(e.to_string());
                    });
                    Outcome::Failed
                }
            }
        }
    }

    fn merge(&self, fresh: T) -> Outcome {
        let fresh_hash = content_hash(&fresh).ok();
        let displayed = self.view.borrow().data.is_some();
        let unchanged = displayed
            && fresh_hash.is_some()
            && *self.baseline.lock().unwrap_or_else(|e| e.into_inner()) == fresh_hash;

        // Written either way: an identical payload still bumps the timestamp.
        self.store.set(&self.key, &fresh, &CacheOptions::default());
        self.store.metrics().record_revalidation(&self.key, !unchanged);

        if unchanged {
            debug!("✓ {} unchanged, keeping displayed data", self.key);
            return Outcome::Unchanged;
        }

        self.set_baseline(fresh_hash);
        self.view.send_modify(|v| {
            v.data = Some(Arc::new(fresh));
            v.using_cache = false;
            v.loading = false;
            v.error = None;
        });
        info!("✓ {} updated from source", self.key);
        Outcome::Replaced
    }

    fn set_baseline(&self, hash: Option<ContentHash>) {
        *self.baseline.lock().unwrap_or_else(|e| e.into_inner()) = hash;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::clock::ManualClock;
    use crate::fetch::ScriptedFetcher;
    use serde::Deserialize;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Lesson {
        subject: String,
        room: String,
    }

    fn lessons(room: &str) -> Vec<Lesson> {
        vec![
            Lesson {
                subject: "Math".to_string(),
                room: room.to_string(),
            },
            Lesson {
                subject: "Physics".to_string(),
                room: "204".to_string(),
            },
        ]
    }

    fn setup() -> (CacheStore<InMemoryBackend>, ManualClock) {
        let clock = ManualClock::new(1_000);
        let store = CacheStore::new(InMemoryBackend::new()).with_clock(Arc::new(clock.clone()));
        (store, clock)
    }

    #[test]
    fn test_dataset_keys() {
        assert_eq!(DatasetSpec::schedule().key(&42), "schedule_42");
        assert_eq!(DatasetSpec::marks().key(&42), "marks_42");
        assert_eq!(DatasetSpec::marks().ttl, Duration::from_secs(7_200));
    }

    #[tokio::test]
    async fn test_no_cache_replaces_and_writes() {
        let (store, _) = setup();
        let reval = Revalidator::new(store.clone(), DatasetSpec::schedule(), &7);
        let mut rx = reval.subscribe();

        let outcome = reval.load(&ScriptedFetcher::always(lessons("101"))).await;
        assert_eq!(outcome, Outcome::Replaced);

        let view = rx.borrow_and_update().clone();
        assert_eq!(view.data.as_deref(), Some(&lessons("101")));
        assert!(!view.using_cache);
        assert!(!view.loading);
        assert_eq!(
            store.get::<Vec<Lesson>>("schedule_7", &CacheOptions::default()),
            Some(lessons("101"))
        );
    }

    #[tokio::test]
    async fn test_cached_data_is_shown_before_fetch() {
        let (store, _) = setup();
        store.set("schedule_7", &lessons("101"), &CacheOptions::default());
        let reval = Revalidator::new(store, DatasetSpec::schedule(), &7);

        assert!(reval.prime());
        let view = reval.view();
        assert!(view.using_cache);
        assert_eq!(view.data.as_deref(), Some(&lessons("101")));

        let outcome = reval
            .revalidate(&ScriptedFetcher::always(lessons("305")))
            .await;
        assert_eq!(outcome, Outcome::Replaced);
        let view = reval.view();
        assert!(!view.using_cache);
        assert_eq!(view.data.as_deref(), Some(&lessons("305")));
    }

    #[tokio::test]
    async fn test_identical_payload_keeps_reference_and_bumps_timestamp() {
        let (store, clock) = setup();
        store.set("schedule_7", &lessons("101"), &CacheOptions::default());
        let reval = Revalidator::new(store.clone(), DatasetSpec::schedule(), &7);

        reval.prime();
        let before = reval.view().data.expect("primed");
        let mut rx = reval.subscribe();
        rx.borrow_and_update();

        clock.advance(60_000);
        let outcome = reval
            .revalidate(&ScriptedFetcher::always(lessons("101")))
            .await;

        assert_eq!(outcome, Outcome::Unchanged);
        let after = reval.view().data.expect("still displayed");
        assert!(Arc::ptr_eq(&before, &after));
        assert!(!rx.has_changed().expect("sender alive"));
        assert!(reval.view().using_cache);
        assert_eq!(
            store.get_info("schedule_7").expect("entry").timestamp,
            61_000
        );
    }

    #[tokio::test]
    async fn test_second_load_keeps_confirmed_view() {
        let (store, _) = setup();
        let reval = Revalidator::new(store, DatasetSpec::schedule(), &7);
        let fetcher = ScriptedFetcher::always(lessons("101"));

        assert_eq!(reval.load(&fetcher).await, Outcome::Replaced);
        let before = reval.view().data.expect("displayed");
        let mut rx = reval.subscribe();
        rx.borrow_and_update();

        assert_eq!(reval.load(&fetcher).await, Outcome::Unchanged);
        let view = reval.view();
        assert!(Arc::ptr_eq(&before, &view.data.expect("still displayed")));
        assert!(!rx.has_changed().expect("sender alive"));
        assert!(!view.using_cache);
    }

    #[tokio::test]
    async fn test_retry_after_stale_keeps_reference() {
        let (store, _) = setup();
        store.set("schedule_7", &lessons("101"), &CacheOptions::default());
        let reval = Revalidator::new(store, DatasetSpec::schedule(), &7);
        let fetcher = ScriptedFetcher::new(vec![Err("offline".into()), Ok(lessons("101"))]);

        assert_eq!(reval.load(&fetcher).await, Outcome::KeptStale);
        let before = reval.view().data.expect("primed");

        assert_eq!(reval.retry(&fetcher).await, Outcome::Unchanged);
        assert!(Arc::ptr_eq(&before, &reval.view().data.expect("displayed")));
    }

    #[tokio::test]
    async fn test_failure_with_cache_keeps_stale() {
        let (store, _) = setup();
        store.set("marks_7", &vec![5u8, 4], &CacheOptions::default());
        let reval = Revalidator::<Vec<u8>, _>::new(store, DatasetSpec::marks(), &7);

        let outcome = reval
            .load(&ScriptedFetcher::new(vec![Err("offline".into())]))
            .await;
        assert_eq!(outcome, Outcome::KeptStale);
        let view = reval.view();
        assert_eq!(view.data.as_deref(), Some(&vec![5u8, 4]));
        assert!(view.using_cache);
        assert_eq!(view.error, None);
        assert!(!view.can_retry());
    }

    #[tokio::test]
    async fn test_failure_without_cache_surfaces_error_then_retry() {
        let (store, _) = setup();
        let reval = Revalidator::<Vec<u8>, _>::new(store, DatasetSpec::marks(), &7);
        let fetcher = ScriptedFetcher::new(vec![Err("HTTP 502".into()), Ok(vec![3u8])]);

        assert_eq!(reval.load(&fetcher).await, Outcome::Failed);
        let view = reval.view();
        assert_eq!(view.error.as_deref(), Some("HTTP 502"));
        assert!(!view.loading);
        assert!(view.can_retry());

        assert_eq!(reval.retry(&fetcher).await, Outcome::Replaced);
        let view = reval.view();
        assert_eq!(view.error, None);
        assert_eq!(view.data.as_deref(), Some(&vec![3u8]));
    }

    #[tokio::test]
    async fn test_refresh_replaces_even_identical_payload() {
        let (store, _) = setup();
        store.set("schedule_7", &lessons("101"), &CacheOptions::default());
        let reval = Revalidator::new(store, DatasetSpec::schedule(), &7);
        reval.prime();
        let before = reval.view().data.expect("primed");

        let outcome = reval
            .refresh(&ScriptedFetcher::always(lessons("101")))
            .await;
        assert_eq!(outcome, Outcome::Replaced);
        let after = reval.view().data.expect("displayed");
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(*after, lessons("101"));
    }

    #[tokio::test]
    async fn test_marks_cache_older_than_two_hours_is_not_shown() {
        let (store, clock) = setup();
        store.set("marks_7", &vec![5u8], &CacheOptions::default());
        clock.advance(2 * 60 * 60 * 1_000 + 1);

        let reval = Revalidator::<Vec<u8>, _>::new(store, DatasetSpec::marks(), &7);
        assert!(!reval.prime());
    }

    #[tokio::test]
    async fn test_unprimed_identical_cache_still_displays() {
        let (store, _) = setup();
        store.set("schedule_7", &lessons("101"), &CacheOptions::default());
        let reval = Revalidator::new(store, DatasetSpec::schedule(), &7);

        let outcome = reval
            .revalidate(&ScriptedFetcher::always(lessons("101")))
            .await;
        assert_eq!(outcome, Outcome::Replaced);
        assert!(reval.view().data.is_some());
    }
}
