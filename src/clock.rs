//! Time sources for entry timestamps.
//!
//! All timestamps are milliseconds since the Unix epoch. The store takes its
//! clock as an injected dependency so TTL behaviour can be driven by hand in tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of the current time in epoch milliseconds.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        let millis = chrono::Utc::now().timestamp_millis();
        u64::try_from(millis).unwrap_or(0)
    }
}

/// Manually driven clock, shared between clones.
///
/// # Example
///
/// ```
/// use portal_cache::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::new(0);
/// clock.advance(500);
/// assert_eq!(clock.now_millis(), 500);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_millis: u64) -> Self {
        ManualClock {
            now: Arc::new(AtomicU64::new(start_millis)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    /// Jump to an absolute time.
    pub fn set(&self, millis: u64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
