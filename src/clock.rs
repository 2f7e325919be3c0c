//! Time sources used to stamp session expiry.

use parking_lot::RwLock;
use std::fmt::Debug;
use std::sync::Arc;
use time::{Duration, OffsetDateTime};

/// A source of the current time.
///
/// [`SessionStore`](crate::SessionStore) reads the clock both when computing a
/// record's expiry on write and when sweeping expired records, so every backend
/// compares against the same notion of "now".
pub trait Clock: Debug + Send + Sync + 'static {
    fn now(&self) -> OffsetDateTime;
}

/// The wall clock, in UTC.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A manually driven clock.
///
/// Clones share the same instant, so a test can hand one clone to the store and
/// keep another to move time forward.
///
/// # Example
///
/// ```rust
/// use sesh::clock::{Clock, MockClock};
/// use time::Duration;
///
/// let clock = MockClock::default();
/// let start = clock.now();
/// clock.advance(Duration::seconds(3601));
/// assert_eq!(clock.now() - start, Duration::seconds(3601));
/// ```
#[derive(Clone, Debug)]
pub struct MockClock {
    now: Arc<RwLock<OffsetDateTime>>,
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new(OffsetDateTime::now_utc())
    }
}

impl MockClock {
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            now: Arc::new(RwLock::new(start)),
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        *self.now.write() += by;
    }

    pub fn set(&self, instant: OffsetDateTime) {
        *self.now.write() = instant;
    }
}

impl Clock for MockClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_time() {
        let clock = MockClock::new(OffsetDateTime::UNIX_EPOCH);
        let other = clock.clone();

        clock.advance(Duration::seconds(10));
        assert_eq!(other.now(), OffsetDateTime::UNIX_EPOCH + Duration::seconds(10));

        other.set(OffsetDateTime::UNIX_EPOCH);
        assert_eq!(clock.now(), OffsetDateTime::UNIX_EPOCH);
    }
}
