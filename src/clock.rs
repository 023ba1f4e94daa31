//! Time source for backup naming and age-based pruning.
//!
//! The writer never calls `Utc::now()` directly. A `Clock` is injected so tests
//! can pin or advance time and get deterministic backup names.

use chrono::{DateTime, Duration, Local, LocalResult, NaiveDateTime, TimeZone, Utc};
use std::sync::{Mutex, PoisonError};

/// Supplies the current instant. Zone handling lives in [`Zone`].
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to an instant until moved with [`MockClock::set`] or [`MockClock::advance`].
#[derive(Debug)]
pub struct MockClock {
    now: Mutex<DateTime<Utc>>,
}

impl MockClock {
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Which wall clock backup timestamps are written in (and parsed back from).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zone {
    #[default]
    Utc,
    Local,
}

impl Zone {
    #[must_use]
    pub const fn from_local_flag(local_time: bool) -> Self {
        if local_time { Self::Local } else { Self::Utc }
    }

    /// Wall-clock reading of `instant` in this zone.
    #[must_use]
    pub fn naive(self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            Self::Utc => instant.naive_utc(),
            Self::Local => instant.with_timezone(&Local).naive_local(),
        }
    }

    /// Inverse of [`Zone::naive`]. DST gaps have no instant and yield `None`;
    /// folds resolve to the earlier reading.
    #[must_use]
    pub fn instant(self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            Self::Utc => Some(naive.and_utc()),
            Self::Local => match Local.from_local_datetime(&naive) {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                    Some(dt.with_timezone(&Utc))
                }
                LocalResult::None => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .expect("valid rfc3339")
            .with_timezone(&Utc)
    }

    #[test]
    fn mock_clock_is_fixed_until_moved() {
        let clock = MockClock::new(instant("2024-03-01T10:00:00Z"));
        assert_eq!(clock.now(), clock.now());

        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now(), instant("2024-03-01T10:01:30Z"));

        clock.set(instant("2020-01-01T00:00:00Z"));
        assert_eq!(clock.now(), instant("2020-01-01T00:00:00Z"));
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now() > instant("2020-01-01T00:00:00Z"));
    }

    #[test]
    fn utc_zone_round_trips() {
        let now = instant("2024-03-01T10:00:00.250Z");
        let naive = Zone::Utc.naive(now);
        assert_eq!(Zone::Utc.instant(naive), Some(now));
    }

    #[test]
    fn clock_works_as_trait_object() {
        let clock: Box<dyn Clock> = Box::new(MockClock::new(instant("2024-03-01T10:00:00Z")));
        assert_eq!(clock.now(), instant("2024-03-01T10:00:00Z"));
    }
}
