//! Separated from the pruning engine so the writer can hand a policy to its
//! background worker without sharing any other state.

use chrono::{DateTime, Duration, Utc};

/// Zero on either limit means unbounded, so a default policy keeps everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Backups older than this many days are deleted.
    pub max_age_days: u32,
    /// Only this many of the newest backups survive.
    pub max_backups: usize,
}

impl RetentionPolicy {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_age_days: 0,
            max_backups: 0,
        }
    }

    #[must_use]
    pub const fn max_age_days(mut self, days: u32) -> Self {
        self.max_age_days = days;
        self
    }

    #[must_use]
    pub const fn max_backups(mut self, n: usize) -> Self {
        self.max_backups = n;
        self
    }

    /// True when neither limit is set and pruning can be skipped outright.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.max_age_days == 0 && self.max_backups == 0
    }

    /// Backups stamped before this instant have expired.
    #[must_use]
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.max_age_days == 0 {
            return None;
        }
        now.checked_sub_signed(Duration::days(i64::from(self.max_age_days)))
    }
}
