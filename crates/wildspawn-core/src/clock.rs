//! Game clock and time-of-day bucketing.
//!
//! The resolver never reads the wall clock directly. It asks a
//! [`GameClock`] for the current hour and maps that hour onto one of the
//! eight [`TimeOfDay`] buckets through a configured [`TimeBuckets`] table.
//! Tests inject a [`FixedClock`]; the host binary uses [`SystemClock`].

use std::sync::atomic::{AtomicU8, Ordering};

use chrono::Timelike;
use wildspawn_types::TimeOfDay;

/// Number of time-of-day buckets.
const BUCKET_COUNT: usize = 8;

/// Errors that can occur when building a bucket table.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// The bucket table is malformed.
    #[error("invalid bucket table: {reason}")]
    InvalidBuckets {
        /// Explanation of what is wrong with the table.
        reason: String,
    },
}

/// Source of the current in-game hour.
pub trait GameClock: Send + Sync {
    /// The current hour, `0..24`.
    fn hour(&self) -> u8;
}

/// Clock backed by the host's local wall-clock hour.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl GameClock for SystemClock {
    fn hour(&self) -> u8 {
        u8::try_from(chrono::Local::now().hour()).unwrap_or(0)
    }
}

/// Clock pinned to an hour until changed. Shared by reference in tests.
#[derive(Debug, Default)]
pub struct FixedClock {
    hour: AtomicU8,
}

impl FixedClock {
    /// Create a clock reading `hour` (taken modulo 24).
    pub fn new(hour: u8) -> Self {
        Self {
            hour: AtomicU8::new(hour % 24),
        }
    }

    /// Move the clock to `hour` (taken modulo 24).
    pub fn set_hour(&self, hour: u8) {
        self.hour.store(hour % 24, Ordering::Release);
    }
}

impl GameClock for FixedClock {
    fn hour(&self) -> u8 {
        self.hour.load(Ordering::Acquire)
    }
}

/// Maps clock hours to [`TimeOfDay`] buckets.
///
/// Bucket `i` covers `[start[i], start[i + 1])`; the last bucket wraps past
/// midnight to the first start hour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBuckets {
    starts: [u8; BUCKET_COUNT],
}

impl Default for TimeBuckets {
    fn default() -> Self {
        Self {
            starts: [0, 3, 6, 9, 12, 15, 18, 21],
        }
    }
}

impl TimeBuckets {
    /// Build a table from eight strictly ascending start hours in `0..24`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidBuckets`] if the length is not eight,
    /// an hour is 24 or more, or the hours are not strictly ascending.
    pub fn new(start_hours: &[u8]) -> Result<Self, ClockError> {
        let starts: [u8; BUCKET_COUNT] =
            start_hours
                .try_into()
                .map_err(|_err| ClockError::InvalidBuckets {
                    reason: format!(
                        "expected {BUCKET_COUNT} start hours, got {}",
                        start_hours.len()
                    ),
                })?;
        if starts.iter().any(|&h| h >= 24) {
            return Err(ClockError::InvalidBuckets {
                reason: "start hours must be below 24".to_owned(),
            });
        }
        if starts.windows(2).any(|pair| pair.first() >= pair.get(1)) {
            return Err(ClockError::InvalidBuckets {
                reason: "start hours must be strictly ascending".to_owned(),
            });
        }
        Ok(Self { starts })
    }

    /// The bucket containing `hour`.
    pub fn bucket(&self, hour: u8) -> TimeOfDay {
        let hour = hour % 24;
        // Hours before the first start belong to the wrapped last bucket.
        let mut current = TimeOfDay::Night;
        for (start, bucket) in self.starts.iter().zip(TimeOfDay::ALL) {
            if hour >= *start {
                current = bucket;
            }
        }
        current
    }

    /// The bucket for `clock`'s current hour.
    pub fn current(&self, clock: &dyn GameClock) -> TimeOfDay {
        self.bucket(clock.hour())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_the_day() {
        let buckets = TimeBuckets::default();
        assert_eq!(buckets.bucket(0), TimeOfDay::WitchingHour);
        assert_eq!(buckets.bucket(2), TimeOfDay::WitchingHour);
        assert_eq!(buckets.bucket(3), TimeOfDay::Dawn);
        assert_eq!(buckets.bucket(10), TimeOfDay::LateMorning);
        assert_eq!(buckets.bucket(23), TimeOfDay::Night);
    }

    #[test]
    fn hours_before_first_start_wrap_to_last_bucket() {
        let buckets = TimeBuckets::new(&[2, 5, 8, 11, 14, 17, 20, 22]).unwrap();
        assert_eq!(buckets.bucket(1), TimeOfDay::Night);
        assert_eq!(buckets.bucket(2), TimeOfDay::WitchingHour);
        assert_eq!(buckets.bucket(22), TimeOfDay::Night);
    }

    #[test]
    fn fixed_clock_drives_current_bucket() {
        let clock = FixedClock::new(10);
        let buckets = TimeBuckets::default();
        assert_eq!(buckets.current(&clock), TimeOfDay::LateMorning);
        clock.set_hour(25);
        assert_eq!(clock.hour(), 1);
        assert_eq!(buckets.current(&clock), TimeOfDay::WitchingHour);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(TimeBuckets::new(&[0, 6, 12, 18]).is_err());
    }

    #[test]
    fn rejects_unordered_hours() {
        assert!(TimeBuckets::new(&[0, 3, 3, 9, 12, 15, 18, 21]).is_err());
        assert!(TimeBuckets::new(&[0, 3, 6, 9, 12, 15, 18, 24]).is_err());
    }
}
