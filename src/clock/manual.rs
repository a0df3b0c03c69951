// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Manually driven time source for tests and simulations.

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;

use super::Clock;

/// A clock that only changes when [`set`](Self::set) or
/// [`advance`](Self::advance) is called.
///
/// Safe to share between threads; every reader observes the latest value
/// written.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Creates a clock frozen at the given unix second.
    ///
    /// Out-of-range values clamp to the unix epoch.
    pub fn from_unix(secs: i64) -> Self {
        Self::new(DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH))
    }

    /// Moves the clock to `at`.
    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock() = at;
    }

    /// Moves the clock by `delta` (which may be negative).
    ///
    /// Saturates instead of overflowing the representable range.
    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock();
        *now = now.checked_add_signed(delta).unwrap_or(if delta < TimeDelta::zero() {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        });
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_is_frozen() {
        let clock = ManualClock::from_unix(1_000);
        assert_eq!(clock.now_unix(), 1_000);
        assert_eq!(clock.now_unix(), 1_000);
    }

    #[test]
    fn test_manual_clock_set_and_advance() {
        let clock = ManualClock::default();
        assert_eq!(clock.now_unix(), 0);

        clock.set(DateTime::from_timestamp(500, 0).unwrap());
        assert_eq!(clock.now_unix(), 500);

        clock.advance(TimeDelta::seconds(20));
        assert_eq!(clock.now_unix(), 520);

        clock.advance(TimeDelta::seconds(-120));
        assert_eq!(clock.now_unix(), 400);
    }

    #[test]
    fn test_manual_clock_advance_saturates() {
        let clock = ManualClock::default();
        clock.advance(TimeDelta::MAX);
        assert_eq!(clock.now(), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_manual_clock_shared_between_threads() {
        use std::sync::Arc;
        use std::thread;

        let clock = Arc::new(ManualClock::from_unix(0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let clock = Arc::clone(&clock);
                thread::spawn(move || {
                    for _ in 0..100 {
                        clock.advance(TimeDelta::seconds(1));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("thread panicked");
        }
        assert_eq!(clock.now_unix(), 400);
    }
}
