// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Pluggable time sources.
//!
//! The TTL index reads "now" through a [`Clock`] so that tests can drive
//! expiry deterministically. Production code uses [`SystemClock`]; tests
//! use [`ManualClock`], which only moves when told to.
//!
//! # Example
//!
//! ```
//! use chrono::{DateTime, TimeDelta};
//! use memindex::clock::{Clock, ManualClock};
//!
//! let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
//! let clock = ManualClock::new(start);
//! clock.advance(TimeDelta::seconds(30));
//! assert_eq!(clock.now().timestamp(), 1_700_000_030);
//! ```

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

use chrono::{DateTime, Utc};

/// A source of the current wall-clock time.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;

    /// Returns the current time as whole unix seconds.
    #[inline]
    fn now_unix(&self) -> i64 {
        self.now().timestamp()
    }
}
