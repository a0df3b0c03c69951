// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! TTL-aware ordered index.
//!
//! [`TtlIndex`] keeps [`Record`]s ordered by key. Each record remembers
//! when it was last written; given a TTL, records written at or before
//! `now - ttl` are expired and can be listed or purged in key order, in
//! bounded batches.
//!
//! Records come in two flavors that share one index: filter records carry
//! only a key, value records also carry bytes.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use chrono::TimeDelta;
//! use memindex::clock::ManualClock;
//! use memindex::ttl::{Record, TtlIndex, TtlIndexConfig};
//!
//! let clock = Arc::new(ManualClock::from_unix(1_000));
//! let index = TtlIndex::new(TtlIndexConfig::default().with_clock(clock.clone()))?;
//!
//! index.upsert_now(Record::with_value("session", "alice"));
//! clock.advance(TimeDelta::minutes(10));
//! index.upsert_now(Record::filter("seen"));
//!
//! let expired = index.list_expired(TimeDelta::minutes(5), 0);
//! assert_eq!(expired.len(), 1);
//! assert_eq!(expired[0].key(), "session");
//!
//! assert_eq!(index.purge_expired(TimeDelta::minutes(5), 0), 1);
//! assert_eq!(index.size(), 1);
//! # Ok::<(), memindex::ttl::TtlError>(())
//! ```

mod config;
mod error;
mod index;
mod record;

pub use config::TtlIndexConfig;
pub use error::TtlError;
pub use index::{PurgeStats, TtlIndex, FOR_EACH_CHUNK};
pub use record::{Payload, Record};
