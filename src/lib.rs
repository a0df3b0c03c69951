// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! memindex: concurrent in-memory indexed storage for byte-string keys.
//!
//! This crate provides two independent stores built on a shared ordered
//! index primitive:
//!
//! - [`AppendLogStore`]: first-writer-wins key-value storage over an
//!   append-only value arena, compacted incrementally once tombstones
//!   exceed a configurable share of the arena.
//! - [`TtlIndex`]: a key-ordered index of filter and value records that
//!   can list and purge entries by last-write time.
//!
//! Both are safe to share across threads; each serializes access through
//! its own reader-writer lock.

pub mod clock;
pub mod index;
pub mod log;
pub mod ttl;

pub use clock::{Clock, ManualClock, SystemClock};
pub use index::{BTreeIndex, IndexError, IndexOptions, OrderedIndex};
pub use log::{
    AppendLogStore, CompactionMode, CompactionProgress, CompactionStats, LogStoreConfig,
    LogStoreError,
};
pub use ttl::{Payload, PurgeStats, Record, TtlError, TtlIndex, TtlIndexConfig};
