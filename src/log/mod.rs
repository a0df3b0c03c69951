// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Append-log key-value store with tombstone-driven compaction.
//!
//! Values are appended to an arena and never moved in place; an ordered
//! index maps each key to the slot holding its value. Deleting a key
//! clears its slot and leaves a tombstone. Once the share of tombstoned
//! slots exceeds [`LogStoreConfig::threshold`], the store rebuilds the
//! arena densely, either on a background worker thread or inline on the
//! deleting thread (see [`CompactionMode`]).
//!
//! Compaction is incremental: each step visits a bounded batch of index
//! entries and remembers where it stopped, so readers and writers can
//! interleave with a long-running compaction.
//!
//! # Example
//!
//! ```
//! use memindex::log::{AppendLogStore, CompactionMode, LogStoreConfig};
//!
//! let store = AppendLogStore::new(
//!     LogStoreConfig::default()
//!         .with_mode(CompactionMode::Inline)
//!         .with_threshold(0.9)
//!         .with_batch_size(2),
//! )?;
//!
//! for i in 0..6u8 {
//!     store.add(vec![i], vec![i]);
//! }
//! store.delete(&[0]);
//!
//! while store.compact_incremental().is_in_progress() {}
//! assert_eq!(store.slots(), 5);
//! assert_eq!(store.tombstones(), 0);
//! # Ok::<(), memindex::log::LogStoreError>(())
//! ```

mod arena;
mod compaction;
mod config;
mod error;
mod store;

pub use compaction::{CompactionProgress, CompactionStats};
pub use config::{
    CompactionMode, LogStoreConfig, DEFAULT_COMPACTION_BATCH_SIZE, DEFAULT_COMPACTION_THRESHOLD,
};
pub use error::LogStoreError;
pub use store::AppendLogStore;
