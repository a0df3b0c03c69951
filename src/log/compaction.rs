// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Incremental, resumable compaction of the value arena.
//!
//! Starting a compaction swaps in a fresh arena with a new generation and
//! keeps the old one as a *drain*. Each step walks the next batch of index
//! entries after a saved cursor and moves their values into the fresh
//! arena, re-pointing the entries at dense new positions. Values added
//! while a drain is in progress land directly in the fresh arena and are
//! skipped by the walk. When the walk reaches the end of the index the
//! drain is dropped, releasing every tombstoned slot at once.
//!
//! A step never discards an entry it has not visited: an interrupted walk
//! simply resumes from the cursor on the next step.

use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};

use bytes::Bytes;
use parking_lot::{Condvar, Mutex};
use tracing::debug;

use crate::index::OrderedIndex;

use super::arena::{Arena, SlotRef};
use super::store::{LogState, Shared};

/// Statistics from one compaction run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactionStats {
    /// Index entries visited.
    pub entries_scanned: u64,
    /// Values moved into the fresh arena.
    pub entries_moved: u64,
    /// Slots released when the old arena was dropped.
    pub slots_reclaimed: u64,
    /// Number of steps the run took.
    pub steps: u64,
}

impl CompactionStats {
    fn absorb(&mut self, other: &CompactionStats) {
        self.entries_scanned += other.entries_scanned;
        self.entries_moved += other.entries_moved;
        self.slots_reclaimed += other.slots_reclaimed;
        self.steps += other.steps;
    }
}

/// Outcome of a single compaction step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactionProgress {
    /// Nothing to reclaim and no compaction in flight.
    Idle,
    /// The walk stopped at the batch limit and will resume on the next step.
    InProgress {
        /// Entries visited so far in this run.
        scanned: u64,
    },
    /// The walk reached the end of the index and the old arena was dropped.
    Completed(CompactionStats),
}

impl CompactionProgress {
    /// Returns true if the run stopped at the batch limit.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::InProgress { .. })
    }
}

/// The arena being drained and how far the walk has progressed.
#[derive(Debug)]
pub(crate) struct Drain {
    pub(super) arena: Arena,
    cursor: Option<Bytes>,
    stats: CompactionStats,
}

impl LogState {
    /// Runs one compaction step visiting at most `batch_size` index entries
    /// (0 = no limit). Must be called with the store's write lock held.
    pub(crate) fn compact_step(&mut self, batch_size: usize) -> CompactionProgress {
        if self.draining.is_none() {
            if self.active.tombstones() == 0 {
                return CompactionProgress::Idle;
            }
            self.begin_drain();
        }

        let LogState {
            index,
            active,
            draining,
            ..
        } = self;
        let Some(drain) = draining.as_mut() else {
            return CompactionProgress::Idle;
        };

        let limit = if batch_size == 0 {
            usize::MAX
        } else {
            batch_size
        };

        let mut batch: Vec<(Bytes, SlotRef)> = Vec::with_capacity(limit.min(index.len()));
        let collect = |key: &Bytes, slot: &SlotRef| {
            batch.push((key.clone(), *slot));
            batch.len() < limit
        };
        match &drain.cursor {
            Some(cursor) => index.ascend_after(cursor, collect),
            None => index.ascend(collect),
        }
        let exhausted = batch.len() < limit;

        drain.stats.steps += 1;
        for (key, slot) in batch {
            drain.stats.entries_scanned += 1;
            if drain.arena.owns(slot) {
                if let Some(value) = drain.arena.take(slot.pos) {
                    let moved = active.push(value);
                    if let Some(entry) = index.get_mut(&key) {
                        *entry = moved;
                    }
                    drain.stats.entries_moved += 1;
                }
            }
            drain.cursor = Some(key);
        }

        if !exhausted {
            return CompactionProgress::InProgress {
                scanned: drain.stats.entries_scanned,
            };
        }

        let Some(finished) = draining.take() else {
            return CompactionProgress::Idle;
        };
        let mut stats = finished.stats;
        stats.slots_reclaimed = (finished.arena.len() as u64).saturating_sub(stats.entries_moved);
        debug!(
            generation = active.generation(),
            scanned = stats.entries_scanned,
            moved = stats.entries_moved,
            reclaimed = stats.slots_reclaimed,
            "compaction finished"
        );
        CompactionProgress::Completed(stats)
    }

    /// Compacts until no tombstone is left, finishing any run in progress
    /// first. Deletes that landed in the fresh arena during that run are
    /// reclaimed by a second pass. Must be called with the write lock held.
    pub(crate) fn compact_to_completion(&mut self) -> CompactionStats {
        let mut total = CompactionStats::default();
        while let CompactionProgress::Completed(stats) = self.compact_step(0) {
            total.absorb(&stats);
        }
        total
    }

    fn begin_drain(&mut self) {
        let generation = self.next_generation;
        self.next_generation += 1;

        let fresh = Arena::with_capacity(generation, self.index.len());
        let old = mem::replace(&mut self.active, fresh);
        debug!(
            generation,
            slots = old.len(),
            tombstones = old.tombstones(),
            live = self.index.len(),
            "compaction started"
        );
        self.draining = Some(Drain {
            arena: old,
            cursor: None,
            stats: CompactionStats::default(),
        });
    }
}

/// Wake-up and shutdown signalling between a store and its worker.
#[derive(Debug, Default)]
pub(crate) struct WorkerSignal {
    pending: Mutex<bool>,
    wake: Condvar,
    shutdown: AtomicBool,
}

impl WorkerSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the worker to run a compaction.
    pub fn notify(&self) {
        *self.pending.lock() = true;
        self.wake.notify_one();
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        let _pending = self.pending.lock();
        self.wake.notify_all();
    }

    #[inline]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Blocks until a compaction is requested. Returns false on shutdown.
    fn wait(&self) -> bool {
        let mut pending = self.pending.lock();
        while !*pending && !self.is_shutdown() {
            self.wake.wait(&mut pending);
        }
        *pending = false;
        !self.is_shutdown()
    }
}

/// Background thread that compacts a store whenever it is signalled.
///
/// Dropping the worker stops the thread and waits for it to exit; an
/// in-flight run stops at the next batch boundary.
pub(crate) struct CompactionWorker {
    signal: Arc<WorkerSignal>,
    handle: Option<JoinHandle<()>>,
}

impl CompactionWorker {
    pub fn spawn(shared: Weak<Shared>, signal: Arc<WorkerSignal>) -> std::io::Result<Self> {
        let thread_signal = Arc::clone(&signal);
        let handle = thread::Builder::new()
            .name("memindex-compaction".to_string())
            .spawn(move || Self::run(shared, thread_signal))?;

        Ok(Self {
            signal,
            handle: Some(handle),
        })
    }

    fn run(shared: Weak<Shared>, signal: Arc<WorkerSignal>) {
        debug!("compaction worker started");
        while signal.wait() {
            let Some(shared) = shared.upgrade() else {
                break;
            };
            shared.run_background_compaction(&signal);
        }
        debug!("compaction worker stopped");
    }
}

impl Drop for CompactionWorker {
    fn drop(&mut self) {
        self.signal.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
