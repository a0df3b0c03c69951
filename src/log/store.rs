// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Append-log store: an ordered index over positions in a value arena.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::{debug, info, instrument, trace};

use crate::index::{BTreeIndex, OrderedIndex};

use super::arena::{Arena, SlotRef};
use super::compaction::{
    CompactionProgress, CompactionStats, CompactionWorker, Drain, WorkerSignal,
};
use super::{CompactionMode, LogStoreConfig, LogStoreError};

/// Everything guarded by the store's reader-writer lock.
#[derive(Debug)]
pub(crate) struct LogState {
    pub(crate) index: BTreeIndex<SlotRef>,
    pub(crate) active: Arena,
    pub(crate) draining: Option<Drain>,
    pub(crate) next_generation: u64,
    /// Bumped by `clear`; background runs abandon when it changes.
    pub(crate) epoch: u64,
}

impl LogState {
    fn new(config: &LogStoreConfig) -> Self {
        Self {
            index: BTreeIndex::new(&config.index),
            active: Arena::with_capacity(0, config.capacity),
            draining: None,
            next_generation: 1,
            epoch: 0,
        }
    }

    fn value(&self, slot: SlotRef) -> Option<&Bytes> {
        if self.active.owns(slot) {
            return self.active.get(slot.pos);
        }
        self.draining
            .as_ref()
            .filter(|drain| drain.arena.owns(slot))
            .and_then(|drain| drain.arena.get(slot.pos))
    }

    fn tombstone(&mut self, slot: SlotRef) -> bool {
        if self.active.owns(slot) {
            return self.active.tombstone(slot.pos);
        }
        match self.draining.as_mut() {
            Some(drain) if drain.arena.owns(slot) => drain.arena.tombstone(slot.pos),
            _ => false,
        }
    }

    fn slots(&self) -> usize {
        self.active.len() + self.draining.as_ref().map_or(0, |d| d.arena.len())
    }

    fn tombstones(&self) -> usize {
        self.active.tombstones() + self.draining.as_ref().map_or(0, |d| d.arena.tombstones())
    }

    fn tombstone_ratio(&self) -> f64 {
        let slots = self.slots();
        if slots == 0 {
            return 0.0;
        }
        self.tombstones() as f64 / slots as f64
    }
}

/// State shared between the store handle and its compaction worker.
pub(crate) struct Shared {
    state: RwLock<LogState>,
    config: LogStoreConfig,
    /// Single-flight guard: set while a background run is requested or active.
    compacting: AtomicBool,
    signal: Arc<WorkerSignal>,
}

impl Shared {
    fn needs_compaction(&self) -> bool {
        self.state.read().tombstone_ratio() > self.config.threshold
    }

    fn request_compaction(&self) {
        if self
            .compacting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            trace!("scheduling background compaction");
            self.signal.notify();
        }
    }

    /// Compacts in batches, releasing the write lock between them.
    pub(crate) fn run_background_compaction(&self, signal: &WorkerSignal) {
        loop {
            let epoch = self.state.read().epoch;
            loop {
                if signal.is_shutdown() {
                    self.compacting.store(false, Ordering::Release);
                    return;
                }

                let mut state = self.state.write();
                if state.epoch != epoch {
                    debug!("store cleared during compaction, abandoning run");
                    break;
                }
                match state.compact_step(self.config.batch_size) {
                    CompactionProgress::InProgress { scanned } => {
                        trace!(scanned, "compaction step done");
                        drop(state);
                        std::thread::yield_now();
                    }
                    CompactionProgress::Completed(stats) => {
                        info!(
                            moved = stats.entries_moved,
                            reclaimed = stats.slots_reclaimed,
                            steps = stats.steps,
                            "background compaction completed"
                        );
                        break;
                    }
                    CompactionProgress::Idle => break,
                }
            }

            self.compacting.store(false, Ordering::Release);

            // A delete may have crossed the threshold after the last step
            // but before the guard was released.
            if !self.needs_compaction()
                || self
                    .compacting
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
            {
                return;
            }
        }
    }
}

/// A thread-safe key-value store whose values live in an append-only
/// arena and whose keys map to arena positions through an ordered index.
///
/// - [`add`](Self::add) is first-writer-wins: adding an existing key is a
///   no-op.
/// - [`delete`](Self::delete) removes the key and clears its slot, leaving
///   a tombstone. Once the tombstone ratio exceeds the configured threshold
///   the store compacts, either on a background worker or inline.
/// - Compaction is incremental and resumable; see
///   [`compact_incremental`](Self::compact_incremental).
///
/// All operations take a single reader-writer lock: reads in shared mode,
/// mutations exclusively.
///
/// # Example
///
/// ```
/// use memindex::log::{AppendLogStore, CompactionMode, LogStoreConfig};
///
/// let store = AppendLogStore::new(
///     LogStoreConfig::default().with_mode(CompactionMode::Inline),
/// )?;
/// store.add("k1", "foo");
/// store.add("k1", "bar");
/// assert_eq!(store.get(b"k1").as_deref(), Some(&b"foo"[..]));
///
/// store.delete(b"k1");
/// assert!(store.get(b"k1").is_none());
/// # Ok::<(), memindex::log::LogStoreError>(())
/// ```
pub struct AppendLogStore {
    shared: Arc<Shared>,
    // Declared after `shared` so the store's reference is released before
    // the worker is joined.
    _worker: Option<CompactionWorker>,
}

impl AppendLogStore {
    /// Creates a store, spawning the compaction worker in
    /// [`CompactionMode::Background`].
    pub fn new(config: LogStoreConfig) -> Result<Self, LogStoreError> {
        config.validate()?;

        let signal = Arc::new(WorkerSignal::new());
        let mode = config.mode;
        let shared = Arc::new(Shared {
            state: RwLock::new(LogState::new(&config)),
            config,
            compacting: AtomicBool::new(false),
            signal: Arc::clone(&signal),
        });

        let worker = match mode {
            CompactionMode::Background => Some(
                CompactionWorker::spawn(Arc::downgrade(&shared), signal)
                    .map_err(LogStoreError::WorkerSpawn)?,
            ),
            CompactionMode::Inline => None,
        };

        Ok(Self {
            shared,
            _worker: worker,
        })
    }

    /// Returns the store's configuration.
    pub fn config(&self) -> &LogStoreConfig {
        &self.shared.config
    }

    /// Adds `value` under `key` unless the key is already present.
    ///
    /// Returns true if the value was stored. Empty keys are ignored.
    pub fn add(&self, key: impl Into<Bytes>, value: impl Into<Bytes>) -> bool {
        let key = key.into();
        if key.is_empty() {
            return false;
        }

        let mut state = self.shared.state.write();
        if state.index.get(&key).is_some() {
            return false;
        }
        let slot = state.active.push(value.into());
        state.index.replace_or_insert(key, slot);
        true
    }

    /// Returns the value stored under `key`.
    ///
    /// `None` if the key is absent or its slot has been tombstoned.
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        if key.is_empty() {
            return None;
        }
        let state = self.shared.state.read();
        let slot = *state.index.get(key)?;
        state.value(slot).cloned()
    }

    /// Returns true if `key` holds a live value.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Deletes `key`, tombstoning its slot. Returns true if the key existed.
    ///
    /// May trigger compaction when the tombstone ratio crosses the
    /// configured threshold.
    pub fn delete(&self, key: &[u8]) -> bool {
        if key.is_empty() {
            return false;
        }

        let schedule = {
            let mut state = self.shared.state.write();
            let Some(slot) = state.index.delete(key) else {
                return false;
            };
            state.tombstone(slot);

            let ratio = state.tombstone_ratio();
            if ratio <= self.shared.config.threshold {
                false
            } else {
                match self.shared.config.mode {
                    CompactionMode::Inline => {
                        trace!(ratio, "tombstone threshold crossed, compacting inline");
                        state.compact_to_completion();
                        false
                    }
                    CompactionMode::Background => true,
                }
            }
        };

        if schedule {
            self.shared.request_compaction();
        }
        true
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.shared.state.read().index.len()
    }

    /// Returns true if the store holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of arena slots currently held, live or tombstoned.
    pub fn slots(&self) -> usize {
        self.shared.state.read().slots()
    }

    /// Number of tombstoned slots not yet reclaimed.
    pub fn tombstones(&self) -> usize {
        self.shared.state.read().tombstones()
    }

    /// Returns true while a compaction is requested or partially done.
    pub fn is_compacting(&self) -> bool {
        self.shared.compacting.load(Ordering::Acquire)
            || self.shared.state.read().draining.is_some()
    }

    /// Runs one compaction step of at most `batch_size` index entries.
    ///
    /// The first step starts a run if there is anything to reclaim;
    /// later steps resume after the last key visited. Entries beyond the
    /// batch are never dropped, they are moved by a later step.
    pub fn compact_incremental(&self) -> CompactionProgress {
        let mut state = self.shared.state.write();
        state.compact_step(self.shared.config.batch_size)
    }

    /// Compacts to completion under a single write lock, finishing any run
    /// already in progress. On return no tombstone is left and every live
    /// value sits at a dense position.
    ///
    /// The returned stats add up every run it took.
    #[instrument(skip(self))]
    pub fn compact_now(&self) -> CompactionStats {
        self.shared.state.write().compact_to_completion()
    }

    /// Removes every entry and abandons any compaction in progress.
    pub fn clear(&self) {
        let mut state = self.shared.state.write();
        let generation = state.next_generation;
        state.next_generation += 1;

        state.index.clear();
        state.active = Arena::with_capacity(generation, self.shared.config.capacity);
        state.draining = None;
        state.epoch += 1;
        debug!(generation, "append-log store cleared");
    }
}

impl std::fmt::Debug for AppendLogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.read();
        f.debug_struct("AppendLogStore")
            .field("len", &state.index.len())
            .field("slots", &state.slots())
            .field("tombstones", &state.tombstones())
            .field("mode", &self.shared.config.mode)
            .finish()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone)]
    enum Op {
        Add(u8, u8),
        Delete(u8),
        Step,
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..32, any::<u8>()).prop_map(|(k, v)| Op::Add(k, v)),
            (0u8..32).prop_map(Op::Delete),
            Just(Op::Step),
        ]
    }

    proptest! {
        #[test]
        fn store_matches_first_writer_wins_model(
            ops in prop::collection::vec(arb_op(), 1..200),
            batch in 1usize..8,
        ) {
            let store = AppendLogStore::new(
                LogStoreConfig::default()
                    .with_mode(CompactionMode::Inline)
                    .with_threshold(0.5)
                    .with_batch_size(batch),
            )
            .unwrap();
            let mut model: BTreeMap<u8, u8> = BTreeMap::new();

            for op in ops {
                match op {
                    Op::Add(k, v) => {
                        let inserted = store.add(vec![b'k', k], vec![v]);
                        prop_assert_eq!(inserted, !model.contains_key(&k));
                        model.entry(k).or_insert(v);
                    }
                    Op::Delete(k) => {
                        prop_assert_eq!(store.delete(&[b'k', k]), model.remove(&k).is_some());
                    }
                    Op::Step => {
                        store.compact_incremental();
                    }
                }
            }

            prop_assert_eq!(store.len(), model.len());
            for k in 0u8..32 {
                let expected = model.get(&k).map(|v| Bytes::from(vec![*v]));
                prop_assert_eq!(store.get(&[b'k', k]), expected);
            }

            store.compact_now();
            prop_assert_eq!(store.len(), model.len());
            prop_assert!(store.slots() >= model.len());
            for (k, v) in &model {
                prop_assert_eq!(store.get(&[b'k', *k]), Some(Bytes::from(vec![*v])));
            }
        }
    }
}
