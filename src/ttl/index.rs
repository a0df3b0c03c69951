// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Thread-safe ordered index of expiring records.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use tracing::{debug, instrument, trace};

use crate::clock::Clock;
use crate::index::{BTreeIndex, OrderedIndex};

use super::record::expiry_cutoff;
use super::{Record, TtlError, TtlIndexConfig};

/// Number of `(key, expiration)` pairs [`TtlIndex::for_each`] copies per
/// read-lock acquisition.
pub const FOR_EACH_CHUNK: usize = 256;

/// Outcome of a purge: how many records the scan selected and how many
/// were actually removed.
///
/// The two differ when a candidate is refreshed, replaced or deleted by
/// another thread between the scan and its deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeStats {
    pub candidates: usize,
    pub deleted: usize,
}

/// A concurrent, key-ordered index of [`Record`]s with expiry listing and
/// bounded purging.
///
/// Every record carries the unix second of its last write. With a TTL
/// `ttl` evaluated at `now`, a record is expired once
/// `expiration <= now - ttl`; the boundary is inclusive. A TTL that is
/// zero or negative expires nothing.
///
/// Operations on empty keys are ignored and report `false`/`0`/`None`.
///
/// # Example
///
/// ```
/// use chrono::{DateTime, TimeDelta};
/// use memindex::ttl::{Record, TtlIndex};
///
/// let index = TtlIndex::default();
/// let t0 = DateTime::from_timestamp(1_000, 0).unwrap();
///
/// index.upsert(Record::filter("a"), t0);
/// index.upsert(Record::with_value("b", "payload"), t0 + TimeDelta::seconds(60));
///
/// let now = t0 + TimeDelta::seconds(90);
/// let deleted = index.purge_expired_at(now, TimeDelta::seconds(60), 0);
/// assert_eq!(deleted, 1);
/// assert!(!index.has(b"a"));
/// assert!(index.has(b"b"));
/// ```
pub struct TtlIndex {
    records: RwLock<BTreeIndex<Arc<Record>>>,
    clock: Arc<dyn Clock>,
}

impl TtlIndex {
    /// Creates an empty index.
    pub fn new(config: TtlIndexConfig) -> Result<Self, TtlError> {
        config.index.validate()?;
        Ok(Self {
            records: RwLock::new(BTreeIndex::new(&config.index)),
            clock: config.clock,
        })
    }

    /// Returns the clock used by the `*_now` operations.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Inserts `record` or updates the record already stored under its
    /// key, stamping it with `at`. Returns true if the key was new.
    ///
    /// A new key stores `record` itself, so the caller's handle becomes
    /// live. For an existing key the stored record keeps its identity and
    /// takes over the payload of `record`.
    pub fn upsert(&self, record: impl Into<Arc<Record>>, at: DateTime<Utc>) -> bool {
        let record = record.into();
        if record.key().is_empty() {
            return false;
        }
        let mut records = self.records.write();
        upsert_locked(&mut records, record, at.timestamp())
    }

    /// [`upsert`](Self::upsert) stamped with the clock's current time.
    pub fn upsert_now(&self, record: impl Into<Arc<Record>>) -> bool {
        self.upsert(record, self.clock.now())
    }

    /// Upserts a batch under a single write lock, stamping every record
    /// with `at`. Returns the number of distinct new keys.
    ///
    /// Records sharing a key collapse to the last one in the batch.
    pub fn upsert_many<I>(&self, records: I, at: DateTime<Utc>) -> usize
    where
        I: IntoIterator,
        I::Item: Into<Arc<Record>>,
    {
        let at = at.timestamp();
        let mut index = self.records.write();
        let mut added = 0;
        for record in records {
            let record = record.into();
            if record.key().is_empty() {
                continue;
            }
            if upsert_locked(&mut index, record, at) {
                added += 1;
            }
        }
        trace!(added, "batch upsert");
        added
    }

    /// [`upsert_many`](Self::upsert_many) stamped with the clock's current
    /// time.
    pub fn upsert_many_now<I>(&self, records: I) -> usize
    where
        I: IntoIterator,
        I::Item: Into<Arc<Record>>,
    {
        self.upsert_many(records, self.clock.now())
    }

    /// Refreshes the expiration of the record under `key` without touching
    /// its payload. Returns true if the key exists.
    pub fn touch(&self, key: &[u8], at: DateTime<Utc>) -> bool {
        if key.is_empty() {
            return false;
        }
        let records = self.records.write();
        match records.get(key) {
            Some(record) => {
                record.set_expiration(at);
                true
            }
            None => false,
        }
    }

    /// [`touch`](Self::touch) with the clock's current time.
    pub fn touch_now(&self, key: &[u8]) -> bool {
        self.touch(key, self.clock.now())
    }

    /// Removes `key`. Returns true if it was present.
    pub fn delete(&self, key: &[u8]) -> bool {
        if key.is_empty() {
            return false;
        }
        self.records.write().delete(key).is_some()
    }

    /// Removes every key in `keys` under a single write lock. Returns the
    /// number of keys that were present.
    pub fn delete_many<I, K>(&self, keys: I) -> usize
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        let mut records = self.records.write();
        keys.into_iter()
            .filter(|key| {
                let key: &[u8] = key.as_ref();
                !key.is_empty() && records.delete(key).is_some()
            })
            .count()
    }

    pub fn has(&self, key: &[u8]) -> bool {
        !key.is_empty() && self.records.read().get(key).is_some()
    }

    /// Returns the live record stored under `key`.
    ///
    /// The handle aliases the indexed record: later upserts are visible
    /// through it, and refreshing it changes what the index sees.
    pub fn get_record(&self, key: &[u8]) -> Option<Arc<Record>> {
        if key.is_empty() {
            return None;
        }
        self.records.read().get(key).cloned()
    }

    /// Returns the payload bytes stored under `key`; `None` for absent
    /// keys and filter records.
    pub fn get_value(&self, key: &[u8]) -> Option<Bytes> {
        self.get_record(key)?.value()
    }

    /// Returns the last write time of `key` in unix seconds.
    pub fn get_last_write_unix(&self, key: &[u8]) -> Option<i64> {
        if key.is_empty() {
            return None;
        }
        self.records.read().get(key).map(|r| r.expiration_unix())
    }

    /// Visits `(key, expiration)` pairs in ascending key order until the
    /// visitor returns false.
    ///
    /// Pairs are copied out under the read lock in chunks of
    /// [`FOR_EACH_CHUNK`] and visited after it is released, so the visitor
    /// may call back into the index and an early stop costs at most one
    /// chunk of copies. Keys are copies that share no memory with the
    /// index.
    ///
    /// Each chunk resumes after the last key visited. Keys inserted or
    /// removed ahead of that point by other callers, or by the visitor
    /// itself, are seen as of the chunk that reaches them.
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(Bytes, i64) -> bool,
    {
        let mut cursor: Option<Bytes> = None;
        loop {
            let chunk = {
                let records = self.records.read();
                let mut chunk = Vec::with_capacity(FOR_EACH_CHUNK.min(records.len()));
                let collect = |key: &Bytes, record: &Arc<Record>| {
                    chunk.push((Bytes::copy_from_slice(key), record.expiration_unix()));
                    chunk.len() < FOR_EACH_CHUNK
                };
                match &cursor {
                    Some(after) => records.ascend_after(after, collect),
                    None => records.ascend(collect),
                }
                chunk
            };

            let exhausted = chunk.len() < FOR_EACH_CHUNK;
            for (key, expiration) in chunk {
                cursor = Some(key.clone());
                if !visit(key, expiration) {
                    return;
                }
            }
            if exhausted {
                return;
            }
        }
    }

    /// Like [`for_each`](Self::for_each) for callers whose visitor is
    /// optional.
    pub fn for_each_with<F>(&self, visit: Option<F>) -> Result<(), TtlError>
    where
        F: FnMut(Bytes, i64) -> bool,
    {
        let visit = visit.ok_or(TtlError::MissingVisitor)?;
        self.for_each(visit);
        Ok(())
    }

    /// Number of records.
    pub fn size(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Removes every record.
    pub fn reset(&self) {
        self.records.write().clear();
        debug!("ttl index reset");
    }

    /// Deletes records expired at `now` under `ttl`, at most `max`
    /// of them (0 = unbounded). Returns the number deleted.
    #[instrument(skip(self))]
    pub fn purge_expired_at(&self, now: DateTime<Utc>, ttl: TimeDelta, max: usize) -> usize {
        self.purge_expired_at_with_stats(now, ttl, max).deleted
    }

    /// [`purge_expired_at`](Self::purge_expired_at) evaluated at the
    /// clock's current time.
    pub fn purge_expired(&self, ttl: TimeDelta, max: usize) -> usize {
        self.purge_expired_at(self.clock.now(), ttl, max)
    }

    /// Purges in two phases: a read-locked scan collects up to `max`
    /// candidates in key order, then each candidate is deleted under the
    /// write lock.
    ///
    /// The purge is not atomic as a whole. A candidate is skipped if, by
    /// the time it is deleted, it was removed, replaced by a different
    /// record, or refreshed past the cutoff.
    pub fn purge_expired_at_with_stats(
        &self,
        now: DateTime<Utc>,
        ttl: TimeDelta,
        max: usize,
    ) -> PurgeStats {
        let Some(cutoff) = expiry_cutoff(now, ttl) else {
            return PurgeStats::default();
        };

        let candidates = self.scan_expired(cutoff, max);
        let mut stats = PurgeStats {
            candidates: candidates.len(),
            deleted: 0,
        };

        for candidate in candidates {
            let mut records = self.records.write();
            let still_expired = records.get(candidate.key()).map_or(false, |current| {
                Arc::ptr_eq(current, &candidate) && current.expiration_unix() <= cutoff
            });
            if still_expired && records.delete(candidate.key()).is_some() {
                stats.deleted += 1;
            }
        }

        if stats.deleted > 0 || stats.candidates > 0 {
            debug!(
                cutoff,
                candidates = stats.candidates,
                deleted = stats.deleted,
                "purged expired records"
            );
        }
        stats
    }

    /// Returns the live records expired at `now` under `ttl`, in key
    /// order, at most `max` of them (0 = unbounded).
    pub fn list_expired_at(
        &self,
        now: DateTime<Utc>,
        ttl: TimeDelta,
        max: usize,
    ) -> Vec<Arc<Record>> {
        match expiry_cutoff(now, ttl) {
            Some(cutoff) => self.scan_expired(cutoff, max),
            None => Vec::new(),
        }
    }

    /// [`list_expired_at`](Self::list_expired_at) evaluated at the clock's
    /// current time.
    pub fn list_expired(&self, ttl: TimeDelta, max: usize) -> Vec<Arc<Record>> {
        self.list_expired_at(self.clock.now(), ttl, max)
    }

    fn scan_expired(&self, cutoff: i64, max: usize) -> Vec<Arc<Record>> {
        let records = self.records.read();
        let mut expired = Vec::new();
        records.ascend(|_, record| {
            if record.expiration_unix() <= cutoff {
                expired.push(Arc::clone(record));
            }
            max == 0 || expired.len() < max
        });
        expired
    }
}

fn upsert_locked(records: &mut BTreeIndex<Arc<Record>>, record: Arc<Record>, at: i64) -> bool {
    if let Some(existing) = records.get(record.key()) {
        existing.absorb(&record);
        existing.set_expiration_unix(at);
        return false;
    }
    record.set_expiration_unix(at);
    records.replace_or_insert(record.key().clone(), record);
    true
}

impl Default for TtlIndex {
    fn default() -> Self {
        let config = TtlIndexConfig::default();
        Self {
            records: RwLock::new(BTreeIndex::new(&config.index)),
            clock: config.clock,
        }
    }
}

impl std::fmt::Debug for TtlIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlIndex")
            .field("size", &self.size())
            .finish_non_exhaustive()
    }
}
