// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Records stored in the TTL index.

use std::cmp::Ordering;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};

use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;

/// What a record carries besides its key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Presence only: the key is the whole record.
    Filter,
    /// Arbitrary bytes stored alongside the key.
    Value(Bytes),
}

/// A key-ordered entry of a [`TtlIndex`](super::TtlIndex).
///
/// The key is fixed at construction. The payload and the expiration (the
/// time of the last write or refresh, in unix seconds) can change while
/// the record sits in an index, so handles returned by
/// [`get_record`](super::TtlIndex::get_record) and
/// [`list_expired_at`](super::TtlIndex::list_expired_at) observe later
/// upserts and may refresh the record directly.
///
/// Records compare, order and hash by key alone; filter and value records
/// can share an index.
pub struct Record {
    key: Bytes,
    payload: RwLock<Payload>,
    expiration: AtomicI64,
}

impl Record {
    /// Creates a record with an explicit payload and a zero expiration.
    pub fn new(key: impl Into<Bytes>, payload: Payload) -> Self {
        Self {
            key: key.into(),
            payload: RwLock::new(payload),
            expiration: AtomicI64::new(0),
        }
    }

    /// Creates a payload-less record.
    pub fn filter(key: impl Into<Bytes>) -> Self {
        Self::new(key, Payload::Filter)
    }

    /// Creates a record carrying `value`.
    pub fn with_value(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self::new(key, Payload::Value(value.into()))
    }

    #[inline]
    pub fn key(&self) -> &Bytes {
        &self.key
    }

    /// Returns the stored bytes, or `None` for a filter record.
    pub fn value(&self) -> Option<Bytes> {
        match &*self.payload.read() {
            Payload::Filter => None,
            Payload::Value(value) => Some(value.clone()),
        }
    }

    /// Returns a copy of the current payload.
    pub fn payload(&self) -> Payload {
        self.payload.read().clone()
    }

    pub fn is_filter(&self) -> bool {
        matches!(*self.payload.read(), Payload::Filter)
    }

    /// Last write time in unix seconds.
    #[inline]
    pub fn expiration_unix(&self) -> i64 {
        self.expiration.load(AtomicOrdering::Acquire)
    }

    /// Sets the last write time, truncated to whole seconds.
    pub fn set_expiration(&self, at: DateTime<Utc>) {
        self.set_expiration_unix(at.timestamp());
    }

    #[inline]
    pub fn set_expiration_unix(&self, secs: i64) {
        self.expiration.store(secs, AtomicOrdering::Release);
    }

    /// Last write time as an instant, if representable.
    pub fn last_write(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expiration_unix(), 0)
    }

    /// First instant at which the record is eligible for purging under
    /// `ttl`.
    pub fn expires_at(&self, ttl: TimeDelta) -> Option<DateTime<Utc>> {
        self.last_write()?.checked_add_signed(ttl)
    }

    /// Returns true if the record would be purged at `now` under `ttl`.
    pub fn is_expired_at(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        expiry_cutoff(now, ttl).map_or(false, |cutoff| self.expiration_unix() <= cutoff)
    }

    /// Takes over the payload of `other`. The key is left untouched.
    pub(crate) fn absorb(&self, other: &Record) {
        if std::ptr::eq(self, other) {
            return;
        }
        let payload = other.payload();
        *self.payload.write() = payload;
    }
}

/// Unix-second cutoff for `ttl` at `now`: records written at or before it
/// are expired. `None` when nothing can be expired, either because `ttl`
/// is not positive or because the cutoff falls outside the representable
/// range.
pub(crate) fn expiry_cutoff(now: DateTime<Utc>, ttl: TimeDelta) -> Option<i64> {
    if ttl <= TimeDelta::zero() {
        return None;
    }
    now.checked_sub_signed(ttl).map(|cutoff| cutoff.timestamp())
}

/// Produces a detached snapshot with the same key, payload and expiration.
impl Clone for Record {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            payload: RwLock::new(self.payload()),
            expiration: AtomicI64::new(self.expiration_unix()),
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("key", &self.key)
            .field("payload", &*self.payload.read())
            .field("expiration", &self.expiration_unix())
            .finish()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Record {}

impl PartialOrd for Record {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Record {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl std::hash::Hash for Record {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}
