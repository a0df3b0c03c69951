// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Ordered index primitive shared by the stores.
//!
//! Both [`AppendLogStore`](crate::log::AppendLogStore) and
//! [`TtlIndex`](crate::ttl::TtlIndex) keep their keys in an ordered map from
//! byte-string keys to a per-store record. The map itself is not
//! thread-safe: every store wraps it in its own reader-writer lock and
//! serializes access externally.
//!
//! Keys are ordered lexicographically, byte by byte, exactly as `[u8]`
//! compares in Rust.
//!
//! # Example
//!
//! ```
//! use memindex::index::{BTreeIndex, IndexOptions, OrderedIndex};
//!
//! let mut index = BTreeIndex::new(&IndexOptions::default());
//! index.replace_or_insert("b".into(), 2);
//! index.replace_or_insert("a".into(), 1);
//!
//! let mut keys = Vec::new();
//! index.ascend(|key, _| {
//!     keys.push(key.clone());
//!     true
//! });
//! assert_eq!(keys, vec!["a", "b"]);
//! ```

mod btree;
mod error;

pub use btree::BTreeIndex;
pub use error::IndexError;

use bytes::Bytes;

/// Default branching factor of the index.
pub const DEFAULT_DEGREE: usize = 32;

/// Default number of nodes kept around for reuse.
pub const DEFAULT_FREE_LIST_CAPACITY: usize = 80_000;

/// Construction-time tuning knobs of the ordered index.
///
/// These affect performance only; no observable behavior of either store
/// depends on them. A value of zero selects the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOptions {
    /// Branching factor (B-tree degree). Must be zero or at least 2.
    pub degree: usize,
    /// Maximum number of nodes cached for reuse (a node count, not bytes).
    pub free_list_capacity: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            degree: DEFAULT_DEGREE,
            free_list_capacity: DEFAULT_FREE_LIST_CAPACITY,
        }
    }
}

impl IndexOptions {
    /// Sets the branching factor.
    pub fn with_degree(mut self, degree: usize) -> Self {
        self.degree = degree;
        self
    }

    /// Sets the free list capacity.
    pub fn with_free_list_capacity(mut self, capacity: usize) -> Self {
        self.free_list_capacity = capacity;
        self
    }

    /// Replaces zero values with the defaults.
    pub fn normalized(self) -> Self {
        Self {
            degree: if self.degree == 0 {
                DEFAULT_DEGREE
            } else {
                self.degree
            },
            free_list_capacity: if self.free_list_capacity == 0 {
                DEFAULT_FREE_LIST_CAPACITY
            } else {
                self.free_list_capacity
            },
        }
    }

    /// Checks that the options describe a usable tree.
    pub fn validate(&self) -> Result<(), IndexError> {
        if self.degree == 1 {
            return Err(IndexError::InvalidOptions(
                "degree must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

/// An ordered map from byte-string keys to values of type `V`.
///
/// Implementations provide no synchronization of their own.
pub trait OrderedIndex<V>: Send + Sync {
    /// Inserts `value` under `key`, returning the value it replaced, if any.
    fn replace_or_insert(&mut self, key: Bytes, value: V) -> Option<V>;

    /// Looks up the value stored under `key`.
    fn get(&self, key: &[u8]) -> Option<&V>;

    /// Looks up the value stored under `key` for in-place modification.
    fn get_mut(&mut self, key: &[u8]) -> Option<&mut V>;

    /// Removes `key`, returning the value it held.
    fn delete(&mut self, key: &[u8]) -> Option<V>;

    /// Visits entries in ascending key order until `visit` returns false.
    fn ascend<F>(&self, visit: F)
    where
        F: FnMut(&Bytes, &V) -> bool;

    /// Visits entries strictly greater than `pivot` in ascending key order
    /// until `visit` returns false.
    fn ascend_after<F>(&self, pivot: &[u8], visit: F)
    where
        F: FnMut(&Bytes, &V) -> bool;

    /// Number of entries.
    fn len(&self) -> usize;

    /// Returns true if the index holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry.
    fn clear(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = IndexOptions::default();
        assert_eq!(opts.degree, 32);
        assert_eq!(opts.free_list_capacity, 80_000);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_normalized_replaces_zeroes() {
        let opts = IndexOptions::default()
            .with_degree(0)
            .with_free_list_capacity(0)
            .normalized();
        assert_eq!(opts, IndexOptions::default());

        let custom = IndexOptions::default().with_degree(8).normalized();
        assert_eq!(custom.degree, 8);
    }

    #[test]
    fn test_degree_one_rejected() {
        let opts = IndexOptions::default().with_degree(1);
        assert!(matches!(opts.validate(), Err(IndexError::InvalidOptions(_))));
    }
}
