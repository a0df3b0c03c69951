// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! B-tree backed ordered index.

use std::collections::BTreeMap;
use std::ops::Bound;

use bytes::Bytes;

use super::{IndexOptions, OrderedIndex};

/// Ordered index backed by the standard library B-tree.
///
/// The standard B-tree uses a fixed node size, so the degree and free list
/// capacity in [`IndexOptions`] are recorded but do not change the layout.
#[derive(Debug)]
pub struct BTreeIndex<V> {
    map: BTreeMap<Bytes, V>,
    options: IndexOptions,
}

impl<V> BTreeIndex<V> {
    /// Creates an empty index.
    pub fn new(options: &IndexOptions) -> Self {
        Self {
            map: BTreeMap::new(),
            options: options.normalized(),
        }
    }

    /// Returns the (normalized) options this index was built with.
    pub fn options(&self) -> &IndexOptions {
        &self.options
    }
}

impl<V> Default for BTreeIndex<V> {
    fn default() -> Self {
        Self::new(&IndexOptions::default())
    }
}

impl<V: Send + Sync> OrderedIndex<V> for BTreeIndex<V> {
    #[inline]
    fn replace_or_insert(&mut self, key: Bytes, value: V) -> Option<V> {
        self.map.insert(key, value)
    }

    #[inline]
    fn get(&self, key: &[u8]) -> Option<&V> {
        self.map.get(key)
    }

    #[inline]
    fn get_mut(&mut self, key: &[u8]) -> Option<&mut V> {
        self.map.get_mut(key)
    }

    #[inline]
    fn delete(&mut self, key: &[u8]) -> Option<V> {
        self.map.remove(key)
    }

    fn ascend<F>(&self, mut visit: F)
    where
        F: FnMut(&Bytes, &V) -> bool,
    {
        for (key, value) in &self.map {
            if !visit(key, value) {
                break;
            }
        }
    }

    fn ascend_after<F>(&self, pivot: &[u8], mut visit: F)
    where
        F: FnMut(&Bytes, &V) -> bool,
    {
        let range = self
            .map
            .range::<[u8], _>((Bound::Excluded(pivot), Bound::Unbounded));
        for (key, value) in range {
            if !visit(key, value) {
                break;
            }
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.map.len()
    }

    fn clear(&mut self) {
        self.map.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_keys(index: &BTreeIndex<u32>) -> Vec<Bytes> {
        let mut keys = Vec::new();
        index.ascend(|k, _| {
            keys.push(k.clone());
            true
        });
        keys
    }

    #[test]
    fn test_replace_or_insert_returns_previous() {
        let mut index = BTreeIndex::default();
        assert_eq!(index.replace_or_insert(Bytes::from("k"), 1), None);
        assert_eq!(index.replace_or_insert(Bytes::from("k"), 2), Some(1));
        assert_eq!(index.get(b"k"), Some(&2));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_delete() {
        let mut index = BTreeIndex::default();
        index.replace_or_insert(Bytes::from("k"), 7);
        assert_eq!(index.delete(b"k"), Some(7));
        assert_eq!(index.delete(b"k"), None);
        assert!(index.is_empty());
    }

    #[test]
    fn test_get_mut() {
        let mut index = BTreeIndex::default();
        index.replace_or_insert(Bytes::from("k"), 1);
        if let Some(v) = index.get_mut(b"k") {
            *v = 10;
        }
        assert_eq!(index.get(b"k"), Some(&10));
    }

    #[test]
    fn test_ascend_is_lexicographic() {
        let mut index = BTreeIndex::default();
        for (i, k) in ["c", "a", "ab", "b", "\u{0}"].iter().enumerate() {
            index.replace_or_insert(Bytes::copy_from_slice(k.as_bytes()), i as u32);
        }
        let keys = collect_keys(&index);
        assert_eq!(keys, vec!["\u{0}", "a", "ab", "b", "c"]);
    }

    #[test]
    fn test_ascend_stops_early() {
        let mut index = BTreeIndex::default();
        for k in ["a", "b", "c", "d"] {
            index.replace_or_insert(Bytes::from(k), 0);
        }
        let mut seen = 0;
        index.ascend(|_, _| {
            seen += 1;
            seen < 2
        });
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_ascend_after_excludes_pivot() {
        let mut index = BTreeIndex::default();
        for k in ["a", "b", "c", "d"] {
            index.replace_or_insert(Bytes::from(k), 0);
        }
        let mut keys = Vec::new();
        index.ascend_after(b"b", |k, _| {
            keys.push(k.clone());
            true
        });
        assert_eq!(keys, vec!["c", "d"]);

        // A pivot that is not itself present still resumes after it.
        keys.clear();
        index.ascend_after(b"bb", |k, _| {
            keys.push(k.clone());
            true
        });
        assert_eq!(keys, vec!["c", "d"]);
    }

    #[test]
    fn test_clear() {
        let mut index = BTreeIndex::default();
        index.replace_or_insert(Bytes::from("x"), 1);
        index.clear();
        assert_eq!(index.len(), 0);
        assert_eq!(index.get(b"x"), None);
    }

    #[test]
    fn test_options_are_normalized() {
        let index: BTreeIndex<u32> = BTreeIndex::new(&IndexOptions::default().with_degree(0));
        assert_eq!(index.options().degree, crate::index::DEFAULT_DEGREE);
    }
}
