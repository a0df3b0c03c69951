// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Append-only value arena with tombstoned slots.

use bytes::Bytes;

/// Handle to a value slot: the arena generation plus a dense position.
///
/// Positions are only meaningful within the generation that assigned them.
/// Compaction is the only operation that moves a value to a new handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SlotRef {
    pub generation: u64,
    pub pos: usize,
}

/// A growable sequence of value slots addressed by position.
///
/// Slots are never removed. Clearing one leaves `None` behind so that the
/// positions of every other slot stay valid.
#[derive(Debug)]
pub(crate) struct Arena {
    generation: u64,
    slots: Vec<Option<Bytes>>,
    tombstones: usize,
}

impl Arena {
    pub fn with_capacity(generation: u64, capacity: usize) -> Self {
        Self {
            generation,
            slots: Vec::with_capacity(capacity),
            tombstones: 0,
        }
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Appends `value` and returns its handle.
    pub fn push(&mut self, value: Bytes) -> SlotRef {
        let pos = self.slots.len();
        self.slots.push(Some(value));
        SlotRef {
            generation: self.generation,
            pos,
        }
    }

    #[inline]
    pub fn owns(&self, slot: SlotRef) -> bool {
        slot.generation == self.generation
    }

    #[inline]
    pub fn get(&self, pos: usize) -> Option<&Bytes> {
        self.slots.get(pos).and_then(Option::as_ref)
    }

    /// Clears a slot as the result of a delete. Returns true if the slot
    /// held a value.
    pub fn tombstone(&mut self, pos: usize) -> bool {
        match self.slots.get_mut(pos).and_then(Option::take) {
            Some(_) => {
                self.tombstones += 1;
                true
            }
            None => false,
        }
    }

    /// Moves a value out of its slot during compaction. Not counted as a
    /// tombstone: the value lives on in another arena.
    #[inline]
    pub fn take(&mut self, pos: usize) -> Option<Bytes> {
        self.slots.get_mut(pos).and_then(Option::take)
    }

    /// Total number of slots, live or cleared.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_assigns_dense_positions() {
        let mut arena = Arena::with_capacity(3, 0);
        let a = arena.push(Bytes::from("a"));
        let b = arena.push(Bytes::from("b"));
        assert_eq!(a, SlotRef { generation: 3, pos: 0 });
        assert_eq!(b, SlotRef { generation: 3, pos: 1 });
        assert_eq!(arena.len(), 2);
        assert!(arena.owns(a));
        assert!(!arena.owns(SlotRef { generation: 4, pos: 0 }));
    }

    #[test]
    fn test_tombstone_keeps_slot() {
        let mut arena = Arena::with_capacity(0, 4);
        arena.push(Bytes::from("a"));
        arena.push(Bytes::from("b"));

        assert!(arena.tombstone(0));
        assert!(!arena.tombstone(0));
        assert_eq!(arena.tombstones(), 1);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(0), None);
        assert_eq!(arena.get(1), Some(&Bytes::from("b")));
    }

    #[test]
    fn test_take_is_not_a_tombstone() {
        let mut arena = Arena::with_capacity(0, 1);
        arena.push(Bytes::from("a"));
        assert_eq!(arena.take(0), Some(Bytes::from("a")));
        assert_eq!(arena.take(0), None);
        assert_eq!(arena.tombstones(), 0);
    }

    #[test]
    fn test_out_of_range_positions() {
        let mut arena = Arena::with_capacity(0, 0);
        assert_eq!(arena.get(10), None);
        assert!(!arena.tombstone(10));
        assert_eq!(arena.take(10), None);
    }
}
