//! Insertion-ordered entry storage that lives inline and spills to the heap.
//!
//! [`EntryStore`] holds a dictionary's entries in insertion order, unique by
//! [`KeyId`]. Up to [`INLINE_CAPACITY`] entries are kept in a `heapless::Vec` and found
//! by linear scan. Pushing one more spills every entry, in order, into an
//! `ordermap::OrderMap` keyed by id.
//!
//! Removal is order-preserving in both states: the inline side shifts the tail left,
//! and `OrderMap::remove` does the same on the heap side. A spilled store only returns
//! inline through [`EntryStore::clear`].

use std::iter::FusedIterator;

use fnv::FnvBuildHasher;
use heapless::Vec as HeaplessVec;
use ordermap::OrderMap;

use crate::key::{Key, KeyId};
use crate::value::Value;

/// Number of entries stored inline before the store spills to the heap.
pub const INLINE_CAPACITY: usize = 8;

type HeapMap = OrderMap<KeyId, Entry, FnvBuildHasher>;

/// A live dictionary entry.
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) key: Key,
    pub(crate) value: Value,
}

impl Entry {
    #[inline]
    pub(crate) fn id(&self) -> KeyId {
        self.key.id()
    }
}

/// Entry storage. Only one representation is active at a time.
#[derive(Debug, Clone)]
pub(crate) enum EntryStore {
    Stack(HeaplessVec<Entry, INLINE_CAPACITY>),
    Heap(HeapMap),
}

impl EntryStore {
    pub const MAX_STACK_SIZE: usize = 16 * 1024;

    pub fn new() -> Self {
        const {
            assert!(
                std::mem::size_of::<EntryStore>() <= EntryStore::MAX_STACK_SIZE,
                "EntryStore is too large! Reduce INLINE_CAPACITY."
            );
        }

        Self::Stack(HeaplessVec::new())
    }

    #[inline]
    pub fn is_on_stack(&self) -> bool {
        matches!(self, Self::Stack(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Stack(stack) => stack.len(),
            Self::Heap(heap) => heap.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: KeyId) -> Option<&Entry> {
        match self {
            Self::Stack(stack) => stack.iter().find(|entry| entry.id() == id),
            Self::Heap(heap) => heap.get(&id),
        }
    }

    pub fn get_mut(&mut self, id: KeyId) -> Option<&mut Entry> {
        match self {
            Self::Stack(stack) => stack.iter_mut().find(|entry| entry.id() == id),
            Self::Heap(heap) => heap.get_mut(&id),
        }
    }

    /// Appends an entry. The caller guarantees its id is not already present.
    pub fn push(&mut self, entry: Entry) {
        let spilled = match self {
            Self::Stack(stack) => match stack.push(entry) {
                Ok(()) => return,
                Err(entry) => {
                    let mut heap = spill_to_heap(core::mem::replace(stack, HeaplessVec::new()));
                    heap.insert(entry.id(), entry);
                    heap
                }
            },
            Self::Heap(heap) => {
                heap.insert(entry.id(), entry);
                return;
            }
        };
        *self = Self::Heap(spilled);
    }

    /// Removes the entry with `id`, shifting later entries one position earlier.
    pub fn remove(&mut self, id: KeyId) -> Option<Entry> {
        match self {
            Self::Stack(stack) => {
                let idx = stack.iter().position(|entry| entry.id() == id)?;
                Some(stack.remove(idx))
            }
            Self::Heap(heap) => heap.remove(&id),
        }
    }

    /// Removes the most recently pushed entry.
    pub fn pop(&mut self) -> Option<Entry> {
        match self {
            Self::Stack(stack) => stack.pop(),
            Self::Heap(heap) => heap.pop().map(|(_, entry)| entry),
        }
    }

    /// Drops every entry and returns to an empty inline store, releasing heap memory.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn iter(&self) -> Iter<'_> {
        match self {
            Self::Stack(stack) => Iter::Stack(stack.iter()),
            Self::Heap(heap) => Iter::Heap(heap.values()),
        }
    }
}

impl Default for EntryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[inline(never)]
fn spill_to_heap(stack: HeaplessVec<Entry, INLINE_CAPACITY>) -> HeapMap {
    tracing::trace!(entries = stack.len(), "spilling dictionary entries to the heap");
    let mut heap = HeapMap::with_capacity_and_hasher(stack.len() * 2, FnvBuildHasher::default());
    for entry in stack {
        heap.insert(entry.id(), entry);
    }
    heap
}

// --- Iterators ---

/// Borrowing iterator over entries in insertion order.
pub(crate) enum Iter<'a> {
    Stack(core::slice::Iter<'a, Entry>),
    Heap(ordermap::map::Values<'a, KeyId, Entry>),
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Entry;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Iter::Stack(i) => i.next(),
            Iter::Heap(i) => i.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Iter::Stack(i) => i.size_hint(),
            Iter::Heap(i) => i.size_hint(),
        }
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        match self {
            Iter::Stack(i) => i.next_back(),
            Iter::Heap(i) => i.next_back(),
        }
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}

impl IntoIterator for EntryStore {
    type Item = Entry;
    type IntoIter = IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        match self {
            EntryStore::Stack(stack) => IntoIter::Stack(stack.into_iter()),
            EntryStore::Heap(heap) => IntoIter::Heap(heap.into_values()),
        }
    }
}

/// Owning iterator over entries in insertion order.
pub(crate) enum IntoIter {
    Stack(heapless::vec::IntoIter<Entry, INLINE_CAPACITY, usize>),
    Heap(ordermap::map::IntoValues<KeyId, Entry>),
}

impl Iterator for IntoIter {
    type Item = Entry;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            IntoIter::Stack(i) => i.next(),
            IntoIter::Heap(i) => i.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            IntoIter::Stack(i) => i.size_hint(),
            IntoIter::Heap(i) => i.size_hint(),
        }
    }
}
