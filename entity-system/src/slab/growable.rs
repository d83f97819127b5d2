// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Unbounded slab built from a chain of fixed slabs

use std::fmt;

use super::fixed::{Slab, SlotIndex, NO_SLOT};

/// Address of a value inside a [`GrowableSlab`]
///
/// Ordering follows storage order: slab first, then slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId {
    slab: u32,
    slot: SlotIndex,
}

impl SlotId {
    /// Create a slot id from a slab index and a 1-based slot position
    pub fn new(slab: u32, slot: SlotIndex) -> Self {
        SlotId { slab, slot }
    }

    /// Index of the fixed slab holding the value
    pub fn slab(&self) -> u32 {
        self.slab
    }

    /// 1-based position inside the fixed slab
    pub fn slot(&self) -> SlotIndex {
        self.slot
    }
}

/// Unbounded pool that appends a new `Slab<T, N>` whenever every existing
/// one is full
///
/// Slabs are boxed so that growing the chain never moves stored values.
/// Slabs are never removed until [`GrowableSlab::clear`].
pub struct GrowableSlab<T, const N: usize> {
    slabs: Vec<Box<Slab<T, N>>>,
}

impl<T, const N: usize> GrowableSlab<T, N> {
    /// Create an empty pool with no slabs allocated
    pub fn new() -> Self {
        GrowableSlab { slabs: Vec::new() }
    }

    /// Create a pool with room reserved for `count` slabs
    pub fn with_slabs(count: usize) -> Self {
        GrowableSlab {
            slabs: Vec::with_capacity(count),
        }
    }

    /// Construct a value in the first slab with a free slot, appending a
    /// new slab if all are full
    pub fn acquire_with<F>(&mut self, init: F) -> (SlotId, &mut T)
    where
        F: FnOnce() -> T,
    {
        let index = match self.slabs.iter().position(|slab| !slab.is_full()) {
            Some(index) => index,
            None => {
                self.slabs.push(Box::new(Slab::new()));
                tracing::trace!(
                    slabs = self.slabs.len(),
                    capacity = self.slabs.len() * N,
                    "slab chain grew"
                );
                self.slabs.len() - 1
            }
        };

        match self.slabs[index].acquire_with(init) {
            Some((slot, value)) => (SlotId::new(index as u32, slot), value),
            None => unreachable!("slab {} was checked for a free slot", index),
        }
    }

    /// Move `value` into the pool
    pub fn acquire(&mut self, value: T) -> (SlotId, &mut T) {
        self.acquire_with(|| value)
    }

    /// Destroy the value at `id`
    ///
    /// Returns `false` if `id` does not address a live value. An id whose
    /// slab was never allocated is a caller bug.
    pub fn release(&mut self, id: SlotId) -> bool {
        debug_assert!(
            (id.slab as usize) < self.slabs.len(),
            "slot id {:?} is past the last slab ({})",
            id,
            self.slabs.len()
        );
        self.take(id).is_some()
    }

    /// Move the value at `id` out of the pool
    pub fn take(&mut self, id: SlotId) -> Option<T> {
        self.slabs.get_mut(id.slab as usize)?.take(id.slot)
    }

    /// Check whether `id` addresses a live value
    pub fn has(&self, id: SlotId) -> bool {
        self.slabs
            .get(id.slab as usize)
            .map_or(false, |slab| slab.has(id.slot))
    }

    /// Get a reference to the value at `id`
    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.slabs.get(id.slab as usize)?.get(id.slot)
    }

    /// Get a mutable reference to the value at `id`
    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.slabs.get_mut(id.slab as usize)?.get_mut(id.slot)
    }

    /// Position of the first live value, or [`GrowableSlab::end_pos`]
    pub fn first(&self) -> SlotId {
        self.next(SlotId::new(0, NO_SLOT))
    }

    /// Past-the-end position: the last slab paired with `N + 1`
    pub fn end_pos(&self) -> SlotId {
        let last = self.slabs.len().max(1) - 1;
        SlotId::new(last as u32, Slab::<T, N>::END)
    }

    /// Next live position after `pos` in storage order, or
    /// [`GrowableSlab::end_pos`]
    pub fn next(&self, pos: SlotId) -> SlotId {
        self.next_slot(pos).unwrap_or_else(|| self.end_pos())
    }

    /// Next live position after `pos`, or `None` at the end
    pub fn next_slot(&self, pos: SlotId) -> Option<SlotId> {
        let mut slab = pos.slab as usize;
        let mut slot = pos.slot;

        while let Some(current) = self.slabs.get(slab) {
            let next = current.next(slot);
            if next != Slab::<T, N>::END {
                return Some(SlotId::new(slab as u32, next));
            }
            slab += 1;
            slot = NO_SLOT;
        }
        None
    }

    /// Iterate over live values in storage order
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &T)> + '_ {
        self.slabs.iter().enumerate().flat_map(|(index, slab)| {
            slab.iter()
                .map(move |(slot, value)| (SlotId::new(index as u32, slot), value))
        })
    }

    /// Iterate mutably over live values in storage order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SlotId, &mut T)> + '_ {
        self.slabs.iter_mut().enumerate().flat_map(|(index, slab)| {
            slab.iter_mut()
                .map(move |(slot, value)| (SlotId::new(index as u32, slot), value))
        })
    }

    /// Number of live values
    pub fn len(&self) -> usize {
        self.slabs.iter().map(|slab| slab.len()).sum()
    }

    /// Check if no value is live
    pub fn is_empty(&self) -> bool {
        self.slabs.iter().all(|slab| slab.is_empty())
    }

    /// Number of fixed slabs allocated so far
    pub fn slab_count(&self) -> usize {
        self.slabs.len()
    }

    /// Total number of slots across all slabs
    pub fn capacity(&self) -> usize {
        self.slabs.len() * N
    }

    /// Destroy every value and release all slabs
    pub fn clear(&mut self) {
        self.slabs.clear();
    }

    /// Dense zero-based index of a slot id
    pub fn index_of(id: SlotId) -> usize {
        id.slab as usize * N + usize::from(id.slot) - 1
    }

    /// Inverse of [`GrowableSlab::index_of`]
    pub fn slot_at(index: usize) -> SlotId {
        SlotId::new((index / N) as u32, (index % N) as SlotIndex + 1)
    }
}

impl<T, const N: usize> Default for GrowableSlab<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> fmt::Debug for GrowableSlab<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrowableSlab")
            .field("slabs", &self.slabs.len())
            .field("len", &self.len())
            .finish()
    }
}
