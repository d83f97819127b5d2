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
//! Fixed-capacity slab
//!
//! A `Slab` holds up to `N` values of one type in place. Free slots are
//! tracked by a single bitmask, so acquire and release are O(1) and the
//! lowest free slot is always picked first.

use std::fmt;

/// Position of a value inside a [`Slab`]
///
/// Positions are 1-based; [`NO_SLOT`] means "no slot".
pub type SlotIndex = u8;

/// The invalid slot position
pub const NO_SLOT: SlotIndex = 0;

/// Fixed-capacity pool of `N` values of type `T`
///
/// `N` must be one of 8, 16, 32 or 64. Any other capacity fails to compile
/// as soon as the slab is constructed.
///
/// # Examples
///
/// ```
/// use entity_system::slab::Slab;
///
/// let mut slab = Slab::<u32, 8>::new();
/// let (slot, value) = slab.acquire(7).unwrap();
/// assert_eq!(slot, 1);
/// assert_eq!(*value, 7);
/// assert!(slab.release(slot));
/// assert!(!slab.release(slot));
/// ```
pub struct Slab<T, const N: usize> {
    /// Bit `i` set means slot `i + 1` is free
    free: u64,
    slots: [Option<T>; N],
}

impl<T, const N: usize> Slab<T, N> {
    const VALID_CAPACITY: () = assert!(
        N == 8 || N == 16 || N == 32 || N == 64,
        "slab capacity must be one of 8, 16, 32 or 64"
    );

    const ALL_FREE: u64 = u64::MAX >> (64 - N);

    /// Number of slots in the slab
    pub const CAPACITY: usize = N;

    /// Past-the-end position returned by [`Slab::next`]
    pub const END: SlotIndex = N as SlotIndex + 1;

    /// Create an empty slab
    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID_CAPACITY;

        Slab {
            free: Self::ALL_FREE,
            slots: std::array::from_fn(|_| None),
        }
    }

    #[inline]
    fn mask(pos: SlotIndex) -> u64 {
        1u64 << (pos - 1)
    }

    /// Construct a value in the lowest free slot
    ///
    /// Returns `None` without calling `init` when the slab is full.
    pub fn acquire_with<F>(&mut self, init: F) -> Option<(SlotIndex, &mut T)>
    where
        F: FnOnce() -> T,
    {
        if self.free == 0 {
            return None;
        }

        let pos = self.free.trailing_zeros() as SlotIndex + 1;
        self.free &= !Self::mask(pos);

        let slot = &mut self.slots[usize::from(pos - 1)];
        debug_assert!(slot.is_none(), "free bit set on an occupied slot {}", pos);
        Some((pos, slot.insert(init())))
    }

    /// Move `value` into the lowest free slot
    ///
    /// When the slab is full the value is handed back untouched.
    pub fn acquire(&mut self, value: T) -> Result<(SlotIndex, &mut T), T> {
        if self.is_full() {
            return Err(value);
        }
        match self.acquire_with(|| value) {
            Some(acquired) => Ok(acquired),
            None => unreachable!("slab reported a free slot"),
        }
    }

    /// Destroy the value at `id` and free its slot
    ///
    /// Returns `false` if `id` is out of range or already free.
    pub fn release(&mut self, id: SlotIndex) -> bool {
        self.take(id).is_some()
    }

    /// Move the value at `id` out of the slab and free its slot
    pub fn take(&mut self, id: SlotIndex) -> Option<T> {
        if !self.has(id) {
            return None;
        }
        self.free |= Self::mask(id);
        self.slots[usize::from(id - 1)].take()
    }

    /// Check that `id` is in `[1, N]` and currently occupied
    #[inline]
    pub fn has(&self, id: SlotIndex) -> bool {
        id > NO_SLOT && usize::from(id) <= N && self.free & Self::mask(id) == 0
    }

    /// Get a reference to the value at `id`
    pub fn get(&self, id: SlotIndex) -> Option<&T> {
        if self.has(id) {
            self.slots[usize::from(id - 1)].as_ref()
        } else {
            None
        }
    }

    /// Get a mutable reference to the value at `id`
    pub fn get_mut(&mut self, id: SlotIndex) -> Option<&mut T> {
        if self.has(id) {
            self.slots[usize::from(id - 1)].as_mut()
        } else {
            None
        }
    }

    /// Next occupied position after `pos`, or [`Slab::END`]
    pub fn next(&self, pos: SlotIndex) -> SlotIndex {
        if pos >= Self::END {
            return pos;
        }
        let occupied = !self.free & Self::ALL_FREE;
        match occupied.checked_shr(u32::from(pos)) {
            Some(rest) if rest != 0 => pos + rest.trailing_zeros() as SlotIndex + 1,
            _ => Self::END,
        }
    }

    /// First occupied position, or [`Slab::END`] when empty
    pub fn first(&self) -> SlotIndex {
        self.next(NO_SLOT)
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        N - self.free.count_ones() as usize
    }

    /// Check if no slot is occupied
    pub fn is_empty(&self) -> bool {
        self.free == Self::ALL_FREE
    }

    /// Check if every slot is occupied
    pub fn is_full(&self) -> bool {
        self.free == 0
    }

    /// Destroy every value, in ascending slot order
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.free = Self::ALL_FREE;
    }

    /// Iterate over occupied slots in ascending order
    pub fn iter(&self) -> SlabIter<'_, T, N> {
        SlabIter {
            slab: self,
            pos: self.first(),
        }
    }

    /// Iterate mutably over occupied slots in ascending order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SlotIndex, &mut T)> + '_ {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_mut().map(|value| (index as SlotIndex + 1, value)))
    }
}

impl<T, const N: usize> Default for Slab<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> fmt::Debug for Slab<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slab")
            .field("capacity", &N)
            .field("len", &self.len())
            .field("free", &format_args!("{:#b}", self.free))
            .finish()
    }
}

/// Iterator over the occupied slots of a [`Slab`]
pub struct SlabIter<'a, T, const N: usize> {
    slab: &'a Slab<T, N>,
    pos: SlotIndex,
}

impl<'a, T, const N: usize> Iterator for SlabIter<'a, T, N> {
    type Item = (SlotIndex, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let pos = self.pos;
        let value = self.slab.get(pos)?;
        self.pos = self.slab.next(pos);
        Some((pos, value))
    }
}
