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
//! Entity handles and component masks
//!
//! Entities are plain integer handles. An entity id is the dense index of
//! the slot holding its record, so ids are reused once an entity is deleted.

use std::fmt;

/// Handle to an entity
///
/// Ids are not generational: a handle to a deleted entity may later refer
/// to a new entity that reused the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(u32);

impl Entity {
    /// Create an entity handle from a raw id
    pub fn new(id: u32) -> Self {
        Entity(id)
    }

    /// Get the raw id
    pub fn id(&self) -> u32 {
        self.0
    }

    /// Raw id as a table index
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Bitset recording which component kinds an entity carries
///
/// Bit `i` corresponds to the component with index `i` in the component
/// set. A component set holds at most 64 kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ComponentMask(u64);

impl ComponentMask {
    /// Create a mask with no bits set
    pub const fn empty() -> Self {
        ComponentMask(0)
    }

    /// Create a mask from raw bits
    pub const fn from_bits(bits: u64) -> Self {
        ComponentMask(bits)
    }

    /// Return a copy of this mask with bit `index` set
    pub const fn with(self, index: usize) -> Self {
        ComponentMask(self.0 | (1u64 << index))
    }

    /// Set bit `index`
    pub fn insert(&mut self, index: usize) {
        self.0 |= 1u64 << index;
    }

    /// Clear bit `index`
    pub fn remove(&mut self, index: usize) {
        self.0 &= !(1u64 << index);
    }

    /// Check whether bit `index` is set
    pub fn contains(&self, index: usize) -> bool {
        index < 64 && self.0 & (1u64 << index) != 0
    }

    /// Check whether every bit of `other` is also set here
    pub fn contains_all(&self, other: ComponentMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check whether no bit is set
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of bits set
    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    /// Raw bits
    pub fn bits(&self) -> u64 {
        self.0
    }
}

/// Per-entity bookkeeping stored in the entity slab
#[derive(Debug, Clone, Copy)]
pub(crate) struct EntityRecord {
    pub(crate) entity: Entity,
    pub(crate) mask: ComponentMask,
}

impl EntityRecord {
    pub(crate) fn vacant() -> Self {
        EntityRecord {
            entity: Entity::new(0),
            mask: ComponentMask::empty(),
        }
    }
}
