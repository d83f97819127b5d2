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
//! Component storage and management
//!
//! Components are data containers attached to entities. Each component type
//! lives in its own [`ComponentStore`], a growable slab plus a sparse vector
//! mapping entity ids to slots. The set of component types a world knows
//! about is closed and declared once with [`component_set!`](crate::component_set).

use crate::ecs::{ComponentMask, Entity};
use crate::slab::{GrowableSlab, SlotId};

/// Number of components held by each slab of a [`ComponentStore`]
pub const STORE_SLAB_CAPACITY: usize = 16;

/// Trait that all components implement
///
/// Components are plain data. Any `'static` type qualifies.
pub trait Component: 'static {}

impl<T: 'static> Component for T {}

struct Stored<T> {
    owner: Entity,
    value: T,
}

/// Storage for every instance of one component type
pub struct ComponentStore<T: Component> {
    data: GrowableSlab<Stored<T>, STORE_SLAB_CAPACITY>,
    mapping: Vec<Option<SlotId>>,
}

impl<T: Component> ComponentStore<T> {
    /// Create a new empty store
    pub fn new() -> Self {
        ComponentStore {
            data: GrowableSlab::new(),
            mapping: Vec::new(),
        }
    }

    fn slot_of(&self, entity: Entity) -> Option<SlotId> {
        self.mapping.get(entity.index()).copied().flatten()
    }

    /// Attach `value` to `entity`
    ///
    /// Returns `None` and drops `value` if the entity already has one.
    pub fn acquire(&mut self, entity: Entity, value: T) -> Option<&mut T> {
        self.acquire_with(entity, || value)
    }

    /// Attach a value built by `init` to `entity`
    ///
    /// `init` only runs when the entity has no value yet.
    pub fn acquire_with<F>(&mut self, entity: Entity, init: F) -> Option<&mut T>
    where
        F: FnOnce() -> T,
    {
        let index = entity.index();
        if index >= self.mapping.len() {
            self.mapping.resize(index + 1, None);
        } else if self.mapping[index].is_some() {
            return None;
        }

        let (slot, stored) = self.data.acquire_with(|| Stored {
            owner: entity,
            value: init(),
        });
        self.mapping[index] = Some(slot);
        Some(&mut stored.value)
    }

    /// Destroy the value attached to `entity`
    pub fn release(&mut self, entity: Entity) -> bool {
        self.take(entity).is_some()
    }

    /// Detach and return the value attached to `entity`
    pub fn take(&mut self, entity: Entity) -> Option<T> {
        let slot = self.mapping.get_mut(entity.index())?.take()?;
        let stored = self.data.take(slot);
        debug_assert!(stored.is_some(), "mapping for {} points at a free slot", entity);
        stored.map(|stored| stored.value)
    }

    /// Get the value attached to `entity`
    pub fn get(&self, entity: Entity) -> Option<&T> {
        let slot = self.slot_of(entity)?;
        self.data.get(slot).map(|stored| &stored.value)
    }

    /// Get the value attached to `entity` mutably
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let slot = self.slot_of(entity)?;
        self.data.get_mut(slot).map(|stored| &mut stored.value)
    }

    /// Check if `entity` has a value in this store
    pub fn contains(&self, entity: Entity) -> bool {
        self.slot_of(entity).is_some()
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the store holds no values
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over `(owner, value)` pairs in storage order
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        self.data.iter().map(|(_, stored)| (stored.owner, &stored.value))
    }

    /// Iterate mutably over `(owner, value)` pairs in storage order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> + '_ {
        self.data
            .iter_mut()
            .map(|(_, stored)| (stored.owner, &mut stored.value))
    }

    /// Destroy every value
    pub fn clear(&mut self) {
        self.data.clear();
        for entry in self.mapping.iter_mut() {
            *entry = None;
        }
    }
}

impl<T: Component> Default for ComponentStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> std::fmt::Debug for ComponentStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentStore")
            .field("type", &std::any::type_name::<T>())
            .field("len", &self.len())
            .finish()
    }
}

/// A closed set of component stores, one per declared type
///
/// Implemented by [`component_set!`](crate::component_set); not meant to be
/// implemented by hand.
pub trait ComponentSet: Default + 'static {
    /// Number of component types in the set
    const LEN: usize;

    /// Destroy every component of `entity` whose bit is set in `mask`, in
    /// declaration order
    fn release_all(&mut self, entity: Entity, mask: ComponentMask);

    /// Destroy every component in every store
    fn clear(&mut self);
}

/// Links a component type to its store inside the set `S`
pub trait ComponentOf<S: ComponentSet>: Component + Sized {
    /// Dense index of this type in `S`; also its mask bit
    const INDEX: usize;

    /// Select this type's store
    fn store(set: &S) -> &ComponentStore<Self>;

    /// Select this type's store mutably
    fn store_mut(set: &mut S) -> &mut ComponentStore<Self>;

    /// Mask with only this type's bit set
    fn mask() -> ComponentMask {
        ComponentMask::empty().with(Self::INDEX)
    }
}

/// Declare a closed set of component types
///
/// Generates a struct with one public [`ComponentStore`] field per type, its
/// [`ComponentSet`] impl and one [`ComponentOf`] impl per type. Indices
/// follow declaration order. A set holds at most 64 types, and a type may
/// appear only once.
///
/// ```
/// use entity_system::component_set;
///
/// pub struct Position(pub i16, pub i16);
/// pub struct Velocity(pub i16, pub i16);
///
/// component_set! {
///     pub struct Motion {
///         position: Position,
///         velocity: Velocity,
///     }
/// }
///
/// use entity_system::ecs::{ComponentOf, ComponentSet};
/// assert_eq!(<Motion as ComponentSet>::LEN, 2);
/// assert_eq!(<Velocity as ComponentOf<Motion>>::INDEX, 1);
/// ```
#[macro_export]
macro_rules! component_set {
    (@count) => { 0usize };
    (@count $head:ident $($tail:ident)*) => {
        1usize + $crate::component_set!(@count $($tail)*)
    };

    (@member $set:ident; $index:expr;) => {};
    (@member $set:ident; $index:expr; $field:ident : $ty:ty, $($rest_field:ident : $rest_ty:ty,)*) => {
        impl $crate::ecs::ComponentOf<$set> for $ty {
            const INDEX: usize = $index;

            fn store(set: &$set) -> &$crate::ecs::ComponentStore<Self> {
                &set.$field
            }

            fn store_mut(set: &mut $set) -> &mut $crate::ecs::ComponentStore<Self> {
                &mut set.$field
            }
        }

        $crate::component_set!(@member $set; $index + 1usize; $($rest_field : $rest_ty,)*);
    };

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($field:ident : $ty:ty),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                #[allow(missing_docs)]
                pub $field: $crate::ecs::ComponentStore<$ty>,
            )+
        }

        impl ::core::default::Default for $name {
            fn default() -> Self {
                $name {
                    $($field: $crate::ecs::ComponentStore::new(),)+
                }
            }
        }

        impl $crate::ecs::ComponentSet for $name {
            const LEN: usize = $crate::component_set!(@count $($field)+);

            fn release_all(&mut self, entity: $crate::ecs::Entity, mask: $crate::ecs::ComponentMask) {
                $(
                    if mask.contains(<$ty as $crate::ecs::ComponentOf<Self>>::INDEX) {
                        self.$field.release(entity);
                    }
                )+
            }

            fn clear(&mut self) {
                $(self.$field.clear();)+
            }
        }

        const _: () = assert!(
            <$name as $crate::ecs::ComponentSet>::LEN <= 64,
            "a component set holds at most 64 types"
        );

        $crate::component_set!(@member $name; 0usize; $($field : $ty,)+);
    };
}
