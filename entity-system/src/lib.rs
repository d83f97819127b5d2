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
//! # Entity System
//!
//! Slab-backed entity-component storage with a typed, re-entrant event
//! dispatcher.
//!
//! ## Features
//!
//! - **Slab storage**: fixed-capacity pools with O(1) acquire and release,
//!   chained into an unbounded pool with stable slot ids
//! - **Closed component sets**: component types are declared once and
//!   resolved to dense indices at compile time
//! - **Mask queries**: iterate entities carrying a tuple of component types
//! - **Typed events**: per-type listener lists and a single FIFO queue that
//!   listeners can push into while it drains
//!
//! ## Example
//!
//! ```rust
//! use entity_system::{component_set, event_set, World};
//!
//! pub struct Position(pub i16, pub i16);
//! pub struct Velocity(pub i16, pub i16);
//! pub struct Tick;
//!
//! component_set! {
//!     pub struct Components {
//!         position: Position,
//!         velocity: Velocity,
//!     }
//! }
//!
//! event_set! {
//!     pub enum Events: EventListeners for World<Components, Events> {
//!         Tick(Tick),
//!     }
//! }
//!
//! let mut world = World::<Components, Events>::new();
//! let entity = world.new_entity();
//! world.new_component(entity, Position(0, 0));
//! world.new_component(entity, Velocity(5, 0));
//!
//! world.for_entities_with::<(Position, Velocity), _>(|world, entity| {
//!     let step = world.get_component::<Velocity>(entity).map(|v| (v.0, v.1));
//!     if let (Some((dx, dy)), Some(p)) = (step, world.get_component_mut::<Position>(entity)) {
//!         p.0 += dx;
//!         p.1 += dy;
//!     }
//! });
//! assert_eq!(world.get_component::<Position>(entity).map(|p| p.0), Some(5));
//! ```

#![warn(missing_docs)]

/// Entity Component System implementation
pub mod ecs;

/// Error types
pub mod error;

/// Typed event dispatch
pub mod event;

/// Fixed and growable slab storage
pub mod slab;

pub use ecs::{ComponentMask, ComponentStore, Entity, EntityManager, System, SystemId, SystemManager, World};
pub use error::{Error, Result};
pub use event::{Dispatch, Dispatcher, Event, EventSet, Listener};
