//! Entity Component System (ECS) core implementation
//!
//! This module provides the entity/component half of the crate:
//! - Entity handles and component masks
//! - Slab-backed component stores keyed by entity
//! - Tuple queries over component types
//! - The entity manager, the system registry and the world tying them together

mod component;
mod entity;
mod query;
mod system;
mod world;

pub use component::{Component, ComponentOf, ComponentSet, ComponentStore, STORE_SLAB_CAPACITY};
pub use entity::{ComponentMask, Entity};
pub(crate) use entity::EntityRecord;
pub use query::Query;
pub use system::{System, SystemId, SystemManager};
pub use world::{EntityManager, World, ENTITY_SLAB_CAPACITY};
