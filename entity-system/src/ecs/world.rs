//! World management
//!
//! [`EntityManager`] owns the entity records and the component stores.
//! [`World`] pairs it with the [`SystemManager`] so listeners can reach
//! entities, components and the dispatcher through one context.

use tracing::trace;

use crate::ecs::{
    ComponentMask, ComponentOf, ComponentSet, ComponentStore, Entity, EntityRecord, Query,
    SystemId, SystemManager, System,
};
use crate::error::Result;
use crate::event::{Dispatch, Dispatcher, Event, EventSet, QueueConfig};
use crate::slab::{GrowableSlab, SlotId, NO_SLOT};

/// Number of entity records held by each slab
pub const ENTITY_SLAB_CAPACITY: usize = 64;

type Records = GrowableSlab<EntityRecord, ENTITY_SLAB_CAPACITY>;

/// Entity records plus one component store per type of `C`
pub struct EntityManager<C: ComponentSet> {
    entities: Records,
    components: C,
}

impl<C: ComponentSet> EntityManager<C> {
    /// Create an empty entity manager
    pub fn new() -> Self {
        EntityManager {
            entities: Records::new(),
            components: C::default(),
        }
    }

    fn slot_of(entity: Entity) -> SlotId {
        Records::slot_at(entity.index())
    }

    /// Create a new entity with no components
    pub fn new_entity(&mut self) -> Entity {
        let (slot, record) = self.entities.acquire(EntityRecord::vacant());
        let entity = Entity::new(Records::index_of(slot) as u32);
        record.entity = entity;
        trace!(%entity, "entity created");
        entity
    }

    /// Destroy `entity` and every component attached to it
    ///
    /// Returns `false` if the entity is not alive.
    pub fn delete_entity(&mut self, entity: Entity) -> bool {
        let slot = Self::slot_of(entity);
        let mask = match self.entities.get(slot) {
            Some(record) => record.mask,
            None => return false,
        };

        self.components.release_all(entity, mask);
        self.entities.release(slot);
        trace!(%entity, components = mask.count(), "entity deleted");
        true
    }

    /// Check if `entity` is alive
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.has(Self::slot_of(entity))
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Component mask of `entity`, or `None` if it is not alive
    pub fn component_mask(&self, entity: Entity) -> Option<ComponentMask> {
        self.entities.get(Self::slot_of(entity)).map(|record| record.mask)
    }

    /// Check if `entity` carries a `T`
    pub fn has_component<T: ComponentOf<C>>(&self, entity: Entity) -> bool {
        self.component_mask(entity)
            .map_or(false, |mask| mask.contains(T::INDEX))
    }

    /// Get the `T` attached to `entity`
    pub fn get_component<T: ComponentOf<C>>(&self, entity: Entity) -> Option<&T> {
        if !self.has_component::<T>(entity) {
            return None;
        }
        T::store(&self.components).get(entity)
    }

    /// Get the `T` attached to `entity` mutably
    pub fn get_component_mut<T: ComponentOf<C>>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.has_component::<T>(entity) {
            return None;
        }
        T::store_mut(&mut self.components).get_mut(entity)
    }

    /// Attach `value` to `entity`
    ///
    /// Returns `None` if the entity is not alive or already carries a `T`;
    /// the existing value is left untouched.
    pub fn new_component<T: ComponentOf<C>>(&mut self, entity: Entity, value: T) -> Option<&mut T> {
        self.new_component_with(entity, || value)
    }

    /// Attach a `T` built by `init` to `entity`
    ///
    /// `init` only runs if the component is actually attached.
    pub fn new_component_with<T, F>(&mut self, entity: Entity, init: F) -> Option<&mut T>
    where
        T: ComponentOf<C>,
        F: FnOnce() -> T,
    {
        let record = self.entities.get_mut(Self::slot_of(entity))?;
        if record.mask.contains(T::INDEX) {
            return None;
        }
        record.mask.insert(T::INDEX);

        let value = T::store_mut(&mut self.components).acquire_with(entity, init);
        debug_assert!(value.is_some(), "store for {} out of sync with mask", entity);
        value
    }

    /// Destroy the `T` attached to `entity`
    pub fn delete_component<T: ComponentOf<C>>(&mut self, entity: Entity) -> bool {
        self.take_component::<T>(entity).is_some()
    }

    /// Detach and return the `T` attached to `entity`
    pub fn take_component<T: ComponentOf<C>>(&mut self, entity: Entity) -> Option<T> {
        let record = self.entities.get_mut(Self::slot_of(entity))?;
        if !record.mask.contains(T::INDEX) {
            return None;
        }
        record.mask.remove(T::INDEX);
        T::store_mut(&mut self.components).take(entity)
    }

    /// Read-only access to the store for `T`
    pub fn store<T: ComponentOf<C>>(&self) -> &ComponentStore<T> {
        T::store(&self.components)
    }

    /// Iterate over live entities in ascending id order
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter().map(|(_, record)| record.entity)
    }

    /// Iterate over live entities carrying every type in `Q`
    pub fn entities_with<Q: Query<C>>(&self) -> impl Iterator<Item = Entity> + '_ {
        let mask = Q::mask();
        self.entities
            .iter()
            .filter(move |(_, record)| record.mask.contains_all(mask))
            .map(|(_, record)| record.entity)
    }

    /// First matching entity stored after `after`, or from the start
    fn next_match(&self, after: Option<SlotId>, mask: ComponentMask) -> Option<(SlotId, Entity)> {
        let mut cursor = self
            .entities
            .next_slot(after.unwrap_or_else(|| SlotId::new(0, NO_SLOT)));
        while let Some(slot) = cursor {
            if let Some(record) = self.entities.get(slot) {
                if record.mask.contains_all(mask) {
                    return Some((slot, record.entity));
                }
            }
            cursor = self.entities.next_slot(slot);
        }
        None
    }

    /// Call `f` for every live entity carrying every type in `Q`
    ///
    /// `f` gets the manager back and may change it freely, including
    /// deleting the entity it was given. The walk is positional: entities
    /// created behind the current position are not visited.
    pub fn for_entities_with<Q, F>(&mut self, f: F)
    where
        Q: Query<C>,
        F: FnMut(&mut Self, Entity),
    {
        walk_matching(self, Q::mask(), |manager| manager, f);
    }

    /// Destroy every entity and component
    pub fn clear(&mut self) {
        self.components.clear();
        self.entities.clear();
    }
}

/// Positional walk over the entities of `manager(target)` whose mask covers
/// `mask`, handing `target` back to `f` for each one
fn walk_matching<T, C, F>(
    target: &mut T,
    mask: ComponentMask,
    manager: fn(&T) -> &EntityManager<C>,
    mut f: F,
) where
    C: ComponentSet,
    F: FnMut(&mut T, Entity),
{
    let mut position = None;
    while let Some((slot, entity)) = manager(target).next_match(position, mask) {
        f(target, entity);
        position = Some(slot);
    }
}

impl<C: ComponentSet> Default for EntityManager<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ComponentSet> std::fmt::Debug for EntityManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityManager")
            .field("entities", &self.entities.len())
            .field("components", &C::LEN)
            .finish()
    }
}

/// The main container: entities, components, systems and the dispatcher
///
/// A world is usually also the context its event set hands to listeners,
/// which lets systems read and write components while handling events.
pub struct World<C: ComponentSet, S: EventSet> {
    entities: EntityManager<C>,
    systems: SystemManager<S>,
}

impl<C: ComponentSet, S: EventSet> World<C, S> {
    /// Create an empty world
    pub fn new() -> Self {
        World {
            entities: EntityManager::new(),
            systems: SystemManager::new(),
        }
    }

    /// Create an empty world with a configured event queue
    pub fn with_config(config: QueueConfig) -> Result<Self> {
        Ok(World {
            entities: EntityManager::new(),
            systems: SystemManager::with_config(config)?,
        })
    }

    /// The entity manager
    pub fn entity_manager(&self) -> &EntityManager<C> {
        &self.entities
    }

    /// The entity manager, mutably
    pub fn entity_manager_mut(&mut self) -> &mut EntityManager<C> {
        &mut self.entities
    }

    /// The system manager
    pub fn system_manager(&self) -> &SystemManager<S> {
        &self.systems
    }

    /// The system manager, mutably
    pub fn system_manager_mut(&mut self) -> &mut SystemManager<S> {
        &mut self.systems
    }

    /// Create a new entity
    pub fn new_entity(&mut self) -> Entity {
        self.entities.new_entity()
    }

    /// Destroy an entity and its components
    pub fn delete_entity(&mut self, entity: Entity) -> bool {
        self.entities.delete_entity(entity)
    }

    /// Check if an entity is alive
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.entity_count()
    }

    /// Attach a component, see [`EntityManager::new_component`]
    pub fn new_component<T: ComponentOf<C>>(&mut self, entity: Entity, value: T) -> Option<&mut T> {
        self.entities.new_component(entity, value)
    }

    /// Attach a lazily built component
    pub fn new_component_with<T, F>(&mut self, entity: Entity, init: F) -> Option<&mut T>
    where
        T: ComponentOf<C>,
        F: FnOnce() -> T,
    {
        self.entities.new_component_with(entity, init)
    }

    /// Get a component
    pub fn get_component<T: ComponentOf<C>>(&self, entity: Entity) -> Option<&T> {
        self.entities.get_component(entity)
    }

    /// Get a component mutably
    pub fn get_component_mut<T: ComponentOf<C>>(&mut self, entity: Entity) -> Option<&mut T> {
        self.entities.get_component_mut(entity)
    }

    /// Destroy a component
    pub fn delete_component<T: ComponentOf<C>>(&mut self, entity: Entity) -> bool {
        self.entities.delete_component::<T>(entity)
    }

    /// Check if an entity carries a component
    pub fn has_component<T: ComponentOf<C>>(&self, entity: Entity) -> bool {
        self.entities.has_component::<T>(entity)
    }

    /// Iterate over live entities carrying every type in `Q`
    pub fn entities_with<Q: Query<C>>(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.entities_with::<Q>()
    }

    /// Call `f` with the whole world for every entity matching `Q`
    ///
    /// Same walk as [`EntityManager::for_entities_with`], but `f` can also
    /// push events and manage systems.
    pub fn for_entities_with<Q, F>(&mut self, f: F)
    where
        Q: Query<C>,
        F: FnMut(&mut Self, Entity),
    {
        walk_matching(self, Q::mask(), Self::entity_manager, f);
    }

    /// Queue an event
    pub fn push<E: Event<S>>(&mut self, event: E) {
        self.systems.dispatcher_mut().push(event);
    }

    /// Register a system
    pub fn add_system<T: System<S>>(&mut self, system: T) -> SystemId {
        self.systems.add_system(system)
    }

    /// Remove a system
    pub fn delete_system(&mut self, id: SystemId) -> Result<()> {
        self.systems.delete_system(id)
    }

    /// Destroy every entity and drop pending events
    ///
    /// Systems and listener registrations are kept.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.systems.dispatcher_mut().clear();
    }
}

impl<C, S> World<C, S>
where
    C: ComponentSet,
    S: EventSet<Context = Self>,
{
    /// Deliver every pending event, including those pushed while
    /// delivering
    ///
    /// Returns the number of events delivered.
    pub fn process(&mut self) -> usize {
        Dispatcher::<S>::drain(self, None)
    }
}

impl<C: ComponentSet, S: EventSet> Default for World<C, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ComponentSet, S: EventSet> Dispatch<S> for World<C, S> {
    fn dispatcher(&self) -> &Dispatcher<S> {
        self.systems.dispatcher()
    }

    fn dispatcher_mut(&mut self) -> &mut Dispatcher<S> {
        self.systems.dispatcher_mut()
    }
}

impl<C: ComponentSet, S: EventSet> std::fmt::Debug for World<C, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.entities)
            .field("systems", &self.systems)
            .finish()
    }
}
