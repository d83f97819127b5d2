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
//! Entity manager and world behaviour through the public API

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;

use entity_system::event::{Dispatch, Dispatcher, Listener};
use entity_system::{component_set, event_set, Entity, EntityManager, Error, System, World};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Position {
    x: u16,
    y: u16,
}

#[derive(Debug, PartialEq)]
struct Life(u16);

/// Counts live instances so tests can observe destruction
struct Tracked(Rc<Cell<i32>>);

impl Tracked {
    fn new(live: &Rc<Cell<i32>>) -> Self {
        live.set(live.get() + 1);
        Tracked(Rc::clone(live))
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

component_set! {
    struct Components {
        position: Position,
        life: Life,
        tracked: Tracked,
    }
}

struct Spawn;
struct Heal(u16);

event_set! {
    enum Events: EventListeners for World<Components, Events> {
        Spawn(Spawn),
        Heal(Heal),
    }
}

type TestWorld = World<Components, Events>;

#[test]
fn test_components_attach_and_detach() {
    let mut world = TestWorld::new();
    let entity = world.new_entity();

    assert!(world.get_component::<Position>(entity).is_none());
    assert!(world.get_component::<Life>(entity).is_none());

    let p = world.new_component(entity, Position { x: 5, y: 8 }).copied();
    assert_eq!(p, Some(Position { x: 5, y: 8 }));
    assert_eq!(world.new_component(entity, Life(15)).map(|l| l.0), Some(15));

    assert_eq!(world.get_component::<Position>(entity), Some(&Position { x: 5, y: 8 }));
    assert_eq!(world.get_component::<Life>(entity), Some(&Life(15)));

    assert!(world.delete_component::<Life>(entity));
    assert!(world.get_component::<Life>(entity).is_none());
    assert!(world.has_component::<Position>(entity));
}

#[test]
fn test_queries_follow_deletions() {
    let mut em = EntityManager::<Components>::new();
    let e1 = em.new_entity();
    let e2 = em.new_entity();

    em.new_component(e1, Position { x: 5, y: 8 });
    em.new_component(e1, Life(15));
    em.new_component(e2, Position { x: 5, y: 8 });

    let collect = |em: &mut EntityManager<Components>, with_life: bool| {
        let mut seen = BTreeSet::new();
        if with_life {
            em.for_entities_with::<(Life,), _>(|_, e| {
                seen.insert(e);
            });
        } else {
            em.for_entities_with::<(Position,), _>(|_, e| {
                seen.insert(e);
            });
        }
        seen
    };

    assert_eq!(collect(&mut em, false), BTreeSet::from([e1, e2]));
    assert_eq!(collect(&mut em, true), BTreeSet::from([e1]));

    em.delete_entity(e2);
    assert_eq!(collect(&mut em, false), BTreeSet::from([e1]));
    assert_eq!(collect(&mut em, true), BTreeSet::from([e1]));

    em.delete_entity(e1);
    assert!(collect(&mut em, false).is_empty());
    assert!(collect(&mut em, true).is_empty());
}

#[test]
fn test_delete_entity_destroys_components() {
    let live = Rc::new(Cell::new(0));
    let mut world = TestWorld::new();

    let entities: Vec<Entity> = (0..10).map(|_| world.new_entity()).collect();
    for entity in &entities {
        world.new_component(*entity, Tracked::new(&live));
        world.new_component(*entity, Life(1));
    }
    assert_eq!(live.get(), 10);

    for entity in entities.iter().step_by(2) {
        assert!(world.delete_entity(*entity));
    }
    assert_eq!(live.get(), 5);
    assert_eq!(world.entities_with::<(Tracked, Life)>().count(), 5);

    // A second attach is refused and the rejected value is dropped at once
    let survivor = entities[1];
    assert!(world.new_component(survivor, Tracked::new(&live)).is_none());
    assert_eq!(live.get(), 5);

    drop(world);
    assert_eq!(live.get(), 0);
}

#[test]
fn test_query_matches_model_under_churn() {
    let mut em = EntityManager::<Components>::new();
    let mut model: Vec<(Entity, bool, bool)> = Vec::new();

    let mut state: u32 = 12345;
    let mut roll = |n: u32| {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        (state >> 16) % n
    };

    for _ in 0..3000 {
        match roll(6) {
            0 | 1 => {
                model.push((em.new_entity(), false, false));
            }
            2 if !model.is_empty() => {
                let i = roll(model.len() as u32) as usize;
                let (entity, _, has_life) = &mut model[i];
                if em.new_component(*entity, Life(0)).is_some() {
                    assert!(!*has_life);
                    *has_life = true;
                }
            }
            3 if !model.is_empty() => {
                let i = roll(model.len() as u32) as usize;
                let (entity, has_position, _) = &mut model[i];
                if em.new_component(*entity, Position { x: 0, y: 0 }).is_some() {
                    *has_position = true;
                }
            }
            4 if !model.is_empty() => {
                let i = roll(model.len() as u32) as usize;
                let (entity, has_position, _) = &mut model[i];
                assert_eq!(em.delete_component::<Position>(*entity), *has_position);
                *has_position = false;
            }
            5 if !model.is_empty() => {
                let i = roll(model.len() as u32) as usize;
                let (entity, _, _) = model.swap_remove(i);
                assert!(em.delete_entity(entity));
            }
            _ => {}
        }

        let mut expected: Vec<Entity> = model
            .iter()
            .filter(|(_, p, l)| *p && *l)
            .map(|(e, _, _)| *e)
            .collect();
        expected.sort();
        let mut visited = Vec::new();
        em.for_entities_with::<(Position, Life), _>(|_, e| visited.push(e));
        assert_eq!(visited, expected);
    }

    assert_eq!(em.entity_count(), model.len());
}

#[test]
fn test_for_entities_with_sees_whole_world() {
    let mut world = TestWorld::new();
    for i in 0..4 {
        let entity = world.new_entity();
        world.new_component(entity, Life(i));
    }

    world.for_entities_with::<(Life,), _>(|world, entity| {
        let amount = world.get_component::<Life>(entity).map_or(0, |l| l.0);
        world.push(Heal(amount));
    });
    assert_eq!(world.dispatcher().pending(), 4);
}

/// Spawns an entity per `Spawn` and heals every living entity per `Heal`
#[derive(Default)]
struct Medic {
    spawned: Vec<Entity>,
}

impl Listener<Spawn, TestWorld> for Medic {
    fn handle(&mut self, _: &mut Spawn, world: &mut TestWorld) {
        let entity = world.new_entity();
        world.new_component(entity, Life(1));
        self.spawned.push(entity);
        world.push(Heal(2));
    }
}

impl Listener<Heal, TestWorld> for Medic {
    fn handle(&mut self, event: &mut Heal, world: &mut TestWorld) {
        let amount = event.0;
        world.for_entities_with::<(Life,), _>(|world, entity| {
            if let Some(life) = world.get_component_mut::<Life>(entity) {
                life.0 += amount;
            }
        });
    }
}

impl System<Events> for Medic {
    fn connect(this: &Rc<RefCell<Self>>, dispatcher: &mut Dispatcher<Events>) {
        dispatcher.connect::<Spawn, _>(this);
        dispatcher.connect::<Heal, _>(this);
    }
}

#[test]
fn test_systems_drive_the_world() {
    let mut world = TestWorld::new();
    let medic = Rc::new(RefCell::new(Medic::default()));
    let id = world
        .system_manager_mut()
        .add_shared_system(Rc::clone(&medic));

    world.push(Spawn);
    world.push(Spawn);
    // Two spawns, each followed by a heal pushed from inside the handler
    assert_eq!(world.process(), 4);

    let spawned = medic.borrow().spawned.clone();
    assert_eq!(spawned.len(), 2);
    // Both heals are queued behind both spawns, so each entity gets both
    assert_eq!(world.get_component::<Life>(spawned[0]), Some(&Life(5)));
    assert_eq!(world.get_component::<Life>(spawned[1]), Some(&Life(5)));

    assert_eq!(world.delete_system(id), Ok(()));
    assert_eq!(world.delete_system(id), Err(Error::UnknownSystem(id)));
}

#[test]
fn test_owned_system_stops_after_deletion() {
    let mut world = TestWorld::new();
    let id = world.add_system(Medic::default());

    world.push(Spawn);
    world.process();
    assert_eq!(world.entity_count(), 1);

    world.delete_system(id).unwrap();
    assert_eq!(world.dispatcher().listener_count::<Spawn>(), 0);

    world.push(Spawn);
    assert_eq!(world.process(), 1);
    assert_eq!(world.entity_count(), 1);
}

#[test]
fn test_clear_resets_world() {
    let live = Rc::new(Cell::new(0));
    let mut world = TestWorld::new();
    for _ in 0..3 {
        let entity = world.new_entity();
        world.new_component(entity, Tracked::new(&live));
    }
    world.push(Spawn);

    world.clear();
    assert_eq!(live.get(), 0);
    assert_eq!(world.entity_count(), 0);
    assert_eq!(world.dispatcher().pending(), 0);
}
