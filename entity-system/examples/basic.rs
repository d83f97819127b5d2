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
//! Basic example demonstrating the entity system
//!
//! This example shows how to declare components and events, spawn
//! entities, query them, and drive a system through the dispatcher.

use std::cell::RefCell;
use std::rc::Rc;

use entity_system::event::{Dispatch, Dispatcher, Listener};
use entity_system::{component_set, event_set, System, World};

#[derive(Debug, Clone, Copy)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug, Clone, Copy)]
struct Velocity {
    dx: f32,
    dy: f32,
}

component_set! {
    struct Components {
        position: Position,
        velocity: Velocity,
    }
}

/// Advance every moving entity by one step
struct Step;

event_set! {
    enum Events: EventListeners for World<Components, Events> {
        Step(Step),
    }
}

type BasicWorld = World<Components, Events>;

// Applies velocity to position on every step
struct MovementSystem {
    steps: u32,
}

impl Listener<Step, BasicWorld> for MovementSystem {
    fn handle(&mut self, _: &mut Step, world: &mut BasicWorld) {
        self.steps += 1;
        world.for_entities_with::<(Position, Velocity), _>(|world, entity| {
            let velocity = match world.get_component::<Velocity>(entity) {
                Some(velocity) => *velocity,
                None => return,
            };
            if let Some(position) = world.get_component_mut::<Position>(entity) {
                position.x += velocity.dx;
                position.y += velocity.dy;
                println!(
                    "  [MovementSystem] {} moved to Position({:.1}, {:.1})",
                    entity, position.x, position.y
                );
            }
        });
    }
}

impl System<Events> for MovementSystem {
    fn connect(this: &Rc<RefCell<Self>>, dispatcher: &mut Dispatcher<Events>) {
        dispatcher.connect::<Step, _>(this);
    }

    fn name(&self) -> &str {
        "MovementSystem"
    }
}

fn main() {
    println!("Entity System - Basic Example");
    println!("=============================\n");

    let mut world = BasicWorld::new();
    println!("Created new world");

    // Create some entities
    let entity1 = world.new_entity();
    let entity2 = world.new_entity();
    let entity3 = world.new_entity();

    println!("Created {} entities:", world.entity_count());
    println!("  - {}", entity1);
    println!("  - {}", entity2);
    println!("  - {}", entity3);

    // Add components to entities
    world.new_component(entity1, Position { x: 0.0, y: 0.0 });
    world.new_component(entity1, Velocity { dx: 1.0, dy: 0.0 });

    world.new_component(entity2, Position { x: 5.0, y: 5.0 });
    world.new_component(entity2, Velocity { dx: -1.0, dy: 1.0 });

    world.new_component(entity3, Position { x: -3.0, y: 2.0 });

    println!("\nComponent assignments:");
    println!("  Entity 1: Position + Velocity");
    println!("  Entity 2: Position + Velocity");
    println!("  Entity 3: Position only");

    println!("\nEntities with Position component:");
    for entity in world.entities_with::<(Position,)>() {
        if let Some(pos) = world.get_component::<Position>(entity) {
            println!("  {} -> Position({:.1}, {:.1})", entity, pos.x, pos.y);
        }
    }

    // Register the system and drive it with events
    let movement = Rc::new(RefCell::new(MovementSystem { steps: 0 }));
    let id = world
        .system_manager_mut()
        .add_shared_system(Rc::clone(&movement));
    println!("\nRegistered systems: {:?}", world.system_manager().system_names());

    world.push(Step);
    world.push(Step);
    println!("Queued {} events", world.dispatcher().pending());

    let delivered = world.process();
    println!(
        "Delivered {} events, MovementSystem ran {} times",
        delivered,
        movement.borrow().steps
    );

    // Clean up
    world.delete_entity(entity2);
    println!("\nDeleted {}", entity2);
    println!("Remaining entities: {}", world.entity_count());

    if let Err(err) = world.delete_system(id) {
        eprintln!("Failed to delete system: {}", err);
    }
    println!("Queue stats: {:?}", world.dispatcher().stats());

    println!("\nExample completed successfully!");
}
