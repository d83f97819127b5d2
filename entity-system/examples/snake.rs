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
//! Headless snake game
//!
//! A player moves across a 300x150 field leaving a trail. Turning is driven
//! by keyboard events, movement by a timer tick. Passing over a target
//! scores a point. The game stops when the player leaves the field, runs
//! into its own trail, or no target is left.
//!
//! Input comes from a fixed script instead of a real keyboard, and the view
//! is printed as text.

use std::cell::RefCell;
use std::rc::Rc;

use entity_system::event::{Dispatcher, Listener};
use entity_system::{component_set, event_set, Entity, System, World};

const WIDTH: i16 = 300;
const HEIGHT: i16 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Position {
    x: i16,
    y: i16,
}

impl Position {
    fn new(x: i16, y: i16) -> Self {
        Position { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Velocity {
    x: i16,
    y: i16,
}

impl Velocity {
    const STILL: Velocity = Velocity { x: 0, y: 0 };

    /// Headings in clockwise order
    const HEADINGS: [Velocity; 4] = [
        Velocity { x: 5, y: 0 },
        Velocity { x: 0, y: 5 },
        Velocity { x: -5, y: 0 },
        Velocity { x: 0, y: -5 },
    ];

    fn turned(self, turn: Turn) -> Velocity {
        let index = Self::HEADINGS.iter().position(|heading| *heading == self);
        let next = match (index, turn) {
            (Some(i), Turn::Right) => (i + 1) % 4,
            (Some(i), Turn::Left) => (i + 3) % 4,
            // Standing still: right starts eastward, left westward
            (None, Turn::Right) => 0,
            (None, Turn::Left) => 2,
        };
        Self::HEADINGS[next]
    }
}

#[derive(Debug, Default)]
struct Score(u16);

#[derive(Debug)]
struct Target;

#[derive(Debug, Default)]
struct PositionHistory(Vec<Position>);

component_set! {
    struct SnakeComponents {
        position: Position,
        velocity: Velocity,
        score: Score,
        target: Target,
        history: PositionHistory,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Turn {
    Left,
    Right,
}

struct Keyboard(Turn);
struct ApplyMove;
struct RefreshView;
struct StopGame;

event_set! {
    enum SnakeEvent: SnakeListeners for World<SnakeComponents, SnakeEvent> {
        Keyboard(Keyboard),
        ApplyMove(ApplyMove),
        RefreshView(RefreshView),
        StopGame(StopGame),
    }
}

type SnakeWorld = World<SnakeComponents, SnakeEvent>;

fn between(a: i16, value: i16, b: i16) -> bool {
    a.min(b) <= value && value <= a.max(b)
}

/// Turns the player on keyboard events and moves it on every tick
struct MoveSystem {
    visited: Vec<bool>,
}

impl MoveSystem {
    fn new() -> Self {
        MoveSystem {
            visited: vec![false; WIDTH as usize * HEIGHT as usize],
        }
    }

    fn cell(&mut self, p: Position) -> &mut bool {
        &mut self.visited[p.x as usize * HEIGHT as usize + p.y as usize]
    }

    /// Mark every cell from `from` (exclusive) to `to` (inclusive)
    ///
    /// Returns the first cell that was already marked.
    fn trace(&mut self, from: Position, to: Position) -> Option<Position> {
        *self.cell(from) = true;
        let (dx, dy) = ((to.x - from.x).signum(), (to.y - from.y).signum());
        let mut current = from;
        while current != to {
            current = Position::new(current.x + dx, current.y + dy);
            let cell = self.cell(current);
            if *cell {
                return Some(current);
            }
            *cell = true;
        }
        None
    }

    /// Score targets on the segment `from -> to`
    ///
    /// Returns `false` when no target remains afterwards.
    fn collect_targets(world: &mut SnakeWorld, player: Entity, from: Position, to: Position) -> bool {
        if !world.has_component::<Score>(player) {
            return true;
        }

        let mut remaining = 0;
        world.for_entities_with::<(Position, Target), _>(|world, target| {
            let hit = match world.get_component::<Position>(target) {
                Some(t) => {
                    (t.x == to.x && from.x == to.x && between(from.y, t.y, to.y))
                        || (t.y == to.y && from.y == to.y && between(from.x, t.x, to.x))
                }
                None => false,
            };
            if hit {
                if let Some(score) = world.get_component_mut::<Score>(player) {
                    score.0 += 1;
                    println!("point !! score is now {}", score.0);
                }
                world.delete_entity(target);
            } else {
                remaining += 1;
            }
        });
        remaining > 0
    }

    /// Move `player` one step; `false` means the game is over
    fn advance(&mut self, world: &mut SnakeWorld, player: Entity) -> bool {
        let (from, velocity) = match (
            world.get_component::<Position>(player),
            world.get_component::<Velocity>(player),
        ) {
            (Some(p), Some(v)) => (*p, *v),
            _ => return true,
        };
        if velocity == Velocity::STILL {
            return true;
        }

        let mut to = Position::new(from.x + velocity.x, from.y + velocity.y);
        let mut alive = Self::collect_targets(world, player, from, to);

        if to.x < 0 || to.y < 0 || to.x >= WIDTH || to.y >= HEIGHT {
            to = Position::new(to.x.clamp(0, WIDTH - 1), to.y.clamp(0, HEIGHT - 1));
            alive = false;
        }
        if let Some(hit) = self.trace(from, to) {
            to = hit;
            alive = false;
        }

        if let Some(position) = world.get_component_mut::<Position>(player) {
            *position = to;
        }
        if let Some(history) = world.get_component_mut::<PositionHistory>(player) {
            history.0.push(to);
        }
        alive
    }
}

impl Listener<Keyboard, SnakeWorld> for MoveSystem {
    fn handle(&mut self, event: &mut Keyboard, world: &mut SnakeWorld) {
        let turn = event.0;
        world.for_entities_with::<(Velocity,), _>(|world, player| {
            if let Some(velocity) = world.get_component_mut::<Velocity>(player) {
                *velocity = velocity.turned(turn);
            }
        });
    }
}

impl Listener<ApplyMove, SnakeWorld> for MoveSystem {
    fn handle(&mut self, _: &mut ApplyMove, world: &mut SnakeWorld) {
        let mut stop = false;
        world.for_entities_with::<(Position, Velocity, PositionHistory), _>(|world, player| {
            if !self.advance(world, player) {
                stop = true;
            }
        });
        if stop {
            world.push(StopGame);
        }
    }
}

impl System<SnakeEvent> for MoveSystem {
    fn connect(this: &Rc<RefCell<Self>>, dispatcher: &mut Dispatcher<SnakeEvent>) {
        dispatcher.connect::<Keyboard, _>(this);
        dispatcher.connect::<ApplyMove, _>(this);
    }
}

/// Prints the trail and the remaining targets
struct TextView;

impl Listener<RefreshView, SnakeWorld> for TextView {
    fn handle(&mut self, _: &mut RefreshView, world: &mut SnakeWorld) {
        for player in world.entities_with::<(PositionHistory,)>() {
            if let Some(history) = world.get_component::<PositionHistory>(player) {
                if let Some(head) = history.0.last() {
                    println!("{} at ({}, {}), trail of {}", player, head.x, head.y, history.0.len());
                }
            }
        }
        let targets: Vec<String> = world
            .entities_with::<(Position, Target)>()
            .filter_map(|t| world.get_component::<Position>(t))
            .map(|p| format!("({}, {})", p.x, p.y))
            .collect();
        println!("targets left: {}", targets.join(" "));
    }
}

impl System<SnakeEvent> for TextView {
    fn connect(this: &Rc<RefCell<Self>>, dispatcher: &mut Dispatcher<SnakeEvent>) {
        dispatcher.connect::<RefreshView, _>(this);
    }
}

/// Records the end of the game
#[derive(Default)]
struct Referee {
    final_score: Option<u16>,
}

impl Listener<StopGame, SnakeWorld> for Referee {
    fn handle(&mut self, _: &mut StopGame, world: &mut SnakeWorld) {
        if self.final_score.is_some() {
            return;
        }
        let score: u16 = world
            .entities_with::<(Score,)>()
            .filter_map(|player| world.get_component::<Score>(player))
            .map(|score| score.0)
            .sum();
        println!("stop with {}", score);
        self.final_score = Some(score);
    }
}

impl System<SnakeEvent> for Referee {
    fn connect(this: &Rc<RefCell<Self>>, dispatcher: &mut Dispatcher<SnakeEvent>) {
        dispatcher.connect::<StopGame, _>(this);
    }
}

/// Build the field: one player in the middle and four targets
fn build_world() -> (SnakeWorld, Entity) {
    let mut world = SnakeWorld::new();

    let player = world.new_entity();
    let start = Position::new(150, 75);
    world.new_component(player, start);
    world.new_component(player, Velocity::STILL);
    world.new_component(player, Score::default());
    world.new_component(player, PositionHistory(vec![start]));

    for i in 0..4 {
        let target = world.new_entity();
        world.new_component(target, Position::new(75 * (i + 1), 125));
        world.new_component(target, Target);
    }

    (world, player)
}

fn main() {
    let (mut world, player) = build_world();
    world.add_system(MoveSystem::new());
    world.add_system(TextView);
    let referee = Rc::new(RefCell::new(Referee::default()));
    world
        .system_manager_mut()
        .add_shared_system(Rc::clone(&referee));

    // Head south onto the middle target, then east along the target row
    let script = [(0, Turn::Right), (0, Turn::Right), (10, Turn::Left)];

    for tick in 0..200u32 {
        for (_, turn) in script.iter().filter(|(at, _)| *at == tick) {
            world.push(Keyboard(*turn));
        }
        world.push(ApplyMove);
        if tick % 10 == 0 {
            world.push(RefreshView);
        }
        world.process();

        if referee.borrow().final_score.is_some() {
            break;
        }
    }

    let history = world
        .get_component::<PositionHistory>(player)
        .map_or(0, |h| h.0.len());
    println!(
        "game over after {} moves, final score {:?}",
        history.saturating_sub(1),
        referee.borrow().final_score
    );
}
