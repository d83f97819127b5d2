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
//! System registry
//!
//! Systems hold application logic and run as event listeners. The system
//! manager owns them and the dispatcher they are connected to. Dispatcher
//! registrations are weak, so dropping the last handle to a system is
//! enough to stop it receiving events.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::event::{Dispatch, Dispatcher, EventSet, QueueConfig};

/// Trait for systems that react to events of the set `S`
///
/// A system wires itself into the dispatcher in [`System::connect`], usually
/// by connecting the shared handle it is given for each event type it
/// handles through [`Listener`](crate::event::Listener) impls.
pub trait System<S: EventSet>: 'static {
    /// Register this system's listeners
    fn connect(this: &Rc<RefCell<Self>>, dispatcher: &mut Dispatcher<S>)
    where
        Self: Sized;

    /// Get the name of this system for debugging
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Handle to a registered system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemId(u32);

impl SystemId {
    /// Create a system id from a raw value
    pub fn new(id: u32) -> Self {
        SystemId(id)
    }

    /// Get the raw value
    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owner of the dispatcher and of every registered system
pub struct SystemManager<S: EventSet> {
    dispatcher: Dispatcher<S>,
    systems: BTreeMap<SystemId, Rc<RefCell<dyn System<S>>>>,
    next_id: u32,
}

impl<S: EventSet> SystemManager<S> {
    /// Create an empty manager with a default dispatcher
    pub fn new() -> Self {
        Self::from_dispatcher(Dispatcher::new())
    }

    /// Create an empty manager with a configured dispatcher
    pub fn with_config(config: QueueConfig) -> Result<Self> {
        Ok(Self::from_dispatcher(Dispatcher::with_config(config)?))
    }

    fn from_dispatcher(dispatcher: Dispatcher<S>) -> Self {
        SystemManager {
            dispatcher,
            systems: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Take ownership of `system` and connect it to the dispatcher
    pub fn add_system<T: System<S>>(&mut self, system: T) -> SystemId {
        self.add_shared_system(Rc::new(RefCell::new(system)))
    }

    /// Register a system the caller keeps a handle to
    ///
    /// A system shared this way keeps receiving events after
    /// [`SystemManager::delete_system`] for as long as the caller's handle
    /// lives.
    pub fn add_shared_system<T: System<S>>(&mut self, system: Rc<RefCell<T>>) -> SystemId {
        T::connect(&system, &mut self.dispatcher);

        let id = SystemId(self.next_id);
        self.next_id += 1;
        debug!(system = %id, name = std::any::type_name::<T>(), "system added");
        self.systems.insert(id, system);
        id
    }

    /// Drop the manager's handle to a system and prune dead registrations
    pub fn delete_system(&mut self, id: SystemId) -> Result<()> {
        let system = self.systems.remove(&id).ok_or(Error::UnknownSystem(id))?;
        debug!(system = %id, "system deleted");
        drop(system);
        self.dispatcher.prune_listeners();
        Ok(())
    }

    /// Number of registered systems
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Check if `id` refers to a registered system
    pub fn contains(&self, id: SystemId) -> bool {
        self.systems.contains_key(&id)
    }

    /// Names of registered systems in registration order
    ///
    /// A system that is currently running reports `"<busy>"`.
    pub fn system_names(&self) -> Vec<String> {
        self.systems
            .values()
            .map(|system| match system.try_borrow() {
                Ok(system) => system.name().to_string(),
                Err(_) => "<busy>".to_string(),
            })
            .collect()
    }

    /// The dispatcher
    pub fn dispatcher(&self) -> &Dispatcher<S> {
        &self.dispatcher
    }

    /// The dispatcher, mutably
    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher<S> {
        &mut self.dispatcher
    }
}

impl<S> SystemManager<S>
where
    S: EventSet<Context = Self>,
{
    /// Deliver every pending event, including those pushed while
    /// delivering
    ///
    /// Available when the manager itself is the listener context. A
    /// [`World`](crate::ecs::World) drains through
    /// [`World::process`](crate::ecs::World::process) instead.
    pub fn process(&mut self) -> usize {
        Dispatcher::<S>::drain(self, None)
    }
}

impl<S: EventSet> Default for SystemManager<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EventSet> Dispatch<S> for SystemManager<S> {
    fn dispatcher(&self) -> &Dispatcher<S> {
        &self.dispatcher
    }

    fn dispatcher_mut(&mut self) -> &mut Dispatcher<S> {
        &mut self.dispatcher
    }
}

impl<S: EventSet> fmt::Debug for SystemManager<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemManager")
            .field("systems", &self.systems.len())
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}
