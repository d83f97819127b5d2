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
//! Listeners and per-event listener lists

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Receives events of type `E` together with the dispatch context `C`
///
/// Any `FnMut(&mut E, &mut C)` closure is a listener.
pub trait Listener<E, C> {
    /// Handle one event
    fn handle(&mut self, event: &mut E, ctx: &mut C);
}

impl<E, C, F> Listener<E, C> for F
where
    F: FnMut(&mut E, &mut C),
{
    fn handle(&mut self, event: &mut E, ctx: &mut C) {
        self(event, ctx)
    }
}

type Registration<E, C> = Weak<RefCell<dyn Listener<E, C>>>;

fn thin<T: ?Sized>(ptr: *const T) -> *const () {
    ptr.cast::<()>()
}

/// Listeners connected to one event type
///
/// The list does not own its listeners. A registration whose listener has
/// been dropped is skipped during delivery and removed by
/// [`ListenerList::prune`].
pub struct ListenerList<E, C> {
    listeners: Vec<Registration<E, C>>,
    spare: Vec<Vec<Registration<E, C>>>,
}

impl<E: 'static, C: 'static> ListenerList<E, C> {
    /// Create an empty list
    pub fn new() -> Self {
        ListenerList {
            listeners: Vec::new(),
            spare: Vec::new(),
        }
    }

    /// Append a registration for `listener`
    ///
    /// Connecting the same listener twice means it runs twice per event.
    pub fn connect<L>(&mut self, listener: &Rc<RefCell<L>>)
    where
        L: Listener<E, C> + 'static,
    {
        let shared: Rc<RefCell<dyn Listener<E, C>>> = listener.clone();
        self.listeners.push(Rc::downgrade(&shared));
    }

    /// Remove one registration for `listener`
    ///
    /// The last registration takes the freed position, so order is not
    /// preserved. Returns `false` if `listener` was not connected.
    pub fn disconnect<L>(&mut self, listener: &Rc<RefCell<L>>) -> bool
    where
        L: Listener<E, C> + 'static,
    {
        let target = thin(Rc::as_ptr(listener));
        match self
            .listeners
            .iter()
            .position(|weak| thin(weak.as_ptr()) == target)
        {
            Some(index) => {
                self.listeners.swap_remove(index);
                true
            }
            None => false,
        }
    }

    /// Check if `listener` has at least one registration
    pub fn contains<L>(&self, listener: &Rc<RefCell<L>>) -> bool
    where
        L: Listener<E, C> + 'static,
    {
        let target = thin(Rc::as_ptr(listener));
        self.listeners.iter().any(|weak| thin(weak.as_ptr()) == target)
    }

    /// Number of registrations, live or not
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Check if nothing is connected
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Drop registrations whose listener no longer exists
    pub fn prune(&mut self) -> usize {
        let before = self.listeners.len();
        self.listeners.retain(|weak| weak.strong_count() > 0);
        before - self.listeners.len()
    }

    /// Copy the current registrations into a recycled buffer
    pub(crate) fn snapshot(&mut self) -> Vec<Registration<E, C>> {
        let mut buffer = self.spare.pop().unwrap_or_default();
        buffer.extend(self.listeners.iter().cloned());
        buffer
    }

    /// Return a buffer obtained from [`ListenerList::snapshot`]
    pub(crate) fn recycle(&mut self, mut buffer: Vec<Registration<E, C>>) {
        buffer.clear();
        self.spare.push(buffer);
    }
}

impl<E: 'static, C: 'static> Default for ListenerList<E, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, C> std::fmt::Debug for ListenerList<E, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerList")
            .field("event", &std::any::type_name::<E>())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
