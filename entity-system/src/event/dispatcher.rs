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
//! Event dispatcher

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace};

use super::{Dispatch, Event, EventQueue, EventSet, Listener, QueueConfig, QueueStats};
use crate::error::Result;

/// Listener registry plus pending-event queue for the event set `S`
///
/// Events are drained through the context that owns the dispatcher, see
/// [`Dispatch::dispatch`].
pub struct Dispatcher<S: EventSet> {
    listeners: S::Listeners,
    queue: EventQueue<S>,
}

impl<S: EventSet> Dispatcher<S> {
    /// Create a dispatcher with the default queue configuration
    pub fn new() -> Self {
        Dispatcher {
            listeners: S::Listeners::default(),
            queue: EventQueue::new(),
        }
    }

    /// Create a dispatcher with a custom queue configuration
    pub fn with_config(config: QueueConfig) -> Result<Self> {
        Ok(Dispatcher {
            listeners: S::Listeners::default(),
            queue: EventQueue::with_config(config)?,
        })
    }

    /// Queue an event
    pub fn push<E: Event<S>>(&mut self, event: E) {
        trace!(
            event = std::any::type_name::<E>(),
            pending = self.queue.pending(),
            "event pushed"
        );
        self.queue.push(event.into_set());
    }

    /// Queue an event built by `init`
    pub fn push_emplace<E, F>(&mut self, init: F)
    where
        E: Event<S>,
        F: FnOnce() -> E,
    {
        self.push(init());
    }

    /// Register `listener` for events of type `E`
    pub fn connect<E, L>(&mut self, listener: &Rc<RefCell<L>>)
    where
        E: Event<S>,
        L: Listener<E, S::Context> + 'static,
    {
        E::listeners_mut(&mut self.listeners).connect(listener);
    }

    /// Remove one registration of `listener` for events of type `E`
    pub fn disconnect<E, L>(&mut self, listener: &Rc<RefCell<L>>) -> bool
    where
        E: Event<S>,
        L: Listener<E, S::Context> + 'static,
    {
        E::listeners_mut(&mut self.listeners).disconnect(listener)
    }

    /// Check if `listener` is registered for events of type `E`
    pub fn is_connected<E, L>(&self, listener: &Rc<RefCell<L>>) -> bool
    where
        E: Event<S>,
        L: Listener<E, S::Context> + 'static,
    {
        E::listeners(&self.listeners).contains(listener)
    }

    /// Number of registrations for events of type `E`
    pub fn listener_count<E: Event<S>>(&self) -> usize {
        E::listeners(&self.listeners).len()
    }

    /// Drop registrations whose listener no longer exists
    pub fn prune_listeners(&mut self) -> usize {
        let pruned = S::prune(&mut self.listeners);
        if pruned > 0 {
            debug!(pruned, "dropped dead listener registrations");
        }
        pruned
    }

    /// Number of events waiting to be delivered
    pub fn pending(&self) -> usize {
        self.queue.pending()
    }

    /// Check if a drain is in progress
    pub fn is_draining(&self) -> bool {
        self.queue.is_draining()
    }

    /// Drop every pending event without delivering it
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Queue activity counters
    pub fn stats(&self) -> &QueueStats {
        self.queue.stats()
    }

    pub(crate) fn listeners_mut(&mut self) -> &mut S::Listeners {
        &mut self.listeners
    }

    pub(crate) fn drain(ctx: &mut S::Context, limit: Option<usize>) -> usize {
        if !ctx.dispatcher_mut().queue.begin_drain() {
            debug!("dispatch requested while draining, ignoring");
            return 0;
        }

        let mut guard = DrainGuard::<S> { ctx };
        let mut delivered = 0;
        while limit.map_or(true, |limit| delivered < limit) {
            let event = match guard.ctx.dispatcher_mut().queue.pop() {
                Some(event) => event,
                None => break,
            };
            trace!(event = event.name(), "delivering event");
            event.deliver(&mut *guard.ctx);
            delivered += 1;
        }

        delivered
    }
}

/// Ends the drain when dropped, including when a listener panics
struct DrainGuard<'a, S: EventSet> {
    ctx: &'a mut S::Context,
}

impl<S: EventSet> Drop for DrainGuard<'_, S> {
    fn drop(&mut self) {
        self.ctx.dispatcher_mut().queue.end_drain();
    }
}

impl<S: EventSet> Default for Dispatcher<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EventSet> Dispatch<S> for Dispatcher<S> {
    fn dispatcher(&self) -> &Dispatcher<S> {
        self
    }

    fn dispatcher_mut(&mut self) -> &mut Dispatcher<S> {
        self
    }
}

impl<S: EventSet> std::fmt::Debug for Dispatcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("pending", &self.queue.pending())
            .field("draining", &self.queue.is_draining())
            .finish()
    }
}
