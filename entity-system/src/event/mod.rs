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
//! Typed event dispatch
//!
//! The event types an application uses form a closed set, declared once
//! with [`event_set!`](crate::event_set). The macro produces an enum with
//! one variant per event type, a struct holding one [`ListenerList`] per
//! type, and the trait impls tying both to a context type. Listeners get
//! `&mut` access to that context while they run, so they can push more
//! events or touch the world.
//!
//! Delivery is run-to-completion: events pushed by a listener are queued
//! behind the one being handled and processed by the same drain, never
//! recursively.

mod dispatcher;
mod listener;
mod queue;

pub use dispatcher::Dispatcher;
pub use listener::{Listener, ListenerList};
pub use queue::{EventQueue, QueueConfig, QueueStats};

use tracing::{debug, warn};

/// A closed set of event types
///
/// Implemented by [`event_set!`](crate::event_set).
pub trait EventSet: Sized + 'static {
    /// Value handed to every listener alongside the event
    type Context: Dispatch<Self> + 'static;

    /// One listener list per event type
    type Listeners: Default + 'static;

    /// Name of the event type held by this value
    fn name(&self) -> &'static str;

    /// Hand the held event to every listener connected to its type
    fn deliver(self, ctx: &mut Self::Context);

    /// Drop dead registrations from every list
    fn prune(listeners: &mut Self::Listeners) -> usize;
}

/// A member of the event set `S`
pub trait Event<S: EventSet>: Sized + 'static {
    /// Wrap this event in the set's enum
    fn into_set(self) -> S;

    /// Select this type's listener list
    fn listeners(lists: &S::Listeners) -> &ListenerList<Self, S::Context>;

    /// Select this type's listener list mutably
    fn listeners_mut(lists: &mut S::Listeners) -> &mut ListenerList<Self, S::Context>;
}

/// Access to the dispatcher owned by a context
///
/// The context is what listeners receive, so draining is driven from it
/// rather than from the dispatcher it contains.
pub trait Dispatch<S: EventSet> {
    /// The dispatcher
    fn dispatcher(&self) -> &Dispatcher<S>;

    /// The dispatcher, mutably
    fn dispatcher_mut(&mut self) -> &mut Dispatcher<S>;

    /// Deliver pending events until the queue is empty, including events
    /// pushed by listeners along the way
    ///
    /// Returns the number of events delivered. Called from inside a
    /// listener it does nothing and returns 0.
    fn dispatch(&mut self) -> usize
    where
        Self: Sized,
        S: EventSet<Context = Self>,
    {
        Dispatcher::<S>::drain(self, None)
    }

    /// Deliver at most `count` pending events
    ///
    /// Events left over stay queued for the next call.
    fn dispatch_n(&mut self, count: usize) -> usize
    where
        Self: Sized,
        S: EventSet<Context = Self>,
    {
        Dispatcher::<S>::drain(self, Some(count))
    }
}

/// Run every listener connected to `E` against one event
///
/// The listener list is copied before the first call, so listeners
/// connected or disconnected meanwhile only take effect for later events.
/// A listener that is already borrowed is skipped. Registrations whose
/// listener was dropped are removed afterwards.
#[doc(hidden)]
pub fn deliver<S, E>(event: &mut E, ctx: &mut S::Context)
where
    S: EventSet,
    E: Event<S>,
{
    let snapshot = E::listeners_mut(ctx.dispatcher_mut().listeners_mut()).snapshot();
    let mut dead = false;

    for registration in &snapshot {
        let listener = match registration.upgrade() {
            Some(listener) => listener,
            None => {
                dead = true;
                continue;
            }
        };
        let result = listener.try_borrow_mut();
        match result {
            Ok(mut listener) => listener.handle(event, ctx),
            Err(_) => warn!(
                event = std::any::type_name::<E>(),
                "listener is already borrowed, skipping"
            ),
        }
    }

    let listeners = E::listeners_mut(ctx.dispatcher_mut().listeners_mut());
    listeners.recycle(snapshot);
    if dead {
        let pruned = listeners.prune();
        debug!(
            event = std::any::type_name::<E>(),
            pruned, "dropped dead listener registrations"
        );
    }
}

/// Declare a closed set of event types
///
/// ```
/// use entity_system::event::{Dispatch, Dispatcher};
/// use entity_system::event_set;
///
/// pub struct Ping(pub u32);
/// pub struct Pong(pub u32);
///
/// event_set! {
///     pub enum NetEvent: NetListeners for Dispatcher<NetEvent> {
///         Ping(Ping),
///         Pong(Pong),
///     }
/// }
///
/// let mut dispatcher = Dispatcher::<NetEvent>::new();
/// dispatcher.push(Ping(1));
/// assert_eq!(dispatcher.dispatch(), 1);
/// ```
///
/// `NetEvent` gets one variant per type and `NetListeners` one listener
/// list per type. Listeners receive the context type named after `for`,
/// which must implement [`Dispatch`]. A type may appear only once.
#[macro_export]
macro_rules! event_set {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $listeners:ident for $ctx:ty {
            $($variant:ident($ty:ty)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $(
                #[allow(missing_docs)]
                $variant($ty),
            )+
        }

        #[allow(non_snake_case, missing_docs)]
        $vis struct $listeners {
            $($variant: $crate::event::ListenerList<$ty, $ctx>,)+
        }

        impl ::core::default::Default for $listeners {
            fn default() -> Self {
                $listeners {
                    $($variant: $crate::event::ListenerList::new(),)+
                }
            }
        }

        impl $crate::event::EventSet for $name {
            type Context = $ctx;
            type Listeners = $listeners;

            fn name(&self) -> &'static str {
                match self {
                    $($name::$variant(_) => ::core::stringify!($variant),)+
                }
            }

            fn deliver(self, ctx: &mut $ctx) {
                match self {
                    $(
                        $name::$variant(mut event) => {
                            $crate::event::deliver::<Self, $ty>(&mut event, ctx)
                        }
                    )+
                }
            }

            fn prune(listeners: &mut $listeners) -> usize {
                0 $(+ listeners.$variant.prune())+
            }
        }

        $(
            impl $crate::event::Event<$name> for $ty {
                fn into_set(self) -> $name {
                    $name::$variant(self)
                }

                fn listeners(lists: &$listeners) -> &$crate::event::ListenerList<Self, $ctx> {
                    &lists.$variant
                }

                fn listeners_mut(lists: &mut $listeners) -> &mut $crate::event::ListenerList<Self, $ctx> {
                    &mut lists.$variant
                }
            }
        )+
    };
}
