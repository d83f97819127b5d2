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
//! Dispatcher behaviour through the public API
//!
//! Covers delivery order, listeners registered for several event types,
//! re-entrant pushes and changes to the listener list mid-dispatch.

use std::cell::RefCell;
use std::rc::Rc;

use entity_system::event::{Dispatch, Dispatcher, Listener};
use entity_system::event_set;

#[derive(Debug, Clone, PartialEq)]
struct Alpha {
    data: String,
    id: u32,
}

#[derive(Debug, Clone, PartialEq)]
struct Beta {
    data: String,
    id: u32,
}

event_set! {
    enum TestEvent: TestListeners for Dispatcher<TestEvent> {
        Alpha(Alpha),
        Beta(Beta),
    }
}

type Ctx = Dispatcher<TestEvent>;

fn alpha() -> Alpha {
    Alpha {
        data: "alpha".to_string(),
        id: 5,
    }
}

fn beta() -> Beta {
    Beta {
        data: "beta".to_string(),
        id: 10,
    }
}

#[derive(Default)]
struct AlphaHandler {
    count: u32,
    seen: Vec<Alpha>,
}

impl Listener<Alpha, Ctx> for AlphaHandler {
    fn handle(&mut self, event: &mut Alpha, _: &mut Ctx) {
        self.count += 1;
        self.seen.push(event.clone());
    }
}

#[derive(Default)]
struct BetaHandler {
    count: u32,
    seen: Vec<Beta>,
}

impl Listener<Beta, Ctx> for BetaHandler {
    fn handle(&mut self, event: &mut Beta, _: &mut Ctx) {
        self.count += 1;
        self.seen.push(event.clone());
    }
}

/// Listens to both event types
#[derive(Default)]
struct BothHandler {
    alphas: u32,
    betas: u32,
}

impl Listener<Alpha, Ctx> for BothHandler {
    fn handle(&mut self, _: &mut Alpha, _: &mut Ctx) {
        self.alphas += 1;
    }
}

impl Listener<Beta, Ctx> for BothHandler {
    fn handle(&mut self, _: &mut Beta, _: &mut Ctx) {
        self.betas += 1;
    }
}

/// Turns every alpha into a beta carrying the same payload
struct Relay;

impl Listener<Alpha, Ctx> for Relay {
    fn handle(&mut self, event: &mut Alpha, ctx: &mut Ctx) {
        let (data, id) = (event.data.clone(), event.id);
        ctx.push_emplace(move || Beta { data, id });
    }
}

fn shared<T>(value: T) -> Rc<RefCell<T>> {
    Rc::new(RefCell::new(value))
}

#[test]
fn test_each_listener_sees_its_own_type() {
    let mut dispatcher = Ctx::new();
    let h1 = shared(AlphaHandler::default());
    let h2 = shared(BetaHandler::default());
    let h3 = shared(BothHandler::default());

    dispatcher.connect::<Alpha, _>(&h1);
    dispatcher.connect::<Beta, _>(&h2);
    dispatcher.connect::<Alpha, _>(&h3);
    dispatcher.connect::<Beta, _>(&h3);

    dispatcher.push(alpha());
    assert_eq!(dispatcher.dispatch(), 1);
    assert_eq!(h1.borrow().count, 1);
    assert_eq!(h2.borrow().count, 0);
    assert_eq!((h3.borrow().alphas, h3.borrow().betas), (1, 0));

    dispatcher.push(beta());
    assert_eq!(dispatcher.dispatch(), 1);
    assert_eq!(h1.borrow().count, 1);
    assert_eq!(h2.borrow().count, 1);
    assert_eq!((h3.borrow().alphas, h3.borrow().betas), (1, 1));

    dispatcher.push(alpha());
    dispatcher.push(beta());
    assert_eq!(dispatcher.dispatch(), 2);
    assert_eq!(h1.borrow().count, 2);
    assert_eq!(h2.borrow().count, 2);
    assert_eq!((h3.borrow().alphas, h3.borrow().betas), (2, 2));

    assert!(h1.borrow().seen.iter().all(|e| *e == alpha()));
    assert!(h2.borrow().seen.iter().all(|e| *e == beta()));
}

#[test]
fn test_reentrant_push_is_drained_in_same_call() {
    let mut dispatcher = Ctx::new();
    let relay = shared(Relay);
    let betas = shared(BetaHandler::default());

    dispatcher.connect::<Alpha, _>(&relay);
    dispatcher.connect::<Beta, _>(&betas);

    dispatcher.push(alpha());
    dispatcher.push(Alpha {
        data: "second".to_string(),
        id: 6,
    });

    assert_eq!(dispatcher.dispatch(), 4);
    assert_eq!(dispatcher.pending(), 0);

    let handler = betas.borrow();
    let seen = &handler.seen;
    assert_eq!(seen.len(), 2);
    assert_eq!((seen[0].data.as_str(), seen[0].id), ("alpha", 5));
    assert_eq!((seen[1].data.as_str(), seen[1].id), ("second", 6));
}

#[test]
fn test_delivery_follows_push_order() {
    let order = shared(Vec::new());
    let mut dispatcher = Ctx::new();

    let log = Rc::clone(&order);
    let on_alpha = shared(move |event: &mut Alpha, _: &mut Ctx| {
        log.borrow_mut().push(format!("a{}", event.id));
    });
    let log = Rc::clone(&order);
    let on_beta = shared(move |event: &mut Beta, _: &mut Ctx| {
        log.borrow_mut().push(format!("b{}", event.id));
    });
    dispatcher.connect::<Alpha, _>(&on_alpha);
    dispatcher.connect::<Beta, _>(&on_beta);

    for id in 0..3 {
        dispatcher.push(Alpha {
            data: String::new(),
            id,
        });
        dispatcher.push(Beta {
            data: String::new(),
            id,
        });
    }
    dispatcher.dispatch();

    assert_eq!(*order.borrow(), vec!["a0", "b0", "a1", "b1", "a2", "b2"]);
}

#[test]
fn test_disconnect_mid_dispatch_applies_to_later_events() {
    let calls = shared(Vec::new());
    let mut dispatcher = Ctx::new();

    let log = Rc::clone(&calls);
    let victim = shared(move |event: &mut Alpha, _: &mut Ctx| {
        log.borrow_mut().push(("victim", event.id));
    });

    // The first listener removes the victim while the first event is being
    // delivered; the victim still runs for that event only.
    let log = Rc::clone(&calls);
    let target = Rc::clone(&victim);
    let remover = shared(move |event: &mut Alpha, ctx: &mut Ctx| {
        log.borrow_mut().push(("remover", event.id));
        ctx.disconnect::<Alpha, _>(&target);
    });

    dispatcher.connect::<Alpha, _>(&remover);
    dispatcher.connect::<Alpha, _>(&victim);

    dispatcher.push(Alpha {
        data: String::new(),
        id: 1,
    });
    dispatcher.push(Alpha {
        data: String::new(),
        id: 2,
    });
    assert_eq!(dispatcher.dispatch(), 2);

    assert_eq!(
        *calls.borrow(),
        vec![("remover", 1), ("victim", 1), ("remover", 2)]
    );
    assert_eq!(dispatcher.listener_count::<Alpha>(), 1);
}

#[test]
fn test_connect_mid_dispatch_waits_for_next_event() {
    let calls = shared(0u32);
    let mut dispatcher = Ctx::new();

    let counter = Rc::clone(&calls);
    let late = shared(move |_: &mut Alpha, _: &mut Ctx| {
        *counter.borrow_mut() += 1;
    });
    let pending = Rc::clone(&late);
    let connector = shared(move |_: &mut Alpha, ctx: &mut Ctx| {
        if ctx.listener_count::<Alpha>() == 1 {
            ctx.connect::<Alpha, _>(&pending);
        }
    });
    dispatcher.connect::<Alpha, _>(&connector);

    dispatcher.push(alpha());
    dispatcher.push(alpha());
    dispatcher.dispatch();

    // Not called for the event that connected it, called for the next one
    assert_eq!(*calls.borrow(), 1);
}

#[test]
fn test_dropped_listener_is_skipped() {
    let mut dispatcher = Ctx::new();
    let handler = shared(AlphaHandler::default());
    dispatcher.connect::<Alpha, _>(&handler);
    drop(handler);

    assert_eq!(dispatcher.listener_count::<Alpha>(), 1);

    dispatcher.push(alpha());
    assert_eq!(dispatcher.dispatch(), 1);
    // Delivery already removed the dead registration
    assert_eq!(dispatcher.listener_count::<Alpha>(), 0);
    assert_eq!(dispatcher.prune_listeners(), 0);
}

#[test]
fn test_borrowed_listener_is_skipped() {
    let mut dispatcher = Ctx::new();
    let handler = shared(AlphaHandler::default());
    dispatcher.connect::<Alpha, _>(&handler);

    {
        let _held = handler.borrow_mut();
        dispatcher.push(alpha());
        assert_eq!(dispatcher.dispatch(), 1);
    }
    assert_eq!(handler.borrow().count, 0);

    dispatcher.push(alpha());
    dispatcher.dispatch();
    assert_eq!(handler.borrow().count, 1);
}

#[test]
fn test_steady_state_does_not_grow_queue() {
    let mut dispatcher = Ctx::new();
    let relay = shared(Relay);
    dispatcher.connect::<Alpha, _>(&relay);

    for _ in 0..10 {
        dispatcher.push(alpha());
        dispatcher.dispatch();
    }
    let growths = dispatcher.stats().growths;

    for _ in 0..1000 {
        dispatcher.push(alpha());
        dispatcher.dispatch();
    }

    let stats = dispatcher.stats();
    assert_eq!(stats.growths, growths);
    assert_eq!(stats.pushed, 2020);
    assert_eq!(stats.dispatched, 2020);
    assert_eq!(stats.resets, 1010);
}
