//! # Event Bus
//!
//! Registry of subscribed components and synchronous fan-out of [`Event`]s.
//!
//! ## Delivery
//!
//! Subscribers are called in registration order. Re-subscribing an id swaps
//! its handler but keeps its original position. Every handler runs inside a
//! panic boundary: an `Err` or a panic is logged and counted, and delivery
//! carries on with the next subscriber.
//!
//! ## Re-entrancy
//!
//! The subscriber list is copied before delivery starts, so a handler may
//! subscribe, unsubscribe or broadcast without invalidating the loop. A
//! subscription added mid-broadcast first hears the next event. A handler
//! that is already running (a nested broadcast reached it again) is skipped
//! for the nested event and counted as failed.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, error, warn};

use super::component::{EventSubscriber, HandlerError};
use super::event::Event;
use super::guard;
use super::id::ComponentId;

type Handler = Box<dyn FnMut(&Event) -> Result<(), HandlerError>>;

struct Subscriber {
    id: ComponentId,
    handler: Rc<RefCell<Handler>>,
}

/// Outcome of one [`EventBus::broadcast`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Handlers that returned `Ok`.
    pub delivered: usize,
    /// Handlers that returned `Err`, panicked or were busy.
    pub failed: usize,
}

impl Delivery {
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed
    }
}

#[derive(Default)]
pub struct EventBus {
    subscribers: RefCell<Vec<Subscriber>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for every event. Replaces an existing handler for
    /// `id` in place.
    pub fn subscribe<F>(&self, id: ComponentId, handler: F)
    where
        F: FnMut(&Event) -> Result<(), HandlerError> + 'static,
    {
        let handler: Rc<RefCell<Handler>> = Rc::new(RefCell::new(Box::new(handler)));
        let mut subscribers = self.subscribers.borrow_mut();
        if let Some(existing) = subscribers.iter_mut().find(|s| s.id == id) {
            debug!("Replacing subscription for {}", id);
            existing.handler = handler;
        } else {
            debug!("Subscribing {}", id);
            subscribers.push(Subscriber { id, handler });
        }
    }

    /// Subscribe a shared component. The bus holds it weakly: once the
    /// component is dropped its handler does nothing.
    pub fn subscribe_component<C>(&self, component: &Rc<RefCell<C>>)
    where
        C: EventSubscriber + 'static,
    {
        let id = component.borrow().id();
        let weak = Rc::downgrade(component);
        let name = id.clone();
        self.subscribe(id, move |event| {
            let Some(component) = weak.upgrade() else {
                return Ok(());
            };
            let Ok(mut component) = component.try_borrow_mut() else {
                return Err(HandlerError::new(format!("{name} is busy")));
            };
            component.on_event(event)
        });
    }

    /// Remove the handler for `id`. Returns whether one was registered.
    pub fn unsubscribe(&self, id: &ComponentId) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != *id);
        let removed = subscribers.len() != before;
        if removed {
            debug!("Unsubscribed {}", id);
        }
        removed
    }

    pub fn is_subscribed(&self, id: &ComponentId) -> bool {
        self.subscribers.borrow().iter().any(|s| s.id == *id)
    }

    /// Subscribed ids in delivery order.
    pub fn subscribers(&self) -> Vec<ComponentId> {
        self.subscribers
            .borrow()
            .iter()
            .map(|s| s.id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.subscribers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.borrow().is_empty()
    }

    /// Deliver `event` to every subscriber, in registration order.
    pub fn broadcast(&self, event: &Event) -> Delivery {
        let snapshot: Vec<(ComponentId, Rc<RefCell<Handler>>)> = self
            .subscribers
            .borrow()
            .iter()
            .map(|s| (s.id.clone(), Rc::clone(&s.handler)))
            .collect();

        let mut delivery = Delivery::default();
        for (id, handler) in snapshot {
            let Ok(mut handler) = handler.try_borrow_mut() else {
                warn!("Skipping {} for {:?}: handler already running", id, event.kind());
                delivery.failed += 1;
                continue;
            };
            match guard::isolate(|| (*handler)(event)) {
                Ok(Ok(())) => delivery.delivered += 1,
                Ok(Err(e)) => {
                    error!("Handler {} failed on {:?}: {}", id, event.kind(), e);
                    delivery.failed += 1;
                }
                Err(panic) => {
                    error!("Handler {} panicked on {:?}: {}", id, event.kind(), panic);
                    delivery.failed += 1;
                }
            }
        }

        debug!(
            "Broadcast {:?}: {} delivered, {} failed",
            event.kind(),
            delivery.delivered,
            delivery.failed
        );
        delivery
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::id;

    fn recorder(
        log: &Rc<RefCell<Vec<String>>>,
        name: &'static str,
    ) -> impl FnMut(&Event) -> Result<(), HandlerError> + 'static {
        let log = Rc::clone(log);
        move |event| {
            log.borrow_mut().push(format!("{name}:{:?}", event.kind()));
            Ok(())
        }
    }

    #[test]
    fn test_delivers_in_registration_order() {
        let bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        bus.subscribe(id::HEADER, recorder(&log, "a"));
        bus.subscribe(id::CONTENT, recorder(&log, "b"));
        bus.subscribe(id::DATABASES, recorder(&log, "c"));

        let delivery = bus.broadcast(&Event::FocusChanged(id::CONTENT));
        assert_eq!(delivery, Delivery { delivered: 3, failed: 0 });
        assert_eq!(
            *log.borrow(),
            vec!["a:FocusChanged", "b:FocusChanged", "c:FocusChanged"]
        );
    }

    #[test]
    fn test_resubscribe_replaces_in_place() {
        let bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        bus.subscribe(id::HEADER, recorder(&log, "old"));
        bus.subscribe(id::CONTENT, recorder(&log, "b"));
        bus.subscribe(id::HEADER, recorder(&log, "new"));

        assert_eq!(bus.len(), 2);
        bus.broadcast(&Event::FocusChanged(id::ROOT));
        assert_eq!(*log.borrow(), vec!["new:FocusChanged", "b:FocusChanged"]);
    }

    #[test]
    fn test_unsubscribe_unknown_is_noop() {
        let bus = EventBus::new();
        assert!(!bus.unsubscribe(&id::HELP));
        bus.subscribe(id::HELP, |_| Ok(()));
        assert!(bus.unsubscribe(&id::HELP));
        assert!(bus.is_empty());
        assert_eq!(bus.broadcast(&Event::FocusChanged(id::ROOT)).attempted(), 0);
    }

    #[test]
    fn test_failures_do_not_stop_delivery() {
        let bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        bus.subscribe(id::HEADER, recorder(&log, "a"));
        bus.subscribe(id::CONTENT, |_| Err(HandlerError::new("nope")));
        bus.subscribe(id::DOC_PEEKER, |_| panic!("handler blew up"));
        bus.subscribe(id::DATABASES, recorder(&log, "d"));

        let delivery = bus.broadcast(&Event::FocusChanged(id::ROOT));
        assert_eq!(delivery, Delivery { delivered: 2, failed: 2 });
        assert_eq!(*log.borrow(), vec!["a:FocusChanged", "d:FocusChanged"]);
    }

    #[test]
    fn test_handler_may_subscribe_during_broadcast() {
        let bus = Rc::new(EventBus::new());
        let log = Rc::new(RefCell::new(Vec::new()));
        let inner_bus = Rc::clone(&bus);
        let inner_log = Rc::clone(&log);
        bus.subscribe(id::HEADER, move |_| {
            inner_bus.subscribe(id::HELP, recorder(&inner_log, "late"));
            Ok(())
        });

        let first = bus.broadcast(&Event::FocusChanged(id::ROOT));
        assert_eq!(first.attempted(), 1);
        assert!(log.borrow().is_empty());

        let second = bus.broadcast(&Event::FocusChanged(id::ROOT));
        assert_eq!(second.attempted(), 2);
        assert_eq!(*log.borrow(), vec!["late:FocusChanged"]);
    }

    #[test]
    fn test_nested_broadcast_skips_running_handler() {
        let bus = Rc::new(EventBus::new());
        let inner_bus = Rc::clone(&bus);
        let nested = Rc::new(RefCell::new(None));
        let nested_out = Rc::clone(&nested);
        bus.subscribe(id::HEADER, move |event| {
            if matches!(event, Event::FocusChanged(target) if *target == id::ROOT) {
                let delivery = inner_bus.broadcast(&Event::FocusChanged(id::HELP));
                *nested_out.borrow_mut() = Some(delivery);
            }
            Ok(())
        });

        let outer = bus.broadcast(&Event::FocusChanged(id::ROOT));
        assert_eq!(outer.delivered, 1);
        assert_eq!(*nested.borrow(), Some(Delivery { delivered: 0, failed: 1 }));
    }

    struct Counter {
        seen: usize,
    }

    impl EventSubscriber for Counter {
        fn id(&self) -> ComponentId {
            id::KEY_HINTS
        }

        fn on_event(&mut self, _event: &Event) -> Result<(), HandlerError> {
            self.seen += 1;
            Ok(())
        }
    }

    #[test]
    fn test_component_subscription_is_weak() {
        let bus = EventBus::new();
        let counter = Rc::new(RefCell::new(Counter { seen: 0 }));
        bus.subscribe_component(&counter);

        bus.broadcast(&Event::FocusChanged(id::ROOT));
        assert_eq!(counter.borrow().seen, 1);

        drop(counter);
        let delivery = bus.broadcast(&Event::FocusChanged(id::ROOT));
        assert_eq!(delivery, Delivery { delivered: 1, failed: 0 });
    }
}
