use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};

use crate::clock::{Clock, SystemClock};
use crate::error::CoreError;
use crate::event::Event;

pub type EventPredicate = Arc<dyn Fn(&Event) -> bool + Send + Sync>;
pub type EventHandler = Arc<dyn Fn(&Event) -> Result<(), CoreError> + Send + Sync>;

struct Subscription {
    predicate: EventPredicate,
    handlers: Vec<EventHandler>,
}

/// Synchronous in-process publish/subscribe router.
///
/// Handlers run on the publishing thread before `publish` returns. The
/// subscription table is snapshotted per publish, so a handler may
/// subscribe or unsubscribe without deadlocking.
#[derive(Default)]
pub struct MessageHub {
    subscriptions: RwLock<Vec<Subscription>>,
}

fn same<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl MessageHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, predicate: EventPredicate, handler: EventHandler) {
        let mut subscriptions = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        match subscriptions
            .iter_mut()
            .find(|s| same(&s.predicate, &predicate))
        {
            Some(subscription) => {
                if !subscription.handlers.iter().any(|h| same(h, &handler)) {
                    subscription.handlers.push(handler);
                }
            }
            None => subscriptions.push(Subscription {
                predicate,
                handlers: vec![handler],
            }),
        }
    }

    /// Remove a handler registered under a predicate, both compared by identity.
    /// Returns false if the pair was not subscribed.
    pub fn unsubscribe(&self, predicate: &EventPredicate, handler: &EventHandler) -> bool {
        let mut subscriptions = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let Some(index) = subscriptions
            .iter()
            .position(|s| same(&s.predicate, predicate))
        else {
            return false;
        };

        let handlers = &mut subscriptions[index].handlers;
        let before = handlers.len();
        handlers.retain(|h| !same(h, handler));
        let removed = handlers.len() < before;

        if handlers.is_empty() {
            subscriptions.remove(index);
        }
        removed
    }

    /// Deliver an event to every matching handler exactly once.
    ///
    /// Every matching handler is invoked even if an earlier one fails; the
    /// first failure is returned.
    pub fn publish(&self, event: &Event) -> Result<(), CoreError> {
        let matching: Vec<EventHandler> = {
            let subscriptions = self
                .subscriptions
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            subscriptions
                .iter()
                .filter(|s| (s.predicate)(event))
                .flat_map(|s| s.handlers.iter().cloned())
                .collect()
        };

        let mut first_error = None;
        for handler in matching {
            if let Err(e) = handler(event) {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn handler_count(&self) -> usize {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|s| s.handlers.len())
            .sum()
    }
}

/// Collaborators every command needs: where to publish and what time it is.
#[derive(Clone)]
pub struct DomainContext {
    hub: Arc<MessageHub>,
    clock: Arc<dyn Clock>,
}

impl DomainContext {
    pub fn new(hub: Arc<MessageHub>) -> Self {
        Self::with_clock(hub, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(hub: Arc<MessageHub>, clock: Arc<dyn Clock>) -> Self {
        Self { hub, clock }
    }

    pub fn hub(&self) -> &Arc<MessageHub> {
        &self.hub
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn publish(&self, event: &Event) -> Result<(), CoreError> {
        self.hub.publish(event)
    }
}
