use std::sync::Arc;

use tracing::debug;

use kanban_core::{CoreError, Event, EventHandler, EventPredicate, EventStore, MessageHub};

/// Appends every published event to an event store.
///
/// A failed append surfaces as the error of the `publish` call, and
/// therefore of the command that produced the event.
pub struct PersistenceSubscriber {
    hub: Arc<MessageHub>,
    predicate: EventPredicate,
    handler: EventHandler,
}

impl PersistenceSubscriber {
    pub fn attach<S>(hub: Arc<MessageHub>, store: Arc<S>) -> Self
    where
        S: EventStore + ?Sized + 'static,
    {
        let predicate: EventPredicate = Arc::new(|_: &Event| true);
        let handler: EventHandler = Arc::new(move |event: &Event| {
            store.append(event).map_err(CoreError::from)
        });
        hub.subscribe(predicate.clone(), handler.clone());
        debug!("Persistence subscriber attached");

        Self {
            hub,
            predicate,
            handler,
        }
    }

    /// Stop persisting events. Returns false if already closed.
    pub fn close(&self) -> bool {
        self.hub.unsubscribe(&self.predicate, &self.handler)
    }
}

impl Drop for PersistenceSubscriber {
    fn drop(&mut self) {
        self.close();
    }
}
