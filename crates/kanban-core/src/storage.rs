use crate::error::StorageError;
use crate::event::Event;

/// Predicate over decoded events, evaluated against every event in log order.
pub type EventFilter<'a> = Box<dyn Fn(&Event) -> bool + 'a>;

/// Lazily produced, finite sequence of events read from a store.
pub type EventStream<'a> = Box<dyn Iterator<Item = Result<Event, StorageError>> + 'a>;

/// Append-only event log: the single source of truth.
///
/// Implementations serialize appends so the log has one total order, and
/// each `open_stream` reads a consistent snapshot from the start of the log.
pub trait EventStore: Send + Sync {
    /// Durably write one event to the end of the log before returning.
    fn append(&self, event: &Event) -> Result<(), StorageError>;

    /// Stream the events matching `filter`, in log order. Each call starts
    /// again from the beginning of the log.
    fn open_stream<'a>(&'a self, filter: EventFilter<'a>) -> Result<EventStream<'a>, StorageError>;

    /// Collect every event in the log.
    fn all_events(&self) -> Result<Vec<Event>, StorageError> {
        self.open_stream(Box::new(|_| true))?.collect()
    }
}

impl<S: EventStore + ?Sized> EventStore for std::sync::Arc<S> {
    fn append(&self, event: &Event) -> Result<(), StorageError> {
        (**self).append(event)
    }

    fn open_stream<'a>(&'a self, filter: EventFilter<'a>) -> Result<EventStream<'a>, StorageError> {
        (**self).open_stream(filter)
    }
}

// In-memory implementation for testing
#[cfg(any(test, feature = "test-utils"))]
pub mod memory {
    use super::*;
    use std::sync::{PoisonError, RwLock};

    /// In-memory event store for testing.
    #[derive(Default)]
    pub struct InMemoryEventStore {
        events: RwLock<Vec<Event>>,
    }

    impl InMemoryEventStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn len(&self) -> usize {
            self.events
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    impl EventStore for InMemoryEventStore {
        fn append(&self, event: &Event) -> Result<(), StorageError> {
            self.events
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event.clone());
            Ok(())
        }

        fn open_stream<'a>(
            &'a self,
            filter: EventFilter<'a>,
        ) -> Result<EventStream<'a>, StorageError> {
            let snapshot = self
                .events
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            Ok(Box::new(
                snapshot.into_iter().filter(move |e| filter(e)).map(Ok),
            ))
        }
    }

}
