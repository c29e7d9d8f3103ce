use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use kanban_core::{
    replay, Aggregate, ConsistencyError, CoreError, EntityId, EntityKind, Event, EventFilter,
    EventStore, EventStream,
};

/// Reads entity histories back out of an event store.
pub struct EventPlayer<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for EventPlayer<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: EventStore + ?Sized> EventPlayer<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Stream the events matching `filter`, in log order.
    pub fn stream<'a>(&'a self, filter: EventFilter<'a>) -> Result<EventStream<'a>, CoreError> {
        Ok(self.store.open_stream(filter)?)
    }

    /// Ids of every entity of `kind` that has been created and not discarded,
    /// in creation order.
    ///
    /// A second creation of the same id, or a discard of an id that does not
    /// exist, means the log is corrupt.
    pub fn extant_entity_ids(&self, kind: EntityKind) -> Result<Vec<EntityId>, CoreError> {
        let mut extant = HashSet::new();
        let mut order = Vec::new();

        let events = self.stream(Box::new(move |e: &Event| {
            e.kind() == kind && (e.is_creation() || e.is_discard())
        }))?;
        for event in events {
            let event = event?;
            let id = event.originator_id;
            if event.is_creation() {
                if !extant.insert(id) {
                    return Err(ConsistencyError::DuplicateCreation { kind, id }.into());
                }
                order.push(id);
            } else if !extant.remove(&id) {
                return Err(ConsistencyError::DiscardOfUnknown { kind, id }.into());
            }
        }

        order.retain(|id| extant.contains(id));
        Ok(order)
    }

    /// Collect the histories of `ids` in a single scan of the log.
    ///
    /// The result is parallel to `ids`; an id with no events gets an empty
    /// history.
    pub fn histories(&self, ids: &[EntityId]) -> Result<Vec<Vec<Event>>, CoreError> {
        let mut grouped: HashMap<EntityId, Vec<Event>> =
            ids.iter().map(|&id| (id, Vec::new())).collect();

        let wanted: HashSet<EntityId> = ids.iter().copied().collect();
        let events = self.stream(Box::new(move |e: &Event| wanted.contains(&e.originator_id)))?;
        for event in events {
            let event = event?;
            if let Some(history) = grouped.get_mut(&event.originator_id) {
                history.push(event);
            }
        }

        Ok(ids
            .iter()
            .map(|id| grouped.remove(id).unwrap_or_default())
            .collect())
    }

    /// Reconstruct the entities with the given ids. Ids without any events
    /// are skipped.
    pub fn replay_events<A: Aggregate>(&self, ids: &[EntityId]) -> Result<Vec<A>, CoreError> {
        let mut entities = Vec::with_capacity(ids.len());
        for history in self.histories(ids)? {
            if let Some(entity) = replay::<A>(&history)? {
                entities.push(entity);
            }
        }
        debug!(kind = %A::KIND, count = entities.len(), "Replayed entities");
        Ok(entities)
    }
}
