use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, trace};

use kanban_core::{replay, Aggregate, CoreError, EntityId, EventStore, LookupError};

use crate::cache::LruCache;
use crate::player::EventPlayer;

/// Default number of reconstructed entities kept per repository.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Reconstructs aggregates of one kind on demand from the event log.
///
/// Reconstructions are cached by id. A cached entity is reused only while
/// its version still equals the version implied by the newest event for
/// that id, so a hit returns the same `Arc` and a stale entry is rebuilt.
pub struct Repository<A: Aggregate, S: EventStore + ?Sized> {
    player: EventPlayer<S>,
    cache: Mutex<LruCache<EntityId, Arc<A>>>,
}

impl<A: Aggregate, S: EventStore + ?Sized> Repository<A, S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_capacity(store, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(store: Arc<S>, capacity: usize) -> Self {
        Self {
            player: EventPlayer::new(store),
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn player(&self) -> &EventPlayer<S> {
        &self.player
    }

    /// Every live entity, or the live entities among `ids`.
    pub fn all(&self, ids: Option<&[EntityId]>) -> Result<Vec<Arc<A>>, CoreError> {
        self.all_where(|_| true, ids)
    }

    /// Live entities satisfying `predicate`, in creation order when `ids` is
    /// `None`, otherwise in the order of `ids`. Discarded entities and ids
    /// with no history are left out.
    pub fn all_where<P>(&self, predicate: P, ids: Option<&[EntityId]>) -> Result<Vec<Arc<A>>, CoreError>
    where
        P: Fn(&A) -> bool,
    {
        let ids = match ids {
            Some(ids) => ids.to_vec(),
            None => self.player.extant_entity_ids(A::KIND)?,
        };
        let histories = self.player.histories(&ids)?;

        let mut found = Vec::new();
        for (id, history) in ids.into_iter().zip(histories) {
            let Some(last) = history.last() else {
                continue;
            };
            let expected_version = last.originator_version + 1;
            // A history whose length disagrees with its newest version holds a
            // conflicting event; only a full replay reports it.
            let consistent = u64::try_from(history.len()) == Ok(expected_version);

            let cached = if consistent {
                self.cached(id, expected_version)
            } else {
                self.forget(id);
                None
            };
            let entity = match cached {
                Some(entity) => entity,
                None => {
                    let Some(entity) = replay::<A>(&history)? else {
                        continue;
                    };
                    let entity = Arc::new(entity);
                    self.remember(id, entity.clone());
                    entity
                }
            };

            if !entity.is_discarded() && predicate(entity.as_ref()) {
                found.push(entity);
            }
        }
        Ok(found)
    }

    /// The single live entity with this id.
    pub fn with_id(&self, id: EntityId) -> Result<Arc<A>, CoreError> {
        // A one-id filter yields at most one entity; `exactly_one` still
        // rejects any other count.
        exactly_one(self.all(Some(std::slice::from_ref(&id)))?, id)
    }

    /// Every live entity with exactly this name.
    pub fn with_name(&self, name: &str) -> Result<Vec<Arc<A>>, CoreError> {
        self.all_where(|entity| entity.name().is_ok_and(|n| n == name), None)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn cached(&self, id: EntityId, expected_version: u64) -> Option<Arc<A>> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let entity = cache.get(&id)?.clone();
        let version = entity.version();
        if version == expected_version {
            trace!(%id, version, "Cache hit");
            return Some(entity);
        }
        trace!(%id, cached = version, expected_version, "Stale cache entry");
        cache.remove(&id);
        None
    }

    fn forget(&self, id: EntityId) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }

    fn remember(&self, id: EntityId, entity: Arc<A>) {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((evicted, _)) = cache.put(id, entity) {
            debug!(%evicted, "Evicted from reconstruction cache");
        }
    }
}

fn exactly_one<A: Aggregate>(mut found: Vec<Arc<A>>, id: EntityId) -> Result<Arc<A>, CoreError> {
    match found.len() {
        1 => Ok(found.remove(0)),
        0 => Err(LookupError::NotFound { kind: A::KIND, id }.into()),
        count => Err(LookupError::Ambiguous {
            kind: A::KIND,
            id,
            count,
        }
        .into()),
    }
}
