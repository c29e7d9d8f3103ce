//! Mutator dispatch: current state is the left fold over past events.

use crate::error::CoreError;
use crate::event::Event;
use crate::id::{EntityId, EntityKind};

/// An entity whose state is fully determined by folding its events.
pub trait Aggregate: Sized + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> EntityId;

    fn version(&self) -> u64;

    fn is_discarded(&self) -> bool;

    fn name(&self) -> Result<&str, CoreError>;

    /// Apply one event to the prior state.
    ///
    /// `prior` is `None` only for the creation event. Each event kind has
    /// exactly one case; an event of another aggregate type is rejected.
    fn mutate(prior: Option<Self>, event: &Event) -> Result<Self, CoreError>;
}

/// Fold an ordered event sequence from an absent state.
///
/// Returns `Ok(None)` for an empty sequence.
pub fn replay<'a, A: Aggregate>(
    events: impl IntoIterator<Item = &'a Event>,
) -> Result<Option<A>, CoreError> {
    events
        .into_iter()
        .try_fold(None, |state, event| A::mutate(state, event).map(Some))
}
