use crate::error::{ConsistencyError, DiscardedEntityError};
use crate::event::Event;
use crate::id::EntityId;

/// Identity, version and lifecycle bookkeeping shared by every entity.
///
/// The version equals the number of events applied since creation; it only
/// ever moves through [`EntityBase::increment_version`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityBase {
    kind: &'static str,
    id: EntityId,
    version: u64,
    discarded: bool,
}

impl EntityBase {
    pub fn new(kind: &'static str, id: EntityId, version: u64) -> Self {
        Self {
            kind,
            id,
            version,
            discarded: false,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_discarded(&self) -> bool {
        self.discarded
    }

    pub fn check_not_discarded(&self) -> Result<(), DiscardedEntityError> {
        if self.discarded {
            return Err(DiscardedEntityError {
                kind: self.kind,
                id: self.id,
            });
        }
        Ok(())
    }

    /// Reject events produced for another entity or against another version.
    pub fn validate_event_originator(&self, event: &Event) -> Result<(), ConsistencyError> {
        if event.originator_id != self.id {
            return Err(ConsistencyError::OriginatorMismatch {
                expected: self.id,
                found: event.originator_id,
            });
        }
        if event.originator_version != self.version {
            return Err(ConsistencyError::VersionMismatch {
                id: self.id,
                expected: self.version,
                found: event.originator_version,
            });
        }
        Ok(())
    }

    pub(crate) fn increment_version(&mut self) {
        self.version += 1;
    }

    pub(crate) fn mark_discarded(&mut self) {
        self.discarded = true;
    }
}
