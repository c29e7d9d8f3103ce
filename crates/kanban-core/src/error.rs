use thiserror::Error;

use crate::id::{EntityId, EntityKind};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Constraint violation: {0}")]
    Constraint(#[from] ConstraintError),

    #[error("Discarded entity: {0}")]
    Discarded(#[from] DiscardedEntityError),

    #[error("Inconsistent state: {0}")]
    Consistency(#[from] ConsistencyError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),
}

impl CoreError {
    /// True for every domain-rule violation, work-limit exhaustion included.
    pub fn is_constraint(&self) -> bool {
        matches!(self, CoreError::Constraint(_))
    }

    /// True only when a column's work-in-progress limit blocked the command.
    pub fn is_work_limit(&self) -> bool {
        matches!(self, CoreError::Constraint(ConstraintError::WorkLimit { .. }))
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    #[error("Column name {0:?} is not distinct from existing column names")]
    DuplicateColumnName(String),

    #[error("No column with name {0:?}")]
    UnknownColumnName(String),

    #[error("Column {0} is not part of board {1}")]
    ColumnNotOnBoard(EntityId, EntityId),

    #[error("Work item {0} is not on board {1}")]
    WorkItemNotOnBoard(EntityId, EntityId),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstraintError {
    #[error("Board {0} has no columns")]
    NoColumns(EntityId),

    #[error("Work item {0} is already scheduled")]
    AlreadyScheduled(EntityId),

    #[error("Cannot remove non-empty column {name:?} ({count} work items)")]
    ColumnNotEmpty { name: String, count: usize },

    #[error("Cannot advance work item {0} from the last column")]
    LastColumn(EntityId),

    #[error("Work item {0} is not available for retiring from the last column")]
    NotInLastColumn(EntityId),

    #[error("Column {column:?} is at or exceeding its work-in-progress limit of {limit}")]
    WorkLimit { column: String, limit: u32 },
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind} {id} has been discarded")]
pub struct DiscardedEntityError {
    pub kind: &'static str,
    pub id: EntityId,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConsistencyError {
    #[error("Event originator {found} does not match entity {expected}")]
    OriginatorMismatch { expected: EntityId, found: EntityId },

    #[error("Event version {found} does not match version {expected} of entity {id}")]
    VersionMismatch {
        id: EntityId,
        expected: u64,
        found: u64,
    },

    #[error("No mutator for {topic} against {target}")]
    UnhandledEvent { topic: &'static str, target: &'static str },

    #[error("Creation event {topic} applied to existing entity {id}")]
    AlreadyCreated { topic: &'static str, id: EntityId },

    #[error("First event for {id} is {topic}, not a creation event")]
    MissingCreation { topic: &'static str, id: EntityId },

    #[error("Duplicate {kind} creation for id {id}")]
    DuplicateCreation { kind: EntityKind, id: EntityId },

    #[error("Discarding non-existent {kind} for id {id}")]
    DiscardOfUnknown { kind: EntityKind, id: EntityId },

    #[error("No column with id {0} during replay")]
    UnknownColumn(EntityId),

    #[error("Column index {index} out of range during replay of {board}")]
    ColumnIndexOutOfRange { board: EntityId, index: usize },

    #[error("Event designates work item {expected} at priority {priority}, found {found:?}")]
    PriorityMismatch {
        expected: EntityId,
        priority: usize,
        found: Option<EntityId>,
    },

    #[error("Duplicate work item scheduled with id {0}")]
    DuplicateSchedule(EntityId),

    #[error("Retiring non-existent work item with id {0}")]
    RetireUntracked(EntityId),

    #[error("Abandoning non-existent work item with id {0}")]
    AbandonUntracked(EntityId),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Unknown event topic: {0}")]
    UnknownTopic(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    #[error("No {kind} with id {id}")]
    NotFound { kind: EntityKind, id: EntityId },

    #[error("Expected exactly one {kind} with id {id}, found {count}")]
    Ambiguous {
        kind: EntityKind,
        id: EntityId,
        count: usize,
    },
}
