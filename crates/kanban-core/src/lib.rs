//! Kanban Core - Event-sourced domain model.
//!
//! Boards and work items never store their current state; it is always the
//! fold of their events through [`Aggregate::mutate`]. This crate has no
//! dependencies on other kanban crates.

pub mod board;
pub mod clock;
pub mod entity;
pub mod error;
pub mod event;
pub mod hub;
pub mod id;
pub mod lead_time;
pub mod mutator;
pub mod storage;
pub mod validation;
pub mod work_item;

// Re-exports for convenience
pub use board::{Board, Column};
pub use clock::{Clock, ManualClock, SystemClock};
pub use entity::EntityBase;
pub use error::{
    ConsistencyError, ConstraintError, CoreError, DiscardedEntityError, LookupError, StorageError,
    ValidationError,
};
pub use event::{BoardEvent, Event, Payload, WorkItemEvent};
pub use hub::{DomainContext, EventHandler, EventPredicate, MessageHub};
pub use id::{EntityId, EntityKind};
pub use lead_time::LeadTimeState;
pub use mutator::{replay, Aggregate};
pub use storage::{EventFilter, EventStore, EventStream};
pub use validation::Validator;
pub use work_item::WorkItem;

#[cfg(any(test, feature = "test-utils"))]
pub use storage::memory::InMemoryEventStore;
