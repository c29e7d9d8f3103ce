use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{EntityId, EntityKind};

/// An immutable fact about one entity, in the order it happened.
///
/// `originator_version` is the version of the entity *before* this event is
/// applied. Mutators reject the event unless it matches exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub originator_id: EntityId,
    pub originator_version: u64,
    pub timestamp: DateTime<Utc>,
    pub payload: Payload,
}

impl Event {
    pub fn new(
        originator_id: EntityId,
        originator_version: u64,
        timestamp: DateTime<Utc>,
        payload: impl Into<Payload>,
    ) -> Self {
        Self {
            originator_id,
            originator_version,
            timestamp,
            payload: payload.into(),
        }
    }

    pub fn topic(&self) -> &'static str {
        self.payload.topic()
    }

    pub fn kind(&self) -> EntityKind {
        self.payload.kind()
    }

    pub fn is_creation(&self) -> bool {
        matches!(
            self.payload,
            Payload::Board(BoardEvent::Created(_)) | Payload::WorkItem(WorkItemEvent::Created(_))
        )
    }

    pub fn is_discard(&self) -> bool {
        matches!(
            self.payload,
            Payload::Board(BoardEvent::Discarded(_)) | Payload::WorkItem(WorkItemEvent::Discarded(_))
        )
    }

    /// The work item a board event moves, if it moves one.
    pub fn work_item_id(&self) -> Option<EntityId> {
        match &self.payload {
            Payload::Board(BoardEvent::WorkItemScheduled(e)) => Some(e.work_item_id),
            Payload::Board(BoardEvent::WorkItemAbandoned(e)) => Some(e.work_item_id),
            Payload::Board(BoardEvent::WorkItemAdvanced(e)) => Some(e.work_item_id),
            Payload::Board(BoardEvent::WorkItemRetired(e)) => Some(e.work_item_id),
            _ => None,
        }
    }
}

/// Event body, one variant per aggregate type.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Board(BoardEvent),
    WorkItem(WorkItemEvent),
}

impl Payload {
    pub fn kind(&self) -> EntityKind {
        match self {
            Payload::Board(_) => EntityKind::Board,
            Payload::WorkItem(_) => EntityKind::WorkItem,
        }
    }

    /// Stable name of the concrete event type, used as the log topic.
    pub fn topic(&self) -> &'static str {
        match self {
            Payload::Board(event) => match event {
                BoardEvent::Created(_) => "Board.Created",
                BoardEvent::AttributeChanged(_) => "Board.AttributeChanged",
                BoardEvent::ColumnAttributeChanged(_) => "Board.ColumnAttributeChanged",
                BoardEvent::NewColumnAdded(_) => "Board.NewColumnAdded",
                BoardEvent::NewColumnInserted(_) => "Board.NewColumnInserted",
                BoardEvent::ColumnRemoved(_) => "Board.ColumnRemoved",
                BoardEvent::WorkItemScheduled(_) => "Board.WorkItemScheduled",
                BoardEvent::WorkItemAbandoned(_) => "Board.WorkItemAbandoned",
                BoardEvent::WorkItemAdvanced(_) => "Board.WorkItemAdvanced",
                BoardEvent::WorkItemRetired(_) => "Board.WorkItemRetired",
                BoardEvent::Discarded(_) => "Board.Discarded",
            },
            Payload::WorkItem(event) => match event {
                WorkItemEvent::Created(_) => "WorkItem.Created",
                WorkItemEvent::AttributeChanged(_) => "WorkItem.AttributeChanged",
                WorkItemEvent::Discarded(_) => "WorkItem.Discarded",
            },
        }
    }
}

impl From<BoardEvent> for Payload {
    fn from(event: BoardEvent) -> Self {
        Payload::Board(event)
    }
}

impl From<WorkItemEvent> for Payload {
    fn from(event: WorkItemEvent) -> Self {
        Payload::WorkItem(event)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    Created(BoardCreated),
    AttributeChanged(BoardAttribute),
    ColumnAttributeChanged(ColumnAttributeChanged),
    NewColumnAdded(NewColumnAdded),
    NewColumnInserted(NewColumnInserted),
    ColumnRemoved(ColumnRemoved),
    WorkItemScheduled(WorkItemScheduled),
    WorkItemAbandoned(WorkItemAbandoned),
    WorkItemAdvanced(WorkItemAdvanced),
    WorkItemRetired(WorkItemRetired),
    Discarded(Discarded),
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkItemEvent {
    Created(WorkItemCreated),
    AttributeChanged(WorkItemAttribute),
    Discarded(Discarded),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardCreated {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "value", rename_all = "snake_case")]
pub enum BoardAttribute {
    Name(String),
    Description(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "value", rename_all = "snake_case")]
pub enum ColumnAttribute {
    Name(String),
    WipLimit(Option<u32>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnAttributeChanged {
    pub column_id: EntityId,
    pub attribute: ColumnAttribute,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewColumnAdded {
    pub column_id: EntityId,
    pub column_name: String,
    pub wip_limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewColumnInserted {
    pub column_id: EntityId,
    pub column_name: String,
    pub wip_limit: Option<u32>,
    pub succeeding_column_id: EntityId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRemoved {
    pub column_id: EntityId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItemScheduled {
    pub work_item_id: EntityId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItemAbandoned {
    pub work_item_id: EntityId,
    pub column_index: usize,
    pub priority: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItemAdvanced {
    pub work_item_id: EntityId,
    pub source_column_index: usize,
    pub priority: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItemRetired {
    pub work_item_id: EntityId,
    pub priority: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItemCreated {
    pub name: String,
    pub due_date: Option<NaiveDate>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "value", rename_all = "snake_case")]
pub enum WorkItemAttribute {
    Name(String),
    DueDate(Option<NaiveDate>),
    Content(Option<String>),
}

/// Marker body for the terminal event of an entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Discarded {}
