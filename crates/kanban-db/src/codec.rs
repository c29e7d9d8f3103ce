//! Conversion between domain events and log records.
//!
//! A record is `{topic, timestamp, attributes}` where `attributes` holds the
//! originator id and version alongside the event-specific fields. The topic
//! alone selects the concrete event type at decode time.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use kanban_core::{BoardEvent, EntityId, Event, Payload, StorageError, WorkItemEvent};

const ORIGINATOR_ID: &str = "originator_id";
const ORIGINATOR_VERSION: &str = "originator_version";

/// One entry of the event log as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub topic: String,
    pub timestamp: DateTime<Utc>,
    pub attributes: Map<String, Value>,
}

fn codec_err(e: serde_json::Error) -> StorageError {
    StorageError::Codec(e.to_string())
}

fn body(payload: &Payload) -> Result<Value, serde_json::Error> {
    match payload {
        Payload::Board(event) => match event {
            BoardEvent::Created(e) => serde_json::to_value(e),
            BoardEvent::AttributeChanged(e) => serde_json::to_value(e),
            BoardEvent::ColumnAttributeChanged(e) => serde_json::to_value(e),
            BoardEvent::NewColumnAdded(e) => serde_json::to_value(e),
            BoardEvent::NewColumnInserted(e) => serde_json::to_value(e),
            BoardEvent::ColumnRemoved(e) => serde_json::to_value(e),
            BoardEvent::WorkItemScheduled(e) => serde_json::to_value(e),
            BoardEvent::WorkItemAbandoned(e) => serde_json::to_value(e),
            BoardEvent::WorkItemAdvanced(e) => serde_json::to_value(e),
            BoardEvent::WorkItemRetired(e) => serde_json::to_value(e),
            BoardEvent::Discarded(e) => serde_json::to_value(e),
        },
        Payload::WorkItem(event) => match event {
            WorkItemEvent::Created(e) => serde_json::to_value(e),
            WorkItemEvent::AttributeChanged(e) => serde_json::to_value(e),
            WorkItemEvent::Discarded(e) => serde_json::to_value(e),
        },
    }
}

fn field<T: DeserializeOwned>(body: Value) -> Result<T, StorageError> {
    serde_json::from_value(body).map_err(codec_err)
}

fn payload(topic: &str, body: Value) -> Result<Payload, StorageError> {
    let payload: Payload = match topic {
        "Board.Created" => BoardEvent::Created(field(body)?).into(),
        "Board.AttributeChanged" => BoardEvent::AttributeChanged(field(body)?).into(),
        "Board.ColumnAttributeChanged" => BoardEvent::ColumnAttributeChanged(field(body)?).into(),
        "Board.NewColumnAdded" => BoardEvent::NewColumnAdded(field(body)?).into(),
        "Board.NewColumnInserted" => BoardEvent::NewColumnInserted(field(body)?).into(),
        "Board.ColumnRemoved" => BoardEvent::ColumnRemoved(field(body)?).into(),
        "Board.WorkItemScheduled" => BoardEvent::WorkItemScheduled(field(body)?).into(),
        "Board.WorkItemAbandoned" => BoardEvent::WorkItemAbandoned(field(body)?).into(),
        "Board.WorkItemAdvanced" => BoardEvent::WorkItemAdvanced(field(body)?).into(),
        "Board.WorkItemRetired" => BoardEvent::WorkItemRetired(field(body)?).into(),
        "Board.Discarded" => BoardEvent::Discarded(field(body)?).into(),
        "WorkItem.Created" => WorkItemEvent::Created(field(body)?).into(),
        "WorkItem.AttributeChanged" => WorkItemEvent::AttributeChanged(field(body)?).into(),
        "WorkItem.Discarded" => WorkItemEvent::Discarded(field(body)?).into(),
        other => return Err(StorageError::UnknownTopic(other.to_string())),
    };
    Ok(payload)
}

/// Convert an event into its log record.
pub fn encode(event: &Event) -> Result<StoredEvent, StorageError> {
    let mut attributes = match body(&event.payload).map_err(codec_err)? {
        Value::Object(map) => map,
        other => {
            return Err(StorageError::Codec(format!(
                "{} body is not an object: {other}",
                event.topic()
            )))
        }
    };
    attributes.insert(
        ORIGINATOR_ID.to_string(),
        serde_json::to_value(event.originator_id).map_err(codec_err)?,
    );
    attributes.insert(
        ORIGINATOR_VERSION.to_string(),
        Value::from(event.originator_version),
    );

    Ok(StoredEvent {
        topic: event.topic().to_string(),
        timestamp: event.timestamp,
        attributes,
    })
}

/// Recreate an event from its log record.
pub fn decode(stored: StoredEvent) -> Result<Event, StorageError> {
    let StoredEvent {
        topic,
        timestamp,
        mut attributes,
    } = stored;

    let originator_id: EntityId = attributes
        .remove(ORIGINATOR_ID)
        .ok_or_else(|| StorageError::Codec(format!("{topic} record has no {ORIGINATOR_ID}")))
        .and_then(field)?;
    let originator_version: u64 = attributes
        .remove(ORIGINATOR_VERSION)
        .ok_or_else(|| StorageError::Codec(format!("{topic} record has no {ORIGINATOR_VERSION}")))
        .and_then(field)?;

    let payload = payload(&topic, Value::Object(attributes))?;
    Ok(Event {
        originator_id,
        originator_version,
        timestamp,
        payload,
    })
}

/// Encode an event as compact JSON bytes.
pub fn to_bytes(event: &Event) -> Result<Vec<u8>, StorageError> {
    serde_json::to_vec(&encode(event)?).map_err(codec_err)
}

/// Decode an event from JSON bytes.
pub fn from_bytes(bytes: &[u8]) -> Result<Event, StorageError> {
    decode(serde_json::from_slice(bytes).map_err(codec_err)?)
}
