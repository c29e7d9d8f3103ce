use std::sync::Arc;

use redb::{Database, ReadableTable};
use tracing::trace;

use kanban_core::{Event, EventFilter, EventStore, EventStream, StorageError};

use crate::codec;
use crate::tables::EVENTS_TABLE;

fn db_err(e: impl std::fmt::Display) -> StorageError {
    StorageError::Database(e.to_string())
}

/// redb implementation of EventStore.
///
/// Every append is its own write transaction, so redb's single-writer lock
/// gives the log its total order. Streams read from one read transaction and
/// therefore never see appends committed after they were opened.
pub struct RedbEventStore {
    db: Arc<Database>,
}

impl RedbEventStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Initialize the database tables.
    pub fn init_tables(db: &Database) -> Result<(), StorageError> {
        let write_txn = db.begin_write().map_err(db_err)?;
        {
            let _ = write_txn.open_table(EVENTS_TABLE).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;
        Ok(())
    }
}

impl EventStore for RedbEventStore {
    fn append(&self, event: &Event) -> Result<(), StorageError> {
        let value = codec::to_bytes(event)?;

        let write_txn = self.db.begin_write().map_err(db_err)?;
        let position = {
            let mut table = write_txn.open_table(EVENTS_TABLE).map_err(db_err)?;

            let position = table
                .last()
                .map_err(db_err)?
                .map(|(key, _)| key.value() + 1)
                .unwrap_or(0);

            table
                .insert(position, value.as_slice())
                .map_err(db_err)?;
            position
        };
        write_txn.commit().map_err(db_err)?;

        trace!(position, topic = event.topic(), "Event appended");
        Ok(())
    }

    fn open_stream<'a>(&'a self, filter: EventFilter<'a>) -> Result<EventStream<'a>, StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(EVENTS_TABLE).map_err(db_err)?;

        let mut records = Vec::new();
        for entry in table.iter().map_err(db_err)? {
            let (_, value) = entry.map_err(db_err)?;
            records.push(value.value().to_vec());
        }

        Ok(Box::new(records.into_iter().filter_map(move |bytes| {
            match codec::from_bytes(&bytes) {
                Ok(event) => filter(&event).then_some(Ok(event)),
                Err(e) => Some(Err(e)),
            }
        })))
    }
}
