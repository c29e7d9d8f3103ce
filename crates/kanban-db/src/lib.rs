//! Kanban DB - durable implementations of the event store.
//!
//! Two backends share one record codec: an append-only JSON-lines file and
//! a redb database.

pub mod codec;
pub mod event_store;
pub mod jsonl_store;
pub mod tables;

pub use codec::StoredEvent;
pub use event_store::RedbEventStore;
pub use jsonl_store::JsonlEventStore;

use std::path::Path;
use std::sync::Arc;

use redb::Database;

use kanban_core::StorageError;

/// Initialize a database with all required tables.
pub fn init_database(path: impl AsRef<Path>) -> Result<Arc<Database>, StorageError> {
    let db = Database::create(path).map_err(|e| StorageError::Database(e.to_string()))?;

    RedbEventStore::init_tables(&db)?;

    Ok(Arc::new(db))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanban_core::EventStore;
    use tempfile::tempdir;

    #[test]
    fn test_init_database() {
        let dir = tempdir().unwrap();
        let db = init_database(dir.path().join("test.redb")).unwrap();

        let store = RedbEventStore::new(db);
        assert!(store.all_events().unwrap().is_empty());
    }
}
