use redb::TableDefinition;

/// Table for storing the event log.
/// Key: position in the log, starting at 0
/// Value: event record as JSON bytes
pub const EVENTS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("events");
