use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, trace, warn};

use kanban_core::{Event, EventFilter, EventStore, EventStream, StorageError};

use crate::codec;

fn io_err(e: std::io::Error) -> StorageError {
    StorageError::Io(e.to_string())
}

/// Append handle plus the length of the log up to its last complete record.
struct Writer {
    file: File,
    committed: u64,
}

impl Writer {
    /// Cut the file back to the last complete record.
    fn truncate_to_committed(&mut self) -> std::io::Result<()> {
        self.file.set_len(self.committed)?;
        self.file.sync_data()
    }

    fn append_line(&mut self, line: &[u8]) -> Result<(), StorageError> {
        let length = self.file.metadata().map_err(io_err)?.len();
        if length != self.committed {
            warn!(
                length,
                committed = self.committed,
                "Discarding incomplete record at end of event log"
            );
            self.truncate_to_committed().map_err(io_err)?;
        }

        let written = self
            .file
            .write_all(line)
            .and_then(|()| self.file.flush())
            .and_then(|()| self.file.sync_data());
        if let Err(e) = written {
            if let Err(rollback) = self.truncate_to_committed() {
                warn!(error = %rollback, "Failed to roll back partial append");
            }
            return Err(io_err(e));
        }

        self.committed += line.len() as u64;
        Ok(())
    }
}

/// Event log kept as a file of JSON records, one per line.
///
/// Appends are serialized through the writer lock and synced to disk before
/// returning. A failed append leaves no partial record behind. A stream only
/// reads the records committed when it was opened.
pub struct JsonlEventStore {
    path: PathBuf,
    writer: Mutex<Writer>,
}

impl JsonlEventStore {
    /// Open the log at `path`, creating an empty one if it does not exist.
    ///
    /// A non-empty log whose last record is not newline-terminated is
    /// rejected.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;

        let committed = file.metadata().map_err(io_err)?.len();
        if committed > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1)).map_err(io_err)?;
            file.read_exact(&mut last).map_err(io_err)?;
            if last[0] != b'\n' {
                return Err(StorageError::Codec(format!(
                    "{} ends with an incomplete record",
                    path.display()
                )));
            }
        }

        debug!(path = %path.display(), bytes = committed, "Opened event log");
        Ok(Self {
            path,
            writer: Mutex::new(Writer { file, committed }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventStore for JsonlEventStore {
    fn append(&self, event: &Event) -> Result<(), StorageError> {
        let mut line = codec::to_bytes(event)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.append_line(&line)?;

        trace!(topic = event.topic(), "Event appended");
        Ok(())
    }

    fn open_stream<'a>(&'a self, filter: EventFilter<'a>) -> Result<EventStream<'a>, StorageError> {
        let length = self
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .committed;
        let reader = BufReader::new(File::open(&self.path).map_err(io_err)?.take(length));

        Ok(Box::new(reader.lines().filter_map(move |line| {
            let line = match line {
                Ok(line) => line,
                Err(e) => return Some(Err(io_err(e))),
            };
            if line.trim().is_empty() {
                return None;
            }
            match codec::from_bytes(line.as_bytes()) {
                Ok(event) => filter(&event).then_some(Ok(event)),
                Err(e) => Some(Err(e)),
            }
        })))
    }
}
