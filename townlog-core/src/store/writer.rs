//! Appending events to the town log.

use super::log_path;
use crate::config::{AppendMode, StoreConfig};
use crate::error::Result;
use crate::lock::FileLock;
use crate::types::{Event, EventKind};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append discipline for an [`EventLog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Whether appends rely on atomic append or always take the lock
    pub append_mode: AppendMode,
    /// Largest record (bytes) written under the shared lock in `Atomic` mode;
    /// longer records take the exclusive lock
    pub atomic_write_limit: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions::from(&StoreConfig::default())
    }
}

impl From<&StoreConfig> for StoreOptions {
    fn from(config: &StoreConfig) -> Self {
        Self {
            append_mode: config.append_mode,
            atomic_write_limit: config.atomic_write_limit,
        }
    }
}

/// Writer handle for one town's event log.
///
/// Holds only the path and options; every [`EventLog::append`] is a fresh
/// open/write/close, so a handle can be shared freely within a process and
/// many processes can append to the same file at once.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
    options: StoreOptions,
}

impl EventLog {
    /// Writer for `<root>/logs/town.log` with default options.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self::with_options(root, StoreOptions::default())
    }

    /// Writer with explicit append options.
    pub fn with_options(root: impl AsRef<Path>, options: StoreOptions) -> Self {
        Self {
            path: log_path(root.as_ref()),
            options,
        }
    }

    /// Path of the log file this handle appends to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stamp and append one event, returning what was written.
    pub fn append(&self, kind: EventKind, agent: &str, context: Option<&str>) -> Result<Event> {
        let event = Event::new(kind, agent, context.map(str::to_string));
        self.append_raw(&event)?;
        Ok(event)
    }

    /// Append an already-built event verbatim, keeping its timestamp.
    ///
    /// For copying or importing existing records. New events go through
    /// [`EventLog::append`], which stamps the time at the call.
    pub fn append_raw(&self, event: &Event) -> Result<()> {
        let line = event.to_line()?;
        let file = self.open_for_append()?;

        let exclusive = match self.options.append_mode {
            AppendMode::Locked => true,
            AppendMode::Atomic => line.len() > self.options.atomic_write_limit,
        };

        // Small atomic appends share the lock with each other; anything that
        // might be split waits for them to drain and holds off new ones.
        let _lock = if exclusive {
            tracing::debug!(
                bytes = line.len(),
                mode = ?self.options.append_mode,
                "Appending under exclusive lock"
            );
            FileLock::exclusive(&file)?
        } else {
            FileLock::shared(&file)?
        };
        write_record(&file, line.as_bytes())?;

        tracing::trace!(kind = %event.kind, agent = %event.agent, "Appended event");
        Ok(())
    }

    fn open_for_append(&self) -> Result<File> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        Ok(OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?)
    }
}

/// Write a full record with a single `write` call.
///
/// A regular file opened with `O_APPEND` takes the whole buffer in one call in
/// practice; if the kernel ever returns short, the remainder is written
/// immediately and the event is reported since the record may have been split.
fn write_record(mut file: &File, record: &[u8]) -> Result<()> {
    let written = file.write(record)?;
    if written < record.len() {
        tracing::warn!(
            written,
            total = record.len(),
            "Short append; completing record in a second write"
        );
        file.write_all(&record[written..])?;
    }
    Ok(())
}

/// Append one event to the town log at `root` with default options.
pub fn append(
    root: impl AsRef<Path>,
    kind: EventKind,
    agent: &str,
    context: Option<&str>,
) -> Result<Event> {
    EventLog::new(root).append(kind, agent, context)
}
