//! Reading the town log back.

use super::log_path;
use crate::error::Result;
use crate::types::Event;
use std::fs;
use std::io;
use std::path::Path;

/// Result of loading the whole log.
#[derive(Debug, Default)]
pub struct LoadResult {
    /// Parsed events, in file (append) order
    pub events: Vec<Event>,
    /// Number of non-blank records that failed to parse
    pub skipped: usize,
    /// One warning per skipped record (non-fatal)
    pub warnings: Vec<String>,
}

/// Whether the town has an event log yet.
///
/// A missing file is `Ok(false)`; any other metadata failure is an error.
pub fn log_exists(root: impl AsRef<Path>) -> Result<bool> {
    match fs::metadata(log_path(root.as_ref())) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Read every parseable event, skipping corrupt records.
///
/// A missing or empty log yields an empty vector.
pub fn read_all(root: impl AsRef<Path>) -> Result<Vec<Event>> {
    Ok(load(root)?.events)
}

/// Read every parseable event and report what was skipped.
pub fn load(root: impl AsRef<Path>) -> Result<LoadResult> {
    let path = log_path(root.as_ref());

    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LoadResult::default()),
        Err(e) => return Err(e.into()),
    };

    let result = parse_records(&bytes);

    if result.skipped > 0 {
        tracing::warn!(
            path = %path.display(),
            skipped = result.skipped,
            parsed = result.events.len(),
            "Skipped corrupt records in town log"
        );
    }

    Ok(result)
}

/// Split a log snapshot into lines and parse each record on its own.
pub(crate) fn parse_records(bytes: &[u8]) -> LoadResult {
    let mut result = LoadResult::default();
    let mut offset = 0usize;

    for (index, raw) in bytes.split(|b| *b == b'\n').enumerate() {
        let record_offset = offset;
        offset += raw.len() + 1;

        let record = raw.strip_suffix(b"\r").unwrap_or(raw);
        if record.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        match Event::from_slice(record) {
            Ok(event) => result.events.push(event),
            Err(e) => {
                let warning = format!("line {} (offset {}): {}", index + 1, record_offset, e);
                tracing::debug!(%warning, "Skipping record");
                result.skipped += 1;
                result.warnings.push(warning);
            }
        }
    }

    result
}
