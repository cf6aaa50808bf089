//! Event store for the town log
//!
//! The store is a single append-only JSONL file per town:
//!
//! ```text
//! <root>/
//! └── logs/
//!     └── town.log      one Event per line, oldest first
//! ```
//!
//! ## Concurrency
//!
//! Writers are independent OS processes. Each append opens the file with
//! `O_APPEND`, writes the whole record with one `write` call and closes it, so
//! records never interleave as long as they stay within the filesystem's
//! atomic-append size. Backends without that guarantee are configured with
//! [`AppendMode::Locked`](crate::config::AppendMode::Locked), which wraps each
//! write in an advisory `flock`.
//!
//! Readers take a best-effort snapshot: the whole file is read once and each
//! line parsed independently. A corrupt or half-written line costs only that
//! record.

mod reader;
mod writer;

pub use reader::{load, log_exists, read_all, LoadResult};
pub use writer::{append, EventLog, StoreOptions};

use std::path::{Path, PathBuf};

/// Directory under the town root holding the event log.
pub const LOG_DIR: &str = "logs";

/// Event log file name.
pub const LOG_FILE: &str = "town.log";

/// Path of the event log for a town root: `<root>/logs/town.log`.
pub fn log_path(root: &Path) -> PathBuf {
    root.join(LOG_DIR).join(LOG_FILE)
}
