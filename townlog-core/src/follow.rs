//! Live follow of the town log (`tail -f` semantics).
//!
//! The follower polls the file size and streams every newly completed line to
//! the caller's writer. Lines are passed through raw; filtering and tail
//! counts belong to the one-shot read path.
//!
//! Memory use is bounded: at most `backlog` lines during start-up and the
//! unterminated tail of one record while it is being written.

use crate::config::FollowConfig;
use crate::error::{Error, Result};
use crate::store::log_path;
use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Options for [`follow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowOptions {
    /// How often to check the file for growth
    pub poll_interval: Duration,
    /// Existing lines shown before streaming starts
    pub backlog: usize,
    /// Consecutive polls the log may be missing before following stops
    pub missing_polls: u32,
}

impl Default for FollowOptions {
    fn default() -> Self {
        FollowOptions::from(&FollowConfig::default())
    }
}

impl From<&FollowConfig> for FollowOptions {
    fn from(config: &FollowConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_ms),
            backlog: config.backlog,
            missing_polls: config.missing_polls,
        }
    }
}

/// Incremental reader over a growing log file.
pub struct Follower {
    path: PathBuf,
    file: File,
    identity: (u64, u64),
    offset: u64,
    pending: Vec<u8>,
    missing: u32,
    missing_limit: u32,
}

impl Follower {
    /// Open the town log for following, creating it (empty) if absent.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let path = log_path(root.as_ref());
        ensure_log_file(&path)?;

        let file = File::open(&path)?;
        let identity = file_identity(&file.metadata()?);

        Ok(Self {
            path,
            file,
            identity,
            offset: 0,
            pending: Vec::new(),
            missing: 0,
            missing_limit: FollowConfig::default().missing_polls,
        })
    }

    /// Tolerate the log being absent for up to `polls` consecutive polls,
    /// as happens between a rotation's rename and the next append.
    pub fn with_missing_polls(mut self, polls: u32) -> Self {
        self.missing_limit = polls;
        self
    }

    /// Path being followed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset up to which the file has been consumed.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Write the last `lines` complete lines currently in the file and
    /// position the follower at the end of the file.
    ///
    /// Returns the number of lines written.
    pub fn emit_backlog(&mut self, lines: usize, out: &mut impl Write) -> Result<usize> {
        self.file.seek(SeekFrom::Start(0))?;
        self.pending.clear();
        let mut reader = BufReader::new(&self.file);
        let mut window: VecDeque<Vec<u8>> = VecDeque::with_capacity(lines.min(1024));
        let mut consumed = 0u64;

        loop {
            let mut line = Vec::new();
            let n = reader.read_until(b'\n', &mut line)?;
            if n == 0 {
                break;
            }
            consumed += n as u64;

            if line.last() != Some(&b'\n') {
                // Record still being written; hold it until its newline lands.
                self.pending = line;
                break;
            }
            if lines > 0 {
                if window.len() == lines {
                    window.pop_front();
                }
                window.push_back(line);
            }
        }

        self.offset = consumed;

        let count = window.len();
        for line in window {
            out.write_all(&line)?;
        }
        out.flush()?;
        Ok(count)
    }

    /// Emit any complete lines appended since the last call.
    ///
    /// Returns the number of lines written. A missing log is waited for;
    /// fails with [`Error::LogUnavailable`] once it has been missing for more
    /// than the allowed number of consecutive polls.
    pub fn poll(&mut self, out: &mut impl Write) -> Result<usize> {
        let on_disk = match fs::metadata(&self.path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.missing += 1;
                if self.missing > self.missing_limit {
                    return Err(Error::LogUnavailable(self.path.clone()));
                }
                if self.missing == 1 {
                    tracing::debug!(
                        path = %self.path.display(),
                        "Log file missing, waiting for it to return"
                    );
                }
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };

        // A file that comes back after a gap is always a new file, even if the
        // filesystem hands out the old inode number again.
        let returned = std::mem::take(&mut self.missing) > 0;

        if returned || file_identity(&on_disk) != self.identity {
            tracing::warn!(path = %self.path.display(), "Log file replaced, reopening");
            self.file = File::open(&self.path)?;
            self.identity = file_identity(&self.file.metadata()?);
            self.reset();
        }

        let size = self.file.metadata()?.len();
        if size < self.offset {
            tracing::warn!(
                path = %self.path.display(),
                offset = self.offset,
                size,
                "Log file truncated, following from the beginning"
            );
            self.reset();
        }
        if size == self.offset {
            return Ok(0);
        }

        self.file.seek(SeekFrom::Start(self.offset))?;
        let read = (&self.file)
            .take(size - self.offset)
            .read_to_end(&mut self.pending)?;
        self.offset += read as u64;

        let Some(last_newline) = self.pending.iter().rposition(|b| *b == b'\n') else {
            return Ok(0);
        };

        let complete: Vec<u8> = self.pending.drain(..=last_newline).collect();
        let count = complete.iter().filter(|b| **b == b'\n').count();
        out.write_all(&complete)?;
        out.flush()?;
        Ok(count)
    }

    fn reset(&mut self) {
        self.offset = 0;
        self.pending.clear();
    }
}

/// Stream the town log to `out` until `running` turns false.
///
/// Emits the configured backlog first, then each new line as it is appended.
/// Returns `Ok(())` on cancellation, or the first I/O failure.
pub fn follow(
    root: impl AsRef<Path>,
    options: &FollowOptions,
    running: &AtomicBool,
    out: &mut impl Write,
) -> Result<()> {
    let mut follower = Follower::open(root)?.with_missing_polls(options.missing_polls);
    follower.emit_backlog(options.backlog, out)?;

    tracing::info!(
        path = %follower.path().display(),
        offset = follower.offset(),
        poll_ms = options.poll_interval.as_millis() as u64,
        "Following town log"
    );

    while running.load(Ordering::SeqCst) {
        follower.poll(out)?;
        thread::sleep(options.poll_interval);
    }

    tracing::info!("Follow stopped");
    Ok(())
}

fn ensure_log_file(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)?;
    Ok(())
}

fn file_identity(meta: &fs::Metadata) -> (u64, u64) {
    (meta.dev(), meta.ino())
}
