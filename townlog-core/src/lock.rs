//! Advisory `flock` locks on the log file's own descriptor.
//!
//! Appenders that trust append-mode atomicity hold a shared lock while they
//! write, so they run side by side. Appenders that cannot (oversized records,
//! or [`AppendMode::Locked`](crate::config::AppendMode)) hold an exclusive
//! lock, which waits out every shared holder and keeps new ones out until the
//! record is complete.

use std::fs::File;
use std::io;
use std::os::fd::AsRawFd;

/// Advisory lock held for the lifetime of the guard.
pub struct FileLock<'a> {
    file: &'a File,
}

impl<'a> FileLock<'a> {
    /// Block until an exclusive lock on `file` is held.
    pub fn exclusive(file: &'a File) -> io::Result<Self> {
        lock_file_blocking(file)?;
        Ok(Self { file })
    }

    /// Block until a shared lock on `file` is held.
    pub fn shared(file: &'a File) -> io::Result<Self> {
        flock_checked(file, LOCK_SH)?;
        Ok(Self { file })
    }

    /// Try to take an exclusive lock without blocking.
    ///
    /// Returns `Ok(None)` when another descriptor holds the lock.
    pub fn try_exclusive(file: &'a File) -> io::Result<Option<Self>> {
        match lock_file_nonblocking(file) {
            Ok(()) => Ok(Some(Self { file })),
            Err(e) if is_lock_busy(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl Drop for FileLock<'_> {
    fn drop(&mut self) {
        if let Err(e) = unlock_file(self.file) {
            tracing::warn!(error = %e, "Failed to release log file lock");
        }
    }
}

fn is_lock_busy(error: &io::Error) -> bool {
    matches!(error.kind(), io::ErrorKind::WouldBlock)
        || matches!(error.raw_os_error(), Some(11) | Some(35))
}

const LOCK_SH: i32 = 1;
const LOCK_EX: i32 = 2;
const LOCK_NB: i32 = 4;
const LOCK_UN: i32 = 8;

#[cfg(unix)]
fn flock_checked(file: &File, operation: i32) -> io::Result<()> {
    let fd = file.as_raw_fd();
    loop {
        // SAFETY: flock is called with a valid file descriptor and constant flags.
        let rc = unsafe { flock(fd, operation) };
        if rc == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

#[cfg(unix)]
fn lock_file_blocking(file: &File) -> io::Result<()> {
    flock_checked(file, LOCK_EX)
}

#[cfg(unix)]
fn lock_file_nonblocking(file: &File) -> io::Result<()> {
    flock_checked(file, LOCK_EX | LOCK_NB)
}

#[cfg(unix)]
fn unlock_file(file: &File) -> io::Result<()> {
    flock_checked(file, LOCK_UN)
}

#[cfg(unix)]
extern "C" {
    fn flock(fd: i32, operation: i32) -> i32;
}

#[cfg(not(unix))]
compile_error!("townlog advisory locks currently require Unix (macOS/Linux)");
