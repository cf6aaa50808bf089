//! Producer-side helpers for recording agent lifecycle events.
//!
//! Two kinds of callers write to the town log:
//!
//! - **Direct callers** (the `townlog record` command, tools whose job is to
//!   write the log) use [`record`] or the `log_*` wrappers and get the raw
//!   error back.
//! - **Incidental callers** (an agent manager noting that it just spawned or
//!   woke something) must never fail their primary action because the log
//!   could not be written. They use [`record_quietly`] or wrap a `log_*`
//!   result in [`quiet`], which report the failure through `tracing` and
//!   carry on.

use crate::error::Result;
use crate::store::EventLog;
use crate::types::EventKind;
use std::path::Path;

/// Record one event, surfacing any failure.
pub fn record(root: impl AsRef<Path>, kind: EventKind, agent: &str, context: &str) -> Result<()> {
    EventLog::new(root).append(kind, agent, Some(context))?;
    Ok(())
}

/// Record one event; failures are logged and swallowed.
pub fn record_quietly(root: impl AsRef<Path>, kind: EventKind, agent: &str, context: &str) {
    let root = root.as_ref();
    if let Err(e) = record(root, kind.clone(), agent, context) {
        tracing::warn!(
            root = %root.display(),
            kind = %kind,
            agent,
            error = %e,
            "Failed to record lifecycle event"
        );
    }
}

/// Discard the outcome of an incidental `log_*` call, logging failures.
pub fn quiet(result: Result<()>) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "Failed to record lifecycle event");
    }
}

/// Record that an agent was spawned to work on `issue_id`.
pub fn log_spawn(root: impl AsRef<Path>, agent: &str, issue_id: &str) -> Result<()> {
    record(root, EventKind::Spawn, agent, issue_id)
}

/// Record that an agent resumed.
pub fn log_wake(root: impl AsRef<Path>, agent: &str, context: &str) -> Result<()> {
    record(root, EventKind::Wake, agent, context)
}

/// Record a message injected into an agent. Surrounding whitespace is
/// trimmed.
pub fn log_nudge(root: impl AsRef<Path>, agent: &str, message: &str) -> Result<()> {
    record(root, EventKind::Nudge, agent, message.trim())
}

/// Record a handoff to a fresh session.
pub fn log_handoff(root: impl AsRef<Path>, agent: &str, context: &str) -> Result<()> {
    record(root, EventKind::Handoff, agent, context)
}

/// Record that an agent completed `issue_id`.
pub fn log_done(root: impl AsRef<Path>, agent: &str, issue_id: &str) -> Result<()> {
    record(root, EventKind::Done, agent, issue_id)
}

/// Record an unexpected exit.
pub fn log_crash(root: impl AsRef<Path>, agent: &str, reason: &str) -> Result<()> {
    record(root, EventKind::Crash, agent, reason)
}

/// Record an intentional kill.
pub fn log_kill(root: impl AsRef<Path>, agent: &str, reason: &str) -> Result<()> {
    record(root, EventKind::Kill, agent, reason)
}
