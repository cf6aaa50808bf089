//! Core domain types for townlog
//!
//! An [`Event`] is one immutable lifecycle record for one agent. Events live on
//! disk as one JSON object per line in `<root>/logs/town.log`:
//!
//! ```text
//! {"ts":"2026-10-16T09:45:00.123456789Z","type":"spawn","agent":"town/crew/max","context":"issue-42"}
//! ```
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Town** | A workspace root managing many agents; owns one event log |
//! | **Agent** | Subject of an event, named by a path-like id (`town/crew/max`) |
//! | **Kind** | What happened: spawn, wake, nudge, handoff, done, crash, kill |
//! | **Context** | Optional free text (issue id, reason, nudge message) |
//!
//! ### Context: absent vs empty
//!
//! `context: None` is omitted from the record entirely, while `Some("")` is
//! written as `"context":""`. Both read back exactly as written.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Event kinds
// ============================================

/// Lifecycle event kind.
///
/// Unknown kinds written by newer producers are kept verbatim in
/// [`EventKind::Other`] so that they survive a read/write cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    /// New agent created
    Spawn,
    /// Agent resumed
    Wake,
    /// Message injected into agent
    Nudge,
    /// Agent handed off to a fresh session
    Handoff,
    /// Agent finished work
    Done,
    /// Agent exited unexpectedly
    Crash,
    /// Agent killed intentionally
    Kill,
    /// Any kind this build does not know about
    Other(String),
}

impl EventKind {
    /// The kinds this build knows about, in lifecycle order.
    pub const KNOWN: [EventKind; 7] = [
        EventKind::Spawn,
        EventKind::Wake,
        EventKind::Nudge,
        EventKind::Handoff,
        EventKind::Done,
        EventKind::Crash,
        EventKind::Kill,
    ];

    /// Returns the identifier used in the log file
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Spawn => "spawn",
            EventKind::Wake => "wake",
            EventKind::Nudge => "nudge",
            EventKind::Handoff => "handoff",
            EventKind::Done => "done",
            EventKind::Crash => "crash",
            EventKind::Kill => "kill",
            EventKind::Other(raw) => raw,
        }
    }

    /// Whether this is one of the [`EventKind::KNOWN`] kinds.
    pub fn is_known(&self) -> bool {
        !matches!(self, EventKind::Other(_))
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for EventKind {
    fn from(s: &str) -> Self {
        match s {
            "spawn" => EventKind::Spawn,
            "wake" => EventKind::Wake,
            "nudge" => EventKind::Nudge,
            "handoff" => EventKind::Handoff,
            "done" => EventKind::Done,
            "crash" => EventKind::Crash,
            "kill" => EventKind::Kill,
            other => EventKind::Other(other.to_string()),
        }
    }
}

impl From<String> for EventKind {
    fn from(s: String) -> Self {
        match EventKind::from(s.as_str()) {
            EventKind::Other(_) => EventKind::Other(s),
            known => known,
        }
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

// ============================================
// Event
// ============================================

/// One lifecycle occurrence for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// When the event was appended (assigned by the writer)
    pub ts: DateTime<Utc>,
    /// What happened
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Hierarchical agent id, e.g. `town/crew/max`
    pub agent: String,
    /// Optional annotation; `Some("")` is distinct from `None`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Event {
    /// Create an event stamped with the current time.
    pub fn new(kind: EventKind, agent: impl Into<String>, context: Option<String>) -> Self {
        Self {
            ts: Utc::now(),
            kind,
            agent: agent.into(),
            context,
        }
    }

    /// Serialize as a single newline-terminated record.
    pub fn to_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    /// Parse one record. Surrounding whitespace (including the trailing
    /// newline) is ignored.
    pub fn from_line(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line.trim())?)
    }

    /// Parse one record from raw bytes; invalid UTF-8 is a parse failure.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Context text, with `None` read as empty.
    pub fn context_str(&self) -> &str {
        self.context.as_deref().unwrap_or("")
    }
}
