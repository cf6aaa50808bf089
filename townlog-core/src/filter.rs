//! Filtering and tail-limiting of event sequences.
//!
//! Everything here is pure: no I/O, input order preserved.

use crate::types::{Event, EventKind};
use chrono::{DateTime, Duration, Utc};

/// Criteria for narrowing a sequence of events.
///
/// Unset fields impose no constraint; set fields are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    /// Exact kind match
    pub kind: Option<EventKind>,
    /// Agent id must start with this prefix (empty matches all)
    pub agent_prefix: Option<String>,
    /// Inclusive lower bound on the event timestamp
    pub since: Option<DateTime<Utc>>,
}

impl Filter {
    /// Filter that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one kind.
    pub fn with_kind(mut self, kind: impl Into<EventKind>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Restrict to agents under a prefix such as `town/crew/`.
    pub fn with_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.agent_prefix = Some(prefix.into());
        self
    }

    /// Keep events at or after `since`.
    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// True when no constraint is set.
    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.agent_prefix.is_none() && self.since.is_none()
    }

    /// Whether a single event satisfies every set constraint.
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(kind) = &self.kind {
            if event.kind != *kind {
                return false;
            }
        }
        if let Some(prefix) = &self.agent_prefix {
            if !event.agent.starts_with(prefix.as_str()) {
                return false;
            }
        }
        if let Some(since) = self.since {
            if event.ts < since {
                return false;
            }
        }
        true
    }
}

/// Keep the events matching `filter`, in their original order.
pub fn apply(events: Vec<Event>, filter: &Filter) -> Vec<Event> {
    if filter.is_empty() {
        return events;
    }
    events.into_iter().filter(|e| filter.matches(e)).collect()
}

/// Keep the last `limit` events in their original order.
///
/// `limit == 0` means no limit.
pub fn tail(mut events: Vec<Event>, limit: usize) -> Vec<Event> {
    if limit > 0 && events.len() > limit {
        events.drain(..events.len() - limit);
    }
    events
}

/// Lower bound for a relative window ending at `now`.
pub fn since_from_window(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    now.checked_sub_signed(window)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
