//! Human-readable rendering of town events.

use chrono::{DateTime, Utc};
use townlog_core::format::{format_age, format_timestamp};
use townlog_core::{Event, EventKind};

/// Longest nudge message shown before truncation.
const NUDGE_PREVIEW_CHARS: usize = 40;

/// One listing row: `<time> [<type>] <agent> <detail>`.
pub fn event_row(event: &Event) -> String {
    format!(
        "{} [{}] {} {}",
        format_timestamp(event.ts),
        event.kind,
        event.agent,
        event_detail(event)
    )
}

/// Listing row followed by the event's age, for verbose output.
pub fn event_row_with_age(event: &Event, now: DateTime<Utc>) -> String {
    format!("{} ({})", event_row(event), format_age(event.ts, now))
}

/// Sentence describing what happened to the agent.
pub fn event_detail(event: &Event) -> String {
    let context = event.context_str();
    let has_context = !context.is_empty();

    match &event.kind {
        EventKind::Spawn if has_context => format!("spawned for {}", context),
        EventKind::Spawn => "spawned".to_string(),
        EventKind::Wake if has_context => format!("resumed ({})", context),
        EventKind::Wake => "resumed".to_string(),
        EventKind::Nudge if has_context => {
            format!("nudged with {:?}", truncate(context, NUDGE_PREVIEW_CHARS))
        }
        EventKind::Nudge => "nudged".to_string(),
        EventKind::Handoff if has_context => format!("handed off ({})", context),
        EventKind::Handoff => "handed off".to_string(),
        EventKind::Done if has_context => format!("completed {}", context),
        EventKind::Done => "completed work".to_string(),
        EventKind::Crash if has_context => format!("exited unexpectedly ({})", context),
        EventKind::Crash => "exited unexpectedly".to_string(),
        EventKind::Kill if has_context => format!("killed ({})", context),
        EventKind::Kill => "killed".to_string(),
        EventKind::Other(raw) if has_context => format!("{} ({})", raw, context),
        EventKind::Other(raw) => raw.clone(),
    }
}

/// Shorten to at most `max_chars` characters, ending in `...` when cut.
fn truncate(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let cut = input
        .char_indices()
        .nth(keep)
        .map(|(idx, _)| idx)
        .unwrap_or(input.len());
    format!("{}...", &input[..cut])
}
