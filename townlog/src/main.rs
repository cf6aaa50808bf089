//! townlog - town activity log
//!
//! Views and records the centralized log of agent lifecycle events kept at
//! `<town>/logs/town.log`.
//!
//! Events logged include:
//!   spawn   - new agent created
//!   wake    - agent resumed
//!   nudge   - message injected into agent
//!   handoff - agent handed off to fresh session
//!   done    - agent finished work
//!   crash   - agent exited unexpectedly
//!   kill    - agent killed intentionally
//!
//! Uses XDG Base Directory specification for its own files:
//! - Config: $XDG_CONFIG_HOME/townlog/config.toml (~/.config/townlog/config.toml)
//! - Logs: $XDG_STATE_HOME/townlog/ (~/.local/state/townlog/)

mod event_format;
mod workspace;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use townlog_core::filter::{self, Filter};
use townlog_core::follow::{follow, FollowOptions};
use townlog_core::format::parse_duration;
use townlog_core::store::{self, EventLog, StoreOptions};
use townlog_core::{Config, EventKind};

#[derive(Parser)]
#[command(name = "townlog")]
#[command(about = "View and record town agent lifecycle events")]
#[command(version)]
struct Args {
    /// Town root (defaults to config town_root, then the nearest parent with
    /// logs/town.log; a town with no events yet must be named explicitly)
    #[arg(long, global = true, env = "GT_TOWN_ROOT")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show recent events
    #[command(after_help = "Examples:
  townlog log                     # Show last 20 events
  townlog log -n 50               # Show last 50 events
  townlog log --type spawn        # Show only spawn events
  townlog log --agent gastown/    # Show events for gastown rig
  townlog log --since 1h          # Show events from last hour
  townlog log -f                  # Follow log (like tail -f)

Without --root, the town is found by walking up to a directory that already
has logs/town.log. Use --root or GT_TOWN_ROOT for a town with no events yet.")]
    Log(LogArgs),

    /// Append one event to the log
    Record {
        /// Event type (spawn, wake, nudge, handoff, done, crash, kill, or a custom type)
        #[arg(value_name = "TYPE")]
        kind: String,

        /// Agent id, e.g. gastown/crew/max
        agent: String,

        /// Context (issue id, reason, message)
        #[arg(default_value = "")]
        context: String,
    },
}

#[derive(clap::Args)]
struct LogArgs {
    /// Number of events to show (0 shows all)
    #[arg(short = 'n', long, default_value = "20")]
    tail: usize,

    /// Filter by event type (spawn,wake,nudge,handoff,done,crash,kill)
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    kind: Option<String>,

    /// Filter by agent prefix (e.g., gastown/, gastown/crew/max)
    #[arg(short, long)]
    agent: Option<String>,

    /// Show events since duration (e.g., 1h, 30m, 24h)
    #[arg(long)]
    since: Option<String>,

    /// Follow log output (like tail -f)
    #[arg(short, long)]
    follow: bool,

    /// Show each event's age and report records that could not be parsed
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging (to file; stdout carries the event listing)
    let _log_guard =
        townlog_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let cwd = std::env::current_dir().context("failed to read current directory")?;

    match args.command {
        Command::Log(log_args) => {
            // Validate the window before touching the workspace.
            let filter = build_filter(&log_args)?;
            let root = workspace::resolve_root(args.root.as_deref(), &config, &cwd)?;
            tracing::debug!(root = %root.display(), "Resolved town root");

            if log_args.follow {
                run_follow(&root, &config)
            } else {
                run_show(&root, &log_args, &filter)
            }
        }
        Command::Record {
            kind,
            agent,
            context,
        } => {
            // Recording is how a town gets its first log, so an explicit root
            // is accepted even before logs/town.log exists.
            let root = match args.root.as_deref() {
                Some(root) => root.to_path_buf(),
                None => workspace::resolve_root(None, &config, &cwd)?,
            };
            run_record(&root, &config, &kind, &agent, &context)
        }
    }
}

/// Translate command-line criteria into a [`Filter`].
fn build_filter(args: &LogArgs) -> Result<Filter> {
    let mut filter = Filter::new();

    if let Some(kind) = args.kind.as_deref().filter(|k| !k.is_empty()) {
        filter = filter.with_kind(kind);
    }

    if let Some(agent) = args.agent.as_deref().filter(|a| !a.is_empty()) {
        filter = filter.with_agent_prefix(agent);
    }

    if let Some(since) = args.since.as_deref().filter(|s| !s.is_empty()) {
        let window = parse_duration(since).context("invalid --since duration")?;
        filter = filter.with_since(filter::since_from_window(chrono::Utc::now(), window));
    }

    Ok(filter)
}

/// One-shot listing: read, filter, tail, render.
fn run_show(root: &Path, args: &LogArgs, filter: &Filter) -> Result<()> {
    if !store::log_exists(root).context("checking for log file")? {
        println!("○ No log file yet (no events recorded)");
        return Ok(());
    }

    let loaded = store::load(root).context("reading events")?;

    if args.verbose {
        for warning in &loaded.warnings {
            eprintln!("warning: skipped {}", warning);
        }
    }

    if loaded.events.is_empty() {
        println!("○ No events in log");
        return Ok(());
    }

    let total = loaded.events.len();
    let events = filter::tail(filter::apply(loaded.events, filter), args.tail);

    tracing::debug!(total, shown = events.len(), "Rendering events");

    if events.is_empty() {
        println!("○ No events match filter");
        return Ok(());
    }

    let now = chrono::Utc::now();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for event in &events {
        let row = if args.verbose {
            event_format::event_row_with_age(event, now)
        } else {
            event_format::event_row(event)
        };
        writeln!(out, "{}", row)?;
    }

    Ok(())
}

/// Stream new lines until Ctrl+C.
fn run_follow(root: &Path, config: &Config) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("failed to set Ctrl+C handler")?;

    println!(
        "○ Following {} (Ctrl+C to stop)\n",
        store::log_path(root).display()
    );

    let options = FollowOptions::from(&config.follow);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    follow(root, &options, &running, &mut out).context("following log")?;

    tracing::info!("townlog follow stopped");
    Ok(())
}

/// Direct writer path: failures are reported to the user.
fn run_record(root: &Path, config: &Config, kind: &str, agent: &str, context: &str) -> Result<()> {
    if kind.trim().is_empty() {
        anyhow::bail!("event type must not be empty");
    }
    if agent.trim().is_empty() {
        anyhow::bail!("agent must not be empty");
    }

    let kind = EventKind::from(kind);
    if !kind.is_known() {
        tracing::info!(kind = %kind, "Recording custom event type");
    }

    let log = EventLog::with_options(root, StoreOptions::from(&config.store));
    let context = if kind == EventKind::Nudge {
        context.trim()
    } else {
        context
    };
    let event = log
        .append(kind, agent, Some(context))
        .with_context(|| format!("failed to append to {}", log.path().display()))?;

    tracing::info!(kind = %event.kind, agent = %event.agent, "Recorded event");
    Ok(())
}
