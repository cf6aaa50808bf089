//! Integration tests for the town event log
//!
//! These exercise the store, filter and follow paths together against real
//! files in temporary town roots, plus the fixture in `tests/fixtures/`.

use chrono::{Duration, TimeZone, Utc};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;
use tempfile::TempDir;
use townlog_core::config::AppendMode;
use townlog_core::filter::{self, Filter};
use townlog_core::follow::{follow, FollowOptions};
use townlog_core::store::{self, EventLog, StoreOptions};
use townlog_core::{lifecycle, Event, EventKind};

/// Get the path to a fixture file
fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Create a town root whose log is a copy of a fixture
fn town_with_fixture(name: &str) -> TempDir {
    let dir = TempDir::new().expect("failed to create temp dir");
    let logs = dir.path().join(store::LOG_DIR);
    fs::create_dir_all(&logs).unwrap();
    fs::copy(fixture_path(name), logs.join(store::LOG_FILE)).unwrap();
    dir
}

// ============================================
// Store
// ============================================

#[test]
fn test_spawn_wake_filtered_to_spawn() {
    let dir = TempDir::new().unwrap();

    store::append(dir.path(), EventKind::Spawn, "town/crew/max", Some("issue-42")).unwrap();
    store::append(dir.path(), EventKind::Wake, "town/crew/max", Some("")).unwrap();

    let events = store::read_all(dir.path()).unwrap();
    let spawns = filter::apply(events, &Filter::new().with_kind("spawn"));

    assert_eq!(spawns.len(), 1);
    assert_eq!(spawns[0].kind, EventKind::Spawn);
    assert_eq!(spawns[0].context.as_deref(), Some("issue-42"));
}

#[test]
fn test_n_appends_read_back_in_order() {
    let dir = TempDir::new().unwrap();
    let log = EventLog::new(dir.path());

    let written: Vec<Event> = (0..50)
        .map(|i| {
            log.append(EventKind::Nudge, "town/crew/max", Some(&format!("msg {}", i)))
                .unwrap()
        })
        .collect();

    assert_eq!(store::read_all(dir.path()).unwrap(), written);
}

#[test]
fn test_corrupt_fixture_skips_one_line() {
    let dir = town_with_fixture("corrupt.log");

    let result = store::load(dir.path()).unwrap();

    assert_eq!(result.events.len(), 10);
    assert_eq!(result.skipped, 1);
    assert!(result.warnings[0].starts_with("line 7 "));
    assert_eq!(result.events[1].context.as_deref(), Some(""));
    assert_eq!(
        result.events[8].kind,
        EventKind::Other("merge_queue".to_string())
    );
}

#[test]
fn test_unknown_kind_survives_rewrite() {
    let dir = town_with_fixture("corrupt.log");
    let events = store::read_all(dir.path()).unwrap();

    let copy = TempDir::new().unwrap();
    let log = EventLog::new(copy.path());
    for event in &events {
        log.append_raw(event).unwrap();
    }

    assert_eq!(store::read_all(copy.path()).unwrap(), events);
}

#[test]
fn test_fixture_filters() {
    let dir = town_with_fixture("corrupt.log");
    let events = store::read_all(dir.path()).unwrap();

    let agent0 = filter::apply(
        events.clone(),
        &Filter::new().with_agent_prefix("town/crew/agent0"),
    );
    assert_eq!(agent0.len(), 4);

    let since = Utc.with_ymd_and_hms(2026, 3, 1, 12, 6, 0).unwrap();
    let recent = filter::apply(events.clone(), &Filter::new().with_since(since));
    assert_eq!(recent.len(), 4);
    assert_eq!(recent[0].kind, EventKind::Kill);

    let last_three = filter::tail(
        filter::apply(events, &Filter::new().with_agent_prefix("town/")),
        3,
    );
    assert_eq!(last_three.len(), 3);
    assert_eq!(last_three[2].context.as_deref(), Some("issue-9"));
}

// ============================================
// Concurrent writers
// ============================================

fn hammer(root: PathBuf, options: StoreOptions, writers: usize, per_writer: usize) {
    hammer_with_padding(root, options, writers, per_writer, |w| 200 + w * 37);
}

fn hammer_with_padding(
    root: PathBuf,
    options: StoreOptions,
    writers: usize,
    per_writer: usize,
    padding: fn(usize) -> usize,
) {
    let handles: Vec<_> = (0..writers)
        .map(|w| {
            let root = root.clone();
            thread::spawn(move || {
                // Each writer gets its own handle, like a separate process would.
                let log = EventLog::with_options(&root, options);
                let padding = "p".repeat(padding(w));
                for m in 0..per_writer {
                    log.append(
                        EventKind::Wake,
                        &format!("town/writer-{}", w),
                        Some(&format!("{}:{}", m, padding)),
                    )
                    .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

fn assert_all_records_intact(root: &std::path::Path, writers: usize, per_writer: usize) {
    let raw = fs::read_to_string(store::log_path(root)).unwrap();
    assert_eq!(raw.lines().count(), writers * per_writer);
    for line in raw.lines() {
        Event::from_line(line).unwrap_or_else(|e| panic!("corrupt record {:?}: {}", line, e));
    }

    let events = store::read_all(root).unwrap();
    assert_eq!(events.len(), writers * per_writer);

    // Per-writer order is preserved even though writers interleave.
    for w in 0..writers {
        let seq: Vec<usize> = events
            .iter()
            .filter(|e| e.agent == format!("town/writer-{}", w))
            .map(|e| {
                e.context_str()
                    .split(':')
                    .next()
                    .unwrap()
                    .parse()
                    .unwrap()
            })
            .collect();
        assert_eq!(seq, (0..per_writer).collect::<Vec<_>>());
    }
}

#[test]
fn test_concurrent_writers_atomic_mode() {
    let dir = TempDir::new().unwrap();
    hammer(dir.path().to_path_buf(), StoreOptions::default(), 8, 200);
    assert_all_records_intact(dir.path(), 8, 200);
}

#[test]
fn test_concurrent_writers_locked_mode() {
    let dir = TempDir::new().unwrap();
    let options = StoreOptions {
        append_mode: AppendMode::Locked,
        ..StoreOptions::default()
    };
    hammer(dir.path().to_path_buf(), options, 6, 100);
    assert_all_records_intact(dir.path(), 6, 100);
}

#[test]
fn test_concurrent_oversized_records_use_lock() {
    let dir = TempDir::new().unwrap();
    let options = StoreOptions {
        append_mode: AppendMode::Atomic,
        atomic_write_limit: 128,
    };
    hammer(dir.path().to_path_buf(), options, 4, 100);
    assert_all_records_intact(dir.path(), 4, 100);
}

#[test]
fn test_concurrent_mixed_small_and_oversized_records() {
    let dir = TempDir::new().unwrap();
    let options = StoreOptions {
        append_mode: AppendMode::Atomic,
        atomic_write_limit: 256,
    };
    // Even writers stay well under the limit, odd writers go well over it.
    hammer_with_padding(dir.path().to_path_buf(), options, 6, 150, |w| {
        if w % 2 == 0 {
            8
        } else {
            2000 + w
        }
    });
    assert_all_records_intact(dir.path(), 6, 150);
}

// ============================================
// Follow
// ============================================

/// Writer shared between the follow thread and the test.
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    fn wait_for_lines(&self, count: usize) -> Vec<String> {
        let deadline = Instant::now() + std::time::Duration::from_secs(10);
        loop {
            let lines: Vec<String> = self.text().lines().map(str::to_string).collect();
            if lines.len() >= count || Instant::now() > deadline {
                return lines;
            }
            thread::sleep(std::time::Duration::from_millis(10));
        }
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_follow_streams_until_cancelled() {
    let dir = TempDir::new().unwrap();
    lifecycle::log_spawn(dir.path(), "town/crew/max", "issue-1").unwrap();

    let running = Arc::new(AtomicBool::new(true));
    let output = SharedBuf::default();

    let follower = {
        let root = dir.path().to_path_buf();
        let running = running.clone();
        let mut out = output.clone();
        thread::spawn(move || {
            let options = FollowOptions {
                poll_interval: std::time::Duration::from_millis(10),
                backlog: 10,
                ..FollowOptions::default()
            };
            follow(&root, &options, &running, &mut out)
        })
    };

    assert_eq!(output.wait_for_lines(1).len(), 1);

    lifecycle::log_wake(dir.path(), "town/crew/max", "").unwrap();
    lifecycle::log_done(dir.path(), "town/crew/max", "issue-1").unwrap();

    let lines = output.wait_for_lines(3);
    running.store(false, Ordering::SeqCst);
    follower.join().unwrap().unwrap();

    assert_eq!(lines.len(), 3);
    let kinds: Vec<_> = lines
        .iter()
        .map(|l| Event::from_line(l).unwrap().kind)
        .collect();
    assert_eq!(kinds, vec![EventKind::Spawn, EventKind::Wake, EventKind::Done]);
}

#[test]
fn test_follow_creates_missing_log() {
    let dir = TempDir::new().unwrap();
    let running = AtomicBool::new(false);

    follow(dir.path(), &FollowOptions::default(), &running, &mut io::sink()).unwrap();

    assert!(store::log_exists(dir.path()).unwrap());
    assert!(store::read_all(dir.path()).unwrap().is_empty());
}

#[test]
fn test_since_window_against_fresh_events() {
    let dir = TempDir::new().unwrap();
    let log = EventLog::new(dir.path());

    let mut old = Event::new(EventKind::Spawn, "town/crew/max", None);
    old.ts = Utc::now() - Duration::hours(3);
    log.append_raw(&old).unwrap();
    log.append(EventKind::Wake, "town/crew/max", None).unwrap();

    let window = townlog_core::format::parse_duration("1h").unwrap();
    let since = filter::since_from_window(Utc::now(), window);
    let recent = filter::apply(
        store::read_all(dir.path()).unwrap(),
        &Filter::new().with_since(since),
    );

    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].kind, EventKind::Wake);
}
