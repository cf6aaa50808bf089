//! # townlog-core
//!
//! Core library for the town activity log: a shared, append-only record of
//! agent lifecycle events written concurrently by many processes.
//!
//! This library provides:
//! - The [`Event`] model and its one-line JSON record format
//! - The event store: concurrency-safe [`store::append`] and tolerant
//!   [`store::read_all`]
//! - The pure [`filter`] engine (kind, agent prefix, time lower bound, tail)
//! - Live [`follow`] of newly appended records
//! - Configuration and logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use townlog_core::filter::{self, Filter};
//! use townlog_core::{lifecycle, store, EventKind};
//!
//! let root = std::path::Path::new("/srv/town");
//! lifecycle::log_spawn(root, "town/crew/max", "issue-42").expect("append failed");
//!
//! let events = store::read_all(root).expect("read failed");
//! let spawns = filter::apply(events, &Filter::new().with_kind(EventKind::Spawn));
//! for event in filter::tail(spawns, 20) {
//!     println!("{} {} {}", event.ts, event.kind, event.agent);
//! }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use filter::Filter;
pub use store::EventLog;
pub use types::{Event, EventKind};

// Public modules
pub mod config;
pub mod error;
pub mod filter;
pub mod follow;
pub mod format;
pub mod lifecycle;
pub mod lock;
pub mod logging;
pub mod store;
pub mod types;
