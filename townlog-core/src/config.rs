//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/townlog/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/townlog/` (~/.config/townlog/)
//! - State/Logs: `$XDG_STATE_HOME/townlog/` (~/.local/state/townlog/)
//!
//! The town event log itself is not here; it always lives under the town
//! root at `<root>/logs/town.log`.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Town root used when none is given on the command line
    #[serde(default)]
    pub town_root: Option<PathBuf>,

    /// Event store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Follow (live tail) configuration
    #[serde(default)]
    pub follow: FollowConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How appends are protected against concurrent writers in other processes.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppendMode {
    /// One `write` per record on an `O_APPEND` descriptor. Records longer than
    /// `atomic_write_limit` are written under the advisory lock.
    #[default]
    Atomic,
    /// Every append holds the advisory lock (network filesystems and other
    /// backends without atomic append).
    Locked,
}

/// Event store configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Append discipline
    #[serde(default)]
    pub append_mode: AppendMode,

    /// Largest record (bytes, including newline) trusted to append atomically
    #[serde(default = "default_atomic_write_limit")]
    pub atomic_write_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            append_mode: AppendMode::default(),
            atomic_write_limit: default_atomic_write_limit(),
        }
    }
}

fn default_atomic_write_limit() -> usize {
    4096
}

/// Follow configuration
#[derive(Debug, Deserialize, Clone)]
pub struct FollowConfig {
    /// Poll interval in milliseconds
    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,

    /// Lines of existing history shown before streaming
    #[serde(default = "default_backlog")]
    pub backlog: usize,

    /// Consecutive polls the log may be missing (e.g. mid-rotation) before
    /// following gives up
    #[serde(default = "default_missing_polls")]
    pub missing_polls: u32,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            poll_ms: default_poll_ms(),
            backlog: default_backlog(),
            missing_polls: default_missing_polls(),
        }
    }
}

fn default_poll_ms() -> u64 {
    250
}

fn default_backlog() -> usize {
    10
}

fn default_missing_polls() -> u32 {
    20
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::debug!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.store.atomic_write_limit == 0 {
            return Err(Error::Config(
                "store.atomic_write_limit must be greater than 0".to_string(),
            ));
        }
        if self.follow.poll_ms == 0 {
            return Err(Error::Config(
                "follow.poll_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/townlog/config.toml` (~/.config/townlog/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("townlog").join("config.toml")
    }

    /// Returns the state directory path (for diagnostic logs)
    ///
    /// `$XDG_STATE_HOME/townlog/` (~/.local/state/townlog/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("townlog")
    }

    /// Returns today's diagnostic log file
    ///
    /// `$XDG_STATE_HOME/townlog/townlog.<YYYY-MM-DD>.log`, dated in UTC like the
    /// daily rolling appender names its files.
    pub fn log_path() -> PathBuf {
        let today = chrono::Utc::now().format("%Y-%m-%d");
        Self::state_dir().join(format!("townlog.{}.log", today))
    }
}
