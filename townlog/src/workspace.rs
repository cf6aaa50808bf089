//! Town root resolution for the CLI.
//!
//! The core library always takes the root as an explicit path; this module is
//! the only place that looks at flags, config or the current directory.

use std::path::{Path, PathBuf};
use townlog_core::store::log_path;
use townlog_core::{Config, Error, Result};

/// Resolve the town root.
///
/// Order: explicit `--root`/`GT_TOWN_ROOT`, then `town_root` from config, then
/// the nearest ancestor of `cwd` that already has a town log.
pub fn resolve_root(explicit: Option<&Path>, config: &Config, cwd: &Path) -> Result<PathBuf> {
    if let Some(root) = explicit {
        return require_dir(root, "--root");
    }

    if let Some(root) = &config.town_root {
        return require_dir(root, "town_root in config");
    }

    find_from(cwd).ok_or_else(|| {
        Error::WorkspaceNotFound(format!(
            "no logs/town.log above {}; pass --root or set GT_TOWN_ROOT",
            cwd.display()
        ))
    })
}

/// Nearest ancestor of `start` (inclusive) containing `logs/town.log`.
pub fn find_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| log_path(dir).is_file())
        .map(Path::to_path_buf)
}

fn require_dir(root: &Path, source: &str) -> Result<PathBuf> {
    if root.is_dir() {
        Ok(root.to_path_buf())
    } else {
        Err(Error::WorkspaceNotFound(format!(
            "{} ({}) is not a directory",
            root.display(),
            source
        )))
    }
}
