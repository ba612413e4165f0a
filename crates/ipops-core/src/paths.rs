// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// User state directory and PATH resolution.

use std::path::{Path, PathBuf};

use crate::error::{IpopsError, Result};

/// Return the per-application state directory, creating it if needed.
///
/// Follows the XDG convention: `$XDG_STATE_HOME`, then
/// `$HOME/.local/state`, then `/tmp` as a last resort.
pub fn state_dir(app: &str) -> PathBuf {
    let dir = state_base().join(app);
    std::fs::create_dir_all(&dir).ok();
    dir
}

fn state_base() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        if !xdg.is_empty() {
            return PathBuf::from(xdg);
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        if !home.is_empty() {
            return PathBuf::from(home).join(".local").join("state");
        }
    }
    // Last resort
    PathBuf::from("/tmp")
}

/// Resolve an executable name against `$PATH`.
///
/// Used for the startup preflight of every external utility this system
/// drives, so a missing tool fails with a named error before any work
/// starts instead of at the first invocation.
pub fn find_executable(name: &str) -> Result<PathBuf> {
    let search_path = std::env::var_os("PATH").unwrap_or_default();
    for dir in std::env::split_paths(&search_path) {
        if dir.as_os_str().is_empty() {
            continue;
        }
        let candidate = dir.join(name);
        if is_executable_file(&candidate) {
            return Ok(candidate);
        }
    }
    Err(IpopsError::MissingExecutable(name.to_owned()))
}

fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    match std::fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_executable_is_reported_by_name() {
        let err = find_executable("ipops-test-no-such-tool").unwrap_err();
        assert!(matches!(err, IpopsError::MissingExecutable(name) if name == "ipops-test-no-such-tool"));
    }

    #[test]
    fn finds_a_ubiquitous_tool() {
        // `sh` is mandated by POSIX; every CI image has it.
        assert!(find_executable("sh").is_ok());
    }
}
