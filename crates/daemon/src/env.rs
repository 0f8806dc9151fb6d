// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Notegate Contributors

//! Environment variable lookups for daemon configuration.

use std::path::PathBuf;

/// Environment variable names, generated at build time so the daemon and its
/// documentation cannot drift apart.
pub mod names {
    include!(concat!(env!("OUT_DIR"), "/env_names.rs"));
}

/// Explicit state directory override, if set.
pub fn state_dir() -> Option<PathBuf> {
    std::env::var(names::NOTEGATE_STATE_DIR)
        .ok()
        .map(PathBuf::from)
}

/// XDG base directory for state data, if set.
pub fn xdg_state_home() -> Option<PathBuf> {
    std::env::var(names::XDG_STATE_HOME).ok().map(PathBuf::from)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
