//! Configuration lookup helpers.

use std::path::{Path, PathBuf};

/// Mode used when neither the CLI, `ssg.toml` nor the environment sets one.
pub const DEFAULT_MODE: &str = "production";

/// Override config files probed at the project root, in order.
pub const OVERRIDE_CONFIG_FILES: [&str; 2] = ["vite.ssg.config.js", "vite.ssg.config.ts"];

/// Find config file by searching upward from `start`
///
/// ```text
/// /home/user/app/src/pages/  ← start
/// /home/user/app/ssg.toml    ← found!
/// ```
pub fn find_config_file(config_name: &Path, start: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.is_file() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

/// Read the build mode from `MODE`, then `NODE_ENV`.
///
/// Empty values count as unset. Falls back to [`DEFAULT_MODE`].
pub fn mode_from_env(var: impl Fn(&str) -> Option<String>) -> String {
    ["MODE", "NODE_ENV"]
        .into_iter()
        .filter_map(|key| var(key))
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_MODE.to_string())
}

/// Locate the server-build override config at the project root.
pub fn find_override_config(root: &Path) -> Option<PathBuf> {
    OVERRIDE_CONFIG_FILES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
}

// ============================================================================
// tests
// ============================================================================
