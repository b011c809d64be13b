//! Embedded JavaScript driver.
//!
//! The binary carries the driver that talks to the project's vite and Vue
//! installations. It is written into the project's `node_modules/.cache`
//! so that bare imports (`vite`, `jsdom`, `@vue/server-renderer`) resolve
//! against the project, not against the binary's location.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Driver source.
pub const DRIVER_JS: &str = include_str!("driver.mjs");

/// Location of the installed driver under the project root.
const DRIVER_PATH: &str = "node_modules/.cache/vite-ssg/driver.mjs";

/// Install the driver under `root`, returning its path.
///
/// The file is only rewritten when its content differs.
pub fn install_driver(root: &Path) -> Result<PathBuf> {
    let path = root.join(DRIVER_PATH);
    if fs::read_to_string(&path).is_ok_and(|existing| existing == DRIVER_JS) {
        return Ok(path);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&path, DRIVER_JS).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_install_driver() {
        let dir = TempDir::new().unwrap();
        let path = install_driver(dir.path()).unwrap();

        assert!(path.ends_with("node_modules/.cache/vite-ssg/driver.mjs"));
        assert_eq!(fs::read_to_string(&path).unwrap(), DRIVER_JS);
    }

    #[test]
    fn test_install_replaces_stale_driver() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DRIVER_PATH);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "// old").unwrap();

        install_driver(dir.path()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), DRIVER_JS);
    }

    #[test]
    fn test_driver_commands() {
        for command in ["'resolve-config'", "build,", "'build-ssr'", "app:"] {
            assert!(DRIVER_JS.contains(command), "driver lacks {command}");
        }
    }

    #[test]
    fn test_server_build_replaces_input() {
        // assigned in a `config` hook after the file config is merged in
        assert!(DRIVER_JS.contains("plugins: [serverEntry(config.input)]"));
        assert!(DRIVER_JS.contains("enforce: 'post'"));
        assert!(DRIVER_JS.contains("userConfig.build.rollupOptions.input = input"));
    }
}
