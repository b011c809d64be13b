//! Client and server build config resolution.

use super::{BuildConfig, Bundler, SERVER_ASSETS_DIR, SERVER_ENTRY_NAME};
use crate::config::{BuildOptions, find_override_config};
use crate::debug;
use crate::error::SsgError;
use std::collections::BTreeMap;
use std::path::Path;

/// The two configs of a run.
#[derive(Debug, Clone)]
pub struct BuildConfigs {
    pub client: BuildConfig,
    pub server: BuildConfig,
}

/// Resolve the primary config, then the server config.
///
/// The server config comes from `vite.ssg.config.{js,ts}` at `project_root`
/// when present, otherwise from the primary config itself. Either way only
/// its output directory, assets directory and entry are replaced; every
/// other setting of the source config is kept.
pub fn resolve_build_configs<B: Bundler>(
    bundler: &B,
    mode: &str,
    project_root: &Path,
    options: &BuildOptions,
) -> Result<BuildConfigs, SsgError> {
    let client = bundler
        .resolve_config(mode, None)
        .map_err(SsgError::ConfigResolution)?;

    let base = match find_override_config(project_root) {
        Some(path) => {
            debug!("config"; "server build uses {}", path.display());
            bundler
                .resolve_config(mode, Some(&path))
                .map_err(SsgError::ConfigResolution)?
        }
        None => client.clone(),
    };

    let server = server_config(base, &client.root, options);
    Ok(BuildConfigs { client, server })
}

/// Derive the server build config from `base`.
///
/// Paths are anchored at the primary config's root.
fn server_config(base: BuildConfig, root: &Path, options: &BuildOptions) -> BuildConfig {
    BuildConfig {
        out_dir: root.join(&options.ssg_dir),
        assets_dir: SERVER_ASSETS_DIR.to_string(),
        input: BTreeMap::from([(SERVER_ENTRY_NAME.to_string(), root.join(&options.entry))]),
        ..base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBundler;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_server_config_falls_back_to_primary() {
        let dir = TempDir::new().unwrap();
        let bundler = FakeBundler::new(dir.path());

        let configs =
            resolve_build_configs(&bundler, "production", dir.path(), &BuildOptions::default())
                .unwrap();

        assert_eq!(bundler.resolved(), vec![None]);
        assert_eq!(configs.client.out_dir, dir.path().join("dist"));
        assert_eq!(configs.server.out_dir, dir.path().join(".vite-ssg-dist"));
        assert_eq!(configs.server.assets_dir, "_assets");
        assert_eq!(
            configs.server.input,
            BTreeMap::from([("main".to_string(), dir.path().join("src/main.ts"))])
        );
        // everything else is inherited from the primary config
        assert_eq!(configs.server.config_file, configs.client.config_file);
        assert_eq!(configs.server.mode, "production");
    }

    #[test]
    fn test_server_config_uses_override_file() {
        let dir = TempDir::new().unwrap();
        let override_file = dir.path().join("vite.ssg.config.ts");
        fs::write(&override_file, "export default {}").unwrap();
        let bundler = FakeBundler::new(dir.path());

        let configs =
            resolve_build_configs(&bundler, "staging", dir.path(), &BuildOptions::default())
                .unwrap();

        assert_eq!(bundler.resolved(), vec![None, Some(override_file.clone())]);
        assert_eq!(configs.server.config_file, Some(override_file));
        assert_eq!(configs.client.config_file, None);
        assert_eq!(configs.server.mode, "staging");
    }

    #[test]
    fn test_custom_entry_and_ssg_dir() {
        let dir = TempDir::new().unwrap();
        let bundler = FakeBundler::new(dir.path());
        let options = BuildOptions {
            entry: PathBuf::from("src/entry-server.ts"),
            ssg_dir: PathBuf::from(".ssg"),
            ..BuildOptions::default()
        };

        let configs = resolve_build_configs(&bundler, "production", dir.path(), &options).unwrap();
        assert_eq!(
            configs.server.server_entry_artifact(),
            dir.path().join(".ssg/_assets/main.js")
        );
        assert_eq!(
            configs.server.input.get("main"),
            Some(&dir.path().join("src/entry-server.ts"))
        );
    }

    #[test]
    fn test_resolution_failure_is_classified() {
        let dir = TempDir::new().unwrap();
        let bundler = FakeBundler::new(dir.path()).failing_resolve();

        let err =
            resolve_build_configs(&bundler, "production", dir.path(), &BuildOptions::default())
                .unwrap_err();
        assert!(matches!(err, SsgError::ConfigResolution(_)));
        assert!(bundler.builds().is_empty());
    }
}
