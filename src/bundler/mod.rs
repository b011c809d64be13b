//! Bundler collaborator: config resolution and the two build passes.
//!
//! # Module Structure
//!
//! - `resolve` - primary + server build config resolution
//! - `vite` - [`Bundler`] backed by the project's vite installation
//!
//! The bundler itself (module graph, transforms, output) stays external;
//! this module only decides what to ask it for and in which order.

mod resolve;
pub mod vite;

pub use resolve::{BuildConfigs, resolve_build_configs};

use crate::error::{BuildTarget, SsgError};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Assets directory of the server build; the entry artifact lands here.
pub const SERVER_ASSETS_DIR: &str = "_assets";

/// Entry name of the server build, so the artifact is `_assets/main.js`.
pub const SERVER_ENTRY_NAME: &str = "main";

/// Resolved bundler settings for one build pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    pub mode: String,
    /// Project root as the bundler sees it
    pub root: PathBuf,
    /// Config file the settings came from; `None` lets the bundler discover one
    pub config_file: Option<PathBuf>,
    /// Absolute output directory
    pub out_dir: PathBuf,
    pub assets_dir: String,
    /// Entry name -> source file; empty keeps the bundler's default entry
    pub input: BTreeMap<String, PathBuf>,
}

impl BuildConfig {
    /// Root HTML document emitted by a client build.
    pub fn template_path(&self) -> PathBuf {
        self.out_dir.join("index.html")
    }

    /// Entry module emitted by a server build.
    pub fn server_entry_artifact(&self) -> PathBuf {
        self.out_dir
            .join(&self.assets_dir)
            .join(format!("{SERVER_ENTRY_NAME}.js"))
    }
}

/// The external bundler.
///
/// Every call is attempt-once; failures surface as returned errors.
pub trait Bundler: Sync {
    /// Resolve the config for `mode`, from `config_file` or the default lookup.
    fn resolve_config(&self, mode: &str, config_file: Option<&Path>) -> Result<BuildConfig>;

    /// Browser-targeted build.
    fn build(&self, config: &BuildConfig) -> Result<()>;

    /// Server-targeted build.
    fn build_server(&self, config: &BuildConfig) -> Result<()>;
}

/// Run the client and server builds concurrently.
///
/// Both passes always run to completion; the client failure is reported
/// first when both fail.
pub fn build_both<B: Bundler>(bundler: &B, configs: &BuildConfigs) -> Result<(), SsgError> {
    let (client, server) = rayon::join(
        || bundler.build(&configs.client),
        || bundler.build_server(&configs.server),
    );

    client.map_err(|source| SsgError::Build {
        target: BuildTarget::Client,
        source,
    })?;
    server.map_err(|source| SsgError::Build {
        target: BuildTarget::Server,
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildOptions;
    use crate::testing::FakeBundler;
    use tempfile::TempDir;

    fn configs(bundler: &FakeBundler) -> BuildConfigs {
        resolve_build_configs(bundler, "production", &bundler.root, &BuildOptions::default()).unwrap()
    }

    #[test]
    fn test_build_both_runs_both_passes() {
        let dir = TempDir::new().unwrap();
        let bundler = FakeBundler::new(dir.path());
        let configs = configs(&bundler);

        build_both(&bundler, &configs).unwrap();

        assert!(configs.client.template_path().is_file());
        assert!(configs.server.server_entry_artifact().is_file());
        assert_eq!(bundler.builds().len(), 2);
    }

    #[test]
    fn test_build_both_fails_on_server_error() {
        let dir = TempDir::new().unwrap();
        let bundler = FakeBundler::new(dir.path()).failing(BuildTarget::Server);
        let configs = configs(&bundler);

        let err = build_both(&bundler, &configs).unwrap_err();
        assert!(matches!(err, SsgError::Build { target: BuildTarget::Server, .. }));
        // the client pass is not cancelled by its sibling
        assert!(configs.client.template_path().is_file());
    }

    #[test]
    fn test_build_both_reports_client_first() {
        let dir = TempDir::new().unwrap();
        let bundler = FakeBundler::new(dir.path()).failing(BuildTarget::Client);
        let configs = configs(&bundler);

        let err = build_both(&bundler, &configs).unwrap_err();
        assert!(matches!(err, SsgError::Build { target: BuildTarget::Client, .. }));
    }

    #[test]
    fn test_server_entry_artifact_path() {
        let config = BuildConfig {
            mode: "production".into(),
            root: PathBuf::from("/app"),
            config_file: None,
            out_dir: PathBuf::from("/app/.vite-ssg-dist"),
            assets_dir: SERVER_ASSETS_DIR.into(),
            input: BTreeMap::new(),
        };
        assert_eq!(
            config.server_entry_artifact(),
            PathBuf::from("/app/.vite-ssg-dist/_assets/main.js")
        );
    }
}
