//! [`Bundler`] backed by the project's vite installation.
//!
//! Every call goes through the embedded driver (`resolve-config`, `build`,
//! `build-ssr`), with the request serialized as a single JSON argument.

use super::{BuildConfig, Bundler};
use crate::config::SsgConfig;
use crate::utils::exec::{Cmd, NoiseFilter};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Progress chatter vite prints on every build.
const VITE_FILTER: NoiseFilter = NoiseFilter::new(&[
    "transforming",
    "rendering chunks",
    "computing gzip size",
    "✓ ",
]);

pub struct ViteBundler {
    node: Vec<String>,
    driver: PathBuf,
    root: PathBuf,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveRequest<'a> {
    mode: &'a str,
    root: &'a Path,
    config_file: Option<&'a Path>,
}

/// Subset of vite's resolved config the pipeline needs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResolvedConfig {
    root: PathBuf,
    out_dir: PathBuf,
    assets_dir: String,
    #[serde(default)]
    input: BTreeMap<String, PathBuf>,
}

impl ResolvedConfig {
    fn into_build_config(self, mode: &str, config_file: Option<&Path>) -> BuildConfig {
        BuildConfig {
            mode: mode.to_string(),
            out_dir: self.root.join(self.out_dir),
            root: self.root,
            config_file: config_file.map(Path::to_path_buf),
            assets_dir: self.assets_dir,
            input: self.input,
        }
    }
}

impl ViteBundler {
    pub fn new(config: &SsgConfig, driver: PathBuf) -> Self {
        Self {
            node: config.node.command.clone(),
            driver,
            root: config.root.clone(),
        }
    }

    fn driver_cmd(&self, command: &str, payload: &impl Serialize) -> Result<Cmd> {
        let payload = serde_json::to_string(payload)?;
        Ok(Cmd::from_slice(&self.node)
            .arg(&self.driver)
            .arg(command)
            .arg(payload)
            .cwd(&self.root))
    }
}

impl Bundler for ViteBundler {
    fn resolve_config(&self, mode: &str, config_file: Option<&Path>) -> Result<BuildConfig> {
        let request = ResolveRequest {
            mode,
            root: &self.root,
            config_file,
        };
        let output = self
            .driver_cmd("resolve-config", &request)?
            .run()
            .context("vite could not resolve config")?;

        let resolved: ResolvedConfig = serde_json::from_slice(&output.stdout)
            .context("unexpected reply from resolve-config")?;
        Ok(resolved.into_build_config(mode, config_file))
    }

    fn build(&self, config: &BuildConfig) -> Result<()> {
        self.driver_cmd("build", config)?
            .pty(true)
            .filter(&VITE_FILTER)
            .run()
            .map(|_| ())
    }

    fn build_server(&self, config: &BuildConfig) -> Result<()> {
        self.driver_cmd("build-ssr", config)?
            .pty(true)
            .filter(&VITE_FILTER)
            .run()
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_config_reply() {
        let reply = r#"{"root":"/app","outDir":"dist","assetsDir":"assets","input":{"index":"/app/index.html"}}"#;
        let resolved: ResolvedConfig = serde_json::from_str(reply).unwrap();
        let config = resolved.into_build_config("staging", None);

        assert_eq!(config.out_dir, PathBuf::from("/app/dist"));
        assert_eq!(config.mode, "staging");
        assert_eq!(config.input.get("index"), Some(&PathBuf::from("/app/index.html")));
    }

    #[test]
    fn test_absolute_out_dir_kept() {
        let reply = r#"{"root":"/app","outDir":"/srv/www","assetsDir":"assets"}"#;
        let resolved: ResolvedConfig = serde_json::from_str(reply).unwrap();
        let config = resolved.into_build_config("production", Some(Path::new("/app/vite.ssg.config.ts")));

        assert_eq!(config.out_dir, PathBuf::from("/srv/www"));
        assert!(config.input.is_empty());
        assert_eq!(config.config_file, Some(PathBuf::from("/app/vite.ssg.config.ts")));
    }

    #[test]
    fn test_build_request_payload() {
        let config = BuildConfig {
            mode: "production".into(),
            root: PathBuf::from("/app"),
            config_file: None,
            out_dir: PathBuf::from("/app/.vite-ssg-dist"),
            assets_dir: "_assets".into(),
            input: BTreeMap::from([("main".into(), PathBuf::from("/app/src/main.ts"))]),
        };
        let json: serde_json::Value = serde_json::to_value(&config).unwrap();
        assert_eq!(json["outDir"], "/app/.vite-ssg-dist");
        assert_eq!(json["assetsDir"], "_assets");
        assert_eq!(json["configFile"], serde_json::Value::Null);
        assert_eq!(json["input"]["main"], "/app/src/main.ts");
    }
}
