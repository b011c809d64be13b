//! Tool configuration from the optional `ssg.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section    # [build] and [node] sections, ScriptLoading
//! ├── error      # ConfigError
//! ├── util       # config file search, mode lookup, override probing
//! └── mod.rs     # SsgConfig (this file)
//! ```
//!
//! Precedence: CLI flags > `ssg.toml` > environment > defaults.

mod error;
mod section;
mod util;

pub use error::ConfigError;
pub use section::{BuildOptions, ScriptLoading};
pub use util::find_override_config;

use crate::cli::{BuildArgs, Cli, Commands};
use crate::debug;
use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};
use section::NodeConfig;
use util::{find_config_file, mode_from_env};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing ssg.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SsgConfig {
    /// Project root directory (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub build: BuildOptions,

    #[serde(default)]
    pub node: NodeConfig,
}

impl SsgConfig {
    /// Load configuration for a CLI invocation.
    ///
    /// Searches upward from cwd for the config file. Without one, the
    /// working directory is the project root and defaults apply.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = Self::discover(&cli.config, &cwd)?;
        config.apply_command_options(cli);
        config.validate()?;
        Ok(config)
    }

    /// Config file `name` found upward from `cwd`, rooted at its directory.
    fn discover(name: &Path, cwd: &Path) -> Result<Self, ConfigError> {
        let Some(path) = find_config_file(name, cwd) else {
            debug!("config"; "no {} found, using defaults", name.display());
            return Ok(Self {
                root: cwd.to_path_buf(),
                ..Self::default()
            });
        };

        debug!("config"; "using {}", path.display());
        let mut config = Self::from_path(&path)?;
        config.root = path
            .parent()
            .map_or_else(|| cwd.to_path_buf(), Path::to_path_buf);
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Resolve the bundler mode: explicit setting, else `MODE` / `NODE_ENV`.
    pub fn mode(&self) -> String {
        self.build
            .mode
            .clone()
            .unwrap_or_else(|| mode_from_env(|key| std::env::var(key).ok()))
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    fn apply_command_options(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Build { build_args } => self.apply_build_args(build_args),
            Commands::Routes { mode, .. } => {
                Self::update_option(&mut self.build.mode, mode.clone().map(Some));
            }
        }
    }

    fn apply_build_args(&mut self, args: &BuildArgs) {
        Self::update_option(&mut self.build.script, args.script.clone().map(ScriptLoading::from));
        Self::update_option(&mut self.build.mock, args.mock.then_some(true));
        Self::update_option(&mut self.build.mode, args.mode.clone().map(Some));
    }

    fn update_option<T>(target: &mut T, value: Option<T>) {
        if let Some(value) = value {
            *target = value;
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate settings that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(attr) = self.build.script.attribute()
            && !is_attribute_name(attr)
        {
            return Err(ConfigError::Validation(format!(
                "build.script `{attr}` is not `sync` or a valid attribute name"
            )));
        }

        if matches!(self.build.mode.as_deref(), Some("")) {
            return Err(ConfigError::Validation("build.mode must not be empty".into()));
        }

        for (field, path) in [("build.entry", &self.build.entry), ("build.ssg_dir", &self.build.ssg_dir)] {
            if path.as_os_str().is_empty() || path.is_absolute() {
                return Err(ConfigError::Validation(format!(
                    "{field} must be a relative path, got `{}`",
                    path.display()
                )));
            }
        }

        if self.node.command.first().is_none_or(|program| program.is_empty()) {
            return Err(ConfigError::Validation("node.command must not be empty".into()));
        }

        Ok(())
    }
}

fn is_attribute_name(name: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_:][-A-Za-z0-9_:.]*$").expect("valid regex"))
        .is_match(name)
}

// ============================================================================
// tests
// ============================================================================
