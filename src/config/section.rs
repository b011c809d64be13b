//! `[build]` and `[node]` sections.
//!
//! ```toml
//! [build]
//! mode = "staging"            # Overrides MODE / NODE_ENV
//! script = "defer"            # sync | async | defer | any boolean attribute
//! mock = false                # Install a DOM shim before rendering
//! entry = "src/main.ts"       # Server build entry (relative to the bundler root)
//! ssg_dir = ".vite-ssg-dist"  # Intermediate server output (relative to the bundler root)
//!
//! [node]
//! command = ["node"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How module scripts of the template are loaded.
///
/// `sync` leaves the template untouched; anything else is inserted as a
/// boolean attribute on every `<script type="module">` tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScriptLoading {
    #[default]
    Sync,
    Attribute(String),
}

impl ScriptLoading {
    /// The attribute to inject, `None` for `sync`.
    pub fn attribute(&self) -> Option<&str> {
        match self {
            Self::Sync => None,
            Self::Attribute(attr) => Some(attr),
        }
    }
}

impl From<String> for ScriptLoading {
    fn from(value: String) -> Self {
        if value == "sync" {
            Self::Sync
        } else {
            Self::Attribute(value)
        }
    }
}

impl From<&str> for ScriptLoading {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ScriptLoading> for String {
    fn from(value: ScriptLoading) -> Self {
        match value {
            ScriptLoading::Sync => "sync".into(),
            ScriptLoading::Attribute(attr) => attr,
        }
    }
}

/// Options of a static build.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildOptions {
    /// Bundler mode; `None` defers to the environment.
    pub mode: Option<String>,
    pub script: ScriptLoading,
    pub mock: bool,
    pub entry: PathBuf,
    pub ssg_dir: PathBuf,
    /// Suppress progress output (internal use only)
    #[serde(skip)]
    pub quiet: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            mode: None,
            script: ScriptLoading::Sync,
            mock: false,
            entry: PathBuf::from("src/main.ts"),
            ssg_dir: PathBuf::from(".vite-ssg-dist"),
            quiet: false,
        }
    }
}

/// JavaScript runtime used to drive the bundler and the app.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfig {
    pub command: Vec<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            command: vec!["node".into()],
        }
    }
}
