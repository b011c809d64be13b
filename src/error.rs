//! Classified pipeline failures.
//!
//! Every variant is fatal to the run; nothing is retried.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which of the two bundling passes failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildTarget {
    Client,
    Server,
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Client => "client",
            Self::Server => "server",
        })
    }
}

#[derive(Debug, Error)]
pub enum SsgError {
    #[error("failed to resolve bundler config")]
    ConfigResolution(#[source] anyhow::Error),

    #[error("{target} build failed")]
    Build {
        target: BuildTarget,
        #[source]
        source: anyhow::Error,
    },

    #[error("missing build artifact `{}`", .0.display())]
    ArtifactMissing(PathBuf, #[source] std::io::Error),

    #[error("failed to load app factory from `{}`", .0.display())]
    Load(PathBuf, #[source] anyhow::Error),

    #[error("failed to render route `{route}`")]
    Render {
        route: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("template `{}` has no mount point `{mount}`", .path.display())]
    MountPointMissing { path: PathBuf, mount: &'static str },

    #[error("output conflicts: {0}")]
    OutputConflict(String),

    #[error("failed to write `{}`", .0.display())]
    Write(PathBuf, #[source] std::io::Error),

    #[error("failed to remove `{}`", .0.display())]
    Cleanup(PathBuf, #[source] std::io::Error),
}
