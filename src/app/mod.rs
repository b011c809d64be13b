//! Application factory boundary.
//!
//! The server bundle is only known after the build, so the pipeline talks
//! to it through these traits and binds a concrete implementation at the
//! [`FactoryLoader`] extension point once the artifact exists.
//!
//! - `routes` - static route enumeration and output conflict detection
//! - `node` - factory backed by one Node.js child process per app instance

pub mod node;
mod routes;

pub use routes::{RouteTable, check_output_conflicts, enumerate_routes};

use crate::error::SsgError;
use crate::render::RenderEnv;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One declared route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    pub path: String,
}

#[cfg(test)]
impl RouteDescriptor {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Router of one app instance.
pub trait Router {
    /// Declared route table, in declaration order.
    fn routes(&self) -> &[RouteDescriptor];

    /// Start navigating to `path`.
    fn push(&mut self, path: &str) -> Result<()>;

    /// Block until the pending navigation has settled.
    fn is_ready(&mut self) -> Result<()>;
}

/// A fresh `{ app, router }` pair.
pub struct AppContext<A, R> {
    pub app: A,
    pub router: R,
}

/// `createApp(isClient)` of the server bundle.
///
/// Every call returns an instance that shares no state with earlier ones.
pub trait AppFactory: Sync {
    type App;
    type Router: Router;

    fn create_app(
        &self,
        is_client: bool,
        env: &RenderEnv,
    ) -> Result<AppContext<Self::App, Self::Router>>;
}

/// Serializes an app tree to markup.
pub trait RenderEngine<A>: Sync {
    fn render_to_string(&self, app: &A) -> Result<String>;
}

/// Binds an [`AppFactory`] to a built server entry.
pub trait FactoryLoader {
    type Factory: AppFactory;

    fn load(&self, entry: &Path) -> Result<Self::Factory>;
}

/// Load the factory exported by the server build's entry artifact.
pub fn load_factory<L: FactoryLoader>(loader: &L, artifact: &Path) -> Result<L::Factory, SsgError> {
    fs::metadata(artifact).map_err(|err| SsgError::ArtifactMissing(artifact.to_path_buf(), err))?;
    loader
        .load(artifact)
        .map_err(|err| SsgError::Load(artifact.to_path_buf(), err))
}
