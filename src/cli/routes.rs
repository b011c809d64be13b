//! `routes` command: list what a build would render.
//!
//! Only the server bundle is built; the client build is not needed to read
//! the route table.

use super::common::{node_collaborators, remove_intermediate};
use crate::app::{FactoryLoader, RouteTable, enumerate_routes, load_factory};
use crate::bundler::{Bundler, resolve_build_configs};
use crate::config::SsgConfig;
use crate::error::{BuildTarget, SsgError};
use crate::html::relative_output_path;
use crate::log;
use crate::utils::plural_count;
use anyhow::Result;

/// Print static routes with their output files, then the skipped ones.
pub fn list_routes(config: &SsgConfig) -> Result<()> {
    let (bundler, loader) = node_collaborators(config)?;
    let table = collect_routes(&bundler, &loader, config)?;

    log!("ssg"; "{}", plural_count(table.static_paths.len(), "static route"));
    for line in format_routes(&table) {
        println!("{line}");
    }
    Ok(())
}

/// Build the server bundle and read its route table.
pub fn collect_routes<B, L>(bundler: &B, loader: &L, config: &SsgConfig) -> Result<RouteTable, SsgError>
where
    B: Bundler,
    L: FactoryLoader,
{
    let configs = resolve_build_configs(bundler, &config.mode(), &config.root, &config.build)?;
    bundler
        .build_server(&configs.server)
        .map_err(|source| SsgError::Build {
            target: BuildTarget::Server,
            source,
        })?;

    let artifact = configs.server.server_entry_artifact();
    let factory = load_factory(loader, &artifact)?;
    let table = enumerate_routes(&factory).map_err(|err| SsgError::Load(artifact, err))?;

    remove_intermediate(&configs.server.out_dir)?;
    Ok(table)
}

fn format_routes(table: &RouteTable) -> Vec<String> {
    let width = table.static_paths.iter().map(String::len).max().unwrap_or(0);

    let rendered = table.static_paths.iter().map(|path| {
        format!("  {path:<width$}  {}", relative_output_path(path).display())
    });
    let skipped = table
        .dynamic_paths
        .iter()
        .map(|path| format!("  {path:<width$}  (dynamic, skipped)"));

    rendered.chain(skipped).collect()
}
