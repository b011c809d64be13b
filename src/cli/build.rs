//! Static build orchestration.
//!
//! Build pipeline phases:
//! - **Resolve** - client config, then the server config (override or fallback)
//! - **Bundle** - client and server builds in parallel
//! - **Load** - bind the app factory exported by the server entry
//! - **Enumerate** - static routes from one throwaway app instance
//! - **Render** - one fresh instance per route, spliced into the template
//! - **Cleanup** - remove the intermediate server output

use super::common::{node_collaborators, remove_intermediate};
use crate::app::node::ServerRenderer;
use crate::app::{AppFactory, FactoryLoader, RenderEngine, check_output_conflicts, enumerate_routes, load_factory};
use crate::bundler::{Bundler, build_both, resolve_build_configs};
use crate::config::SsgConfig;
use crate::error::SsgError;
use crate::html::{MOUNT_POINT, Template};
use crate::logger::ProgressLine;
use crate::render::{PageSink, RenderEnv, render_pages};
use crate::utils::plural_count;
use crate::{debug, log};
use anyhow::Result;
use std::path::PathBuf;

/// Outcome of a successful build.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Written pages, in route declaration order
    pub written: Vec<PathBuf>,
    /// Dynamic routes that were not rendered
    pub skipped: Vec<String>,
}

/// Build the project with vite and render it with Node.js.
pub fn build(config: &SsgConfig) -> Result<BuildReport> {
    let (bundler, loader) = node_collaborators(config)?;
    Ok(run_build(&bundler, &loader, &ServerRenderer, config)?)
}

/// Run the full pipeline against the given collaborators.
///
/// Pipeline: resolve -> bundle -> load -> enumerate -> render -> cleanup
pub fn run_build<B, L, E>(
    bundler: &B,
    loader: &L,
    engine: &E,
    config: &SsgConfig,
) -> Result<BuildReport, SsgError>
where
    B: Bundler,
    L: FactoryLoader,
    E: RenderEngine<<L::Factory as AppFactory>::App>,
{
    let mode = config.mode();
    debug!("ssg"; "mode {}", mode);
    let configs = resolve_build_configs(bundler, &mode, &config.root, &config.build)?;

    log!("ssg"; "build for client + server");
    build_both(bundler, &configs)?;

    let artifact = configs.server.server_entry_artifact();
    let factory = load_factory(loader, &artifact)?;
    let template = Template::read(&configs.client.template_path())?;

    let routes = enumerate_routes(&factory).map_err(|err| SsgError::Load(artifact.clone(), err))?;
    if !routes.dynamic_paths.is_empty() {
        debug!("ssg"; "skipping dynamic routes: {}", routes.dynamic_paths.join(", "));
    }
    check_output_conflicts(&routes.static_paths)?;

    let count = routes.static_paths.len();
    if count > 0 && !template.has_mount_point() {
        return Err(SsgError::MountPointMissing {
            path: template.path().to_path_buf(),
            mount: MOUNT_POINT,
        });
    }

    let template = template.with_script_loading(&config.build.script);
    let env = RenderEnv::install(config.build.mock);

    log!("ssg"; "rendering {}", plural_count(count, "page"));
    let progress = (!config.build.quiet && count > 0).then(|| ProgressLine::new("pages", count));
    let sink = PageSink {
        template: &template,
        out_dir: &configs.client.out_dir,
        progress: progress.as_ref(),
    };
    let written = render_pages(&factory, engine, &env, &sink, &routes.static_paths)?;
    if let Some(progress) = progress {
        progress.finish();
    }

    remove_intermediate(&configs.server.out_dir)?;
    log!("ssg"; "build finished");

    Ok(BuildReport {
        written,
        skipped: routes.dynamic_paths,
    })
}
