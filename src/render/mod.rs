//! Per-route rendering and the page fan-out.
//!
//! Every route gets its own app instance; nothing created for one route is
//! visible to another.

mod env;

pub use env::RenderEnv;

use crate::app::{AppFactory, RenderEngine, Router};
use crate::error::SsgError;
use crate::html::{Template, write_page};
use crate::logger::ProgressLine;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Markup of one route, before assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub route: String,
    pub html: String,
}

/// Render `route` on a fresh app instance.
pub fn render_route<F, E>(factory: &F, engine: &E, env: &RenderEnv, route: &str) -> Result<RenderedPage>
where
    F: AppFactory,
    E: RenderEngine<F::App>,
{
    let mut context = factory.create_app(false, env)?;
    context
        .router
        .push(route)
        .with_context(|| format!("navigation to `{route}` failed"))?;
    context
        .router
        .is_ready()
        .context("router did not become ready")?;

    let html = engine.render_to_string(&context.app)?;
    Ok(RenderedPage {
        route: route.to_string(),
        html,
    })
}

/// Shared inputs of the fan-out.
pub struct PageSink<'a> {
    pub template: &'a Template,
    pub out_dir: &'a Path,
    pub progress: Option<&'a ProgressLine>,
}

impl PageSink<'_> {
    fn write(&self, page: &RenderedPage) -> Result<PathBuf, SsgError> {
        let file = write_page(self.out_dir, &page.route, &self.template.render(&page.html))?;
        if let Some(progress) = self.progress {
            progress.inc();
        }
        Ok(file)
    }
}

/// Render and write every route in parallel.
///
/// All tasks run to completion. Files already written by successful
/// tasks stay on disk when another task fails, and the failure of the
/// earliest declared route is returned.
pub fn render_pages<F, E>(
    factory: &F,
    engine: &E,
    env: &RenderEnv,
    sink: &PageSink<'_>,
    routes: &[String],
) -> Result<Vec<PathBuf>, SsgError>
where
    F: AppFactory,
    E: RenderEngine<F::App>,
{
    let results: Vec<Result<PathBuf, SsgError>> = routes
        .par_iter()
        .map(|route| {
            let page = render_route(factory, engine, env, route).map_err(|source| SsgError::Render {
                route: route.clone(),
                source,
            })?;
            sink.write(&page)
        })
        .collect();

    results.into_iter().collect()
}
