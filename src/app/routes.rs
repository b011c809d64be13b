//! Static route enumeration.

use super::{AppFactory, RouteDescriptor, Router};
use crate::error::SsgError;
use crate::html::relative_output_path;
use crate::render::RenderEnv;
use crate::utils::plural_s;
use crate::log;
use anyhow::Result;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::PathBuf;

/// Characters that make a route path depend on runtime input.
///
/// `:` starts a parameter segment, `*` is a wildcard.
const DYNAMIC_MARKERS: [char; 2] = [':', '*'];

impl RouteDescriptor {
    /// Resolvable at build time (no parameter or wildcard segment).
    pub fn is_static(&self) -> bool {
        !self.path.contains(DYNAMIC_MARKERS)
    }
}

/// Declared routes split by resolvability, declaration order kept.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RouteTable {
    pub static_paths: Vec<String>,
    pub dynamic_paths: Vec<String>,
}

impl RouteTable {
    /// Split a declared route table. Repeated declarations of one path
    /// count once.
    pub fn from_routes(routes: &[RouteDescriptor]) -> Self {
        let mut seen = FxHashSet::default();
        let mut table = Self::default();

        for route in routes {
            if !seen.insert(route.path.as_str()) {
                continue;
            }
            if route.is_static() {
                table.static_paths.push(route.path.clone());
            } else {
                table.dynamic_paths.push(route.path.clone());
            }
        }
        table
    }
}

/// Read the route table from one throwaway app instance.
pub fn enumerate_routes<F: AppFactory>(factory: &F) -> Result<RouteTable> {
    let context = factory.create_app(false, &RenderEnv::bare())?;
    Ok(RouteTable::from_routes(context.router.routes()))
}

/// Fail when two static routes would write the same file.
pub fn check_output_conflicts(paths: &[String]) -> Result<(), SsgError> {
    let mut claims: FxHashMap<PathBuf, Vec<&str>> = FxHashMap::default();
    for path in paths {
        claims.entry(relative_output_path(path)).or_default().push(path);
    }

    let mut conflicts: Vec<_> = claims
        .into_iter()
        .filter(|(_, routes)| routes.len() > 1)
        .collect();
    if conflicts.is_empty() {
        return Ok(());
    }
    conflicts.sort();

    log!("error"; "output conflicts ({} file{})", conflicts.len(), plural_s(conflicts.len()));
    let summary = conflicts
        .iter()
        .map(|(file, routes)| {
            for route in routes {
                eprintln!("  - {route} -> {}", file.display());
            }
            format!("{} <- {}", file.display(), routes.join(", "))
        })
        .collect::<Vec<_>>()
        .join("; ");

    Err(SsgError::OutputConflict(summary))
}
