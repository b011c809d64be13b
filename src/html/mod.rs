//! HTML assembly: template rewriting, fragment splicing, output paths.

use crate::config::ScriptLoading;
use crate::error::SsgError;
use regex::{Captures, Regex};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Opening tag of the element server-rendered markup is spliced into.
pub const MOUNT_POINT: &str = r#"<div id="app">"#;

/// Mount point carrying the server-rendered marker.
const RENDERED_MOUNT_POINT: &str = r#"<div id="app" data-server-rendered="true">"#;

fn module_script_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<script type="module"([^>]*)>"#).expect("valid regex"))
}

/// Whether `attrs`, the rest of an opening tag, already carries `name`.
fn has_attribute(attrs: &str, name: &str) -> bool {
    attrs.split(|c: char| c.is_ascii_whitespace()).any(|token| {
        let key = token.split_once('=').map_or(token, |(key, _)| key);
        key.eq_ignore_ascii_case(name)
    })
}

/// The client build's root document.
#[derive(Debug, Clone)]
pub struct Template {
    path: PathBuf,
    source: String,
}

impl Template {
    /// Read the template emitted by the client build.
    pub fn read(path: &Path) -> Result<Self, SsgError> {
        let source = fs::read_to_string(path)
            .map_err(|err| SsgError::ArtifactMissing(path.to_path_buf(), err))?;
        Ok(Self::new(path, source))
    }

    pub fn new(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_mount_point(&self) -> bool {
        self.source.contains(MOUNT_POINT)
    }

    /// Copy of the template with `loading` applied to every module script.
    ///
    /// Tags that already carry the attribute are left alone, so it appears
    /// exactly once per tag.
    pub fn with_script_loading(&self, loading: &ScriptLoading) -> Self {
        let Some(attr) = loading.attribute() else {
            return self.clone();
        };

        let source = module_script_re()
            .replace_all(&self.source, |caps: &Captures<'_>| {
                let rest = &caps[1];
                if has_attribute(rest, attr) {
                    caps[0].to_string()
                } else {
                    format!(r#"<script type="module" {attr}{rest}>"#)
                }
            })
            .into_owned();
        Self::new(&self.path, source)
    }

    /// Splice `content` after the first mount point.
    pub fn render(&self, content: &str) -> String {
        self.source
            .replacen(MOUNT_POINT, &format!("{RENDERED_MOUNT_POINT}{content}"), 1)
    }
}

/// Output file of `route`, relative to the output directory.
///
/// `/` -> `index.html`, `/about` -> `about.html`, `/about/` -> `about/index.html`
pub fn relative_output_path(route: &str) -> PathBuf {
    let path = route.strip_prefix('/').unwrap_or(route);
    if path.is_empty() || path.ends_with('/') {
        PathBuf::from(format!("{path}index.html"))
    } else {
        PathBuf::from(format!("{path}.html"))
    }
}

pub fn output_file(out_dir: &Path, route: &str) -> PathBuf {
    out_dir.join(relative_output_path(route))
}

/// Write one page, creating its parent directories.
pub fn write_page(out_dir: &Path, route: &str, html: &str) -> Result<PathBuf, SsgError> {
    let file = output_file(out_dir, route);
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent).map_err(|err| SsgError::Write(parent.to_path_buf(), err))?;
    }
    fs::write(&file, html).map_err(|err| SsgError::Write(file.clone(), err))?;
    Ok(file)
}
