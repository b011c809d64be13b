//! In-memory collaborators for pipeline tests.

use crate::app::{AppContext, AppFactory, FactoryLoader, RenderEngine, RouteDescriptor, Router};
use crate::bundler::{BuildConfig, Bundler};
use crate::error::BuildTarget;
use crate::render::RenderEnv;
use anyhow::{Result, bail};
use parking_lot::Mutex;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const CLIENT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><script type="module" crossorigin src="/assets/index.js"></script></head>
<body><div id="app"></div></body>
</html>"#;

// ============================================================================
// Bundler
// ============================================================================

/// Writes a fixed template and server entry instead of bundling.
pub struct FakeBundler {
    pub root: PathBuf,
    template: String,
    failing: Option<BuildTarget>,
    failing_resolve: bool,
    resolved: Mutex<Vec<Option<PathBuf>>>,
    builds: Mutex<Vec<BuildTarget>>,
}

impl FakeBundler {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            template: CLIENT_TEMPLATE.to_string(),
            failing: None,
            failing_resolve: false,
            resolved: Mutex::new(Vec::new()),
            builds: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(mut self, target: BuildTarget) -> Self {
        self.failing = Some(target);
        self
    }

    pub fn failing_resolve(mut self) -> Self {
        self.failing_resolve = true;
        self
    }

    pub fn with_template(mut self, template: &str) -> Self {
        self.template = template.to_string();
        self
    }

    /// Config files passed to `resolve_config`, in call order.
    pub fn resolved(&self) -> Vec<Option<PathBuf>> {
        self.resolved.lock().clone()
    }

    /// Build passes that completed.
    pub fn builds(&self) -> Vec<BuildTarget> {
        self.builds.lock().clone()
    }

    fn run(&self, target: BuildTarget, file: PathBuf, contents: &str) -> Result<()> {
        if self.failing == Some(target) {
            bail!("{target} bundle has errors");
        }
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(file, contents)?;
        self.builds.lock().push(target);
        Ok(())
    }
}

impl Bundler for FakeBundler {
    fn resolve_config(&self, mode: &str, config_file: Option<&Path>) -> Result<BuildConfig> {
        self.resolved.lock().push(config_file.map(Path::to_path_buf));
        if self.failing_resolve {
            bail!("vite.config.ts: unexpected token");
        }
        Ok(BuildConfig {
            mode: mode.to_string(),
            root: self.root.clone(),
            config_file: config_file.map(Path::to_path_buf),
            out_dir: self.root.join("dist"),
            assets_dir: "assets".into(),
            input: BTreeMap::from([("index".into(), self.root.join("index.html"))]),
        })
    }

    fn build(&self, config: &BuildConfig) -> Result<()> {
        self.run(BuildTarget::Client, config.template_path(), &self.template)
    }

    fn build_server(&self, config: &BuildConfig) -> Result<()> {
        self.run(
            BuildTarget::Server,
            config.server_entry_artifact(),
            "exports.createApp = () => ({})",
        )
    }
}

// ============================================================================
// App factory
// ============================================================================

/// Hands out [`FakeFactory`] instances sharing one creation counter.
pub struct FakeLoader {
    factory: FakeFactory,
    failing: bool,
}

impl FakeLoader {
    pub fn new(routes: &[&str]) -> Self {
        Self {
            factory: FakeFactory::new(routes),
            failing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            factory: FakeFactory::new(&[]),
            failing: true,
        }
    }

    /// App instances created by every loaded factory.
    pub fn created(&self) -> usize {
        self.factory.created()
    }

    pub fn dom_shims(&self) -> Vec<bool> {
        self.factory.dom_shims()
    }
}

impl FactoryLoader for FakeLoader {
    type Factory = FakeFactory;

    fn load(&self, _entry: &Path) -> Result<FakeFactory> {
        if self.failing {
            bail!("main.js does not export createApp");
        }
        Ok(self.factory.clone())
    }
}

#[derive(Clone)]
pub struct FakeFactory {
    routes: Vec<RouteDescriptor>,
    failing_push: Option<String>,
    created: Arc<AtomicUsize>,
    dom_shims: Arc<Mutex<Vec<bool>>>,
}

impl FakeFactory {
    pub fn new(routes: &[&str]) -> Self {
        Self {
            routes: routes.iter().map(|p| RouteDescriptor::new(*p)).collect(),
            failing_push: None,
            created: Arc::new(AtomicUsize::new(0)),
            dom_shims: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing_push(mut self, path: &str) -> Self {
        self.failing_push = Some(path.to_string());
        self
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Whether each instance was created under the DOM shim, in creation order.
    pub fn dom_shims(&self) -> Vec<bool> {
        self.dom_shims.lock().clone()
    }
}

impl AppFactory for FakeFactory {
    type App = FakeApp;
    type Router = FakeRouter;

    fn create_app(&self, is_client: bool, env: &RenderEnv) -> Result<AppContext<FakeApp, FakeRouter>> {
        assert!(!is_client, "static rendering must not create client apps");
        self.dom_shims.lock().push(env.mock_dom());
        self.created.fetch_add(1, Ordering::SeqCst);

        let state = Rc::new(RefCell::new(Navigation::default()));
        Ok(AppContext {
            app: FakeApp {
                state: Rc::clone(&state),
            },
            router: FakeRouter {
                routes: self.routes.clone(),
                failing_push: self.failing_push.clone(),
                state,
            },
        })
    }
}

/// Router state of one instance, visible to its app.
#[derive(Default)]
struct Navigation {
    location: Option<String>,
    ready: bool,
}

pub struct FakeApp {
    state: Rc<RefCell<Navigation>>,
}

pub struct FakeRouter {
    routes: Vec<RouteDescriptor>,
    failing_push: Option<String>,
    state: Rc<RefCell<Navigation>>,
}

impl Router for FakeRouter {
    fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    fn push(&mut self, path: &str) -> Result<()> {
        if self.failing_push.as_deref() == Some(path) {
            bail!("no match for `{path}`");
        }
        let mut state = self.state.borrow_mut();
        // a fresh instance sees exactly one navigation
        if state.location.is_some() {
            bail!("instance reused");
        }
        state.location = Some(path.to_string());
        Ok(())
    }

    fn is_ready(&mut self) -> Result<()> {
        self.state.borrow_mut().ready = true;
        Ok(())
    }
}

// ============================================================================
// Render engine
// ============================================================================

/// Renders `<h1>{path}</h1>` for the current location.
#[derive(Default)]
pub struct FakeEngine {
    failing_on: Option<String>,
}

impl FakeEngine {
    pub fn failing_on(path: &str) -> Self {
        Self {
            failing_on: Some(path.to_string()),
        }
    }
}

impl RenderEngine<FakeApp> for FakeEngine {
    fn render_to_string(&self, app: &FakeApp) -> Result<String> {
        let state = app.state.borrow();
        let (Some(path), true) = (state.location.as_deref(), state.ready) else {
            bail!("app rendered before navigation settled");
        };
        if self.failing_on.as_deref() == Some(path) {
            bail!("render error in `{path}`");
        }
        Ok(format!("<h1>{path}</h1>"))
    }
}
