//! App factory backed by Node.js.
//!
//! Each [`AppFactory::create_app`] call spawns one driver session: a child
//! process that imports the server entry, calls `createApp`, and answers
//! JSON-line requests on stdin/stdout until stdin closes. One process per
//! instance keeps routes from observing each other's state.
//!
//! Protocol:
//!
//! ```text
//! <- {"ok":true,"routes":[{"path":"/"},{"path":"/about"}]}   (on start)
//! -> {"op":"push","path":"/about"}
//! <- {"ok":true}
//! -> {"op":"ready"}
//! <- {"ok":true}
//! -> {"op":"render"}
//! <- {"ok":true,"html":"<main>...</main>"}
//!
//! <- {"ok":false,"error":"TypeError: ..."}                   (any failure)
//! ```

use super::{AppContext, AppFactory, FactoryLoader, RenderEngine, RouteDescriptor, Router};
use crate::config::SsgConfig;
use crate::debug;
use crate::render::RenderEnv;
use crate::utils::exec::Cmd;
use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout};
use std::rc::Rc;

// ============================================================================
// Protocol
// ============================================================================

/// Arguments of a driver `app` session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionArgs<'a> {
    entry: &'a Path,
    client: bool,
    mock: bool,
    url: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum Request<'a> {
    Push { path: &'a str },
    Ready,
    Render,
}

#[derive(Debug, Deserialize)]
struct Response {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    routes: Option<Vec<RouteDescriptor>>,
    #[serde(default)]
    html: Option<String>,
}

impl Response {
    fn into_result(self) -> Result<Self> {
        if self.ok {
            Ok(self)
        } else {
            Err(anyhow!(
                "{}",
                self.error.as_deref().unwrap_or("app session reported an unknown error")
            ))
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// A running driver process hosting one app instance.
pub struct NodeSession {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

impl NodeSession {
    /// Spawn `cmd` and wait for its greeting.
    fn open(cmd: Cmd) -> Result<(Self, Response)> {
        let mut child = cmd.spawn()?;
        let stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or_else(|| anyhow!("app session has no stdout"))?;

        let mut session = Self {
            child,
            stdin,
            stdout,
        };
        let greeting = session.read_response()?;
        Ok((session, greeting))
    }

    fn request(&mut self, request: &Request<'_>) -> Result<Response> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| anyhow!("app session is closed"))?;

        let mut line = serde_json::to_vec(request)?;
        line.push(b'\n');
        stdin
            .write_all(&line)
            .and_then(|()| stdin.flush())
            .context("app session stopped accepting requests")?;

        self.read_response()
    }

    fn read_response(&mut self) -> Result<Response> {
        let mut line = String::new();
        let read = self
            .stdout
            .read_line(&mut line)
            .context("failed to read from app session")?;
        if read == 0 {
            bail!("app session exited unexpectedly");
        }

        let response: Response = serde_json::from_str(line.trim_end())
            .with_context(|| format!("malformed app session reply: {}", line.trim_end()))?;
        response.into_result()
    }
}

impl Drop for NodeSession {
    fn drop(&mut self) {
        // closing stdin ends the session loop
        drop(self.stdin.take());
        if let Err(e) = self.child.wait() {
            debug!("node"; "failed to reap app session: {}", e);
        }
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Binds the Node.js factory to a server entry.
pub struct NodeLoader {
    node: Vec<String>,
    driver: PathBuf,
    root: PathBuf,
}

impl NodeLoader {
    pub fn new(config: &SsgConfig, driver: PathBuf) -> Self {
        Self {
            node: config.node.command.clone(),
            driver,
            root: config.root.clone(),
        }
    }
}

impl FactoryLoader for NodeLoader {
    type Factory = NodeFactory;

    fn load(&self, entry: &Path) -> Result<NodeFactory> {
        let program = self
            .node
            .first()
            .ok_or_else(|| anyhow!("node.command is empty"))?;
        let resolved = which::which(program)
            .with_context(|| format!("`{program}` not found, install Node.js or set node.command"))?;
        debug!("node"; "using {}", resolved.display());
        mark_commonjs_scope(entry)?;

        Ok(NodeFactory {
            node: self.node.clone(),
            driver: self.driver.clone(),
            root: self.root.clone(),
            entry: entry.to_path_buf(),
        })
    }
}

/// Pin the server bundle's directory to CommonJS.
///
/// The bundle is emitted as CommonJS with a `.js` extension, which Node.js
/// would otherwise load as an ES module under a `"type": "module"` project.
fn mark_commonjs_scope(entry: &Path) -> Result<()> {
    let Some(dir) = entry.parent() else {
        return Ok(());
    };
    let manifest = dir.join("package.json");
    fs::write(&manifest, COMMONJS_MANIFEST)
        .with_context(|| format!("Failed to write {}", manifest.display()))
}

const COMMONJS_MANIFEST: &str = "{\"type\":\"commonjs\"}\n";

pub struct NodeFactory {
    node: Vec<String>,
    driver: PathBuf,
    root: PathBuf,
    entry: PathBuf,
}

impl NodeFactory {
    fn session_payload(&self, is_client: bool, env: &RenderEnv) -> Result<String> {
        let args = SessionArgs {
            entry: &self.entry,
            client: is_client,
            mock: env.mock_dom(),
            url: env.url(),
        };
        Ok(serde_json::to_string(&args)?)
    }

    fn session_cmd(&self, is_client: bool, env: &RenderEnv) -> Result<Cmd> {
        Ok(Cmd::from_slice(&self.node)
            .arg(&self.driver)
            .arg("app")
            .arg(self.session_payload(is_client, env)?)
            .cwd(&self.root))
    }
}

impl AppFactory for NodeFactory {
    type App = NodeApp;
    type Router = NodeRouter;

    fn create_app(&self, is_client: bool, env: &RenderEnv) -> Result<AppContext<NodeApp, NodeRouter>> {
        let cmd = self.session_cmd(is_client, env)?;
        let (session, greeting) = NodeSession::open(cmd).context("createApp failed")?;
        Ok(attach(session, greeting))
    }
}

fn attach(session: NodeSession, greeting: Response) -> AppContext<NodeApp, NodeRouter> {
    let session = Rc::new(RefCell::new(session));
    AppContext {
        app: NodeApp {
            session: Rc::clone(&session),
        },
        router: NodeRouter {
            session,
            routes: greeting.routes.unwrap_or_default(),
        },
    }
}

/// App half of a session.
pub struct NodeApp {
    session: Rc<RefCell<NodeSession>>,
}

/// Router half of a session.
pub struct NodeRouter {
    session: Rc<RefCell<NodeSession>>,
    routes: Vec<RouteDescriptor>,
}

impl Router for NodeRouter {
    fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    fn push(&mut self, path: &str) -> Result<()> {
        self.session.borrow_mut().request(&Request::Push { path })?;
        Ok(())
    }

    fn is_ready(&mut self) -> Result<()> {
        self.session.borrow_mut().request(&Request::Ready)?;
        Ok(())
    }
}

/// `renderToString` of the app's own server renderer.
pub struct ServerRenderer;

impl RenderEngine<NodeApp> for ServerRenderer {
    fn render_to_string(&self, app: &NodeApp) -> Result<String> {
        app.session
            .borrow_mut()
            .request(&Request::Render)?
            .html
            .ok_or_else(|| anyhow!("render reply carried no html"))
    }
}

// ============================================================================
// Tests
// ============================================================================
