//! Render environment shared by every app instance of a run.

use crate::debug;

/// Location the DOM shim reports as `window.location`.
const MOCK_URL: &str = "http://localhost/";

/// Ambient globals app instances are created under.
///
/// Built once per run before the fan-out and only read afterwards, so all
/// render tasks see the same environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderEnv {
    mock_dom: bool,
    url: String,
}

impl RenderEnv {
    /// No DOM shim. Used where no component is rendered.
    pub fn bare() -> Self {
        Self {
            mock_dom: false,
            url: MOCK_URL.to_string(),
        }
    }

    /// Environment for the render fan-out.
    pub fn install(mock: bool) -> Self {
        if mock {
            debug!("render"; "installing DOM shim at {}", MOCK_URL);
        }
        Self {
            mock_dom: mock,
            ..Self::bare()
        }
    }

    /// Whether `window`/`document` globals are provided.
    pub fn mock_dom(&self) -> bool {
        self.mock_dom
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}
