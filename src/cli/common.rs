//! Common utilities shared across CLI commands.

use crate::app::node::NodeLoader;
use crate::bundler::vite::ViteBundler;
use crate::config::SsgConfig;
use crate::debug;
use crate::embed::install_driver;
use crate::error::SsgError;
use anyhow::Result;
use std::fs;
use std::path::Path;

/// Production collaborators: vite for bundling, Node.js for the app.
pub fn node_collaborators(config: &SsgConfig) -> Result<(ViteBundler, NodeLoader)> {
    let driver = install_driver(&config.root)?;
    debug!("node"; "driver at {}", driver.display());
    Ok((
        ViteBundler::new(config, driver.clone()),
        NodeLoader::new(config, driver),
    ))
}

/// Remove the intermediate server build output.
pub fn remove_intermediate(dir: &Path) -> Result<(), SsgError> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(SsgError::Cleanup(dir.to_path_buf(), err)),
    }
}
