//! Command-line interface.
//!
//! - `args` - clap definitions
//! - `build` - the static build pipeline
//! - `routes` - static route listing
//! - `common` - collaborator wiring and cleanup

mod args;
pub mod build;
mod common;
pub mod routes;

pub use args::{BuildArgs, Cli, Commands};
