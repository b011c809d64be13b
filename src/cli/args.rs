//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Pre-render every static route of a vite single-page app
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: ssg.toml, optional)
    #[arg(short = 'C', long, default_value = "ssg.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build client + server bundles and pre-render static routes
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// List static routes and the files they render to
    #[command(visible_alias = "r")]
    Routes {
        /// Bundler mode (default: $MODE, $NODE_ENV, then production)
        #[arg(long)]
        mode: Option<String>,

        /// Enable verbose output for debugging
        #[arg(short = 'V', long)]
        verbose: bool,
    },
}

/// Build command arguments
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Module script loading: sync, async, defer
    #[arg(short, long)]
    pub script: Option<String>,

    /// Install a DOM shim (window/document) before rendering
    #[arg(short = 'm', long)]
    pub mock: bool,

    /// Bundler mode (default: $MODE, $NODE_ENV, then production)
    #[arg(long)]
    pub mode: Option<String>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

impl Cli {
    pub fn verbose(&self) -> bool {
        match &self.command {
            Commands::Build { build_args } => build_args.verbose,
            Commands::Routes { verbose, .. } => *verbose,
        }
    }
}
