//! vite-ssg - static site generation for vite single-page apps.

mod logger;

mod app;
mod bundler;
mod cli;
mod config;
mod embed;
mod error;
mod html;
mod render;
mod utils;

#[cfg(test)]
mod testing;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::SsgConfig;
use utils::plural_count;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose());

    let config = SsgConfig::load(&cli)?;

    match &cli.command {
        Commands::Build { .. } => {
            let report = cli::build::build(&config)?;
            if !report.skipped.is_empty() {
                log!("ssg"; "{} skipped", plural_count(report.skipped.len(), "dynamic route"));
            }
            debug!("ssg"; "wrote {}", plural_count(report.written.len(), "page"));
            Ok(())
        }
        Commands::Routes { .. } => cli::routes::list_routes(&config),
    }
}
