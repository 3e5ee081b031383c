//! DrDocer CLI: infrastructure documentation from discovered metadata.
//!
//! Aggregates servers and services from configured sources, links them into
//! a dependency graph and renders one Markdown document per entity.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
