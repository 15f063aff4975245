//! Sluice quote simulator.

mod cli;
mod simulate;

use crate::cli::{Cli, Commands};
use clap::Parser;
use color_eyre::eyre;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    sluice_observability::init_logging(&cli.logs)?;

    match cli.command {
        Commands::Simulate(args) => simulate::run(*args).await?,
    }

    Ok(())
}
