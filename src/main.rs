mod cli;

use anyhow::{Context, Result};
use clap::Parser;

use cli::types::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(dir) = &cli.directory {
        std::env::set_current_dir(dir)
            .with_context(|| format!("Failed to change directory to {}", dir.display()))?;
    }

    let level = weft::commands::common::configured_log_level();
    weft::logging::init(cli.verbose, level.as_deref());

    cli::dispatch::dispatch(cli.command)
}
