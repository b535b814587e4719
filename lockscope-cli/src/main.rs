//! lockscope CLI -- npm manifest dependency and vulnerability scanner
//!
//! Entry point for the `lockscope` binary. Parses arguments, loads the
//! configuration, initializes logging, and dispatches to command handlers.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;
use colored::Colorize;

use lockscope_core::config::LockscopeConfig;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {e}", "error:".red().bold());
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    // `config validate` must still run when the file is broken, so the load
    // error is only surfaced by commands that need a working config.
    let loaded = LockscopeConfig::load_or_default(&cli.config).await;

    let mut general = loaded
        .as_ref()
        .map(|config| config.general.clone())
        .unwrap_or_default();
    if let Some(level) = &cli.log_level {
        general.log_level = level.clone();
    }
    logging::init_tracing(&general)?;

    let writer = OutputWriter::new(cli.output);

    match cli.command {
        Commands::Scan(args) => commands::scan::execute(args, &loaded?, &writer).await,
        Commands::Rules(args) => commands::rules::execute(args, &loaded?, &writer).await,
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    }
}
