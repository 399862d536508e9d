//! Layerscan CLI - Command-line utility for inspecting container image layers
//! and local filesystems.

mod cli;
mod commands;
mod error;
mod logging;
mod output;
mod progress;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    logging::init(cli.verbose, cli.quiet);

    let formatter = output::create_formatter(cli.json, cli.verbose, cli.quiet);

    match &cli.command {
        cli::Commands::Layer(args) => {
            commands::layer::execute(args, &*formatter, cli.quiet || cli.json)
        }
        cli::Commands::Fs(args) => commands::fs::execute(args, &*formatter, cli.quiet || cli.json),
        cli::Commands::Completion(args) => {
            commands::completion::execute(args.shell);
            Ok(())
        }
    }
}
