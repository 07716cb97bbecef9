//! Main entry point for the cfgtree CLI.
//!
//! This is the command-line interface over the cfgtree library. It builds a
//! configuration tree from a schema and layered configuration files and
//! provides commands to inspect and edit it:
//! - `dump`: Print the configuration values
//! - `get`: Print the value at a path
//! - `set`: Set the value at a path and save it
//! - `validate`: Check that every required value is present

mod cli;
mod commands;
mod error;
mod utils;

use clap::Parser;
use cli::Cli;
use utils::GlobalOptions;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let _logger = cfgtree::init_logger(cli.verbose, cli.quiet);

    // Convert CLI args to GlobalOptions
    let global = GlobalOptions {
        quiet: cli.quiet,
        schema: cli.tree.schema,
        configs: cli.tree.configs,
    };

    // Execute the command
    let result = match cli.command {
        cli::Command::Dump(cmd) => cmd.execute(&global),
        cli::Command::Get(cmd) => cmd.execute(&global),
        cli::Command::Set(cmd) => cmd.execute(&global),
        cli::Command::Validate(cmd) => cmd.execute(&global),
        cli::Command::Completions(cmd) => cmd.execute(&global),
    };

    // Handle errors and set exit code
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
