//! CLI structure and command definitions.
//!
//! This module defines the main CLI structure using clap's derive macros,
//! including global options and subcommands.

use crate::commands::{
    CompletionsCommand, DumpCommand, GetCommand, SetCommand, ValidateCommand,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Inspect and edit hierarchical configuration files.
#[derive(Parser)]
#[command(name = "cfgtree")]
#[command(version, about = "Inspect and edit hierarchical configuration files", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    #[command(flatten)]
    pub tree: TreeArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Where the configuration tree comes from.
#[derive(Args, Debug, Clone, Default)]
pub struct TreeArgs {
    /// Schema declaring the tree (JSON or YAML)
    #[arg(long, value_name = "FILE", global = true, env = "CFGTREE_SCHEMA")]
    pub schema: Option<PathBuf>,

    /// Configuration file to load; repeat to layer files, later ones win
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub configs: Vec<PathBuf>,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Print the configuration values
    Dump(DumpCommand),

    /// Print the value at a path
    Get(GetCommand),

    /// Set the value at a path and save it
    Set(SetCommand),

    /// Check that every required value is present
    Validate(ValidateCommand),

    /// Generate shell completion scripts
    Completions(CompletionsCommand),
}
