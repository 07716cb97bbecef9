//! Library exports for cfgtree-cli.
//!
//! This module exports the CLI structure so benchmarks and documentation
//! tooling can reach the command definitions.

pub mod cli;
pub mod commands;
pub mod error;
pub mod utils;

pub use cli::Cli;
