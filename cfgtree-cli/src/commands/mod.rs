//! CLI command implementations.
//!
//! This module contains the implementations of all CLI commands:
//! - `dump`: Print the configuration values
//! - `get`: Print the value at a path
//! - `set`: Set the value at a path and save it
//! - `validate`: Check that every required value is present
//! - `completions`: Generate shell completion scripts

pub mod completions;
pub mod dump;
pub mod get;
pub mod set;
pub mod validate;

pub use completions::CompletionsCommand;
pub use dump::DumpCommand;
pub use get::GetCommand;
pub use set::SetCommand;
pub use validate::ValidateCommand;
