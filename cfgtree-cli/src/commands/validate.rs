//! Command to validate a configuration tree.

use crate::error::CliError;
use crate::utils::{load_tree, GlobalOptions};
use clap::Args;

/// Check that every item resolves: required items have a value and
/// environment overrides parse.
#[derive(Args)]
pub struct ValidateCommand {}

impl ValidateCommand {
    /// Execute the validate command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_tree(global)?;
        let separator = config.separator();

        let mut failures = 0;
        for (path, item) in config.iter_items(true) {
            if let Err(e) = item.get() {
                eprintln!("{}: {e}", path.join(&separator));
                failures += 1;
            }
        }

        if failures == 0 {
            if !global.quiet {
                println!("Configuration is valid");
            }
            Ok(())
        } else {
            Err(CliError::SemanticFailure(format!(
                "Configuration validation failed ({failures} problem(s))"
            )))
        }
    }
}
