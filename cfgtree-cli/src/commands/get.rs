//! Command to print the value at a path.

use crate::error::CliError;
use crate::utils::{load_tree, render_value, GlobalOptions};
use cfgtree::Node;
use clap::Args;

/// Print the value at a path.
///
/// Items print their effective value; sections print their values as JSON.
#[derive(Args)]
pub struct GetCommand {
    /// Path of the item or section, e.g. `server.port`
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Print item values as JSON, quoting strings
    #[arg(long)]
    pub json: bool,
}

impl GetCommand {
    /// Execute the get command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_tree(global)?;

        match config.resolve(self.path.as_str())? {
            Node::Item(item) => {
                let value = item.get()?;
                if self.json {
                    println!("{}", value.unwrap_or_default());
                } else {
                    println!("{}", render_value(value.as_ref()));
                }
            }
            Node::Section(section) => {
                let values = section.dump_values(true, false)?;
                let text = serde_json::to_string_pretty(&values)
                    .map_err(|e| CliError::Library(e.into()))?;
                println!("{text}");
            }
        }

        Ok(())
    }
}
