//! Command to print configuration values.

use crate::error::CliError;
use crate::utils::{load_tree, FileFormat, GlobalOptions};
use clap::Args;

/// Print the configuration values.
#[derive(Args)]
pub struct DumpCommand {
    /// Output format
    #[arg(long, value_enum, default_value_t = FileFormat::Json)]
    pub format: FileFormat,

    /// Include values that are at their default
    #[arg(long)]
    pub with_defaults: bool,

    /// Print one entry per item keyed by its full path
    #[arg(long)]
    pub flat: bool,
}

impl DumpCommand {
    /// Execute the dump command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_tree(global)?;

        let text = if self.flat {
            let values = config.dump_values(self.with_defaults, true)?;
            match self.format {
                FileFormat::Json => serde_json::to_string_pretty(&values)
                    .map_err(|e| CliError::Library(e.into()))?,
                FileFormat::Yaml => {
                    serde_yaml::to_string(&values).map_err(|e| CliError::Library(e.into()))?
                }
                FileFormat::Ini => {
                    return Err(CliError::InvalidArguments(
                        "--flat cannot be combined with --format ini".to_string(),
                    ))
                }
            }
        } else {
            self.format.render(&config, self.with_defaults)?
        };

        println!("{}", text.trim_end());
        Ok(())
    }
}
