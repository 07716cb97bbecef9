//! Command to set a value and write it back.

use crate::error::CliError;
use crate::utils::{load_tree, schema_tree, FileFormat, GlobalOptions};
use cfgtree::{Config, Value};
use clap::Args;
use serde_json::Map;
use std::path::Path;

/// Set the value at a path and save it to the last `--config` file.
///
/// The value is checked against the tree built from every layer, but only
/// the last file is rewritten: it keeps what it already held plus the new
/// value, so earlier layers are never copied into it. With `--schema`,
/// values equal to their defaults are left out. The file is created if it
/// does not exist yet.
#[derive(Args)]
pub struct SetCommand {
    /// Path of the item, e.g. `server.port`
    #[arg(value_name = "PATH")]
    pub path: String,

    /// New value; converted to the item's type
    #[arg(value_name = "VALUE")]
    pub value: String,

    /// Parse VALUE as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

impl SetCommand {
    /// Execute the set command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let Some(target) = global.configs.last().cloned() else {
            return Err(CliError::InvalidArguments(
                "set needs a --config file to write to".to_string(),
            ));
        };
        let format = FileFormat::from_path(&target)?;

        let value: Value = if self.json {
            serde_json::from_str(&self.value).map_err(|e| {
                CliError::InvalidArguments(format!("VALUE is not valid JSON: {e}"))
            })?
        } else {
            Value::String(self.value.clone())
        };

        // Check the path and value against every layer that exists so far
        let mut sources = global.clone();
        sources.configs.retain(|path| path.exists());
        let layered = load_tree(&sources)?;
        layered.set_value(self.path.as_str(), value.clone())?;

        match schema_tree(global)? {
            Some(own) => {
                if target.exists() {
                    format.load(&own, &target, false)?;
                }
                own.set_value(self.path.as_str(), value)?;
                format.dump(&own, &target, false)?;
            }
            None => {
                let item = layered.get_item(self.path.as_str())?;
                let exported = item
                    .value()
                    .map(|v| item.item_type().serialize(&v))
                    .unwrap_or(Value::Null);
                let own = inferred_file_tree(format, &target)?;
                own.load_values(&nest(&item.path(), exported), true, false)?;
                format.dump(&own, &target, true)?;
            }
        }

        if !global.quiet {
            eprintln!("Set {} in {}", self.path, target.display());
        }
        Ok(())
    }
}

/// Infers a tree from `path` alone, empty if the file does not exist.
fn inferred_file_tree(format: FileFormat, path: &Path) -> Result<Config, CliError> {
    let config = Config::new();
    if path.exists() {
        format.load(&config, path, true)?;
    }
    Ok(config)
}

/// Wraps `value` in one object per path segment.
fn nest(path: &[String], value: Value) -> Value {
    path.iter().rev().fold(value, |inner, segment| {
        let mut map = Map::new();
        map.insert(segment.clone(), inner);
        Value::Object(map)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nest() {
        let path = vec!["a".to_string(), "b".to_string()];
        assert_eq!(nest(&path, json!(1)), json!({"a": {"b": 1}}));
        assert_eq!(nest(&[], json!(1)), json!(1));
    }
}
