//! Utility functions for CLI operations.
//!
//! This module provides common utility functions used across CLI commands:
//! building the tree from `--schema` and `--config`, picking a file format,
//! and rendering values.

use crate::error::CliError;
use cfgtree::persistence::expand_tilde;
use cfgtree::{Config, ConfigFormat, Schema, Value, YamlFormat};
use clap::ValueEnum;
use std::fs;
use std::path::{Path, PathBuf};

/// Global CLI options shared across all commands.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Suppress non-essential output.
    pub quiet: bool,

    /// Schema file declaring the tree.
    pub schema: Option<PathBuf>,

    /// Configuration files, lowest precedence first.
    pub configs: Vec<PathBuf>,
}

/// File formats understood by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FileFormat {
    /// JSON
    Json,
    /// YAML
    Yaml,
    /// INI
    Ini,
}

impl FileFormat {
    /// Picks the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, CliError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("ini" | "cfg" | "conf") => Ok(Self::Ini),
            _ => Err(CliError::InvalidArguments(format!(
                "Cannot tell the format of {} (use .json, .yaml, .yml or .ini)",
                path.display()
            ))),
        }
    }

    /// Loads `path` into `config`.
    pub fn load(self, config: &Config, path: &Path, as_defaults: bool) -> Result<(), CliError> {
        match self {
            Self::Json => config.json().load(path, as_defaults)?,
            Self::Yaml => config.yaml().load(path, as_defaults)?,
            Self::Ini => config.ini().load(path, as_defaults)?,
        }
        Ok(())
    }

    /// Writes the values of `config` to `path`.
    pub fn dump(self, config: &Config, path: &Path, with_defaults: bool) -> Result<(), CliError> {
        match self {
            Self::Json => config.json().dump(path, with_defaults)?,
            Self::Yaml => config.yaml().dump(path, with_defaults)?,
            Self::Ini => config.ini().dump(path, with_defaults)?,
        }
        Ok(())
    }

    /// Renders the values of `config`.
    pub fn render(self, config: &Config, with_defaults: bool) -> Result<String, CliError> {
        let text = match self {
            Self::Json => config.json().dumps(with_defaults)?,
            Self::Yaml => config.yaml().dumps(with_defaults)?,
            Self::Ini => config.ini().dumps(with_defaults)?,
        };
        Ok(text)
    }
}

/// Builds the configuration tree from the global options.
///
/// With `--schema`, the tree is declared by the schema and every `--config`
/// file is loaded on top. Without it, the first `--config` file is loaded
/// as defaults to infer the tree, then all files are loaded as values.
pub fn load_tree(global: &GlobalOptions) -> Result<Config, CliError> {
    let config = match schema_tree(global)? {
        Some(config) => config,
        None => {
            let Some(first) = global.configs.first() else {
                return Err(CliError::InvalidArguments(
                    "Either --schema or at least one --config is required".to_string(),
                ));
            };
            let config = Config::new();
            FileFormat::from_path(first)?.load(&config, first, true)?;
            config
        }
    };

    for path in &global.configs {
        FileFormat::from_path(path)?.load(&config, path, false)?;
    }

    Ok(config)
}

/// Builds the tree declared by `--schema`, if one was given.
pub fn schema_tree(global: &GlobalOptions) -> Result<Option<Config>, CliError> {
    let Some(path) = &global.schema else {
        return Ok(None);
    };
    let schema = read_schema(path)?;
    Ok(Some(Config::from_schema(schema)?))
}

/// Reads a JSON or YAML schema file.
fn read_schema(path: &Path) -> Result<Schema, CliError> {
    let path = expand_tilde(path)?;
    let format = FileFormat::from_path(&path)?;
    if format == FileFormat::Ini {
        return Err(CliError::InvalidArguments(
            "Schemas must be JSON or YAML".to_string(),
        ));
    }
    let text = fs::read_to_string(&path)?;
    // YAML is a superset of JSON
    let value = YamlFormat.parse(&text)?;
    Ok(Schema::from_value(value))
}

/// Renders a value for terminal output: strings bare, everything else as
/// compact JSON.
pub fn render_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
