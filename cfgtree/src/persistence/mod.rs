//! Reading and writing trees as JSON, YAML and INI.
//!
//! A [`ConfigFormat`] turns text into a nested [`Value`] object and a
//! section back into text. A [`PersistenceAdapter`] binds a format to a
//! section and adds the file handling.

mod ini;
mod json;
mod yaml;

pub use self::ini::{IniFormat, INI_ROOT_SECTION};
pub use self::json::JsonFormat;
pub use self::yaml::YamlFormat;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{Error, Result};
use crate::section::Section;

/// A text format for configuration trees.
pub trait ConfigFormat {
    /// Short name of the format, used in log messages.
    fn name(&self) -> &'static str;

    /// Parses text into a nested object of values.
    ///
    /// # Errors
    ///
    /// Returns the format's parse error, or [`Error::TypeMismatch`] if the
    /// document is not a mapping.
    fn parse(&self, text: &str) -> Result<Value>;

    /// Renders the values of `section`.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be read or represented.
    fn render(&self, section: &Section, with_defaults: bool) -> Result<String>;
}

/// Loads and stores the values of one section in one format.
#[derive(Debug, Clone)]
pub struct PersistenceAdapter<F> {
    section: Section,
    format: F,
}

impl<F: ConfigFormat> PersistenceAdapter<F> {
    /// Binds `format` to `section`.
    pub const fn new(section: Section, format: F) -> Self {
        Self { section, format }
    }

    /// The bound section.
    pub const fn section(&self) -> &Section {
        &self.section
    }

    /// Loads values from a file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if the file cannot be read, a parse
    /// error, or any error from [`Section::load_values`].
    pub fn load(&self, path: impl AsRef<Path>, as_defaults: bool) -> Result<()> {
        let path = expand_tilde(path.as_ref())?;
        let text = fs::read_to_string(&path).map_err(|e| Error::InvalidPath {
            path: path.clone(),
            reason: format!("failed to read {} file: {e}", self.format.name()),
        })?;
        log::debug!("loading {} values from {}", self.format.name(), path.display());
        self.loads(&text, as_defaults)
    }

    /// Loads every file in `paths` that exists, in order, so later files
    /// override earlier ones. Returns how many files were loaded.
    ///
    /// # Errors
    ///
    /// Fails like [`load`](Self::load) on the first file that exists but
    /// does not load.
    pub fn load_all<I, P>(&self, paths: I, as_defaults: bool) -> Result<usize>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut loaded = 0;
        for path in paths {
            let path = path.as_ref();
            if self.store_exists(path) {
                self.load(path, as_defaults)?;
                loaded += 1;
            } else {
                log::debug!("skipping missing {}", path.display());
            }
        }
        Ok(loaded)
    }

    /// Loads values from text.
    ///
    /// # Errors
    ///
    /// Returns a parse error or any error from [`Section::load_values`].
    pub fn loads(&self, text: &str, as_defaults: bool) -> Result<()> {
        let values = self.format.parse(text)?;
        self.section.load_values(&values, as_defaults, false)
    }

    /// Writes the values to a file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if the file cannot be written, or any
    /// rendering error.
    pub fn dump(&self, path: impl AsRef<Path>, with_defaults: bool) -> Result<()> {
        let path = expand_tilde(path.as_ref())?;
        let text = self.dumps(with_defaults)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::InvalidPath {
                path: parent.to_path_buf(),
                reason: format!("failed to create directory: {e}"),
            })?;
        }
        fs::write(&path, text).map_err(|e| Error::InvalidPath {
            path: path.clone(),
            reason: format!("failed to write {} file: {e}", self.format.name()),
        })?;
        log::debug!("wrote {} values to {}", self.format.name(), path.display());
        Ok(())
    }

    /// Renders the values as text.
    ///
    /// # Errors
    ///
    /// Returns any rendering error.
    pub fn dumps(&self, with_defaults: bool) -> Result<String> {
        self.format.render(&self.section, with_defaults)
    }

    /// Whether `path` names an existing file.
    pub fn store_exists(&self, path: impl AsRef<Path>) -> bool {
        expand_tilde(path.as_ref()).is_ok_and(|p| p.is_file())
    }
}

/// Expands a leading `~` to the home directory.
///
/// # Errors
///
/// Returns [`Error::InvalidPath`] if the path is not UTF-8, the home
/// directory is unknown, or the path uses `~user`.
pub fn expand_tilde(path: &Path) -> Result<PathBuf> {
    let Some(raw) = path.to_str() else {
        return Err(Error::InvalidPath {
            path: path.to_path_buf(),
            reason: "path is not valid UTF-8".to_string(),
        });
    };
    if !raw.starts_with('~') {
        return Ok(path.to_path_buf());
    }
    let home = home::home_dir().ok_or_else(|| Error::InvalidPath {
        path: path.to_path_buf(),
        reason: "cannot determine home directory".to_string(),
    })?;
    if raw == "~" {
        Ok(home)
    } else if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        Ok(home.join(rest))
    } else {
        Err(Error::InvalidPath {
            path: path.to_path_buf(),
            reason: "~user paths are not supported".to_string(),
        })
    }
}

/// Requires a parsed document to be a mapping. An empty document is an
/// empty mapping.
pub(crate) fn expect_object(value: Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Object(serde_json::Map::new())),
        Value::Object(_) => Ok(value),
        other => Err(Error::TypeMismatch {
            expected: "mapping at the document root".to_string(),
            actual: crate::types::describe_kind(&other).to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use serde_json::json;
    use tempfile::TempDir;

    fn config() -> Config {
        Config::from_schema(json!({"server": {"host": "localhost", "port": 80}})).unwrap()
    }

    #[test]
    fn test_expand_tilde() {
        let plain = Path::new("/etc/app.json");
        assert_eq!(expand_tilde(plain).unwrap(), plain);
        if let Some(home) = home::home_dir() {
            assert_eq!(expand_tilde(Path::new("~")).unwrap(), home);
            assert_eq!(
                expand_tilde(Path::new("~/app.json")).unwrap(),
                home.join("app.json")
            );
        }
        assert!(expand_tilde(Path::new("~bob/app.json")).is_err());
    }

    #[test]
    fn test_dump_creates_parents_and_load_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/dir/app.json");
        let config = config();
        config.set_value("server.port", 8080).unwrap();
        config.json().dump(&path, false).unwrap();
        assert!(config.json().store_exists(&path));

        let fresh = self::config();
        fresh.json().load(&path, false).unwrap();
        assert_eq!(fresh.get("server.port").unwrap(), Some(json!(8080)));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = config()
            .yaml()
            .load(dir.path().join("absent.yaml"), false)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));
    }

    #[test]
    fn test_load_all_skips_missing_and_later_wins() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("a.json");
        let second = dir.path().join("b.json");
        fs::write(&first, r#"{"server": {"port": 1, "host": "a"}}"#).unwrap();
        fs::write(&second, r#"{"server": {"port": 2}}"#).unwrap();
        let config = config();
        let loaded = config
            .json()
            .load_all([&first, &dir.path().join("missing.json"), &second], false)
            .unwrap();
        assert_eq!(loaded, 2);
        assert_eq!(config.get("server.port").unwrap(), Some(json!(2)));
        assert_eq!(config.get("server.host").unwrap(), Some(json!("a")));
    }

    #[test]
    fn test_non_mapping_document_rejected() {
        assert!(matches!(
            config().json().loads("[1, 2]", false),
            Err(Error::TypeMismatch { .. })
        ));
        config().yaml().loads("", false).unwrap();
    }
}
