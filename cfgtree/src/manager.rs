//! The configuration manager: a root section that owns its settings.

use std::ops::Deref;

use crate::changeset::ChangesetContext;
use crate::error::Result;
use crate::persistence::{IniFormat, JsonFormat, PersistenceAdapter, YamlFormat};
use crate::schema::Schema;
use crate::section::Section;
use crate::settings::{Settings, SettingsHandle};

/// A configuration tree.
///
/// `Config` dereferences to its root [`Section`], so every section operation
/// is available on it directly. Unlike a plain section, the root owns the
/// [`Settings`] shared by the whole tree, so a `Config` mounted inside
/// another tree keeps its own separator and hook switches.
///
/// # Examples
///
/// ```
/// use cfgtree::{Config, Settings};
/// use serde_json::json;
///
/// let config = Config::with_settings(Settings::default().with_separator("/"));
/// config.add_schema(json!({"server": {"port": 8080}})).unwrap();
/// assert_eq!(config.get("server/port").unwrap(), Some(json!(8080)));
///
/// let text = config.json().dumps(true).unwrap();
/// assert!(text.contains("8080"));
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    root: Section,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Creates an empty tree with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    /// Creates an empty tree with the given settings.
    #[must_use]
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            root: Section::with_own_settings(settings.into_handle()),
        }
    }

    /// Creates a tree from a schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`](crate::Error::Schema) if the schema is not a
    /// valid root.
    pub fn from_schema(schema: impl Into<Schema>) -> Result<Self> {
        Self::from_schema_with_settings(schema, Settings::default())
    }

    /// Creates a tree from a schema with the given settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`](crate::Error::Schema) if the schema is not a
    /// valid root.
    pub fn from_schema_with_settings(schema: impl Into<Schema>, settings: Settings) -> Result<Self> {
        let config = Self::with_settings(settings);
        config.root.add_schema(schema)?;
        Ok(config)
    }

    /// The root section.
    #[must_use]
    pub fn section(&self) -> &Section {
        &self.root
    }

    /// The settings owned by this tree.
    #[must_use]
    pub fn settings_handle(&self) -> SettingsHandle {
        self.root.settings()
    }

    /// JSON persistence for this tree.
    #[must_use]
    pub fn json(&self) -> PersistenceAdapter<JsonFormat> {
        PersistenceAdapter::new(self.root.clone(), JsonFormat)
    }

    /// YAML persistence for this tree.
    #[must_use]
    pub fn yaml(&self) -> PersistenceAdapter<YamlFormat> {
        PersistenceAdapter::new(self.root.clone(), YamlFormat)
    }

    /// INI persistence for this tree.
    #[must_use]
    pub fn ini(&self) -> PersistenceAdapter<IniFormat> {
        PersistenceAdapter::new(self.root.clone(), IniFormat)
    }

    /// A changeset context tracking value changes anywhere in this tree.
    #[must_use]
    pub fn changeset_context(&self, auto_reset: bool) -> ChangesetContext {
        ChangesetContext::new(self.root.clone(), auto_reset)
    }
}

impl Deref for Config {
    type Target = Section;

    fn deref(&self) -> &Section {
        &self.root
    }
}

impl From<Config> for Section {
    fn from(config: Config) -> Self {
        config.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Item, Node};
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_root_owns_settings() {
        let config = Config::new();
        assert!(config.is_manager_root());
        let db = config.add_section("db", Section::new()).unwrap();
        config.settings_handle().borrow_mut().str_path_separator = "/".to_string();
        assert_eq!(db.separator(), "/");
    }

    #[test]
    fn test_nested_config_keeps_its_settings() {
        let outer = Config::new();
        let inner = Config::with_settings(Settings::default().with_separator("::"));
        inner.add_schema(json!({"port": 1})).unwrap();
        outer.add_section("inner", inner.section().clone()).unwrap();
        assert_eq!(outer.get("inner.port").unwrap(), Some(json!(1)));
        assert_eq!(inner.get("port").unwrap(), Some(json!(1)));
        assert_eq!(inner.section().separator(), "::");
    }

    #[test]
    fn test_events_bubble_out_of_nested_config_with_hooks_disabled() {
        let outer = Config::new();
        let inner = Config::with_settings(Settings::default().with_hooks_enabled(false));
        inner.add_schema(json!({"port": 1})).unwrap();
        outer.add_section("inner", inner.section().clone()).unwrap();

        let changed = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&changed);
        outer.on_value_changed(move |item, change| {
            seen.borrow_mut().push((item.path(), change.new_value.clone()));
            Ok(())
        });
        outer.on_not_found(|section, name| {
            Ok(Some(Node::Item(section.add_item(name, Item::builder().default(0).build()?)?)))
        });
        inner.on_value_changed(|_, _| panic!("disabled handler ran"));

        inner.set_value("port", 2).unwrap();
        assert_eq!(
            *changed.borrow(),
            vec![(vec!["inner".to_string(), "port".to_string()], Some(json!(2)))]
        );
        assert_eq!(inner.get("timeout").unwrap(), Some(json!(0)));
        assert!(outer.contains("inner.timeout"));
        assert_eq!(inner.section().settings().borrow().hooks_enabled, Some(false));
    }

    #[test]
    fn test_disabled_hooks_stay_disabled() {
        let config = Config::with_settings(Settings::default().with_hooks_enabled(false));
        config.on_not_found(|section, name| {
            Ok(Some(Node::Item(section.add_item(name, Item::new())?)))
        });
        assert!(matches!(config.resolve("x"), Err(Error::NotFound { .. })));
        config.settings_handle().borrow_mut().hooks_enabled = Some(true);
        assert!(config.resolve("x").is_ok());
    }

    #[test]
    fn test_from_schema_rejects_scalar_root() {
        assert!(matches!(
            Config::from_schema(json!(1)),
            Err(Error::Schema { .. })
        ));
    }
}
