//! Tree-wide settings.
//!
//! A [`Config`](crate::Config) root owns one [`Settings`] object, shared by
//! reference with every section beneath it. Sections never own settings;
//! [`Section::settings`](crate::Section::settings) resolves them by walking
//! up to the nearest root.

use std::cell::RefCell;
use std::rc::Rc;

/// Default separator for string paths.
pub const DEFAULT_SEPARATOR: &str = ".";

/// Behavior switches shared by one configuration tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Separator used to split string paths into segments.
    pub str_path_separator: String,
    /// Whether hook handlers run. `None` means "not decided yet": the first
    /// hook registration switches it on.
    pub hooks_enabled: Option<bool>,
    /// Prepended verbatim to automatically derived environment variable names.
    pub envvar_prefix: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            str_path_separator: DEFAULT_SEPARATOR.to_string(),
            hooks_enabled: None,
            envvar_prefix: None,
        }
    }
}

impl Settings {
    /// Sets the path separator.
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.str_path_separator = separator.into();
        self
    }

    /// Explicitly enables or disables hooks.
    #[must_use]
    pub const fn with_hooks_enabled(mut self, enabled: bool) -> Self {
        self.hooks_enabled = Some(enabled);
        self
    }

    /// Sets the environment variable prefix.
    #[must_use]
    pub fn with_envvar_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.envvar_prefix = Some(prefix.into());
        self
    }

    /// Wraps the settings in a shareable handle.
    #[must_use]
    pub fn into_handle(self) -> SettingsHandle {
        Rc::new(RefCell::new(self))
    }
}

/// Shared, mutable settings. Writes through any handle are seen by every
/// section of the tree.
pub type SettingsHandle = Rc<RefCell<Settings>>;
