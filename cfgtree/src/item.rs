//! Configuration items: the typed leaves of a tree.

use std::cell::RefCell;
use std::env;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::hooks::{Change, Event};
use crate::path::join_segments;
use crate::section::{Section, SectionInner};
use crate::settings::DEFAULT_SEPARATOR;
use crate::types::{display_value, ItemType};

/// Where an item looks for an environment override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvVar {
    /// Use the item's `envvar_name`, or derive one from its path.
    Auto,
    /// Use exactly this variable.
    Named(String),
}

#[derive(Debug, Clone, Default)]
struct ItemState {
    name: Option<String>,
    item_type: ItemType,
    default: Option<Value>,
    value: Option<Value>,
    raw_str_value: Option<String>,
    required: bool,
    envvar: Option<EnvVar>,
    envvar_name: Option<String>,
    help: Option<String>,
}

struct ItemInner {
    state: RefCell<ItemState>,
    section: RefCell<Weak<SectionInner>>,
}

/// A named, typed configuration value.
///
/// `Item` is a handle: clones share the same underlying item. An item is
/// usable on its own and can be attached to at most one [`Section`].
///
/// The effective value is the custom value if one is set, otherwise the
/// default. Values given as strings to an item of a non-string type are
/// parsed, and the original text is kept so it can be written back
/// unchanged.
///
/// # Examples
///
/// ```
/// use cfgtree::{Item, ItemType, Value};
///
/// let item = Item::builder()
///     .name("enabled")
///     .item_type(ItemType::Bool)
///     .default(false)
///     .build()
///     .unwrap();
///
/// item.set("Yes").unwrap();
/// assert_eq!(item.get().unwrap(), Some(Value::Bool(true)));
/// assert_eq!(item.to_string(), "Yes");
/// ```
#[derive(Clone)]
pub struct Item(Rc<ItemInner>);

impl Item {
    /// Creates an unnamed string item with no default.
    #[must_use]
    pub fn new() -> Self {
        Self::from_state(ItemState::default())
    }

    /// Starts building an item.
    #[must_use]
    pub fn builder() -> ItemBuilder {
        <ItemBuilder as Default>::default()
    }

    fn from_state(state: ItemState) -> Self {
        Self(Rc::new(ItemInner {
            state: RefCell::new(state),
            section: RefCell::new(Weak::new()),
        }))
    }

    /// The item's canonical name, if it has been given one.
    #[must_use]
    pub fn name(&self) -> Option<String> {
        self.0.state.borrow().name.clone()
    }

    /// The item's type.
    #[must_use]
    pub fn item_type(&self) -> ItemType {
        self.0.state.borrow().item_type
    }

    /// The default, if any.
    #[must_use]
    pub fn default_value(&self) -> Option<Value> {
        self.0.state.borrow().default.clone()
    }

    /// The custom value, if any. Ignores the default and the environment.
    #[must_use]
    pub fn value(&self) -> Option<Value> {
        self.0.state.borrow().value.clone()
    }

    /// The string the current value was parsed from, if it was set from text.
    #[must_use]
    pub fn raw_str_value(&self) -> Option<String> {
        self.0.state.borrow().raw_str_value.clone()
    }

    /// Whether reading an unset value is an error.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.0.state.borrow().required
    }

    /// Marks the item as required or optional.
    pub fn set_required(&self, required: bool) {
        self.0.state.borrow_mut().required = required;
    }

    /// Help text.
    #[must_use]
    pub fn help(&self) -> Option<String> {
        self.0.state.borrow().help.clone()
    }

    /// Replaces the help text.
    pub fn set_help(&self, help: Option<String>) {
        self.0.state.borrow_mut().help = help;
    }

    /// The environment override mode.
    #[must_use]
    pub fn envvar(&self) -> Option<EnvVar> {
        self.0.state.borrow().envvar.clone()
    }

    /// Enables, changes, or disables the environment override.
    pub fn set_envvar(&self, envvar: Option<EnvVar>) {
        self.0.state.borrow_mut().envvar = envvar;
    }

    /// Explicit variable name used by [`EnvVar::Auto`].
    #[must_use]
    pub fn envvar_name(&self) -> Option<String> {
        self.0.state.borrow().envvar_name.clone()
    }

    /// Sets the variable name used by [`EnvVar::Auto`].
    pub fn set_envvar_name(&self, name: Option<String>) {
        self.0.state.borrow_mut().envvar_name = name;
    }

    /// The environment variable this item currently reads, if overrides are
    /// enabled.
    ///
    /// With [`EnvVar::Auto`] and no explicit name, the variable is the item's
    /// path joined with `_` and upper-cased, after the tree's
    /// `envvar_prefix`.
    #[must_use]
    pub fn envvar_key(&self) -> Option<String> {
        let (envvar, explicit) = {
            let state = self.0.state.borrow();
            (state.envvar.clone(), state.envvar_name.clone())
        };
        match envvar? {
            EnvVar::Named(name) => Some(name),
            EnvVar::Auto => Some(explicit.unwrap_or_else(|| self.derived_envvar_name())),
        }
    }

    fn derived_envvar_name(&self) -> String {
        let prefix = self
            .section()
            .and_then(|s| s.with_settings(|settings| settings.envvar_prefix.clone()))
            .unwrap_or_default();
        format!("{prefix}{}", self.path().join("_").to_uppercase())
    }

    fn envvar_override(&self) -> Result<Option<Value>> {
        let Some(key) = self.envvar_key() else {
            return Ok(None);
        };
        match env::var(&key) {
            Ok(raw) => self.item_type().parse_str(&raw).map(Some),
            Err(_) => Ok(None),
        }
    }

    /// Returns the effective value.
    ///
    /// Lookup order: the environment override (when enabled and present),
    /// the custom value, a copy of the default. An unset optional item
    /// yields `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RequiredValueMissing`] if the item is required and
    /// unset, or a coercion error if the environment variable does not parse.
    pub fn get(&self) -> Result<Option<Value>> {
        if let Some(value) = self.envvar_override()? {
            return Ok(Some(value));
        }
        let state = self.0.state.borrow();
        if let Some(value) = state.value.as_ref().or(state.default.as_ref()) {
            return Ok(Some(value.clone()));
        }
        if state.required {
            return Err(Error::RequiredValueMissing {
                name: self.display_path(),
            });
        }
        Ok(None)
    }

    /// Returns the effective value, or `fallback` when the item is unset.
    /// Never fails for required items.
    ///
    /// # Errors
    ///
    /// Returns a coercion error if the environment variable does not parse.
    pub fn get_or(&self, fallback: impl Into<Value>) -> Result<Value> {
        if let Some(value) = self.envvar_override()? {
            return Ok(value);
        }
        let state = self.0.state.borrow();
        Ok(state
            .value
            .as_ref()
            .or(state.default.as_ref())
            .cloned()
            .unwrap_or_else(|| fallback.into()))
    }

    /// Returns the effective value deserialized into `T`.
    ///
    /// # Errors
    ///
    /// Fails like [`get`](Self::get), or with [`Error::Json`] if the value
    /// does not fit `T`.
    pub fn get_as<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        self.get()?
            .map(|value| serde_json::from_value(value).map_err(Error::from))
            .transpose()
    }

    /// Sets the custom value and raises a value-changed event.
    ///
    /// # Errors
    ///
    /// Returns a coercion error, leaving the item untouched, or the error of
    /// a failing hook handler, after the value has been stored.
    pub fn set(&self, value: impl Into<Value>) -> Result<()> {
        let (value, raw) = self.coerce(value.into())?;
        let change = {
            let mut state = self.0.state.borrow_mut();
            let change = Change {
                old_value: state.value.take(),
                new_value: Some(value.clone()),
                old_raw_str_value: state.raw_str_value.take(),
                new_raw_str_value: raw.clone(),
            };
            state.value = Some(value);
            state.raw_str_value = raw;
            change
        };
        self.notify(&change)
    }

    /// Replaces the default. Does not raise an event.
    ///
    /// # Errors
    ///
    /// Returns a coercion error if the value does not fit the item type.
    pub fn set_default(&self, default: impl Into<Value>) -> Result<()> {
        let item_type = self.item_type();
        let default = item_type.deserialize(&default.into())?;
        self.0.state.borrow_mut().default = Some(default);
        Ok(())
    }

    /// Clears the custom value and its raw string, raising a value-changed
    /// event.
    ///
    /// # Errors
    ///
    /// Returns the error of a failing hook handler.
    pub fn reset(&self) -> Result<()> {
        let change = {
            let mut state = self.0.state.borrow_mut();
            Change {
                old_value: state.value.take(),
                new_value: None,
                old_raw_str_value: state.raw_str_value.take(),
                new_raw_str_value: None,
            }
        };
        self.notify(&change)
    }

    /// True if no custom value is set, or the custom value equals the
    /// default. A value explicitly set to the default is indistinguishable
    /// from an unset one.
    #[must_use]
    pub fn is_default(&self) -> bool {
        let state = self.0.state.borrow();
        match &state.value {
            None => true,
            Some(value) => state.default.as_ref() == Some(value),
        }
    }

    /// True if the item has a custom value or a default.
    #[must_use]
    pub fn has_value(&self) -> bool {
        let state = self.0.state.borrow();
        state.value.is_some() || state.default.is_some()
    }

    /// True if the item has a default.
    #[must_use]
    pub fn has_default(&self) -> bool {
        self.0.state.borrow().default.is_some()
    }

    /// Text form of the item: the raw string it was set from, or the
    /// effective value rendered as text, or an empty string.
    #[must_use]
    pub fn str_value(&self) -> String {
        if let Some(raw) = self.raw_str_value() {
            return raw;
        }
        self.get()
            .ok()
            .flatten()
            .map(|value| display_value(&value))
            .unwrap_or_default()
    }

    /// The section this item is attached to.
    #[must_use]
    pub fn section(&self) -> Option<Section> {
        self.0.section.borrow().upgrade().map(Section)
    }

    /// Path of the item from the outermost section.
    #[must_use]
    pub fn path(&self) -> Vec<String> {
        let mut path = self.section().map(|s| s.path()).unwrap_or_default();
        path.push(self.name().unwrap_or_default());
        path
    }

    fn display_path(&self) -> String {
        let separator = self
            .section()
            .map_or_else(|| DEFAULT_SEPARATOR.to_string(), |s| s.separator());
        join_segments(&self.path(), &separator)
    }

    /// Whether both handles refer to the same item.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// A detached deep copy of this item.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self::from_state(self.0.state.borrow().clone())
    }

    pub(crate) fn attach(&self, section: &Section) {
        *self.0.section.borrow_mut() = Rc::downgrade(&section.0);
    }

    pub(crate) fn detach(&self) {
        *self.0.section.borrow_mut() = Weak::new();
    }

    pub(crate) fn is_attached_to(&self, section: &Section) -> bool {
        self.section().is_some_and(|s| s.ptr_eq(section))
    }

    pub(crate) fn ensure_name(&self, name: &str) -> String {
        let mut state = self.0.state.borrow_mut();
        state.name.get_or_insert_with(|| name.to_string()).clone()
    }

    /// Puts back a previous value without raising an event.
    pub(crate) fn restore(&self, value: Option<Value>, raw: Option<String>) {
        let mut state = self.0.state.borrow_mut();
        state.value = value;
        state.raw_str_value = raw;
    }

    fn coerce(&self, value: Value) -> Result<(Value, Option<String>)> {
        let item_type = self.item_type();
        match value {
            Value::String(raw) if !matches!(item_type, ItemType::Str | ItemType::NotSet) => {
                let parsed = item_type.parse_str(&raw)?;
                Ok((parsed, Some(raw)))
            }
            other => Ok((item_type.deserialize(&other)?, None)),
        }
    }

    fn notify(&self, change: &Change) -> Result<()> {
        if let Some(section) = self.section() {
            section.dispatch(&Event::ValueChanged { item: self, change })?;
        }
        Ok(())
    }
}

impl Default for Item {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.str_value())
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.state.borrow();
        f.debug_struct("Item")
            .field("path", &self.display_path())
            .field("type", &state.item_type)
            .field("value", &state.value)
            .field("default", &state.default)
            .finish()
    }
}

/// Builder for [`Item`].
///
/// When no type is given it is guessed from the default, then from the
/// value, and falls back to `str`.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct ItemBuilder {
    name: Option<String>,
    item_type: Option<ItemType>,
    type_name: Option<String>,
    default: Option<Value>,
    value: Option<Value>,
    required: bool,
    envvar: Option<EnvVar>,
    envvar_name: Option<String>,
    help: Option<String>,
}

impl ItemBuilder {
    /// Sets the canonical name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the type.
    pub const fn item_type(mut self, item_type: ItemType) -> Self {
        self.item_type = Some(item_type);
        self
    }

    /// Sets the type by name or alias, resolved in [`build`](Self::build).
    pub fn type_name(mut self, name: impl Into<String>) -> Self {
        self.type_name = Some(name.into());
        self
    }

    /// Sets the default.
    pub fn default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Sets an initial custom value.
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Marks the item as required.
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Enables the environment override.
    pub fn envvar(mut self, envvar: EnvVar) -> Self {
        self.envvar = Some(envvar);
        self
    }

    /// Sets the variable name used by [`EnvVar::Auto`].
    pub fn envvar_name(mut self, name: impl Into<String>) -> Self {
        self.envvar_name = Some(name.into());
        self
    }

    /// Sets help text.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Builds the item.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownType`] for an unknown type name, or a
    /// coercion error if the default or value does not fit the type.
    pub fn build(self) -> Result<Item> {
        let item_type = match (self.item_type, self.type_name.as_deref()) {
            (Some(item_type), _) => item_type,
            (None, Some(name)) => ItemType::translate(name)?,
            (None, None) => self
                .default
                .iter()
                .chain(self.value.iter())
                .map(ItemType::guess)
                .find(|t| *t != ItemType::NotSet)
                .unwrap_or_default(),
        };
        let default = self
            .default
            .map(|d| item_type.deserialize(&d))
            .transpose()?;
        let item = Item::from_state(ItemState {
            name: self.name,
            item_type,
            default,
            value: None,
            raw_str_value: None,
            required: self.required,
            envvar: self.envvar,
            envvar_name: self.envvar_name,
            help: self.help,
        });
        if let Some(value) = self.value {
            item.set(value)?;
        }
        Ok(item)
    }
}
