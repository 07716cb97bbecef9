//! Sections: the containers of a configuration tree.
//!
//! A [`Section`] maps names to child [`Node`]s in insertion order and keeps
//! a weak link to its parent. Lookups walk the tree one segment at a time;
//! a miss raises a `not_found` event that a hook may answer with a node.

use std::cell::{OnceCell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::hooks::{Change, Event, HookId, HookKind, Hooks};
use crate::item::Item;
use crate::path::{join_segments, ToPath};
use crate::schema::{self, Schema};
use crate::settings::{Settings, SettingsHandle};
use crate::types::describe_kind;

/// A child of a section.
#[derive(Debug, Clone)]
pub enum Node {
    /// A leaf.
    Item(Item),
    /// A nested section.
    Section(Section),
}

impl Node {
    /// Returns the item, if this node is one.
    #[must_use]
    pub const fn as_item(&self) -> Option<&Item> {
        match self {
            Self::Item(item) => Some(item),
            Self::Section(_) => None,
        }
    }

    /// Returns the section, if this node is one.
    #[must_use]
    pub const fn as_section(&self) -> Option<&Section> {
        match self {
            Self::Section(section) => Some(section),
            Self::Item(_) => None,
        }
    }

    /// Whether this node is an item.
    #[must_use]
    pub const fn is_item(&self) -> bool {
        matches!(self, Self::Item(_))
    }

    /// Whether this node is a section.
    #[must_use]
    pub const fn is_section(&self) -> bool {
        matches!(self, Self::Section(_))
    }

    /// Whether both nodes refer to the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Item(a), Self::Item(b)) => a.ptr_eq(b),
            (Self::Section(a), Self::Section(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<Item> for Node {
    fn from(item: Item) -> Self {
        Self::Item(item)
    }
}

impl From<Section> for Node {
    fn from(section: Section) -> Self {
        Self::Section(section)
    }
}

pub(crate) struct SectionInner {
    children: RefCell<Vec<(String, Node)>>,
    parent: RefCell<Weak<SectionInner>>,
    alias: RefCell<Option<String>>,
    hooks: Hooks,
    own_settings: Option<SettingsHandle>,
    detached_settings: SettingsHandle,
}

/// A named container of items and sections.
///
/// `Section` is a handle: clones share the same underlying section.
///
/// # Examples
///
/// ```
/// use cfgtree::{Section, Value};
/// use serde_json::json;
///
/// let config = Section::from_schema(json!({"db": {"port": 5432, "ssl": true}})).unwrap();
/// assert_eq!(config.get("db.port").unwrap(), Some(Value::from(5432)));
/// assert_eq!(config.get(&["db", "ssl"]).unwrap(), Some(Value::Bool(true)));
/// ```
#[derive(Clone)]
pub struct Section(pub(crate) Rc<SectionInner>);

impl Default for Section {
    fn default() -> Self {
        Self::new()
    }
}

impl Section {
    /// Creates an empty, detached section.
    #[must_use]
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Creates a section that owns `settings`. Used for manager roots.
    pub(crate) fn with_own_settings(settings: SettingsHandle) -> Self {
        Self::build(Some(settings))
    }

    fn build(own_settings: Option<SettingsHandle>) -> Self {
        Self(Rc::new(SectionInner {
            children: RefCell::new(Vec::new()),
            parent: RefCell::new(Weak::new()),
            alias: RefCell::new(None),
            hooks: Hooks::default(),
            own_settings,
            detached_settings: Settings::default().into_handle(),
        }))
    }

    /// Creates a detached section populated from a schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if the schema is not a valid root.
    pub fn from_schema(schema: impl Into<Schema>) -> Result<Self> {
        let section = Self::new();
        section.add_schema(schema)?;
        Ok(section)
    }

    /// Declares more sections and items from a schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if the schema is not a valid root, and any
    /// error raised while attaching its children.
    pub fn add_schema(&self, schema: impl Into<Schema>) -> Result<()> {
        schema::parse_into(self, schema.into())
    }

    /// The key this section was attached under.
    #[must_use]
    pub fn alias(&self) -> Option<String> {
        self.0.alias.borrow().clone()
    }

    /// The parent section.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0.parent.borrow().upgrade().map(Self)
    }

    /// Whether this section owns its settings.
    #[must_use]
    pub fn is_manager_root(&self) -> bool {
        self.0.own_settings.is_some()
    }

    /// Alias path from the outermost section down to this one.
    #[must_use]
    pub fn path(&self) -> Vec<String> {
        let mut path = Vec::new();
        let mut current = Some(self.clone());
        while let Some(section) = current {
            let parent = section.parent();
            if parent.is_some() {
                if let Some(alias) = section.alias() {
                    path.push(alias);
                }
            }
            current = parent;
        }
        path.reverse();
        path
    }

    /// The settings in effect for this section.
    ///
    /// A manager root answers with its own settings, any other section with
    /// its parent's. A section with neither answers with private defaults.
    #[must_use]
    pub fn settings(&self) -> SettingsHandle {
        if let Some(own) = &self.0.own_settings {
            return Rc::clone(own);
        }
        match self.parent() {
            Some(parent) => parent.settings(),
            None => Rc::clone(&self.0.detached_settings),
        }
    }

    pub(crate) fn with_settings<R>(&self, f: impl FnOnce(&Settings) -> R) -> R {
        let handle = self.settings();
        let settings = handle.borrow();
        f(&settings)
    }

    /// The active path separator.
    #[must_use]
    pub fn separator(&self) -> String {
        self.with_settings(|s| s.str_path_separator.clone())
    }

    fn hooks_enabled(&self) -> bool {
        self.with_settings(|s| s.hooks_enabled.unwrap_or(false))
    }

    /// Number of distinct children, with aliases collapsed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter_all(false).len()
    }

    /// Whether the section has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.children.borrow().is_empty()
    }

    /// All keys, aliases included, in insertion order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.0
            .children
            .borrow()
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn child(&self, key: &str) -> Option<Node> {
        self.0
            .children
            .borrow()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, node)| node.clone())
    }

    /// Whether `path` resolves. Never runs `not_found` hooks.
    #[must_use]
    pub fn contains<P: ToPath + ?Sized>(&self, path: &P) -> bool {
        let Ok(segments) = path.to_segments(&self.separator()) else {
            return false;
        };
        let mut current = Node::Section(self.clone());
        for segment in &segments {
            let next = match &current {
                Node::Section(section) => section.child(segment),
                Node::Item(_) => None,
            };
            match next {
                Some(node) => current = node,
                None => return false,
            }
        }
        true
    }

    /// Resolves a path to a node.
    ///
    /// Each segment is looked up in turn. On a miss the `not_found` event is
    /// dispatched; a node returned by a hook becomes the resolution.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unresolved names and
    /// [`Error::NotASection`] when the path continues past an item.
    pub fn resolve<P: ToPath + ?Sized>(&self, path: &P) -> Result<Node> {
        let segments = path.to_segments(&self.separator())?;
        self.resolve_segments(&segments)
    }

    fn resolve_segments(&self, segments: &[String]) -> Result<Node> {
        let Some((first, rest)) = segments.split_first() else {
            return Err(Error::InvalidKey {
                key: String::new(),
                reason: "empty path".to_string(),
            });
        };
        let node = self.resolve_one(first)?;
        if rest.is_empty() {
            return Ok(node);
        }
        match node {
            Node::Section(section) => section.resolve_segments(rest),
            Node::Item(_) => Err(Error::NotASection {
                name: first.clone(),
            }),
        }
    }

    fn resolve_one(&self, name: &str) -> Result<Node> {
        if let Some(node) = self.child(name) {
            return Ok(node);
        }
        let event = Event::NotFound {
            section: self,
            name,
        };
        if let Some(node) = self.dispatch(&event)? {
            log::trace!("not_found hook resolved '{name}'");
            return Ok(node);
        }
        Err(Error::NotFound {
            name: name.to_string(),
            section: self.path(),
        })
    }

    /// Resolves a path that must end at an item.
    ///
    /// # Errors
    ///
    /// Fails like [`resolve`](Self::resolve), or with [`Error::NotAnItem`].
    pub fn get_item<P: ToPath + ?Sized>(&self, path: &P) -> Result<Item> {
        let segments = path.to_segments(&self.separator())?;
        match self.resolve_segments(&segments)? {
            Node::Item(item) => Ok(item),
            Node::Section(_) => Err(Error::NotAnItem {
                name: join_segments(&segments, &self.separator()),
            }),
        }
    }

    /// Resolves a path that must end at a section.
    ///
    /// # Errors
    ///
    /// Fails like [`resolve`](Self::resolve), or with [`Error::NotASection`].
    pub fn get_section<P: ToPath + ?Sized>(&self, path: &P) -> Result<Self> {
        let segments = path.to_segments(&self.separator())?;
        match self.resolve_segments(&segments)? {
            Node::Section(section) => Ok(section),
            Node::Item(_) => Err(Error::NotASection {
                name: join_segments(&segments, &self.separator()),
            }),
        }
    }

    /// Effective value of the item at `path`.
    ///
    /// # Errors
    ///
    /// Fails like [`get_item`](Self::get_item) and [`Item::get`].
    pub fn get<P: ToPath + ?Sized>(&self, path: &P) -> Result<Option<Value>> {
        self.get_item(path)?.get()
    }

    /// Effective value of the item at `path`, or `fallback` when unset.
    ///
    /// # Errors
    ///
    /// Fails like [`get_item`](Self::get_item) and [`Item::get_or`].
    pub fn get_or<P: ToPath + ?Sized>(&self, path: &P, fallback: impl Into<Value>) -> Result<Value> {
        self.get_item(path)?.get_or(fallback)
    }

    /// Sets the value of the item at `path`.
    ///
    /// # Errors
    ///
    /// Fails like [`get_item`](Self::get_item) and [`Item::set`].
    pub fn set_value<P: ToPath + ?Sized>(&self, path: &P, value: impl Into<Value>) -> Result<()> {
        self.get_item(path)?.set(value)
    }

    fn check_alias(&self, alias: &str) -> Result<()> {
        let separator = self.separator();
        if alias.is_empty() {
            return Err(Error::InvalidKey {
                key: alias.to_string(),
                reason: "names must not be empty".to_string(),
            });
        }
        if !separator.is_empty() && alias.contains(&separator) {
            return Err(Error::InvalidKey {
                key: alias.to_string(),
                reason: format!("names must not contain the path separator '{separator}'"),
            });
        }
        Ok(())
    }

    /// Attaches an item under `alias` and returns the attached handle.
    ///
    /// An item without a name takes `alias` as its name. If its name differs
    /// from `alias`, it becomes reachable under both. An item already
    /// attached to another section is copied rather than moved. An existing
    /// item under the same key is replaced in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] for names containing the separator and
    /// [`Error::UnsupportedOperation`] if a section occupies the key.
    pub fn add_item(&self, alias: &str, item: Item) -> Result<Item> {
        self.check_alias(alias)?;
        let item = if item.section().is_some() && !item.is_attached_to(self) {
            item.duplicate()
        } else {
            item
        };
        let name = item.ensure_name(alias);
        self.check_alias(&name)?;
        for key in [name.as_str(), alias] {
            if let Some(Node::Section(_)) = self.child(key) {
                return Err(Error::unsupported(format!(
                    "'{key}' holds a section and cannot be replaced by an item"
                )));
            }
        }

        self.put(&name, Node::Item(item.clone()));
        if name != alias {
            self.put(alias, Node::Item(item.clone()));
        }
        item.attach(self);

        self.dispatch(&Event::ItemAdded {
            section: self,
            alias,
            item: &item,
        })?;
        Ok(item)
    }

    fn put(&self, key: &str, node: Node) {
        let replaced = {
            let mut children = self.0.children.borrow_mut();
            match children.iter_mut().find(|(k, _)| k == key) {
                Some(slot) => Some(std::mem::replace(&mut slot.1, node)),
                None => {
                    children.push((key.to_string(), node));
                    None
                }
            }
        };
        if let Some(Node::Item(old)) = replaced {
            let still_present = self
                .0
                .children
                .borrow()
                .iter()
                .any(|(_, n)| matches!(n, Node::Item(i) if i.ptr_eq(&old)));
            if !still_present {
                old.detach();
            }
        }
    }

    /// Attaches a section under `alias`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperation`] if an item occupies the key or
    /// the section already has a parent, and [`Error::Schema`] for a
    /// duplicate section name or an attempt to create a cycle.
    pub fn add_section(&self, alias: &str, section: Self) -> Result<Self> {
        self.check_alias(alias)?;
        match self.child(alias) {
            Some(Node::Item(_)) => {
                return Err(Error::unsupported(format!(
                    "'{alias}' holds an item and cannot be replaced by a section"
                )));
            }
            Some(Node::Section(_)) => {
                return Err(Error::schema(format!("duplicate section '{alias}'")));
            }
            None => {}
        }
        if section.parent().is_some() {
            return Err(Error::unsupported(format!(
                "section '{}' is already attached elsewhere",
                section.alias().unwrap_or_default()
            )));
        }
        let mut ancestor = Some(self.clone());
        while let Some(current) = ancestor {
            if current.ptr_eq(&section) {
                return Err(Error::schema(format!(
                    "adding '{alias}' would make a section its own descendant"
                )));
            }
            ancestor = current.parent();
        }

        *section.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        *section.0.alias.borrow_mut() = Some(alias.to_string());
        self.0
            .children
            .borrow_mut()
            .push((alias.to_string(), Node::Section(section.clone())));

        self.dispatch(&Event::SectionAdded {
            section: self,
            alias,
            subject: &section,
        })?;
        Ok(section)
    }

    /// Attaches a node at `path`, whose parent section must already resolve.
    ///
    /// # Errors
    ///
    /// Fails like [`add_item`](Self::add_item) or
    /// [`add_section`](Self::add_section), or if the parent does not resolve.
    pub fn insert<P: ToPath + ?Sized>(&self, path: &P, node: impl Into<Node>) -> Result<Node> {
        let segments = path.to_segments(&self.separator())?;
        let Some((last, parents)) = segments.split_last() else {
            return Err(Error::InvalidKey {
                key: String::new(),
                reason: "empty path".to_string(),
            });
        };
        let parent = if parents.is_empty() {
            self.clone()
        } else {
            match self.resolve_segments(parents)? {
                Node::Section(section) => section,
                Node::Item(_) => {
                    return Err(Error::NotASection {
                        name: join_segments(parents, &self.separator()),
                    })
                }
            }
        };
        match node.into() {
            Node::Item(item) => parent.add_item(last, item).map(Node::Item),
            Node::Section(section) => parent.add_section(last, section).map(Node::Section),
        }
    }

    /// All children as `(path, node)` pairs, in insertion order.
    ///
    /// Each item or section is listed once, under its canonical name, however
    /// many aliases point at it.
    #[must_use]
    pub fn iter_all(&self, recursive: bool) -> Vec<(Vec<String>, Node)> {
        let mut out = Vec::new();
        self.collect_nodes(recursive, &[], &mut out);
        out
    }

    fn collect_nodes(&self, recursive: bool, prefix: &[String], out: &mut Vec<(Vec<String>, Node)>) {
        let children = self.0.children.borrow().clone();
        let mut seen = HashSet::new();
        for (key, node) in children {
            let name = match &node {
                Node::Section(section) => section.alias().unwrap_or_else(|| key.clone()),
                Node::Item(item) => item.name().unwrap_or_else(|| key.clone()),
            };
            if !seen.insert(name.clone()) {
                continue;
            }
            let mut path = prefix.to_vec();
            path.push(name);
            if let (true, Node::Section(section)) = (recursive, &node) {
                out.push((path.clone(), node.clone()));
                section.collect_nodes(true, &path, out);
            } else {
                out.push((path, node));
            }
        }
    }

    /// Items as `(path, item)` pairs.
    #[must_use]
    pub fn iter_items(&self, recursive: bool) -> Vec<(Vec<String>, Item)> {
        self.iter_all(recursive)
            .into_iter()
            .filter_map(|(path, node)| match node {
                Node::Item(item) => Some((path, item)),
                Node::Section(_) => None,
            })
            .collect()
    }

    /// Sections as `(path, section)` pairs.
    #[must_use]
    pub fn iter_sections(&self, recursive: bool) -> Vec<(Vec<String>, Self)> {
        self.iter_all(recursive)
            .into_iter()
            .filter_map(|(path, node)| match node {
                Node::Section(section) => Some((path, section)),
                Node::Item(_) => None,
            })
            .collect()
    }

    /// Paths of all children.
    #[must_use]
    pub fn iter_paths(&self, recursive: bool) -> Vec<Vec<String>> {
        self.iter_all(recursive)
            .into_iter()
            .map(|(path, _)| path)
            .collect()
    }

    /// Resets every item in the tree below this section.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a value-changed hook.
    pub fn reset(&self) -> Result<()> {
        for (_, item) in self.iter_items(true) {
            item.reset()?;
        }
        Ok(())
    }

    /// True if every item below this section is at its default.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.iter_items(true).iter().all(|(_, item)| item.is_default())
    }

    /// Exports effective values as a JSON object.
    ///
    /// Items with neither a value nor a default are left out, as are items at
    /// their default unless `with_defaults` is set. Empty sections are left
    /// out. With `flat`, keys are separator-joined paths.
    ///
    /// # Errors
    ///
    /// Fails if reading an item fails.
    pub fn dump_values(&self, with_defaults: bool, flat: bool) -> Result<Value> {
        self.export(with_defaults, flat, false)
    }

    /// Like [`dump_values`](Self::dump_values), with each value in its
    /// exported form (see [`ItemType::serialize`](crate::ItemType::serialize)).
    pub(crate) fn export(&self, with_defaults: bool, flat: bool, serialize: bool) -> Result<Value> {
        let mut values = Map::new();
        if flat {
            let separator = self.separator();
            for (path, item) in self.iter_items(true) {
                if let Some(value) = exported_value(&item, with_defaults, serialize)? {
                    values.insert(join_segments(&path, &separator), value);
                }
            }
        } else {
            for (path, node) in self.iter_all(false) {
                let key = path.concat();
                match node {
                    Node::Section(section) => {
                        let nested = section.export(with_defaults, false, serialize)?;
                        if nested.as_object().is_some_and(|m| !m.is_empty()) {
                            values.insert(key, nested);
                        }
                    }
                    Node::Item(item) => {
                        if let Some(value) = exported_value(&item, with_defaults, serialize)? {
                            values.insert(key, value);
                        }
                    }
                }
            }
        }
        Ok(Value::Object(values))
    }

    /// Imports values from a JSON object.
    ///
    /// Known items get their value set (their default, with `as_defaults`).
    /// Unknown names are skipped, unless `as_defaults` is set, in which case
    /// objects become sections and anything else becomes an item. An object
    /// carrying `@` keys becomes a single item. With `flat`, keys are
    /// separator-joined paths.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if `values`, or the value aimed at a
    /// section, is not an object, and any coercion error.
    pub fn load_values(&self, values: &Value, as_defaults: bool, flat: bool) -> Result<()> {
        let Value::Object(map) = values else {
            return Err(Error::TypeMismatch {
                expected: "dict".to_string(),
                actual: describe_kind(values).to_string(),
            });
        };
        if flat {
            let nested = unflatten(map, &self.separator())?;
            return self.load_map(&nested, as_defaults);
        }
        self.load_map(map, as_defaults)
    }

    fn load_map(&self, map: &Map<String, Value>, as_defaults: bool) -> Result<()> {
        for (name, value) in map {
            match self.child(name) {
                Some(Node::Item(item)) => {
                    if as_defaults {
                        item.set_default(value.clone())?;
                    } else {
                        item.set(value.clone())?;
                    }
                }
                Some(Node::Section(section)) => section.load_values(value, as_defaults, false)?,
                None if as_defaults => {
                    match schema::node_for_value(name, value)? {
                        Node::Item(item) => {
                            self.add_item(name, item)?;
                        }
                        Node::Section(section) => {
                            self.add_section(name, section)?;
                        }
                    }
                }
                None => log::trace!("skipping unknown key '{name}'"),
            }
        }
        Ok(())
    }

    /// Registers a hook handler and returns its id.
    ///
    /// If the tree has not decided whether hooks are enabled, registering a
    /// handler enables them.
    pub fn register_hook<F>(&self, kind: HookKind, handler: F) -> HookId
    where
        F: Fn(&Event<'_>) -> Result<Option<Node>> + 'static,
    {
        let handle = self.settings();
        {
            let mut settings = handle.borrow_mut();
            if settings.hooks_enabled.is_none() {
                settings.hooks_enabled = Some(true);
            }
        }
        self.0.hooks.register(kind, Rc::new(handler))
    }

    /// Removes a handler. Returns false if it was not registered here.
    pub fn unregister_hook(&self, id: HookId) -> bool {
        self.0.hooks.unregister(id)
    }

    /// Registers a `not_found` handler. Returning `Some` resolves the name.
    pub fn on_not_found<F>(&self, handler: F) -> HookId
    where
        F: Fn(&Self, &str) -> Result<Option<Node>> + 'static,
    {
        self.register_hook(HookKind::NotFound, move |event| match event {
            Event::NotFound { section, name } => handler(section, name),
            _ => Ok(None),
        })
    }

    /// Registers an observer for items being attached.
    pub fn on_item_added<F>(&self, handler: F) -> HookId
    where
        F: Fn(&Self, &str, &Item) -> Result<()> + 'static,
    {
        self.register_hook(HookKind::ItemAdded, move |event| {
            if let Event::ItemAdded {
                section,
                alias,
                item,
            } = event
            {
                handler(section, alias, item)?;
            }
            Ok(None)
        })
    }

    /// Registers an observer for sections being attached.
    pub fn on_section_added<F>(&self, handler: F) -> HookId
    where
        F: Fn(&Self, &str, &Self) -> Result<()> + 'static,
    {
        self.register_hook(HookKind::SectionAdded, move |event| {
            if let Event::SectionAdded {
                section,
                alias,
                subject,
            } = event
            {
                handler(section, alias, subject)?;
            }
            Ok(None)
        })
    }

    /// Registers an observer for value changes.
    pub fn on_value_changed<F>(&self, handler: F) -> HookId
    where
        F: Fn(&Item, &Change) -> Result<()> + 'static,
    {
        self.register_hook(HookKind::ValueChanged, move |event| {
            if let Event::ValueChanged { item, change } = event {
                handler(item, change)?;
            }
            Ok(None)
        })
    }

    /// Raises `event` here and then in each ancestor, stopping at the first
    /// handler that produces a node.
    ///
    /// Handlers only run on sections whose tree has hooks enabled, but the
    /// event always continues upward, so a nested tree with hooks disabled
    /// still reaches the handlers of the tree it is mounted in.
    pub(crate) fn dispatch(&self, event: &Event<'_>) -> Result<Option<Node>> {
        if self.hooks_enabled() {
            if let Some(node) = self.0.hooks.run(event)? {
                return Ok(Some(node));
            }
        }
        match self.parent() {
            Some(parent) => parent.dispatch(event),
            None => Ok(None),
        }
    }

    /// Whether both handles refer to the same section.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// A lazily resolved reference to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] if the path is malformed. Resolution
    /// itself is deferred until the proxy is used.
    pub fn proxy<P: ToPath + ?Sized>(&self, path: &P) -> Result<PathProxy> {
        Ok(PathProxy {
            section: self.clone(),
            path: path.to_segments(&self.separator())?,
            resolved: OnceCell::new(),
        })
    }
}

fn exported_value(item: &Item, with_defaults: bool, serialize: bool) -> Result<Option<Value>> {
    if !item.has_value() || (!with_defaults && item.is_default()) {
        return Ok(None);
    }
    Ok(item.get()?.map(|value| {
        if serialize {
            item.item_type().serialize(&value)
        } else {
            value
        }
    }))
}

fn unflatten(flat: &Map<String, Value>, separator: &str) -> Result<Map<String, Value>> {
    let mut nested = Map::new();
    for (key, value) in flat {
        let segments = key.to_segments(separator)?;
        let Some((last, parents)) = segments.split_last() else {
            continue;
        };
        let mut cursor = &mut nested;
        for segment in parents {
            let entry = cursor
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            let actual = describe_kind(entry);
            let Value::Object(next) = entry else {
                return Err(Error::TypeMismatch {
                    expected: "dict".to_string(),
                    actual: actual.to_string(),
                });
            };
            cursor = next;
        }
        cursor.insert(last.clone(), value.clone());
    }
    Ok(nested)
}

impl fmt::Debug for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Section")
            .field("path", &self.path())
            .field("keys", &self.keys())
            .finish()
    }
}

/// A path bound to a section, resolved on first use and cached.
pub struct PathProxy {
    section: Section,
    path: Vec<String>,
    resolved: OnceCell<Node>,
}

impl PathProxy {
    /// The proxied path.
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Resolves the path, or returns the cached node.
    ///
    /// # Errors
    ///
    /// Fails like [`Section::resolve`]. Failures are not cached.
    pub fn node(&self) -> Result<Node> {
        if let Some(node) = self.resolved.get() {
            return Ok(node.clone());
        }
        let node = self.section.resolve(&self.path)?;
        Ok(self.resolved.get_or_init(|| node).clone())
    }

    /// The proxied item.
    ///
    /// # Errors
    ///
    /// Fails like [`node`](Self::node), or with [`Error::NotAnItem`].
    pub fn item(&self) -> Result<Item> {
        match self.node()? {
            Node::Item(item) => Ok(item),
            Node::Section(_) => Err(Error::NotAnItem {
                name: join_segments(&self.path, &self.section.separator()),
            }),
        }
    }

    /// The proxied section.
    ///
    /// # Errors
    ///
    /// Fails like [`node`](Self::node), or with [`Error::NotASection`].
    pub fn section(&self) -> Result<Section> {
        match self.node()? {
            Node::Section(section) => Ok(section),
            Node::Item(_) => Err(Error::NotASection {
                name: join_segments(&self.path, &self.section.separator()),
            }),
        }
    }

    /// Effective value of the proxied item.
    ///
    /// # Errors
    ///
    /// Fails like [`item`](Self::item) and [`Item::get`].
    pub fn get(&self) -> Result<Option<Value>> {
        self.item()?.get()
    }
}

impl fmt::Debug for PathProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathProxy")
            .field("path", &self.path)
            .field("resolved", &self.resolved.get().is_some())
            .finish()
    }
}
