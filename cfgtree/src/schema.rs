//! Schema declarations.
//!
//! A [`Schema`] describes the shape of a tree: nested entries become
//! sections, scalars and sequences become items whose default is the value.
//! Keys starting with `_` are skipped. Keys starting with `@` are meta keys
//! describing the item they belong to:
//!
//! | key | meaning |
//! |---|---|
//! | `@type` | type name or alias (`int`, `boolean`, `dict`, ...) |
//! | `@default` | default value |
//! | `@value` | initial custom value |
//! | `@required` | reading the item while unset is an error |
//! | `@help` | help text |
//! | `@envvar` | `true` for a derived variable name, or the variable name |
//! | `@name` | canonical name, when it differs from the key |
//!
//! An entry with no plain children, or with a non-empty `@type`, is an item.
//! Its plain children, if any, form the default of a dict item, and there
//! `_` keys are kept as data. A dict item with neither children nor
//! `@default` defaults to an empty object. Meta keys next to plain children
//! without `@type` are ignored and the entry is a section.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::item::{EnvVar, Item};
use crate::section::{Node, Section};
use crate::types::{parse_bool, ItemType, TYPE_META_KEY};

/// A schema declaration.
#[derive(Debug, Clone)]
pub enum Schema {
    /// An existing item, attached as is.
    Item(Item),
    /// An existing section, attached as is.
    Section(Section),
    /// Ordered key/schema pairs: a mapping, a list of pairs or a struct's
    /// fields.
    Entries(Vec<(String, Schema)>),
    /// A bare value.
    Value(Value),
}

impl Schema {
    /// Classifies nested data: non-empty objects become entries, anything
    /// else a bare value.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) if !map.is_empty() => Self::Entries(
                map.into_iter()
                    .map(|(key, value)| (key, Self::from_value(value)))
                    .collect(),
            ),
            other => Self::Value(other),
        }
    }

    /// Classifies a serializable value by its serialized form, so a struct
    /// declares one entry per field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if `value` cannot be serialized.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self::from_value(serde_json::to_value(value)?))
    }

    /// Builds entries from key/schema pairs, keeping their order.
    pub fn pairs<K, S, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<Self>,
    {
        Self::Entries(
            pairs
                .into_iter()
                .map(|(key, schema)| (key.into(), schema.into()))
                .collect(),
        )
    }
}

impl From<Value> for Schema {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

impl From<Item> for Schema {
    fn from(item: Item) -> Self {
        Self::Item(item)
    }
}

impl From<Section> for Schema {
    fn from(section: Section) -> Self {
        Self::Section(section)
    }
}

impl<K: Into<String>, S: Into<Self>> From<Vec<(K, S)>> for Schema {
    fn from(pairs: Vec<(K, S)>) -> Self {
        Self::pairs(pairs)
    }
}

macro_rules! schema_from_scalar {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Schema {
                fn from(value: $ty) -> Self {
                    Self::Value(Value::from(value))
                }
            }
        )*
    };
}

schema_from_scalar!(bool, i32, i64, u32, u64, f64, &str, String);

/// Parses a schema into a new, detached section.
///
/// # Errors
///
/// Returns [`Error::Schema`] if the schema is not a valid root.
pub fn parse_schema(schema: impl Into<Schema>) -> Result<Section> {
    let section = Section::new();
    parse_into(&section, schema.into())?;
    Ok(section)
}

/// Adds the children declared by a root schema to `section`.
///
/// A root must be entries with at least one child, or a section whose
/// children are copied over.
pub(crate) fn parse_into(section: &Section, schema: Schema) -> Result<()> {
    match schema {
        Schema::Entries(entries) => {
            if declares_type(&entries) {
                return Err(Error::schema(format!(
                    "meta key '{TYPE_META_KEY}' is not allowed at the root"
                )));
            }
            let (_, children) = split_entries(entries, false);
            if children.is_empty() {
                return Err(Error::schema("root schema declares no items or sections"));
            }
            for (key, child) in children {
                attach(section, &key, child)?;
            }
            Ok(())
        }
        Schema::Section(source) => {
            if source.is_empty() {
                return Err(Error::schema("root schema declares no items or sections"));
            }
            for (path, node) in source.iter_all(false) {
                let key = path.concat();
                match node {
                    Node::Item(item) => {
                        section.add_item(&key, item)?;
                    }
                    Node::Section(child) => {
                        section.add_section(&key, copy_section(&child)?)?;
                    }
                }
            }
            Ok(())
        }
        Schema::Item(_) => Err(Error::schema(
            "root schema must be a mapping, a struct or a list of pairs, not an item",
        )),
        Schema::Value(value) => Err(Error::schema(format!(
            "root schema must be a non-empty mapping, a struct or a list of pairs, got {value}"
        ))),
    }
}

/// Builds the node for `schema` without attaching it anywhere.
pub(crate) fn build_node(key: &str, schema: Schema) -> Result<Node> {
    match schema {
        Schema::Item(item) => Ok(Node::Item(item)),
        Schema::Section(section) => Ok(Node::Section(section)),
        Schema::Value(value) => Ok(Node::Item(Item::builder().default(value).build()?)),
        Schema::Entries(entries) => {
            let was_empty = entries.is_empty();
            let typed = declares_type(&entries);
            let (meta, children) = split_entries(entries, typed);
            if children.is_empty() || typed {
                log::trace!("schema entry '{key}' is an item");
                return item_from_meta(meta, children, was_empty).map(Node::Item);
            }
            if !meta.is_empty() {
                log::trace!("ignoring meta keys of section '{key}'");
            }
            let section = Section::new();
            for (child_key, child) in children {
                attach(&section, &child_key, child)?;
            }
            log::trace!("schema entry '{key}' is a section");
            Ok(Node::Section(section))
        }
    }
}

/// Builds the node that a loaded value describes.
pub(crate) fn node_for_value(key: &str, value: &Value) -> Result<Node> {
    build_node(key, Schema::from_value(value.clone()))
}

fn attach(parent: &Section, key: &str, schema: Schema) -> Result<()> {
    log::debug!("declaring '{key}'");
    match build_node(key, schema)? {
        Node::Item(item) => {
            parent.add_item(key, item)?;
        }
        Node::Section(section) => {
            parent.add_section(key, section)?;
        }
    }
    Ok(())
}

type Entries = Vec<(String, Schema)>;

/// Whether the entries carry a non-empty `@type`.
fn declares_type(entries: &Entries) -> bool {
    entries.iter().any(|(key, schema)| {
        key == TYPE_META_KEY && !matches!(schema, Schema::Value(value) if is_blank(value))
    })
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(name) => name.trim().is_empty(),
        _ => false,
    }
}

/// Splits entries into meta keys and plain children. Private keys are
/// dropped unless the entries declare an item, whose children are data.
fn split_entries(entries: Entries, keep_private: bool) -> (Entries, Entries) {
    let mut meta = Vec::new();
    let mut children = Vec::new();
    for (key, schema) in entries {
        if key.starts_with('@') {
            meta.push((key, schema));
        } else if keep_private || !key.starts_with('_') {
            children.push((key, schema));
        }
    }
    (meta, children)
}

fn item_from_meta(meta: Entries, children: Entries, was_empty: bool) -> Result<Item> {
    let mut builder = Item::builder();
    let mut has_default = false;
    let mut is_dict = false;
    for (key, schema) in meta {
        let value = schema_to_value(schema)?;
        builder = match key.as_str() {
            "@type" if is_blank(&value) => builder,
            "@type" => {
                let name = meta_string(&key, &value)?;
                is_dict = matches!(ItemType::translate(&name), Ok(ItemType::Dict));
                builder.type_name(name)
            }
            "@default" => {
                has_default = true;
                builder.default(value)
            }
            "@value" => builder.value(value),
            "@required" => builder.required(meta_bool(&key, &value)?),
            "@help" => builder.help(meta_string(&key, &value)?),
            "@name" => builder.name(meta_string(&key, &value)?),
            "@envvar" => match value {
                Value::String(name) if parse_bool(&name).is_err() => {
                    builder.envvar(EnvVar::Named(name))
                }
                other => {
                    if meta_bool(&key, &other)? {
                        builder.envvar(EnvVar::Auto)
                    } else {
                        builder
                    }
                }
            },
            _ => return Err(Error::schema(format!("unknown meta key '{key}'"))),
        };
    }
    if !has_default {
        if !children.is_empty() {
            let mut default = Map::new();
            for (key, schema) in children {
                default.insert(key, schema_to_value(schema)?);
            }
            builder = builder.default(Value::Object(default));
        } else if is_dict {
            builder = builder.default(Value::Object(Map::new()));
        } else if was_empty {
            builder = builder.default(Value::Array(Vec::new()));
        }
    }
    builder.build()
}

fn schema_to_value(schema: Schema) -> Result<Value> {
    match schema {
        Schema::Value(value) => Ok(value),
        Schema::Entries(entries) => {
            let mut map = Map::new();
            for (key, schema) in entries {
                map.insert(key, schema_to_value(schema)?);
            }
            Ok(Value::Object(map))
        }
        Schema::Item(_) | Schema::Section(_) => Err(Error::schema(
            "items and sections cannot be used as meta values",
        )),
    }
}

fn meta_string(key: &str, value: &Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::schema(format!("'{key}' expects a string, got {value}")))
}

fn meta_bool(key: &str, value: &Value) -> Result<bool> {
    match value {
        Value::Bool(flag) => Ok(*flag),
        Value::String(raw) => parse_bool(raw),
        other => Err(Error::schema(format!("'{key}' expects a boolean, got {other}"))),
    }
}

/// Rebuilds `source` as a detached tree with copies of its items.
fn copy_section(source: &Section) -> Result<Section> {
    let copy = Section::new();
    for (path, node) in source.iter_all(false) {
        let key = path.concat();
        match node {
            Node::Item(item) => {
                copy.add_item(&key, item.duplicate())?;
            }
            Node::Section(child) => {
                copy.add_section(&key, copy_section(&child)?)?;
            }
        }
    }
    Ok(copy)
}
