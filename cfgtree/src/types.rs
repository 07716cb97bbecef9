//! The item type registry.
//!
//! Every [`Item`](crate::Item) carries an [`ItemType`] that decides how raw
//! input is coerced into a stored [`Value`] and how that value is written back
//! out. The registry is a closed enum, so guessing a type from a value always
//! succeeds.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Number, Value};

use crate::error::{Error, Result};

/// Key marking a dict-typed leaf in exported JSON and YAML.
pub const TYPE_META_KEY: &str = "@type";

const TRUTHY: [&str; 8] = ["yes", "true", "y", "t", "on", "1", "yeah", "yup"];
const FALSEY: [&str; 6] = ["no", "false", "n", "f", "off", "0"];

/// The semantic type of a configuration item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ItemType {
    /// No type information; values pass through untouched.
    NotSet,
    /// Text.
    #[default]
    Str,
    /// Signed or unsigned integers.
    Int,
    /// Booleans, parsed from a fixed token vocabulary.
    Bool,
    /// Floating point numbers.
    Float,
    /// String-keyed mappings.
    Dict,
    /// Sequences.
    List,
}

/// Priority used by [`ItemType::guess`]. `Bool` precedes `Int` so that a
/// boolean is never taken for a number.
const GUESS_ORDER: [ItemType; 7] = [
    ItemType::NotSet,
    ItemType::Bool,
    ItemType::Int,
    ItemType::Float,
    ItemType::Dict,
    ItemType::List,
    ItemType::Str,
];

impl ItemType {
    /// All registered types.
    pub const ALL: [Self; 7] = [
        Self::NotSet,
        Self::Str,
        Self::Int,
        Self::Bool,
        Self::Float,
        Self::Dict,
        Self::List,
    ];

    /// Canonical name of the type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NotSet => "not_set",
            Self::Str => "str",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Float => "float",
            Self::Dict => "dict",
            Self::List => "list",
        }
    }

    /// Names this type answers to in schemas.
    #[must_use]
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::NotSet => &["not_set"],
            Self::Str => &["str", "string", "unicode"],
            Self::Int => &["int", "integer"],
            Self::Bool => &["bool", "boolean"],
            Self::Float => &["float", "double"],
            Self::Dict => &["dict", "dictionary"],
            Self::List => &["list"],
        }
    }

    /// Resolves a type name or alias.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownType`] if no type answers to `name`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cfgtree::ItemType;
    ///
    /// assert_eq!(ItemType::translate("integer").unwrap(), ItemType::Int);
    /// assert_eq!(ItemType::translate("string").unwrap(), ItemType::Str);
    /// assert!(ItemType::translate("decimal").is_err());
    /// ```
    pub fn translate(name: &str) -> Result<Self> {
        let wanted = name.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.aliases().contains(&wanted))
            .ok_or_else(|| Error::UnknownType {
                name: name.to_string(),
            })
    }

    /// Guesses the type of a value.
    ///
    /// Types are tried in the order not_set, bool, int, float, dict, list,
    /// str; the first one that [includes](Self::includes) the value wins.
    ///
    /// ```
    /// use cfgtree::{ItemType, Value};
    ///
    /// assert_eq!(ItemType::guess(&Value::Bool(true)), ItemType::Bool);
    /// assert_eq!(ItemType::guess(&Value::from(1)), ItemType::Int);
    /// assert_eq!(ItemType::guess(&Value::Null), ItemType::NotSet);
    /// ```
    #[must_use]
    pub fn guess(value: &Value) -> Self {
        GUESS_ORDER
            .into_iter()
            .find(|t| t.includes(value))
            .unwrap_or(Self::Str)
    }

    /// Whether `value` already belongs to this type.
    #[must_use]
    pub fn includes(self, value: &Value) -> bool {
        match self {
            Self::NotSet => value.is_null(),
            Self::Str => value.is_string(),
            Self::Int => value.is_i64() || value.is_u64(),
            Self::Bool => value.is_boolean(),
            Self::Float => value.is_f64(),
            Self::Dict => value.is_object(),
            Self::List => value.is_array(),
        }
    }

    /// Whether `value` can be coerced into this type.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        self.deserialize(value).is_ok()
    }

    /// Coerces a value into this type.
    ///
    /// Strings are parsed the same way [`parse_str`](Self::parse_str) parses
    /// them. An explicit null is kept as null for every type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for values of an incompatible kind and
    /// [`Error::ValueMismatch`] for compatible values that do not convert,
    /// such as an unknown boolean token.
    pub fn deserialize(self, value: &Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        if let Value::String(s) = value {
            return self.parse_str(s);
        }
        match self {
            Self::NotSet => Ok(value.clone()),
            Self::Str => match value {
                Value::Bool(_) | Value::Number(_) => Ok(Value::String(display_value(value))),
                _ => Err(self.mismatch(value)),
            },
            Self::Int => match value {
                Value::Bool(b) => Ok(Value::from(i64::from(*b))),
                Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
                Value::Number(n) => integral_float(n).ok_or_else(|| self.value_mismatch(value)),
                _ => Err(self.mismatch(value)),
            },
            Self::Float => match value {
                Value::Bool(b) => Ok(Value::from(if *b { 1.0 } else { 0.0 })),
                Value::Number(n) => n
                    .as_f64()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| self.value_mismatch(value)),
                _ => Err(self.mismatch(value)),
            },
            Self::Bool => match value {
                Value::Bool(_) => Ok(value.clone()),
                Value::Number(n) => match n.as_i64() {
                    Some(1) => Ok(Value::Bool(true)),
                    Some(0) => Ok(Value::Bool(false)),
                    _ => Err(self.value_mismatch(value)),
                },
                _ => Err(self.mismatch(value)),
            },
            Self::Dict => match value {
                Value::Object(map) => Ok(Value::Object(strip_type_marker(map))),
                _ => Err(self.mismatch(value)),
            },
            Self::List => match value {
                Value::Array(_) => Ok(value.clone()),
                _ => Err(self.mismatch(value)),
            },
        }
    }

    /// Parses a raw string into a value of this type.
    ///
    /// Dicts and lists are read as JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValueMismatch`] if the string does not parse.
    pub fn parse_str(self, raw: &str) -> Result<Value> {
        let trimmed = raw.trim();
        match self {
            Self::NotSet | Self::Str => Ok(Value::String(raw.to_string())),
            Self::Int => trimmed
                .parse::<i64>()
                .map(Value::from)
                .or_else(|_| trimmed.parse::<u64>().map(Value::from))
                .map_err(|_| self.value_mismatch_str(raw)),
            Self::Float => trimmed
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| self.value_mismatch_str(raw)),
            Self::Bool => parse_bool(raw).map(Value::Bool),
            Self::Dict => match serde_json::from_str::<Value>(trimmed) {
                Ok(Value::Object(map)) => Ok(Value::Object(strip_type_marker(&map))),
                _ => Err(self.value_mismatch_str(raw)),
            },
            Self::List => match serde_json::from_str::<Value>(trimmed) {
                Ok(list @ Value::Array(_)) => Ok(list),
                _ => Err(self.value_mismatch_str(raw)),
            },
        }
    }

    /// Converts a stored value into its exported form.
    ///
    /// Dicts gain an `@type: dict` marker so that they are read back as a
    /// single dict-typed item rather than a nested section.
    #[must_use]
    pub fn serialize(self, value: &Value) -> Value {
        match (self, value) {
            (Self::Dict, Value::Object(map)) => {
                let mut out = Map::with_capacity(map.len() + 1);
                out.insert(TYPE_META_KEY.to_string(), Value::from(Self::Dict.name()));
                for (k, v) in map {
                    out.insert(k.clone(), v.clone());
                }
                Value::Object(out)
            }
            _ => value.clone(),
        }
    }

    fn mismatch(self, value: &Value) -> Error {
        Error::TypeMismatch {
            expected: self.name().to_string(),
            actual: describe_kind(value).to_string(),
        }
    }

    fn value_mismatch(self, value: &Value) -> Error {
        self.value_mismatch_str(&display_value(value))
    }

    fn value_mismatch_str(self, raw: &str) -> Error {
        Error::ValueMismatch {
            expected: self.name().to_string(),
            value: raw.to_string(),
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ItemType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::translate(s)
    }
}

/// Parses a boolean token.
///
/// Tokens are trimmed and compared case-insensitively.
///
/// # Errors
///
/// Returns [`Error::ValueMismatch`] for anything outside the vocabulary.
///
/// # Examples
///
/// ```
/// use cfgtree::parse_bool;
///
/// assert!(parse_bool(" Yes ").unwrap());
/// assert!(!parse_bool("OFF").unwrap());
/// assert!(parse_bool("maybe").is_err());
/// ```
pub fn parse_bool(raw: &str) -> Result<bool> {
    let token = raw.trim().to_lowercase();
    if TRUTHY.contains(&token.as_str()) {
        Ok(true)
    } else if FALSEY.contains(&token.as_str()) {
        Ok(false)
    } else {
        Err(Error::ValueMismatch {
            expected: ItemType::Bool.name().to_string(),
            value: raw.to_string(),
        })
    }
}

/// Renders a value as plain text: strings unquoted, null as empty,
/// collections as compact JSON.
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Short name for the kind of a value, used in error messages.
#[must_use]
pub const fn describe_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn integral_float(n: &Number) -> Option<Value> {
    let f = n.as_f64()?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(Value::from(f as i64))
    } else {
        None
    }
}

fn strip_type_marker(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .filter(|(k, _)| k.as_str() != TYPE_META_KEY)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
