//! Error types for the cfgtree library.
//!
//! Every fallible operation in the crate returns [`Result`], whose error
//! side is the [`Error`] enum defined here. Tree-shaped failures (missing
//! names, wrong node kinds, malformed schemas) carry enough context to
//! produce a useful message without holding on to tree handles.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for operations that may fail with a cfgtree error.
///
/// # Examples
///
/// ```
/// use cfgtree::{Error, Result};
///
/// fn lookup() -> Result<i64> {
///     Ok(8080)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the cfgtree library.
#[derive(Debug, Error)]
pub enum Error {
    /// A name did not resolve in a section and no `not_found` hook
    /// supplied a replacement.
    #[error("'{name}' not found in section {}", section_label(section))]
    NotFound {
        /// The missing name.
        name: String,
        /// Alias path of the section that was searched.
        section: Vec<String>,
    },

    /// A required item has neither a value nor a default.
    #[error("required value missing for '{name}'")]
    RequiredValueMissing {
        /// Path of the item, joined with the active separator.
        name: String,
    },

    /// A value is of a kind the item type cannot hold.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The expected type name.
        expected: String,
        /// A description of what was received.
        actual: String,
    },

    /// A value has the right kind but cannot be converted.
    #[error("{value:?} is not a valid {expected}")]
    ValueMismatch {
        /// The expected type name.
        expected: String,
        /// The offending value, rendered as text.
        value: String,
    },

    /// A type name is not known to the type registry.
    #[error("unknown item type '{name}'")]
    UnknownType {
        /// The unrecognized name.
        name: String,
    },

    /// A schema declaration is malformed.
    #[error("schema error: {message}")]
    Schema {
        /// A description of the problem.
        message: String,
    },

    /// The requested mutation would replace a child with an incompatible kind.
    #[error("unsupported operation: {message}")]
    UnsupportedOperation {
        /// A description of the rejected operation.
        message: String,
    },

    /// A path continued through a node that is not a section.
    #[error("'{name}' is not a section")]
    NotASection {
        /// The segment that resolved to a non-section.
        name: String,
    },

    /// A path was expected to resolve to an item.
    #[error("'{name}' is not an item")]
    NotAnItem {
        /// The path that resolved to a non-item.
        name: String,
    },

    /// A tree key or path segment is unusable.
    #[error("invalid key '{key}': {reason}")]
    InvalidKey {
        /// The rejected key.
        key: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An invalid filesystem path was provided.
    #[error("invalid path {}: {reason}", path.display())]
    InvalidPath {
        /// The invalid path.
        path: PathBuf,
        /// The reason the path is invalid.
        reason: String,
    },

    /// An item sits too deep in the tree to be written as INI.
    #[error("cannot write '{path}' as INI: only section.option paths are supported")]
    IniDepth {
        /// Path of the offending item.
        path: String,
    },

    /// A changeset context was used out of order.
    #[error("changeset error: {message}")]
    Changeset {
        /// A description of the misuse.
        message: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON could not be parsed or produced.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML could not be parsed or produced.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// INI text could not be parsed.
    #[error("INI error: {0}")]
    Ini(#[from] ini::ParseError),
}

fn section_label(section: &[String]) -> String {
    if section.is_empty() {
        "<root>".to_string()
    } else {
        section.join(".")
    }
}

impl Error {
    /// Returns true if this is a [`Error::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this is a [`Error::RequiredValueMissing`].
    #[must_use]
    pub const fn is_required_value_missing(&self) -> bool {
        matches!(self, Self::RequiredValueMissing { .. })
    }

    pub(crate) fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            message: message.into(),
        }
    }
}
