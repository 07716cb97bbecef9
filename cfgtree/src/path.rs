//! Tree paths.
//!
//! Anything implementing [`ToPath`] can address a node: a separator-joined
//! string such as `"db.user"`, or a sequence of segments such as
//! `["db", "user"]`. Each segment is split again on the separator, so the
//! two forms can be mixed freely.
//!
//! A segment named after a Rust keyword plus a trailing underscore
//! (`type_`, `match_`) addresses the child without the underscore.

use crate::error::{Error, Result};

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "Self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Whether `name` is a reserved Rust keyword.
#[must_use]
pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

/// Strips the escape underscore from `type_`-style segments.
#[must_use]
pub fn unescape_segment(segment: &str) -> &str {
    match segment.strip_suffix('_') {
        Some(stripped) if is_keyword(stripped) => stripped,
        _ => segment,
    }
}

/// Splits `raw` on `separator`, unescaping each segment.
///
/// # Errors
///
/// Returns [`Error::InvalidKey`] if any segment is empty.
pub fn split_segments(raw: &str, separator: &str) -> Result<Vec<String>> {
    let parts: Vec<&str> = if separator.is_empty() {
        vec![raw]
    } else {
        raw.split(separator).collect()
    };
    parts
        .into_iter()
        .map(|part| {
            if part.is_empty() {
                Err(Error::InvalidKey {
                    key: raw.to_string(),
                    reason: "empty path segment".to_string(),
                })
            } else {
                Ok(unescape_segment(part).to_string())
            }
        })
        .collect()
}

/// Joins segments back into a string path.
#[must_use]
pub fn join_segments(segments: &[String], separator: &str) -> String {
    segments.join(separator)
}

/// Something that names a node in a configuration tree.
pub trait ToPath {
    /// Breaks the path into segments using `separator`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] for empty paths or empty segments.
    fn to_segments(&self, separator: &str) -> Result<Vec<String>>;
}

impl ToPath for str {
    fn to_segments(&self, separator: &str) -> Result<Vec<String>> {
        split_segments(self, separator)
    }
}

impl ToPath for String {
    fn to_segments(&self, separator: &str) -> Result<Vec<String>> {
        split_segments(self, separator)
    }
}

impl<T: AsRef<str>> ToPath for [T] {
    fn to_segments(&self, separator: &str) -> Result<Vec<String>> {
        if self.is_empty() {
            return Err(Error::InvalidKey {
                key: String::new(),
                reason: "empty path".to_string(),
            });
        }
        let mut segments = Vec::with_capacity(self.len());
        for part in self {
            segments.extend(split_segments(part.as_ref(), separator)?);
        }
        Ok(segments)
    }
}

impl<T: AsRef<str>, const N: usize> ToPath for [T; N] {
    fn to_segments(&self, separator: &str) -> Result<Vec<String>> {
        self.as_slice().to_segments(separator)
    }
}

impl<T: AsRef<str>> ToPath for Vec<T> {
    fn to_segments(&self, separator: &str) -> Result<Vec<String>> {
        self.as_slice().to_segments(separator)
    }
}

impl<P: ToPath + ?Sized> ToPath for &P {
    fn to_segments(&self, separator: &str) -> Result<Vec<String>> {
        (**self).to_segments(separator)
    }
}
