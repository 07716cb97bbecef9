#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # cfgtree
//!
//! Hierarchical configuration trees.
//!
//! A tree is made of [`Section`]s holding typed [`Item`]s and nested
//! sections. Trees are declared from a [`Schema`] (nested JSON or YAML data,
//! serializable structs, lists of pairs), addressed by dotted or segmented
//! paths, loaded from and written to JSON, YAML and INI, and observed
//! through hooks that bubble from a section up to the root.
//!
//! ## Core Types
//!
//! - [`Config`]: a tree root that owns its [`Settings`]
//! - [`Section`] and [`Item`]: the nodes, addressed through [`ToPath`]
//! - [`ItemType`]: type names, guessing and coercion
//! - [`HookKind`], [`Event`] and [`Change`]: lifecycle events
//! - [`ChangesetContext`]: change tracking and rollback
//! - [`Error`] and [`Result`]: error handling types
//!
//! ## Examples
//!
//! ```
//! use cfgtree::Config;
//! use serde_json::json;
//!
//! let config = Config::from_schema(json!({
//!     "uploads": {
//!         "enabled": false,
//!         "threads": 1,
//!         "db": {"user": "root"}
//!     }
//! }))
//! .unwrap();
//!
//! config.set_value("uploads.enabled", "yes").unwrap();
//! assert_eq!(config.get("uploads.enabled").unwrap(), Some(json!(true)));
//! assert_eq!(config.get_item(&["uploads", "db", "user"]).unwrap().to_string(), "root");
//!
//! let yaml = config.yaml().dumps(false).unwrap();
//! assert_eq!(yaml.trim(), "uploads:\n  enabled: true");
//! ```

pub mod changeset;
pub mod error;
pub mod hooks;
pub mod item;
pub mod logging;
pub mod manager;
pub mod path;
pub mod persistence;
pub mod schema;
pub mod section;
pub mod settings;
pub mod types;

#[cfg(all(test, feature = "property-tests"))]
mod proptests;

// Re-export key types at crate root for convenience
pub use changeset::{ChangesetContext, ChangesetGuard};
pub use error::{Error, Result};
pub use hooks::{Change, Event, HookHandler, HookId, HookKind};
pub use item::{EnvVar, Item, ItemBuilder};
pub use logging::{init_logger, LogLevel, Logger};
pub use manager::Config;
pub use path::ToPath;
pub use persistence::{ConfigFormat, IniFormat, JsonFormat, PersistenceAdapter, YamlFormat};
pub use schema::{parse_schema, Schema};
pub use section::{Node, PathProxy, Section};
pub use serde_json::Value;
pub use settings::{Settings, SettingsHandle};
pub use types::{parse_bool, ItemType};
