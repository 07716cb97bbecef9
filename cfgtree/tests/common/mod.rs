//! Common test utilities for integration tests.
//!
//! Fixtures shared by the cfgtree integration suites: a representative
//! schema, temp-file helpers and an environment variable guard.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use cfgtree::{Config, Value};
use serde_json::json;

/// The schema most suites start from.
#[allow(dead_code)]
pub fn uploads_schema() -> Value {
    json!({
        "uploads": {
            "enabled": false,
            "threads": 1,
            "tmp_dir": "/tmp",
            "db": {
                "user": "root",
                "password": {"@type": "str", "@required": true},
                "port": {"@type": "int", "@default": 5432}
            }
        },
        "greeting": "hello"
    })
}

/// A fresh tree built from [`uploads_schema`].
#[allow(dead_code)]
pub fn uploads_config() -> Config {
    Config::from_schema(uploads_schema()).expect("fixture schema is valid")
}

/// Writes `content` to `dir/filename` and returns the path.
#[allow(dead_code)]
pub fn write_file(dir: &Path, filename: &str, content: &str) -> PathBuf {
    let path = dir.join(filename);
    fs::write(&path, content).unwrap();
    path
}

/// RAII guard for setting and restoring environment variables.
///
/// Tests using it must be marked `#[serial]`.
#[allow(dead_code)]
pub struct EnvGuard {
    key: String,
    old_value: Option<String>,
}

#[allow(dead_code)]
impl EnvGuard {
    /// Sets `key` to `value` until the guard is dropped.
    pub fn set(key: &str, value: &str) -> Self {
        let old_value = env::var(key).ok();
        env::set_var(key, value);
        Self {
            key: key.to_string(),
            old_value,
        }
    }

    /// Removes `key` until the guard is dropped.
    pub fn remove(key: &str) -> Self {
        let old_value = env::var(key).ok();
        env::remove_var(key);
        Self {
            key: key.to_string(),
            old_value,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.old_value {
            Some(value) => env::set_var(&self.key, value),
            None => env::remove_var(&self.key),
        }
    }
}
