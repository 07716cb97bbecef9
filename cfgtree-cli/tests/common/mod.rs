//! Common test utilities for CLI integration tests.
//!
//! This module provides shared helpers for CLI testing, including:
//! - Test environment setup with temporary directories
//! - Command builder helpers for the `--schema` and `--config` flags
//! - Test data fixtures

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Schema used by most tests.
pub const SERVER_SCHEMA: &str = r#"{
  "server": {
    "host": "localhost",
    "port": {"@type": "int", "@default": 8080},
    "debug": false
  },
  "db": {
    "user": "admin",
    "password": {"@type": "str", "@required": true}
  }
}"#;

/// Test environment with an isolated working directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for the duration of the test)
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Path to the temporary directory
    pub temp_path: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create a new test environment.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let temp_path = temp_dir.path().to_path_buf();

        Self {
            temp_dir,
            temp_path,
        }
    }

    /// Get a bare command builder without pre-configured flags.
    ///
    /// The schema and log mode environment variables are cleared so tests
    /// never pick up the caller's settings.
    pub fn command_bare(&self) -> Command {
        let mut cmd = Command::cargo_bin("cfgtree").expect("Failed to find cfgtree binary");
        cmd.env_remove("CFGTREE_SCHEMA");
        cmd.env_remove("CFGTREE_LOG_MODE");
        cmd.current_dir(&self.temp_path);
        cmd
    }

    /// Get a command builder with `--schema` pointing at [`SERVER_SCHEMA`].
    pub fn command(&self) -> Command {
        let schema = self.write_file("schema.json", SERVER_SCHEMA);
        let mut cmd = self.command_bare();
        cmd.arg("--schema").arg(schema);
        cmd
    }

    /// Get the temp path.
    pub fn path(&self) -> &Path {
        &self.temp_path
    }

    /// Write a file under the temporary directory and return its path.
    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_path.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&path, contents).expect("Failed to write test file");
        path
    }

    /// Read a file under the temporary directory.
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.temp_path.join(name)).expect("Failed to read test file")
    }

    /// Run a command and return its stdout, asserting success.
    pub fn stdout_of(&self, cmd: &mut Command) -> String {
        let output = cmd.output().expect("Failed to run cfgtree");
        assert!(
            output.status.success(),
            "cfgtree failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).expect("Invalid UTF-8 in output")
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
