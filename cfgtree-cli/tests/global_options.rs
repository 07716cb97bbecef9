//! Integration tests for global CLI options.
//!
//! These tests verify global flags and environment variables that affect
//! all commands, including:
//! - --verbose flag
//! - --quiet flag
//! - --schema and the CFGTREE_SCHEMA environment variable
//! - --config layering and position independence
//! - CFGTREE_LOG_MODE

mod common;

use common::{TestEnv, SERVER_SCHEMA};
use predicates::prelude::*;

// ============================================================================
// Verbose / Quiet
// ============================================================================

/// --verbose enables debug logging on stderr.
#[test]
fn test_verbose_flag_logs_file_loads() {
    let env = TestEnv::new();
    let config = env.write_file("local.json", r#"{"server": {"port": 9000}}"#);

    env.command()
        .arg("--verbose")
        .arg("--config")
        .arg(&config)
        .args(["get", "server.port"])
        .assert()
        .success()
        .stdout("9000\n")
        .stderr(predicate::str::contains("loading json values from"));
}

#[test]
fn test_normal_run_does_not_log_debug() {
    let env = TestEnv::new();
    let config = env.write_file("local.json", r#"{"server": {"port": 9000}}"#);

    env.command()
        .arg("--config")
        .arg(&config)
        .args(["get", "server.port"])
        .assert()
        .success()
        .stderr(predicate::str::contains("loading").not());
}

/// The logger follows --verbose even with --quiet, while command messages
/// follow --quiet.
#[test]
fn test_verbose_wins_for_logging() {
    let env = TestEnv::new();
    let target = env.path().join("local.json");

    env.command()
        .args(["--verbose", "--quiet"])
        .arg("--config")
        .arg(&target)
        .args(["set", "server.port", "9000"])
        .assert()
        .success()
        .stderr(predicate::str::contains("wrote json values to"))
        .stderr(predicate::str::contains("Set server.port").not());
}

#[test]
fn test_quiet_set_is_silent() {
    let env = TestEnv::new();
    let target = env.path().join("local.json");

    env.command()
        .arg("--quiet")
        .arg("--config")
        .arg(&target)
        .args(["set", "server.port", "9000"])
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_log_mode_env_enables_debug() {
    let env = TestEnv::new();
    let config = env.write_file("local.json", "{}");

    env.command()
        .env("CFGTREE_LOG_MODE", "verbose")
        .arg("--config")
        .arg(&config)
        .arg("dump")
        .assert()
        .success()
        .stderr(predicate::str::contains("loading json values from"));
}

// ============================================================================
// Tree sources
// ============================================================================

#[test]
fn test_schema_from_environment() {
    let env = TestEnv::new();
    let schema = env.write_file("schema.json", SERVER_SCHEMA);

    env.command_bare()
        .env("CFGTREE_SCHEMA", &schema)
        .args(["get", "server.host"])
        .assert()
        .success()
        .stdout("localhost\n");
}

#[test]
fn test_schema_flag_overrides_environment() {
    let env = TestEnv::new();
    let other = env.write_file("other.json", r#"{"server": {"host": "other.example"}}"#);
    let schema = env.write_file("schema.json", SERVER_SCHEMA);

    env.command_bare()
        .env("CFGTREE_SCHEMA", &other)
        .arg("--schema")
        .arg(&schema)
        .args(["get", "server.host"])
        .assert()
        .success()
        .stdout("localhost\n");
}

#[test]
fn test_yaml_schema() {
    let env = TestEnv::new();
    let schema = env.write_file(
        "schema.yaml",
        "server:\n  host: localhost\n  port:\n    '@type': int\n    '@default': 8080\n",
    );

    env.command_bare()
        .arg("--schema")
        .arg(&schema)
        .args(["get", "server.port"])
        .assert()
        .success()
        .stdout("8080\n");
}

#[test]
fn test_ini_schema_rejected() {
    let env = TestEnv::new();
    let schema = env.write_file("schema.ini", "[server]\nport=1\n");

    env.command_bare()
        .arg("--schema")
        .arg(&schema)
        .arg("dump")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Schemas must be JSON or YAML"));
}

#[test]
fn test_missing_schema_file() {
    let env = TestEnv::new();

    env.command_bare()
        .args(["--schema", "nope.json", "dump"])
        .assert()
        .code(5);
}

#[test]
fn test_global_flags_after_subcommand() {
    let env = TestEnv::new();
    let schema = env.write_file("schema.json", SERVER_SCHEMA);
    let config = env.write_file("local.json", r#"{"server": {"port": 9000}}"#);

    env.command_bare()
        .args(["get", "server.port"])
        .arg("--schema")
        .arg(&schema)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout("9000\n");
}

#[test]
fn test_later_config_wins() {
    let env = TestEnv::new();
    let first = env.write_file("a.json", r#"{"db": {"user": "first"}}"#);
    let second = env.write_file("b.json", r#"{"db": {"user": "second"}}"#);

    env.command()
        .arg("--config")
        .arg(&first)
        .arg("--config")
        .arg(&second)
        .args(["get", "db.user"])
        .assert()
        .success()
        .stdout("second\n");
}
