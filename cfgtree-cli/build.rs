//! Build script for cfgtree-cli.
//!
//! This script generates man pages at build time using clap_mangen.
//! The generated man page is placed in OUT_DIR for inclusion in release builds.
//!
//! Note: We build a minimal command structure here rather than importing from
//! the main crate, since build scripts cannot depend on the crate being built.

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::fs;
use std::path::PathBuf;

/// Build the CLI command structure for man page generation.
///
/// IMPORTANT: Keep this structure synchronized with src/cli.rs
/// When adding/removing/modifying commands, update both files.
fn build_cli() -> Command {
    Command::new("cfgtree")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect and edit hierarchical configuration files")
        .long_about(
            "Command-line tool for reading, layering, validating and editing \
             configuration trees stored as JSON, YAML or INI files",
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .help("Enable verbose output")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .help("Suppress non-essential output")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("schema")
                .long("schema")
                .help("Schema declaring the tree (JSON or YAML)")
                .value_name("FILE")
                .global(true)
                .env("CFGTREE_SCHEMA"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Configuration file to load; repeat to layer files, later ones win")
                .value_name("FILE")
                .global(true)
                .action(ArgAction::Append),
        )
        .subcommands([
            Command::new("dump")
                .about("Print the configuration values")
                .long_about("Render the configuration tree as JSON, YAML or INI"),
            Command::new("get")
                .about("Print the value at a path")
                .long_about("Resolve a dotted path and print the item value or section contents"),
            Command::new("set")
                .about("Set the value at a path and save it")
                .long_about("Convert a value to the item's type and write it to the last --config file"),
            Command::new("validate")
                .about("Check that every required value is present")
                .long_about("Resolve every item, reporting missing required values and bad overrides"),
            Command::new("completions")
                .about("Generate shell completion scripts")
                .long_about("Generate shell completion scripts for bash, zsh, fish, or PowerShell"),
        ])
}

fn main() {
    // Generate man pages at build time
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).unwrap();

    let app = build_cli();
    let man = Man::new(app);
    let mut buffer = Vec::new();
    man.render(&mut buffer).unwrap();

    fs::write(man_dir.join("cfgtree.1"), buffer).unwrap();

    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=src/commands/");
}
