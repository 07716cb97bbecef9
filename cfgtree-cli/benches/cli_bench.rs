use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use assert_cmd::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use tempfile::TempDir;

fn write_fixture(dir: &Path, sections: usize) -> (PathBuf, PathBuf) {
    let mut schema = serde_json::Map::new();
    let mut values = serde_json::Map::new();
    for i in 0..sections {
        schema.insert(
            format!("service{i}"),
            serde_json::json!({
                "host": "localhost",
                "port": {"@type": "int", "@default": 8000 + i},
                "enabled": true
            }),
        );
        values.insert(
            format!("service{i}"),
            serde_json::json!({"port": 9000 + i}),
        );
    }

    let schema_path = dir.join("schema.json");
    let values_path = dir.join("values.json");
    std::fs::write(&schema_path, serde_json::Value::Object(schema).to_string())
        .expect("failed to write schema");
    std::fs::write(&values_path, serde_json::Value::Object(values).to_string())
        .expect("failed to write values");
    (schema_path, values_path)
}

fn cfgtree(schema: &Path, values: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cfgtree").expect("failed to locate cfgtree binary");
    cmd.env_remove("CFGTREE_SCHEMA")
        .arg("--schema")
        .arg(schema)
        .arg("--config")
        .arg(values);
    cmd
}

fn bench_cli_startup(c: &mut Criterion) {
    c.bench_function("cli_startup_version", |b| {
        b.iter(|| {
            let mut cmd = Command::cargo_bin("cfgtree").expect("failed to locate cfgtree binary");
            let output = cmd.arg("--version").output().expect("failed to run cfgtree");
            black_box(output);
        });
    });
}

fn bench_cli_get(c: &mut Criterion) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let (schema, values) = write_fixture(dir.path(), 50);

    c.bench_function("cli_get", |b| {
        b.iter(|| {
            let output = cfgtree(&schema, &values)
                .args(["get", "service25.port"])
                .output()
                .expect("failed to execute cfgtree get");
            black_box(output);
        });
    });
}

fn bench_cli_dump(c: &mut Criterion) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let (schema, values) = write_fixture(dir.path(), 50);

    c.bench_function("cli_dump_with_defaults", |b| {
        b.iter(|| {
            let output = cfgtree(&schema, &values)
                .args(["dump", "--with-defaults", "--format", "yaml"])
                .output()
                .expect("failed to execute cfgtree dump");
            black_box(output);
        });
    });
}

fn bench_cli_set(c: &mut Criterion) {
    c.bench_function("cli_set", |b| {
        b.iter_batched(
            || {
                let dir = TempDir::new().expect("failed to create temp dir");
                let fixture = write_fixture(dir.path(), 50);
                (dir, fixture)
            },
            |(_dir, (schema, values))| {
                let mut cmd = cfgtree(&schema, &values);
                cmd.stdout(Stdio::null()).stderr(Stdio::null());
                let status = cmd
                    .args(["--quiet", "set", "service10.enabled", "no"])
                    .status()
                    .expect("failed to execute cfgtree set");

                black_box(status.success());
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    cli_benches,
    bench_cli_startup,
    bench_cli_get,
    bench_cli_dump,
    bench_cli_set
);
criterion_main!(cli_benches);
