//! CLI integration tests for the Tally command-line interface.
//!
//! These tests verify:
//! - Help text is displayed correctly
//! - Argument parsing works as expected
//! - Commands run end to end against the in-process memory store
//!
//! No Redis server is needed: every test that touches the store points the
//! binary at a config selecting the memory backend.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the tally binary with an isolated config dir.
fn tally(config_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tally").unwrap();
    cmd.env("TALLY_CONFIG_DIR", config_dir)
        .env_remove("TALLY_CONFIG")
        .env_remove("TALLY_REDIS_URL")
        .current_dir(config_dir);
    cmd
}

/// Write a config that selects the memory backend.
fn memory_config(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("memory.toml");
    std::fs::write(&path, "[store]\nbackend = \"memory\"\n\n[cache]\nttl_secs = 600\n").unwrap();
    path
}

fn table_file(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("people.json");
    std::fs::write(
        &path,
        r#"{"columns": [
            {"name": "age", "values": [31, 40, null, 52]},
            {"name": "city", "values": ["Oslo", "Lima", "Oslo", null]}
        ]}"#,
    )
    .unwrap();
    path
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_displays() {
    let dir = TempDir::new().unwrap();
    tally(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Tally"))
        .stdout(predicate::str::contains("dataset cache"));
}

#[test]
fn test_version_displays() {
    let dir = TempDir::new().unwrap();
    tally(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tally"));
}

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    tally(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("datasets"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("ingest"))
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("remove"))
        .stdout(predicate::str::contains("purge"));
}

#[test]
fn test_analyze_help_lists_kinds() {
    let dir = TempDir::new().unwrap();
    tally(dir.path())
        .args(["analyze", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("correlation"))
        .stdout(predicate::str::contains("insights"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Global Flag Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_verbose_flag_accepted() {
    let dir = TempDir::new().unwrap();
    tally(dir.path()).args(["--verbose", "--help"]).assert().success();
}

#[test]
fn test_json_flag_accepted() {
    let dir = TempDir::new().unwrap();
    tally(dir.path()).args(["--json", "--help"]).assert().success();
}

// ─────────────────────────────────────────────────────────────────────────────
// Error Handling Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_unknown_subcommand_fails() {
    let dir = TempDir::new().unwrap();
    tally(dir.path())
        .arg("nonexistent")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_invalid_analysis_kind_rejected() {
    let dir = TempDir::new().unwrap();
    tally(dir.path())
        .args(["analyze", "s1", "d1", "--kind", "regression"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    tally(dir.path())
        .args(["--config", "/nonexistent/tally.toml", "status"])
        .assert()
        .failure();
}

#[test]
fn test_invalid_config_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[cache]\nmax_datasets_per_session = 0\n").unwrap();

    tally(dir.path())
        .arg("--config")
        .arg(&path)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_datasets_per_session"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Backend Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_status_json_with_memory_backend() {
    let dir = TempDir::new().unwrap();
    let config = memory_config(&dir);

    tally(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["--json", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""backend": "memory""#))
        .stdout(predicate::str::contains(r#""reachable": true"#))
        .stdout(predicate::str::contains(r#""ttl_secs": 600"#));
}

#[test]
fn test_ingest_reports_metadata() {
    let dir = TempDir::new().unwrap();
    let config = memory_config(&dir);
    let file = table_file(&dir);

    tally(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["--json", "ingest", "s1"])
        .arg(&file)
        .args(["--title", "people"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""num_rows": 4"#))
        .stdout(predicate::str::contains(r#""title": "people""#))
        .stdout(predicate::str::contains(r#""filename": "people.json""#));
}

#[test]
fn test_ingest_rejects_malformed_file() {
    let dir = TempDir::new().unwrap();
    let config = memory_config(&dir);
    let file = dir.path().join("broken.json");
    std::fs::write(&file, r#"{"columns": [{"name": "x", "values": [{"a": 1}]}]}"#).unwrap();

    tally(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["ingest", "s1"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid table file"));
}

#[test]
fn test_datasets_empty_session() {
    let dir = TempDir::new().unwrap();
    let config = memory_config(&dir);

    tally(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["--json", "datasets", "s1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn test_show_missing_dataset_fails() {
    let dir = TempDir::new().unwrap();
    let config = memory_config(&dir);

    tally(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["show", "s1", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));
}

#[test]
fn test_analyze_missing_dataset_fails() {
    let dir = TempDir::new().unwrap();
    let config = memory_config(&dir);

    tally(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["analyze", "s1", "missing", "--kind", "overview"])
        .assert()
        .failure();
}
