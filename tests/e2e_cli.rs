//! CLI end-to-end tests
//!
//! Tests for the reelmatch command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the reelmatch binary
#[allow(deprecated)]
fn reelmatch_cmd() -> Command {
    let mut cmd = Command::cargo_bin("reelmatch").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Write a config whose database lives in `dir` and whose TMDB endpoint
/// refuses connections.
fn write_config(dir: &Path) -> PathBuf {
    let config_file = dir.join("config.toml");
    fs::write(
        &config_file,
        format!(
            r#"
[database]
path = "{}"

[tmdb]
api_key = "test"
base_url = "http://127.0.0.1:9"
max_retries = 0
timeout_secs = 2
"#,
            dir.join("reelmatch.db").display()
        ),
    )
    .unwrap();
    config_file
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = reelmatch_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_flag() {
    let mut cmd = reelmatch_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("reelmatch"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = reelmatch_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_parse_title_and_year() {
    let mut cmd = reelmatch_cmd();
    cmd.args(["parse", "Inception.2010.1080p.BluRay.x264.mkv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Title: Inception"))
        .stdout(predicate::str::contains("Year: 2010"));
}

#[test]
fn test_cli_parse_discards_out_of_range_year() {
    let mut cmd = reelmatch_cmd();
    cmd.args(["parse", "Old Film (1850).mkv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Title: Old Film"))
        .stdout(predicate::str::contains("Year: none"));
}

#[test]
fn test_cli_validate_config() {
    let temp = tempdir().unwrap();
    let config_file = write_config(temp.path());

    let mut cmd = reelmatch_cmd();
    cmd.args(["validate", config_file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn test_cli_validate_rejects_bad_config() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("config.toml");
    fs::write(&config_file, "[tmdb]\nrate_limit = 0.0\n").unwrap();

    let mut cmd = reelmatch_cmd();
    cmd.args(["validate", config_file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("rate_limit"));
}

#[test]
fn test_cli_invalid_library_id() {
    let temp = tempdir().unwrap();
    let config_file = write_config(temp.path());

    let mut cmd = reelmatch_cmd();
    cmd.args(["--config", config_file.to_str().unwrap(), "scan", "not-a-uuid"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid library id"));
}

#[test]
fn test_cli_library_lifecycle_and_scan() {
    let temp = tempdir().unwrap();
    let config_file = write_config(temp.path());
    let media = temp.path().join("media");
    fs::create_dir_all(&media).unwrap();
    fs::write(media.join("Heat (1995).mkv"), b"x").unwrap();
    fs::write(media.join("notes.txt"), b"x").unwrap();

    let output = reelmatch_cmd()
        .args(["--config", config_file.to_str().unwrap()])
        .args(["library", "add", "Movies", "--kind", "movie"])
        .arg(&media)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let library_id = stdout
        .split_whitespace()
        .nth(2)
        .expect("library id in output")
        .to_string();

    reelmatch_cmd()
        .args(["--config", config_file.to_str().unwrap(), "library", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Movies"))
        .stdout(predicate::str::contains(library_id.as_str()));

    // The catalog is unreachable: the run still completes with one file error.
    reelmatch_cmd()
        .args(["--config", config_file.to_str().unwrap(), "scan", &library_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Files:     1"))
        .stdout(predicate::str::contains("Errors:    1"));

    reelmatch_cmd()
        .args(["--config", config_file.to_str().unwrap(), "records", &library_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 records"));

    reelmatch_cmd()
        .args(["--config", config_file.to_str().unwrap()])
        .args(["library", "remove", &library_id])
        .assert()
        .success();
}
