//! CLI integration tests.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const KEY: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.cli-tests";

/// Binary with a clean working directory and no inherited credential.
fn poolgate(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("poolgate");
    cmd.current_dir(dir.path()).env_remove("POOLGATE_CREDENTIAL");
    cmd
}

fn workspace(config: &str) -> TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    fs::write(dir.path().join("config.toml"), config).expect("write temp config");
    dir
}

#[test]
fn test_help_lists_commands() {
    let dir = tempfile::tempdir().unwrap();
    poolgate(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("probe"))
        .stdout(predicate::str::contains("run"));
}

#[test]
fn test_check_prints_sanitized_config() {
    let dir = workspace(&format!(
        "endpoint = \"https://acme.supabase.co/\"\ncredential = \"{KEY}\"\npool_size = 3\n"
    ));

    poolgate(&dir)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"endpoint\": \"https://acme.supabase.co\""))
        .stdout(predicate::str::contains("\"credential_set\": true"))
        .stdout(predicate::str::contains("\"pool_size\": 3"))
        .stdout(predicate::str::contains(KEY).not());
}

#[test]
fn test_check_takes_credential_from_environment() {
    let dir = workspace("endpoint = \"https://acme.supabase.co\"\n");

    poolgate(&dir)
        .arg("check")
        .env("POOLGATE_CREDENTIAL", KEY)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"credential_set\": true"));
}

#[test]
fn test_check_fails_without_credential() {
    let dir = workspace("endpoint = \"https://acme.supabase.co\"\n");

    poolgate(&dir)
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("credential"));
}

#[test]
fn test_check_rejects_plain_http() {
    let dir = workspace(&format!(
        "endpoint = \"http://acme.supabase.co\"\ncredential = \"{KEY}\"\n"
    ));

    poolgate(&dir)
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must use https"));
}

#[test]
fn test_explicit_config_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    fs::write(
        &path,
        format!("endpoint = \"https://acme.supabase.co\"\ncredential = \"{KEY}\"\n"),
    )
    .unwrap();

    poolgate(&dir)
        .args(["check", "--config"])
        .arg(&path)
        .assert()
        .success();
}

#[test]
fn test_missing_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    poolgate(&dir)
        .arg("probe")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read config file"));
}
