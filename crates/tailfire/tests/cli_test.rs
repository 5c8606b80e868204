//! Integration tests for the `tailfire` binary.
//!
//! Argument parsing, config checking and one-shot discovery, with wiremock
//! standing in for the Tailscale API.
#![allow(clippy::unwrap_used)]

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::mpsc;
use std::time::Duration;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

const TOKEN: &str = "tskey-foo-bar";
const TAILNET_JSON: &str = include_str!("../../../testdata/tailnet.json");

/// Build a [`Command`] for the `tailfire` binary with env isolation.
///
/// Clears all `TAILFIRE_*` env vars, runs inside `dir` so no stray
/// `./config.yaml` is picked up, and points config directories at a
/// nonexistent path.
fn tailfire_cmd(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("tailfire");
    cmd.current_dir(dir)
        .env("HOME", "/tmp/tailfire-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/tailfire-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("TAILFIRE_CONFIG")
        .env_remove("TAILFIRE_LOG_FORMAT")
        .env_remove("TAILFIRE_API_URL")
        .env_remove("TAILFIRE_API_TOKEN")
        .env_remove("TAILFIRE_TAILNET")
        .env_remove("TAILFIRE_TAG_SEPARATOR")
        .env_remove("TAILFIRE_REFRESH_INTERVAL")
        .env_remove("TAILFIRE_REQUEST_TIMEOUT")
        .env_remove("TAILFIRE_LISTEN_ADDRESS")
        .env_remove("TAILFIRE_PORT");
    cmd
}

/// Write a YAML config into `dir` and return its path.
fn write_config(dir: &Path, api_url: &str) -> PathBuf {
    let path = dir.join("tailfire.yaml");
    std::fs::write(
        &path,
        format!(
            "refresh_interval: 30s\n\
             tag_separator: \",\"\n\
             tailnet: \"-\"\n\
             api_url: \"{api_url}\"\n\
             api_token: \"{TOKEN}\"\n"
        ),
    )
    .unwrap();
    path
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_help_flag() {
    let dir = TempDir::new().unwrap();
    tailfire_cmd(dir.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("Prometheus")
            .and(predicate::str::contains("serve"))
            .and(predicate::str::contains("check"))
            .and(predicate::str::contains("targets")),
    );
}

#[test]
fn test_version_flag() {
    let dir = TempDir::new().unwrap();
    tailfire_cmd(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tailfire"));
}

#[test]
fn test_unknown_subcommand_is_usage_error() {
    let dir = TempDir::new().unwrap();
    tailfire_cmd(dir.path())
        .arg("frobnicate")
        .assert()
        .code(2);
}

#[test]
fn test_completions_bash() {
    let dir = TempDir::new().unwrap();
    tailfire_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tailfire"));
}

// ── check ───────────────────────────────────────────────────────────

#[test]
fn test_check_prints_redacted_config() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "https://api.tailscale.com");

    tailfire_cmd(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("check")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("api_token = \"<redacted>\"")
                .and(predicate::str::contains("refresh_interval = \"30s\""))
                .and(predicate::str::contains(TOKEN).not()),
        );
}

#[test]
fn test_check_reads_default_config_in_working_dir() {
    let dir = TempDir::new().unwrap();
    let written = write_config(dir.path(), "https://api.tailscale.com");
    std::fs::rename(written, dir.path().join("config.yaml")).unwrap();

    tailfire_cmd(dir.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("api_url = \"https://api.tailscale.com\""));
}

#[test]
fn test_check_env_overrides_file() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "https://api.tailscale.com");

    tailfire_cmd(dir.path())
        .env("TAILFIRE_TAILNET", "example.com")
        .arg("--config")
        .arg(&config)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("tailnet = \"example.com\""));
}

#[test]
fn test_check_rejects_unsupported_scheme() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "ftp://api.tailscale.com");

    tailfire_cmd(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("check")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("ftp"));
}

#[test]
fn test_check_without_token_fails() {
    let dir = TempDir::new().unwrap();

    tailfire_cmd(dir.path())
        .arg("check")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("api_token is missing"));
}

#[test]
fn test_missing_config_file_fails() {
    let dir = TempDir::new().unwrap();

    tailfire_cmd(dir.path())
        .args(["--config", "does-not-exist.yaml", "check"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("does-not-exist.yaml"));
}

// ── targets ─────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_targets_prints_groups() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/tailnet/-/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(TAILNET_JSON, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), &server.uri());

    let output = tailfire_cmd(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("targets")
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let groups: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let groups = groups.as_array().unwrap();
    assert_eq!(groups.len(), 3);
    assert_eq!(groups[2]["targets"][0], "100.101.101.104");
    assert_eq!(
        groups[2]["labels"]["__meta_tailscale_device_enabled_routes"],
        ",10.0.0.0/8,"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_targets_upstream_failure_exits_four() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad application key"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), &server.uri());

    tailfire_cmd(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("targets")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("bad application key"));
}

// ── serve ───────────────────────────────────────────────────────────

#[test]
fn test_serve_logs_listen_address_without_verbose() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "https://api.tailscale.com");

    let mut child = std::process::Command::new(env!("CARGO_BIN_EXE_tailfire"))
        .current_dir(dir.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("TAILFIRE_LOG_FORMAT")
        .arg("--config")
        .arg(&config)
        .args(["serve", "--listen", "127.0.0.1", "--port", "0"])
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    let stderr = child.stderr.take().unwrap();
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in BufReader::new(stderr).lines().map_while(Result::ok) {
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut seen = Vec::new();
    let found = loop {
        match rx.recv_timeout(Duration::from_secs(10)) {
            Ok(line) if line.contains("/prometheus/targets") => break true,
            Ok(line) => seen.push(line),
            Err(_) => break false,
        }
    };

    child.kill().unwrap();
    child.wait().unwrap();
    assert!(found, "no curl hint in stderr:\n{}", seen.join("\n"));
}
