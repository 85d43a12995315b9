//! Integration tests for `joran config` command.
//!
//! Tests config validation and display functionality with real TOML files.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use tempfile::TempDir;

fn joran() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_joran"));
    cmd.env_remove("RUST_LOG");
    cmd
}

#[tokio::test]
async fn test_config_validate_valid_toml() {
    // Given: A valid config file
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("joran.toml");

    let valid_config = r#"
[general]
log_level = "info"
log_format = "json"

[interpreter]
max_depth = 64
fail_on_error = false

[substitution]
log_dir = "/var/log/app"
"#;
    fs::write(&config_path, valid_config).expect("should write config");

    // When: Loading the config
    let result = joran_core::config::JoranConfig::load(&config_path).await;

    // Then: Should succeed
    let config = result.expect("valid config should load successfully");
    assert_eq!(config.interpreter.max_depth, 64);
    assert!(!config.interpreter.fail_on_error);
}

#[tokio::test]
async fn test_config_validate_malformed_toml() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("bad.toml");
    fs::write(&config_path, "[general\nlog_level = \"info\"\n").expect("should write bad config");

    let result = joran_core::config::JoranConfig::load(&config_path).await;
    assert!(result.is_err(), "malformed TOML should fail to load");
}

#[tokio::test]
async fn test_config_validate_empty_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("empty.toml");
    fs::write(&config_path, "").expect("should write empty file");

    let config = joran_core::config::JoranConfig::load(&config_path)
        .await
        .expect("empty config should use defaults");
    assert!(config.interpreter.implicit_nesting);
    assert!(config.substitution.is_empty());
}

#[test]
fn test_config_validate_command_exit_codes() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let good = temp_dir.path().join("good.toml");
    let bad = temp_dir.path().join("bad.toml");
    fs::write(&good, "[general]\nlog_level = \"warn\"\n").expect("write");
    fs::write(&bad, "[general]\nlog_level = \"loud\"\n").expect("write");

    let output = joran()
        .arg("-c")
        .arg(&good)
        .args(["config", "validate"])
        .output()
        .expect("should run joran");
    assert!(output.status.success(), "valid config should exit 0");
    assert!(String::from_utf8_lossy(&output.stdout).contains("VALID"));

    let output = joran()
        .arg("-c")
        .arg(&bad)
        .args(["config", "validate", "--output", "json"])
        .output()
        .expect("should run joran");
    assert_eq!(output.status.code(), Some(2), "invalid config should exit 2");
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(report["valid"], false);
    assert!(report["errors"][0].as_str().unwrap_or("").contains("log_level"));
}

#[test]
fn test_config_show_section_json() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("joran.toml");
    fs::write(&config_path, "[substitution]\nlog_dir = \"/srv/logs\"\n").expect("write");

    let output = joran()
        .arg("-c")
        .arg(&config_path)
        .args(["config", "show", "--section", "substitution", "--output", "json"])
        .output()
        .expect("should run joran");
    assert!(output.status.success());

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(report["section"], "substitution");
    assert_eq!(report["config"]["log_dir"], "/srv/logs");
}

#[test]
fn test_config_show_missing_file() {
    let config_path = PathBuf::from("/nonexistent/joran.toml");
    let output = joran()
        .arg("-c")
        .arg(&config_path)
        .args(["config", "show"])
        .output()
        .expect("should run joran");
    assert_eq!(output.status.code(), Some(2), "missing config should exit 2");
    assert!(String::from_utf8_lossy(&output.stderr).contains("not found"));
}
