//! End-to-end tests for the veridok binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn veridok() -> Command {
    Command::cargo_bin("veridok").unwrap()
}

#[test]
fn test_help_lists_subcommands() {
    veridok()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("process")
                .and(predicate::str::contains("batch"))
                .and(predicate::str::contains("config")),
        );
}

#[test]
fn test_config_init_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    veridok()
        .args(["config", "init", "--output"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));

    let contents = std::fs::read_to_string(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert!(json.get("ocr").is_some());
    assert!(json.get("anomaly").is_some());
}

#[test]
fn test_config_init_refuses_overwrite_without_force() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{}").unwrap();

    veridok()
        .args(["config", "init", "--output"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    veridok()
        .args(["config", "init", "--force", "--output"])
        .arg(&path)
        .assert()
        .success();
}

#[test]
fn test_process_missing_input_fails() {
    veridok()
        .args(["process", "/no/such/document.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}
