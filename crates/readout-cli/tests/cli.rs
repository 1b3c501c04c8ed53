use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn readout() -> Command {
    Command::cargo_bin("readout").unwrap()
}

#[test]
fn test_help_lists_commands() {
    readout()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("process"))
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_config_init_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("nested").join("config.json");
    let config = config.to_str().unwrap();

    readout()
        .args(["-c", config, "config", "init"])
        .assert()
        .success();

    readout()
        .args(["-c", config, "config", "get", "region.top"])
        .assert()
        .success()
        .stdout("2200\n");

    readout()
        .args(["-c", config, "config", "set", "selection.max_value", "1500"])
        .assert()
        .success();

    readout()
        .args(["-c", config, "config", "get", "selection.max_value"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1500"));

    // Second init refuses to clobber the file
    readout()
        .args(["-c", config, "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn test_config_set_rejects_invalid_value() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    let config = config.to_str().unwrap();

    readout()
        .args(["-c", config, "config", "set", "render.scale", "0"])
        .assert()
        .failure();
    assert!(!dir.path().join("config.json").exists());
}

#[test]
fn test_batch_writes_error_rows() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, r#"{"render": {"renderer": "embedded"}}"#).unwrap();
    let report = dir.path().join("out").join("results.csv");

    // Every document failing is reported, then the command fails
    readout()
        .arg("-c")
        .arg(&config)
        .arg("batch")
        .arg(dir.path().join("absent.pdf"))
        .arg("-o")
        .arg(&report)
        .assert()
        .failure()
        .stderr(predicate::str::contains("All 1 documents failed"));

    let text = fs::read_to_string(&report).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Filename,Extracted Number,Status,Error"));
    let row = lines.next().unwrap();
    assert!(row.starts_with("absent,,error,"));
    assert!(row.contains("[render]"));
}

#[test]
fn test_batch_without_matches_fails() {
    let dir = tempfile::tempdir().unwrap();
    let pattern = format!("{}/*.pdf", dir.path().display());

    readout()
        .args(["batch", &pattern])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No PDF files found"));
}

#[test]
fn test_process_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, r#"{"render": {"renderer": "embedded"}}"#).unwrap();

    readout()
        .arg("-c")
        .arg(&config)
        .arg("process")
        .arg(dir.path().join("absent.pdf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot open"));
}

#[test]
fn test_batch_strict_flag() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, r#"{"render": {"renderer": "embedded"}}"#).unwrap();
    let report = dir.path().join("results.json");

    readout()
        .arg("-c")
        .arg(&config)
        .arg("batch")
        .arg(dir.path().join("absent.pdf"))
        .arg("--strict")
        .arg("-o")
        .arg(&report)
        .assert()
        .failure();

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(value["failed"], 1);
    assert_eq!(value["rows"][0]["Status"], "error");

    readout()
        .args(["batch", "absent.pdf", "--fail-fast"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--fail-fast"));
}
