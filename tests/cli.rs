//! End-to-end tests for the astsec binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn astsec() -> Command {
    Command::cargo_bin("astsec").unwrap()
}

#[test]
fn scan_reports_findings_in_text() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("app.js"),
        "var { exec } = require('child_process');\nexec(userInput);\n",
    )
    .unwrap();

    astsec()
        .arg("scan")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Found child_process.exec() with non Literal first argument",
        ))
        .stdout(predicate::str::contains("detect-child-process"));
}

#[test]
fn scan_clean_directory() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("app.js"),
        "var fs = require('fs');\nfs.readFile('/etc/hosts', cb);\n",
    )
    .unwrap();

    astsec()
        .arg("scan")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No issues found."));
}

#[test]
fn scan_json_output() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("app.js"), "require(moduleName);\n").unwrap();

    let output = astsec()
        .arg("scan")
        .arg(dir.path())
        .args(["--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["files_scanned"], 1);
    assert_eq!(
        value["findings"][0]["rule_id"],
        "detect-non-literal-require"
    );
}

#[test]
fn fail_on_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("app.js"), "require(moduleName);\n").unwrap();

    astsec()
        .arg("scan")
        .arg(dir.path())
        .args(["--fail-on", "high"])
        .assert()
        .code(1);
}

#[test]
fn fail_on_passes_below_threshold() {
    let dir = TempDir::new().unwrap();
    // regexp findings are medium severity
    fs::write(dir.path().join("app.js"), "new RegExp(input);\n").unwrap();

    astsec()
        .arg("scan")
        .arg(dir.path())
        .args(["--fail-on", "high"])
        .assert()
        .success();
}

#[test]
fn disable_flag_suppresses_rule() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("app.js"), "new RegExp(input);\n").unwrap();

    astsec()
        .arg("scan")
        .arg(dir.path())
        .args(["--disable", "detect-non-literal-regexp"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No issues found."));
}

#[test]
fn config_file_is_honored() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("app.js"), "new RegExp(input);\n").unwrap();
    let config = dir.path().join("astsec.toml");
    fs::write(&config, "disabled_rules = [\"detect-non-literal-regexp\"]\n").unwrap();

    astsec()
        .arg("--config")
        .arg(&config)
        .arg("scan")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No issues found."));
}

#[test]
fn rules_command_lists_builtin() {
    astsec()
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("detect-child-process"))
        .stdout(predicate::str::contains("detect-non-literal-fs-filename"))
        .stdout(predicate::str::contains("detect-non-literal-require"))
        .stdout(predicate::str::contains("detect-non-literal-regexp"));
}

#[test]
fn rules_command_json() {
    let output = astsec()
        .arg("rules")
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 4);
}

#[test]
fn init_writes_config() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("astsec.toml");

    astsec()
        .arg("init")
        .args(["--output", target.to_str().unwrap()])
        .assert()
        .success();

    let written = fs::read_to_string(&target).unwrap();
    assert!(written.contains("disabled_rules"));

    // Refuses to overwrite.
    astsec()
        .arg("init")
        .args(["--output", target.to_str().unwrap()])
        .assert()
        .code(1);
}
