//! CLI argument validation tests.
//!
//! Tests command-line argument parsing, validation, and error handling.

#![allow(clippy::unwrap_used)]
#![allow(deprecated)] // cargo_bin deprecation

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

const COMPLETE_RUN: &str = r#"{"type":"start","totalFiles":2}
{"type":"item","fileName":"a.jpg","imageId":"a"}
{"type":"item","fileName":"b.jpg","imageId":"b"}
{"type":"complete"}
"#;

fn tally(config_home: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tally").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .current_dir(config_home.path());
    cmd
}

fn write_log(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("events.jsonl");
    fs::write(&path, contents).unwrap();
    path
}

// === Missing/Invalid Log Tests ===

#[test]
fn test_missing_log_shows_error() {
    let dir = tempfile::tempdir().unwrap();
    tally(&dir)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No event logs specified"));
}

#[test]
fn test_nonexistent_log_warns_but_continues() {
    let dir = tempfile::tempdir().unwrap();
    tally(&dir)
        .arg("/nonexistent/events.jsonl")
        .assert()
        .code(0) // Nothing replayed = idle, nothing to report
        .stderr(predicate::str::contains("does not exist"))
        .stderr(predicate::str::contains("Idle: 0/0"));
}

#[test]
fn test_directory_log_warns_and_finishes() {
    let dir = tempfile::tempdir().unwrap();
    let logs = dir.path().join("logs");
    fs::create_dir(&logs).unwrap();

    tally(&dir)
        .arg("--no-watchdog")
        .arg(&logs)
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .code(0)
        .stderr(predicate::str::contains("is a directory"));

    tally(&dir)
        .arg("validate")
        .arg(&logs)
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .code(0)
        .stdout(predicate::str::contains("\"malformed\":0"));
}

#[test]
fn test_empty_log() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(&dir, "");

    tally(&dir)
        .arg(&log)
        .assert()
        .code(0)
        .stdout(predicate::str::is_empty());
}

// === Flag Validation Tests ===

#[test]
fn test_invalid_format_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(&dir, COMPLETE_RUN);

    tally(&dir)
        .arg("--format")
        .arg("xml")
        .arg(&log)
        .assert()
        .failure()
        .stderr(predicate::str::contains("json").or(predicate::str::contains("jsonl")));
}

#[test]
fn test_zero_stall_timeout_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(&dir, COMPLETE_RUN);

    tally(&dir)
        .arg("--stall-timeout")
        .arg("0")
        .arg(&log)
        .assert()
        .failure()
        .stderr(predicate::str::contains("greater than 0"));
}

#[test]
fn test_non_numeric_stall_timeout_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(&dir, COMPLETE_RUN);

    tally(&dir)
        .arg("--stall-timeout")
        .arg("soon")
        .arg(&log)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a whole number"));
}

#[test]
fn test_quiet_suppresses_summary_line() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(&dir, COMPLETE_RUN);

    tally(&dir)
        .arg("--quiet")
        .arg(&log)
        .assert()
        .code(0)
        .stderr(predicate::str::contains("Complete").not());
}

#[test]
fn test_progress_flag_accepted_without_terminal() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(&dir, COMPLETE_RUN);

    tally(&dir).arg("--progress").arg(&log).assert().code(0);
}

// === Subcommands ===

#[test]
fn test_replay_subcommand_matches_default() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(&dir, COMPLETE_RUN);

    let default = tally(&dir).arg(&log).output().unwrap();
    let explicit = tally(&dir).arg("replay").arg(&log).output().unwrap();

    assert_eq!(default.status.code(), Some(0));
    assert_eq!(explicit.status.code(), Some(0));
    assert_eq!(
        String::from_utf8(default.stdout).unwrap().lines().count(),
        String::from_utf8(explicit.stdout).unwrap().lines().count()
    );
}

#[test]
fn test_validate_clean_log() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(&dir, COMPLETE_RUN);

    let output = tally(&dir).arg("validate").arg(&log).output().unwrap();
    assert_eq!(output.status.code(), Some(0));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["kinds"]["start"], 1);
    assert_eq!(report["kinds"]["item"], 2);
    assert_eq!(report["kinds"]["complete"], 1);
    assert_eq!(report["malformed"], 0);
}

#[test]
fn test_validate_reports_malformed_lines() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(&dir, "{\"type\":\"start\",\"totalFiles\":1}\nnot json\n");

    tally(&dir)
        .arg("validate")
        .arg(&log)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"malformed\":1"))
        .stderr(predicate::str::contains("events.jsonl:2"));
}

#[test]
fn test_validate_requires_logs() {
    let dir = tempfile::tempdir().unwrap();
    tally(&dir).arg("validate").assert().code(2);
}

#[test]
fn test_help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    tally(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("replay"))
        .stdout(predicate::str::contains("validate"));
}
