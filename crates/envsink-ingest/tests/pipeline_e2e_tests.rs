//! End-to-end tests for the envsink binary
//!
//! These run the compiled binary with records on stdin or in a file and
//! check what reaches each sink.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn line(seq: i32) -> String {
    format!(
        r#"{{"battery_potential":2335,"humidity":653675,"mac_address":[254,38,136,122,102,102],"measurement_sequence_number":{seq},"movement_counter":2,"pressure":100755,"temperature_millicelsius":-29020,"tx_power":4,"measurement_ts_ms":1693460525699}}"#
    )
}

fn envsink() -> Command {
    let mut cmd = Command::cargo_bin("envsink").expect("binary is built");
    // Keep the test environment from leaking into the run
    cmd.env_remove("ENVSINK_INPUT")
        .env_remove("JSONL_PATH")
        .env_remove("DUCKDB_PATH")
        .env_remove("LOG_OUTPUT")
        .env("LOG_LEVEL", "info");
    cmd
}

#[test]
fn test_console_prints_each_record() {
    let input = format!("{}\n{}\n", line(1), line(2));

    envsink()
        .arg("console")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""measurement_sequence_number":1"#))
        .stdout(predicate::str::contains(r#""measurement_sequence_number":2"#))
        .stdout(predicate::function(|out: &str| out.lines().count() == 2));
}

#[test]
fn test_malformed_line_is_skipped() {
    let input = format!("{}\nnot json at all\n{}\n", line(1), line(3));

    envsink()
        .arg("console")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""measurement_sequence_number":3"#))
        .stdout(predicate::function(|out: &str| out.lines().count() == 2))
        .stderr(predicate::str::contains("Skipping unparseable line"));
}

#[test]
fn test_jsonl_appends_to_file() {
    let dir = TempDir::new().expect("temp dir");
    let output = dir.path().join("nested/out.jsonl");

    for seq in [1, 2] {
        envsink()
            .arg("jsonl")
            .arg("--path")
            .arg(&output)
            .write_stdin(format!("{}\n", line(seq)))
            .assert()
            .success();
    }

    let written = fs::read_to_string(&output).expect("output written");
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains(r#""measurement_sequence_number":1"#));
    assert!(lines[1].contains(r#""mac_address":[254,38,136,122,102,102]"#));
}

#[test]
fn test_input_file_flag() {
    let dir = TempDir::new().expect("temp dir");
    let input = dir.path().join("readings.jsonl");
    fs::write(&input, format!("{}\n{}\n{}\n", line(1), line(2), line(3))).expect("input written");

    envsink()
        .arg("--input")
        .arg(&input)
        .arg("console")
        .assert()
        .success()
        .stdout(predicate::function(|out: &str| out.lines().count() == 3));
}

#[test]
fn test_duckdb_rejects_bad_table_name() {
    let dir = TempDir::new().expect("temp dir");
    let db = dir.path().join("telemetry.duckdb");

    envsink()
        .args(["duckdb", "--table", "bad-name", "--path"])
        .arg(&db)
        .write_stdin(format!("{}\n", line(1)))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid table name"));

    assert!(!db.exists());
}

#[test]
fn test_missing_input_file_fails() {
    envsink()
        .args(["--input", "/nonexistent/readings.jsonl", "console"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open input"));
}
