//! Integration tests for the command-line interface
//!
//! Runs the built binary against temp workspaces and checks the
//! machine-parseable success/error prefixes and exit codes.

use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn drift_patcher() -> Command {
    Command::new(env!("CARGO_BIN_EXE_drift-patcher"))
}

fn setup_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("config.txt"),
        "retries = 3\ntimeout = 30\nverbose = false\n",
    )
    .unwrap();
    dir
}

#[test]
fn apply_replaces_text_and_reports_success() {
    let dir = setup_workspace();

    let output = drift_patcher()
        .args([
            "apply",
            "--workspace",
            dir.path().to_str().unwrap(),
            "--file",
            "config.txt",
            "--old",
            "timeout = 30",
            "--new",
            "timeout = 60",
        ])
        .output()
        .expect("failed to run drift-patcher");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("Success:"), "stdout: {stdout}");

    let content = fs::read_to_string(dir.path().join("config.txt")).unwrap();
    assert_eq!(content, "retries = 3\ntimeout = 60\nverbose = false\n");
}

#[test]
fn apply_ambiguous_edit_fails_with_nonzero_exit() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("dup.txt"), "same\nother\nsame\n").unwrap();

    let output = drift_patcher()
        .args([
            "apply",
            "--workspace",
            dir.path().to_str().unwrap(),
            "--file",
            "dup.txt",
            "--old",
            "same",
            "--new",
            "different",
        ])
        .output()
        .expect("failed to run drift-patcher");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!output.status.success());
    assert!(stdout.contains("Error:"), "stdout: {stdout}");
    assert!(stdout.contains("replace_all"), "stdout: {stdout}");

    let content = fs::read_to_string(dir.path().join("dup.txt")).unwrap();
    assert_eq!(content, "same\nother\nsame\n");
}

#[test]
fn apply_line_edit_with_checksum_from_view() {
    let dir = setup_workspace();

    // First observe the file to get current references.
    let view = drift_patcher()
        .args([
            "view",
            "--workspace",
            dir.path().to_str().unwrap(),
            "--file",
            "config.txt",
        ])
        .output()
        .expect("failed to run drift-patcher");
    assert!(view.status.success());
    let listing = String::from_utf8_lossy(&view.stdout);

    // Line 2 renders as "2:cc | timeout = 30"; reuse that reference.
    let line2 = listing
        .lines()
        .find(|l| l.starts_with("2:"))
        .expect("line 2 in view output");
    let reference = line2.split(" | ").next().unwrap();

    let output = drift_patcher()
        .args([
            "apply",
            "--workspace",
            dir.path().to_str().unwrap(),
            "--file",
            "config.txt",
            "--start-line",
            reference,
            "--new",
            "timeout = 120",
        ])
        .output()
        .expect("failed to run drift-patcher");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout: {stdout}");

    let content = fs::read_to_string(dir.path().join("config.txt")).unwrap();
    assert_eq!(content, "retries = 3\ntimeout = 120\nverbose = false\n");
}

#[test]
fn view_renders_observation_format() {
    let dir = setup_workspace();

    let output = drift_patcher()
        .args([
            "view",
            "--workspace",
            dir.path().to_str().unwrap(),
            "--file",
            "config.txt",
            "--from",
            "1",
            "--to",
            "2",
        ])
        .output()
        .expect("failed to run drift-patcher");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("1:"));
    assert!(lines[0].ends_with(" | retries = 3"));
    assert!(lines[1].starts_with("2:"));
}
