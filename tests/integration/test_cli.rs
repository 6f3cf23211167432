//! The `fmea-rag` binary: output and exit codes.

use crate::common::{CT_SCANNER_SHEET, TestWorkspace};
use std::path::Path;
use std::process::Command;

fn run_cli(workspace: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_fmea-rag"))
        .args(args)
        .current_dir(workspace)
        .env_remove("RUST_LOG")
        .output()
        .expect("run fmea-rag CLI");

    let code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    (code, stdout, stderr)
}

/// Workspace with the CT scanner sheet and a hash-embedder settings file.
fn prepare_workspace() -> TestWorkspace {
    let workspace = TestWorkspace::new();
    workspace.add_file("fmea_example.csv", CT_SCANNER_SHEET);
    workspace.add_file(
        ".fmea/settings.toml",
        "[embedding]\nmodel = \"hash\"\n\n[knowledge]\npath = \"fmea_example.csv\"\n",
    );
    workspace
}

#[test]
fn retrieve_prints_ranked_chunks() {
    let workspace = prepare_workspace();
    let (code, stdout, stderr) = run_cli(
        workspace.path(),
        &["retrieve", "Gantry", "Motor", "--threshold", "0.2"],
    );

    assert_eq!(code, 0, "stderr: {stderr}");
    let first = stdout.lines().nth(1).unwrap_or_default();
    assert!(stdout.starts_with("1. relevance"), "stdout: {stdout}");
    assert!(first.contains("bearing seizure"), "stdout: {stdout}");
}

#[test]
fn retrieve_sentinel_exits_not_found() {
    let workspace = prepare_workspace();
    let (code, stdout, _stderr) = run_cli(
        workspace.path(),
        &["retrieve", "Quantum Flux Capacitor", "--threshold", "0.9"],
    );

    assert_eq!(code, 3);
    assert_eq!(stdout.trim(), "NOT ENOUGH DATA");
}

#[test]
fn retrieve_json_envelope() {
    let workspace = prepare_workspace();
    let (code, stdout, stderr) = run_cli(
        workspace.path(),
        &["retrieve", "X-ray Tube", "-k", "2", "--json"],
    );

    assert_eq!(code, 0, "stderr: {stderr}");
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(json["code"], "OK");
    assert_eq!(json["data"]["k"], 2);
    assert_eq!(json["data"]["result"]["status"], "evidence");
    assert!(json["data"]["result"]["chunks"].as_array().unwrap().len() <= 2);
}

#[test]
fn context_passes_sentinel_through() {
    let workspace = prepare_workspace();
    let (code, stdout, _stderr) = run_cli(
        workspace.path(),
        &["context", "Gantry Motor", "--threshold", "1.1"],
    );

    assert_eq!(code, 3);
    assert_eq!(stdout.trim(), "NOT ENOUGH DATA");
}

#[test]
fn invalid_k_is_a_config_error() {
    let workspace = prepare_workspace();
    let (code, _stdout, stderr) = run_cli(workspace.path(), &["retrieve", "Gantry", "-k", "0"]);

    assert_eq!(code, 6);
    assert!(stderr.contains("k must be at least 1"), "stderr: {stderr}");
    assert!(stderr.contains("Exit code 6: Configuration error"));
}

#[test]
fn missing_knowledge_file_is_an_io_error() {
    let workspace = prepare_workspace();
    let (code, _stdout, stderr) = run_cli(
        workspace.path(),
        &["stats", "--knowledge", "does-not-exist.csv"],
    );

    assert_eq!(code, 5, "stderr: {stderr}");
    assert!(stderr.contains("Exit code 5: I/O error"), "stderr: {stderr}");
}

#[test]
fn init_refuses_to_overwrite() {
    let workspace = TestWorkspace::new();
    let (code, stdout, _stderr) = run_cli(workspace.path(), &["init"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("settings.toml"));
    assert!(workspace.path().join(".fmea/settings.toml").exists());

    let (code, _stdout, stderr) = run_cli(workspace.path(), &["init"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("--force"), "stderr: {stderr}");

    let (code, _stdout, _stderr) = run_cli(workspace.path(), &["init", "--force"]);
    assert_eq!(code, 0);
}
