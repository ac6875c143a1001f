//! Command-line behaviour of the `wambam` binary.
//!
//! These tests never reach a real aligner: they cover argument handling,
//! configuration errors and failure exit codes.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

// =============================================================================
// Helper functions
// =============================================================================

fn wambam_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_wambam"))
}

fn run_wambam(args: &[&str]) -> Output {
    Command::new(wambam_bin())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run wambam")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn entries(dir: &Path) -> usize {
    fs::read_dir(dir).unwrap().count()
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

// =============================================================================
// Configuration errors
// =============================================================================

#[test]
fn test_help_lists_options() {
    let output = run_wambam(&["--help"]);
    assert!(output.status.success());
    let help = stdout(&output);
    for flag in ["--index", "--prefix", "--R1", "--R2", "--bam", "--adapter", "--CPU", "--save", "--just-trim"] {
        assert!(help.contains(flag), "help is missing {}", flag);
    }
}

#[test]
fn test_no_reads_is_config_error() {
    let scratch = TempDir::new().unwrap();
    let output = run_wambam(&[
        "--prefix",
        "sample",
        "--index",
        "idx",
        "--tmpdir",
        path_str(scratch.path()),
    ]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("configuration error"));
    assert_eq!(entries(scratch.path()), 0);
}

#[test]
fn test_reads_without_index_is_config_error() {
    let scratch = TempDir::new().unwrap();
    let output = run_wambam(&[
        "--prefix",
        "sample",
        "-1",
        "r1.fq",
        "--tmpdir",
        path_str(scratch.path()),
    ]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("--index"));
    assert_eq!(entries(scratch.path()), 0);
}

#[test]
fn test_r2_without_r1_is_config_error() {
    let output = run_wambam(&["--prefix", "sample", "--index", "idx", "-2", "r2.fq"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("--R2"));
}

#[test]
fn test_zero_cpu_is_config_error() {
    let output = run_wambam(&["--prefix", "s", "--index", "idx", "-1", "r.fq", "--CPU", "0"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_unknown_adapter_rejected() {
    let output = run_wambam(&[
        "--prefix",
        "s",
        "--index",
        "idx",
        "-1",
        "r.fq",
        "--adapter",
        "TruSeq9-PE",
    ]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("unknown adapter profile"));
}

#[test]
fn test_missing_prefix_rejected() {
    let output = run_wambam(&["--index", "idx", "-1", "r.fq"]);
    assert!(!output.status.success());
}

// =============================================================================
// External-process failures
// =============================================================================

#[cfg(unix)]
#[test]
fn test_tool_failure_cleans_workspace() {
    let scratch = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let prefix = out.path().join("sample");
    let output = run_wambam(&[
        "--prefix",
        path_str(&prefix),
        "-1",
        "r1.fq",
        "-2",
        "r2.fq",
        "--just-trim",
        "--java",
        "false",
        "--tmpdir",
        path_str(scratch.path()),
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("trim stage failed"));
    assert_eq!(entries(scratch.path()), 0);
    assert_eq!(entries(out.path()), 0);
}

#[cfg(unix)]
#[test]
fn test_tool_failure_with_save_keeps_workspace() {
    let scratch = TempDir::new().unwrap();
    let output = run_wambam(&[
        "--prefix",
        "sample",
        "-1",
        "r1.fq",
        "--just-trim",
        "--save",
        "--java",
        "false",
        "--tmpdir",
        path_str(scratch.path()),
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(entries(scratch.path()), 1);
    assert!(stderr(&output).contains("workspace preserved"));
}

#[test]
fn test_missing_tool_is_reported() {
    let scratch = TempDir::new().unwrap();
    let output = Command::new(wambam_bin())
        .args([
            "--prefix",
            "sample",
            "-1",
            "r1.fq",
            "--just-trim",
            "--tmpdir",
            path_str(scratch.path()),
        ])
        .env("WAMBAM_JAVA", "wambam-test-no-such-java")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run wambam");

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("failed to launch wambam-test-no-such-java"));
    assert_eq!(entries(scratch.path()), 0);
}

// =============================================================================
// Successful runs with a stub trimmer
// =============================================================================

/// Write an executable stand-in for `java` that, called as
/// `java -jar <jar> SE -threads N -phred33 <in> <out> ...`, writes one FASTQ
/// record to `<out>`.
#[cfg(unix)]
fn stub_trimmer(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("java");
    fs::write(&path, "#!/bin/sh\nprintf '@r\\nACGT\\n+\\nIIII\\n' > \"$8\"\n").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
#[test]
fn test_just_trim_with_save_reports_workspace() {
    let tools = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let java = stub_trimmer(tools.path());
    let prefix = out.path().join("sample");

    let output = run_wambam(&[
        "--prefix",
        path_str(&prefix),
        "-1",
        "r1.fq",
        "--just-trim",
        "--save",
        "--java",
        path_str(&java),
        "--tmpdir",
        path_str(scratch.path()),
    ]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    let mut lines = text.lines();
    assert_eq!(lines.next().map(str::trim_end), Some("TEMP FILES:"));
    let workspace = PathBuf::from(lines.next().unwrap());
    assert!(workspace.is_dir());
    assert!(workspace.starts_with(scratch.path()));
    assert!(workspace.join("trimmed.fq").exists());
    assert!(out.path().join("sample-trim.fastq.gz").exists());
}

#[cfg(unix)]
#[test]
fn test_just_trim_without_save_prints_nothing() {
    let tools = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let java = stub_trimmer(tools.path());
    let prefix = out.path().join("sample");

    let output = run_wambam(&[
        "--prefix",
        path_str(&prefix),
        "-1",
        "r1.fq",
        "--just-trim",
        "--java",
        path_str(&java),
        "--tmpdir",
        path_str(scratch.path()),
    ]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(!stdout(&output).contains("TEMP FILES"));
    assert_eq!(entries(scratch.path()), 0);
    assert!(out.path().join("sample-trim.fastq.gz").exists());
}
