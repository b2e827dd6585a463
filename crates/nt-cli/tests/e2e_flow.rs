//! End-to-end tests of the `nt` binary against notes on disk.
//!
//! Every run gets a fresh HOME and `TZ=UTC` so config lookups and local
//! timestamps are isolated from the machine running the tests.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn nt_binary() -> String {
    env!("CARGO_BIN_EXE_nt").to_string()
}

fn nt(home: &Path, args: &[&str]) -> Output {
    Command::new(nt_binary())
        .env_clear()
        .env("HOME", home)
        .env("TZ", "UTC")
        .args(args)
        .output()
        .expect("failed to run nt")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write_note(temp: &TempDir, text: &str) -> PathBuf {
    let path = temp.path().join("note.md");
    std::fs::write(&path, text).unwrap();
    path
}

const HALF_HOUR: &str = "\
# Notes

```time-tracker
2024-03-01 10:00:00 -> 2024-03-01 10:30:00 | Drafting
```
";

#[test]
fn test_update_writes_elapsed_header() {
    let temp = TempDir::new().unwrap();
    let note = write_note(&temp, HALF_HOUR);

    let output = nt(temp.path(), &["update", "-f", note.to_str().unwrap()]);
    assert!(output.status.success(), "update failed: {}", stderr(&output));
    assert!(stderr(&output).contains("Elapsed time updated: 00:30:00"));

    let updated = std::fs::read_to_string(&note).unwrap();
    assert_eq!(updated, format!("---\nelapsed: 1800000\n---\n{HALF_HOUR}"));
    assert!(!temp.path().join(".note.md.nt-tmp").exists());
}

#[test]
fn test_update_without_trackers_leaves_note_alone() {
    let temp = TempDir::new().unwrap();
    let text = "---\ntitle: Empty\n---\nNothing tracked yet.\n";
    let note = write_note(&temp, text);

    let output = nt(temp.path(), &["update", "-f", note.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(stderr(&output).contains("No trackers found"));
    assert_eq!(std::fs::read_to_string(&note).unwrap(), text);
}

#[test]
fn test_update_header_error_fails_without_writing() {
    let temp = TempDir::new().unwrap();
    let text = format!("---\ntitle: [unclosed\n---\n{HALF_HOUR}");
    let note = write_note(&temp, &text);

    let output = nt(temp.path(), &["update", "-f", note.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Header parse error"));
    assert_eq!(std::fs::read_to_string(&note).unwrap(), text);
}

#[test]
fn test_update_without_active_document_fails() {
    let temp = TempDir::new().unwrap();
    let output = nt(temp.path(), &["update"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("No active document"));
}

#[test]
fn test_configured_active_document() {
    let temp = TempDir::new().unwrap();
    let note = write_note(&temp, HALF_HOUR);

    let output = nt(
        temp.path(),
        &["config", "set", "active_document", note.to_str().unwrap()],
    );
    assert!(output.status.success(), "config set failed: {}", stderr(&output));

    let output = nt(temp.path(), &["update"]);
    assert!(output.status.success(), "update failed: {}", stderr(&output));
    assert!(
        std::fs::read_to_string(&note)
            .unwrap()
            .starts_with("---\nelapsed: 1800000\n---\n")
    );
}

#[test]
fn test_config_set_show_and_env_override() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("nt.toml");
    let config = config.to_str().unwrap();

    let output = nt(
        temp.path(),
        &["--config", config, "config", "set", "tracker.duration_format", "coarse"],
    );
    assert!(output.status.success(), "config set failed: {}", stderr(&output));

    let output = nt(temp.path(), &["--config", config, "config", "show"]);
    assert!(stdout(&output).contains("duration_format = \"coarse\""));

    let output = Command::new(nt_binary())
        .env_clear()
        .env("HOME", temp.path())
        .env("NT_TRACKER__ORDER", "descending")
        .args(["--config", config, "config", "show"])
        .output()
        .unwrap();
    assert!(stdout(&output).contains("order = \"descending\""));

    let output = nt(
        temp.path(),
        &["--config", config, "config", "set", "tracker.order", "sideways"],
    );
    assert!(!output.status.success());
}

#[test]
fn test_start_stop_show_flow() {
    let temp = TempDir::new().unwrap();
    let note = write_note(&temp, HALF_HOUR);
    let file = note.to_str().unwrap();

    let output = nt(temp.path(), &["start", "--name", "Review", "-f", file]);
    assert!(output.status.success(), "start failed: {}", stderr(&output));
    assert!(std::fs::read_to_string(&note).unwrap().contains(" -> | Review\n```\n"));

    let output = nt(temp.path(), &["start", "-f", file]);
    assert!(!output.status.success(), "second start must be refused");

    let output = nt(temp.path(), &["show", "--json", "-f", file]);
    let shown: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(shown["trackers"][0]["running"], true);

    let output = nt(temp.path(), &["stop", "-f", file]);
    assert!(output.status.success(), "stop failed: {}", stderr(&output));

    let output = nt(temp.path(), &["show", "--json", "-f", file]);
    let shown: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(shown["trackers"][0]["running"], false);
    assert_eq!(shown["trackers"][0]["entries"][1]["name"], "Review");
}

#[test]
fn test_export_markdown() {
    let temp = TempDir::new().unwrap();
    let note = write_note(&temp, HALF_HOUR);

    let output = nt(
        temp.path(),
        &["export", "--format", "markdown", "-f", note.to_str().unwrap()],
    );
    assert!(output.status.success(), "export failed: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "| Name | Start | End | Duration |\n\
         | --- | --- | --- | --- |\n\
         | Drafting | 24-03-01 10:00:00 | 24-03-01 10:30:00 | 00:30:00 |\n"
    );
}
