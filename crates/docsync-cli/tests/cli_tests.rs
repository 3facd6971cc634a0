//! Integration tests for the docsync binary.
//!
//! Each test runs the compiled binary against a scratch project whose
//! remote is a sibling directory.

use std::fs;

use assert_cmd::Command;
use docsync_test_utils::TestProject;
use predicates::prelude::*;
use serde_json::Value;

fn docsync(project: &TestProject) -> Command {
    let mut cmd = Command::cargo_bin("docsync").expect("Failed to find docsync binary");
    cmd.current_dir(project.root()).env_remove("RUST_LOG");
    cmd
}

fn registry(project: &TestProject) -> Value {
    serde_json::from_slice(&project.registry_bytes()).expect("registry is JSON")
}

fn configured() -> TestProject {
    let project = TestProject::new();
    project.write_config();
    project
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_lists_commands() {
    let project = TestProject::new();
    docsync(&project)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sync"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_no_command_shows_help_hint() {
    let project = TestProject::new();
    docsync(&project)
        .assert()
        .success()
        .stdout(predicate::str::contains("docsync --help"));
}

// ============================================================================
// Registration
// ============================================================================

#[test]
fn test_add_registers_local_only_entry() {
    let project = configured();
    project.write_doc("docs/guide.md", "# Guide\n");

    docsync(&project)
        .args(["add", "docs/guide.md", "--tier", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Registered"));

    let raw = registry(&project);
    let entry = &raw["entries"]["docs/guide.md"];
    assert_eq!(entry["status"], "local_only");
    assert_eq!(entry["tier"], 1);
    assert_eq!(entry["source"], "manual_add");
    assert!(entry["local_content_hash"]
        .as_str()
        .is_some_and(|h| h.starts_with("sha256:")));
}

#[test]
fn test_add_from_subdirectory_uses_project_relative_key() {
    let project = configured();
    project.write_doc("docs/guide.md", "# Guide\n");

    let mut cmd = Command::cargo_bin("docsync").expect("Failed to find docsync binary");
    cmd.current_dir(project.root().join("docs"))
        .args(["add", "guide.md"])
        .assert()
        .success();

    assert!(registry(&project)["entries"]["docs/guide.md"].is_object());
}

#[test]
fn test_add_missing_file_fails() {
    let project = configured();
    docsync(&project)
        .args(["add", "missing.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_add_outside_project_fails() {
    let project = configured();
    docsync(&project)
        .args(["add", "../remote/x.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not inside project root"));
}

#[test]
fn test_update_and_list() {
    let project = configured();
    project.write_doc("a.md", "alpha");
    docsync(&project).args(["add", "a.md"]).assert().success();

    docsync(&project)
        .args(["update", "a.md", "--source", "ops", "--status", "active"])
        .assert()
        .success();
    assert_eq!(registry(&project)["entries"]["a.md"]["source"], "ops");

    docsync(&project)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("a.md"))
        .stdout(predicate::str::contains("active"));
}

#[test]
fn test_update_rejects_unknown_status() {
    let project = configured();
    project.write_doc("a.md", "alpha");
    docsync(&project).args(["add", "a.md"]).assert().success();

    docsync(&project)
        .args(["update", "a.md", "--status", "bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown status 'bogus'"));
    assert_eq!(registry(&project)["entries"]["a.md"]["status"], "local_only");
}

#[test]
fn test_remove_keeps_remote_document() {
    let project = configured();
    project.write_doc("a.md", "alpha");
    docsync(&project).args(["add", "a.md"]).assert().success();
    docsync(&project).arg("sync").assert().success();
    let remote_files = fs::read_dir(project.remote_dir()).unwrap().count();

    docsync(&project)
        .args(["remove", "a.md", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("was kept"));

    assert!(registry(&project)["entries"]["a.md"].is_null());
    assert_eq!(fs::read_dir(project.remote_dir()).unwrap().count(), remote_files);
}

#[test]
fn test_import_legacy_mapping() {
    let project = configured();
    project.write_doc("a.md", "alpha");
    project.write_doc("b.md", "beta");
    project.write_doc(
        "sync_config.json",
        r#"{
            "_comment": "legacy mapping",
            "_google_drive_folder": {"name": "Docs", "id": "folder-1"},
            "a.md": "CREATE_NEW_DOCUMENT",
            "b.md": "doc-legacy"
        }"#,
    );

    docsync(&project)
        .args(["import", "sync_config.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 entries"));

    let raw = registry(&project);
    assert_eq!(raw["entries"]["a.md"]["status"], "new");
    assert_eq!(raw["entries"]["b.md"]["remote_doc_id"], "doc-legacy");
    assert_eq!(raw["sync_preferences"]["target_folder"]["id"], "folder-1");
}

// ============================================================================
// Sync and Check
// ============================================================================

#[test]
fn test_sync_empty_project_succeeds_without_writing() {
    let project = configured();
    docsync(&project)
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("No documents registered"));
    assert!(!project.registry_path().exists());
}

#[test]
fn test_sync_creates_then_is_idle() {
    let project = configured();
    project.write_doc("a.md", r"1\. first");
    docsync(&project).args(["add", "a.md"]).assert().success();

    docsync(&project)
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("created"));

    let entry = registry(&project)["entries"]["a.md"].clone();
    assert_eq!(entry["status"], "active");
    let id = entry["remote_doc_id"].as_str().unwrap().to_string();
    let pushed = fs::read_to_string(project.remote_dir().join(format!("{id}.txt"))).unwrap();
    assert_eq!(pushed, "1. first");

    let bytes = project.registry_bytes();
    docsync(&project)
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("unchanged"));
    assert_eq!(project.registry_bytes(), bytes);
}

#[test]
fn test_sync_no_clean_pushes_raw_text() {
    let project = configured();
    project.write_doc("a.md", r"\# raw");
    docsync(&project).args(["add", "a.md"]).assert().success();

    docsync(&project).args(["sync", "--no-clean"]).assert().success();

    let id = registry(&project)["entries"]["a.md"]["remote_doc_id"]
        .as_str()
        .unwrap()
        .to_string();
    let pushed = fs::read_to_string(project.remote_dir().join(format!("{id}.txt"))).unwrap();
    assert_eq!(pushed, r"\# raw");
}

#[test]
fn test_sync_missing_local_file_exits_nonzero() {
    let project = configured();
    project.write_doc("a.md", "alpha");
    docsync(&project).args(["add", "a.md"]).assert().success();
    project.remove_doc("a.md");

    docsync(&project)
        .arg("sync")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Needs attention"));

    assert_eq!(
        registry(&project)["entries"]["a.md"]["status"],
        "error_local_missing"
    );
}

#[test]
fn test_check_after_sync_is_healthy() {
    let project = configured();
    project.write_doc("a.md", "alpha");
    docsync(&project).args(["add", "a.md"]).assert().success();
    docsync(&project).arg("sync").assert().success();

    docsync(&project)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("All documents are healthy"));
}

#[test]
fn test_check_reports_missing_remote() {
    let project = configured();
    project.write_doc("a.md", "alpha");
    docsync(&project).args(["add", "a.md"]).assert().success();
    docsync(&project).arg("sync").assert().success();
    let id = registry(&project)["entries"]["a.md"]["remote_doc_id"]
        .as_str()
        .unwrap()
        .to_string();
    fs::remove_file(project.remote_dir().join(format!("{id}.meta.json"))).unwrap();

    docsync(&project)
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("remote document not found"));
    assert_eq!(
        registry(&project)["entries"]["a.md"]["status"],
        "error_remote_not_found"
    );
}

#[test]
fn test_corrupt_registry_warns_loudly() {
    let project = configured();
    fs::write(project.registry_path(), "{ broken").unwrap();

    docsync(&project)
        .arg("list")
        .assert()
        .success()
        .stderr(predicate::str::contains("WARNING"));

    docsync(&project)
        .arg("list")
        .assert()
        .success()
        .stderr(predicate::str::contains("WARNING").not());
}
