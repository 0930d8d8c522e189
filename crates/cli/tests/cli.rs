//! End-to-end tests for the `codeflow` binary. None of these reach a provider.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn codeflow(root: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("codeflow").unwrap();
    cmd.arg("--root").arg(root.path());
    cmd
}

#[test]
fn test_init_then_list_prompts() {
    // Given
    let root = TempDir::new().unwrap();

    // When
    codeflow(&root)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));

    // Then
    assert!(root.path().join(".codeflow/prompts/default.md").exists());
    codeflow(&root)
        .arg("prompts")
        .assert()
        .success()
        .stdout(predicate::str::contains("default"));
}

#[test]
fn test_init_refuses_existing_directory() {
    let root = TempDir::new().unwrap();
    codeflow(&root).args(["init", "--minimal"]).assert().success();

    codeflow(&root).args(["init", "--minimal"]).assert().failure();
    codeflow(&root)
        .args(["init", "--minimal", "--force"])
        .assert()
        .success();
}

#[test]
fn test_import_replaces_stored_automations() {
    // Given
    let root = TempDir::new().unwrap();
    let file = root.path().join("automations.json");
    std::fs::write(
        &file,
        r#"[{"id":"a1","name":"Loop","prompts":["one","two"],"infinite-loop":true}]"#,
    )
    .unwrap();

    // When
    codeflow(&root)
        .arg("import-automations")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("imported 1 automation(s)"));

    // Then
    codeflow(&root)
        .arg("export-automations")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"a1\"").and(predicate::str::contains("two")));
}

#[test]
fn test_rate_without_interactions_fails() {
    let root = TempDir::new().unwrap();
    codeflow(&root).args(["rate", "7"]).assert().failure();
}

#[test]
fn test_unknown_automation_fails() {
    let root = TempDir::new().unwrap();
    codeflow(&root).args(["init", "--minimal"]).assert().success();

    codeflow(&root)
        .args(["automate", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("automation 'missing' not found"));
}
