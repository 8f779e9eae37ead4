//! End-to-end checks of the `notenest` binary against a temporary database.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn notenest(db: &Path) -> Command {
    let mut cmd = Command::cargo_bin("notenest").expect("binary should build");
    cmd.arg("--db").arg(db);
    cmd
}

#[test]
fn add_list_delete_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("notes.db");

    notenest(&db)
        .args(["add", "--title", "Groceries", "--content", "milk"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created note 1."));

    notenest(&db)
        .args(["list", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"title\": \"Groceries\""));

    notenest(&db)
        .args(["delete", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted note 1."));

    notenest(&db)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No notes."));
}

#[test]
fn edit_of_unknown_id_fails() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("notes.db");

    notenest(&db)
        .args(["edit", "9", "--title", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no note with id 9"));
}

#[test]
fn shell_undo_keeps_the_note() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("notes.db");

    notenest(&db)
        .args(["add", "--title", "keep me"])
        .assert()
        .success();

    let config = dir.path().join("config.json");
    std::fs::write(&config, r#"{ "grace_period_ms": 60000 }"#).unwrap();

    notenest(&db)
        .arg("--config")
        .arg(&config)
        .arg("shell")
        .write_stdin("del 0\nundo\nlist\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Restored."))
        .stdout(predicate::str::contains("keep me"));

    notenest(&db)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("keep me"));
}

#[test]
fn unwritable_database_location_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("missing").join("notes.db");

    notenest(&db)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("storage unavailable"));
}
