//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A `restate` invocation isolated in `dir`: its own database, no config
/// from the real home directory, and no scorer overrides.
fn restate(dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("restate").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env_remove("RESTATE_SCORER_URL")
        .env_remove("RESTATE_DB")
        .env("RUST_LOG", "off")
        .arg("--db")
        .arg(dir.path().join("restate.db"));
    cmd
}

fn submit(dir: &TempDir, original: &str, user: &str) -> serde_json::Value {
    let output = restate(dir)
        .args(["submit", "--owner", "1", "--name", "Alice", "--json"])
        .args(["--original", original, "--user", user])
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn submit_scores_and_saves() {
    let dir = TempDir::new().unwrap();
    restate(&dir)
        .args(["submit", "--owner", "1"])
        .args(["--original", "The quick brown fox"])
        .args(["--user", "quick brown fox jumps"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 75.00%"))
        .stdout(predicate::str::contains("Saved record #1 (version 0)"))
        .stdout(predicate::str::contains("Missed: the"))
        .stdout(predicate::str::contains("Extra: jumps"));
}

#[test]
fn anonymous_submit_is_not_saved() {
    let dir = TempDir::new().unwrap();
    restate(&dir)
        .args(["submit", "--original", "alpha beta", "--user", "alpha"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 50.00%"))
        .stdout(predicate::str::contains("Not saved"));

    restate(&dir)
        .args(["show", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn submit_json_and_versions() {
    let dir = TempDir::new().unwrap();
    let first = submit(&dir, "Ownership rules.", "ownership");
    let second = submit(&dir, "Ownership rules.", "ownership rules");
    assert_eq!(first["version_no"], 0);
    assert_eq!(second["version_no"], 1);
    assert_eq!(first["content_hash"], second["content_hash"]);
    assert_eq!(second["result"]["matchingRate"], 100.0);
    assert_eq!(second["subject"], "Ownership rules");
}

#[test]
fn submit_with_attachment() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("chapter.txt");
    std::fs::write(&source, "Borrowing lets code use a value without owning it.").unwrap();

    restate(&dir)
        .args(["submit", "--owner", "2", "--json", "--user", "borrowing without owning"])
        .arg("--attach")
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"record_id\": 1"));

    restate(&dir)
        .args(["show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Attachment: chapter.txt"));

    let copy = dir.path().join("copy.txt");
    restate(&dir)
        .args(["show", "1", "--save-attachment"])
        .arg(&copy)
        .assert()
        .success();
    assert_eq!(
        std::fs::read_to_string(&copy).unwrap(),
        "Borrowing lets code use a value without owning it."
    );
}

#[test]
fn saving_missing_attachment_fails() {
    let dir = TempDir::new().unwrap();
    submit(&dir, "No file here", "no file");
    restate(&dir)
        .args(["show", "1", "--save-attachment", "out.bin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("record 1 has no attachment"));
}

#[test]
fn blank_restatement_is_rejected() {
    let dir = TempDir::new().unwrap();
    restate(&dir)
        .args(["submit", "--owner", "1", "--original", "text", "--user", "  "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: invalid input"));
}

#[test]
fn reset_flow() {
    let dir = TempDir::new().unwrap();
    for user in ["one", "two", "three"] {
        submit(&dir, "Reset original", user);
    }

    restate(&dir)
        .args(["reset", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("version 0 records cannot be reset"));

    restate(&dir)
        .args(["reset", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("record #2 (version 1)"));

    restate(&dir)
        .args(["show", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Restatement: (none yet)"));
}

#[test]
fn important_hide_restore() {
    let dir = TempDir::new().unwrap();
    submit(&dir, "Flag me", "flag");

    restate(&dir)
        .args(["important", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("marked important"));
    restate(&dir)
        .args(["important", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no longer important"));

    restate(&dir)
        .args(["hide", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("scheduled for deletion"));
    restate(&dir)
        .args(["hidden", "--owner", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 hidden record(s)"));
    restate(&dir)
        .args(["list", "--owner", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No records."));

    restate(&dir)
        .args(["restore", "1"])
        .assert()
        .success();
    restate(&dir)
        .args(["list", "--owner", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Flag me"));

    restate(&dir)
        .args(["hide", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn latest_dedups_groups() {
    let dir = TempDir::new().unwrap();
    for i in 0..5 {
        submit(&dir, "Grouped original", &format!("attempt {i}"));
    }
    submit(&dir, "Another original", "attempt");

    restate(&dir)
        .args(["latest"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Grouped original"))
        .stdout(predicate::str::contains("Another original"))
        .stdout(predicate::str::contains("Page 1 of 1 (2 total)"));

    restate(&dir)
        .args(["latest", "--search-type", "owner", "--keyword", "ali"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(2 total)"));

    restate(&dir)
        .args(["latest", "--keyword", "another"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(1 total)"));
}

#[test]
fn related_and_trend() {
    let dir = TempDir::new().unwrap();
    submit(&dir, "Trend original text", "trend");
    submit(&dir, "Trend original text", "trend original");
    submit(&dir, "Trend original text", "trend original text");

    restate(&dir)
        .args(["related", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(2 total)"));

    restate(&dir)
        .args(["trend", "--owner", "1", "--record", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 attempt(s), 33.33% -> 100.00% (+66.67 points)"));

    restate(&dir)
        .args(["trend", "--owner", "1"])
        .assert()
        .failure();
}

#[test]
fn trend_rejects_malformed_hash() {
    let dir = TempDir::new().unwrap();
    restate(&dir)
        .args(["trend", "--owner", "1", "--hash", "ab가나다라"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --hash"))
        .stderr(predicate::str::contains("64 hex digits"));
}

#[test]
fn notes_round_trip() {
    let dir = TempDir::new().unwrap();
    submit(&dir, "Noted original", "noted");

    restate(&dir)
        .args(["note", "add", "1", "check the second paragraph"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added note"));

    restate(&dir)
        .args(["note", "list", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("check the second paragraph"));

    restate(&dir)
        .args(["list", "--owner", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Noted original"));

    restate(&dir)
        .args(["note", "delete", "00000000-0000-0000-0000-000000000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn init_creates_config() {
    let dir = TempDir::new().unwrap();

    restate(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created restate.toml"));
    assert!(dir.path().join("restate.toml").exists());

    restate(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    // the generated config is picked up from the working directory
    restate(&dir)
        .args(["submit", "--original", "a b", "--user", "ab"])
        .assert()
        .success();
}

#[test]
fn missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    restate(&dir)
        .args(["--config", "nope.toml", "latest"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}
