use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn lint_accepts_fixture() {
    Command::cargo_bin("tabulon-lint")
        .expect("binary")
        .args(["--resolve", "tests/fixtures/item_conf.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("item_conf.yaml: ok"));
}

#[test]
fn lint_reports_issues() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bad.yaml");
    std::fs::write(&path, "spec: other\nspec_version: \"0.2.0\"\n").expect("write manifest");

    Command::cargo_bin("tabulon-lint")
        .expect("binary")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected spec identifier `tabulon`"));
}
