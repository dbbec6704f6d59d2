//! Command-line interface tests.

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("xclim-testing").unwrap();
    cmd.env_remove("XCLIM_TESTDATA_BRANCH")
        .env_remove("XCLIM_TESTDATA_MIRROR")
        .env("RUST_LOG", "warn");
    cmd
}

#[test]
fn test_generate_atmos_prints_path() {
    let dir = tempfile::tempdir().unwrap();
    cmd()
        .arg("generate-atmos")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("atmosds.nc"));
    assert!(dir.path().join("atmosds.nc").is_file());
}

#[test]
fn test_bootstrap_lists_namespace() {
    let cache = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    cmd()
        .arg("--cache-dir")
        .arg(cache.path())
        .arg("bootstrap")
        .arg("--root")
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("open_dataset"))
        .stdout(predicate::str::contains("path_to_atmos_file"))
        .stdout(predicate::str::contains("is_plotting_enabled"));
    assert!(root.path().join("data/atmosds.nc").is_file());
}

#[test]
fn test_bootstrap_fails_without_cache() {
    let root = tempfile::tempdir().unwrap();
    cmd()
        .arg("--cache-dir")
        .arg(root.path().join("absent"))
        .arg("bootstrap")
        .arg("--root")
        .arg(root.path().join("session"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Session bootstrap failed"));
}

#[test]
fn test_open_prints_tree() {
    let cache = tempfile::tempdir().unwrap();
    cmd()
        .arg("generate-atmos")
        .arg(cache.path())
        .assert()
        .success();

    cmd()
        .arg("--cache-dir")
        .arg(cache.path())
        .arg("open")
        .arg("atmosds.nc")
        .assert()
        .success()
        .stdout(predicate::str::contains("sfcWind"))
        .stdout(predicate::str::contains("time=1461"));
}

#[test]
fn test_open_missing_file_fails() {
    let cache = tempfile::tempdir().unwrap();
    cmd()
        .arg("--cache-dir")
        .arg(cache.path())
        .arg("open")
        .arg("missing.nc")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}
