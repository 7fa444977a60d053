//! The `cachebust` binary: flags, output streams and exit codes.

use predicates::prelude::*;

use crate::common::{cachebust, hashed, site};

#[test]
fn test_help() {
    cachebust()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--hash-length"))
        .stdout(predicate::str::contains("--base-url"));
}

#[test]
fn test_run_prints_summary() {
    let site = site(&[("index.html", r#"<script src="app.js"></script>"#), ("app.js", "1")]);

    cachebust()
        .arg(site.root())
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::contains("Hashed 2 of 2 documents"))
        .stderr(predicate::str::is_empty());

    assert!(site.exists(&hashed("app.js", "1")));
    assert!(site.exists("asset-manifest.json"));
}

#[test]
fn test_flags_reach_the_run() {
    let site = site(&[("app.js", "1")]);

    cachebust()
        .arg(site.root())
        .args(["--hash-length", "infinite", "--manifest", "m.json", "--base-url", "https://cdn.test", "-q"])
        .assert()
        .success();

    let manifest = site.manifest("m.json").unwrap();
    let value = manifest.get("app.js").unwrap();
    assert!(value.starts_with("https://cdn.test/app."));
    // 128 hex characters between "app." and ".js"
    assert_eq!(value.len(), "https://cdn.test/app.".len() + 128 + ".js".len());
}

#[test]
fn test_dry_run_prints_planned_manifest() {
    let site = site(&[("app.js", "1")]);

    cachebust()
        .arg(site.root())
        .args(["--dry-run", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("\"app.js\": \"{}\"", hashed("app.js", "1"))))
        .stdout(predicate::str::contains("dry run"));

    assert!(site.exists("app.js"));
    assert!(!site.exists("asset-manifest.json"));
}

#[test]
fn test_resolution_error_exits_non_zero() {
    let site = site(&[("index.html", r#"<img src="nope.png">"#)]);

    cachebust()
        .arg(site.root())
        .arg("-q")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Cannot resolve 'nope.png'"));

    assert!(site.exists("index.html"));
}

#[test]
fn test_invalid_hash_length() {
    cachebust().args(["--hash-length", "0"]).assert().failure().stderr(predicate::str::contains("hash length"));
}

#[test]
fn test_missing_directory() {
    let site = site(&[]);
    cachebust().arg(site.path("missing")).assert().failure().code(1).stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_config_file_is_read() {
    let site = site(&[("app.js", "1"), ("cachebust.toml", "hash-length = 4\nmanifest = \"from-file.json\"\n")]);

    cachebust().arg(site.root()).arg("-q").assert().success();

    let manifest = site.manifest("from-file.json").unwrap();
    assert_eq!(manifest.get("app.js").unwrap().len(), "app..js".len() + 4);
    assert!(site.exists("cachebust.toml"));
}

#[test]
fn test_verbose_logs_to_stderr() {
    let site = site(&[("app.js", "1")]);

    cachebust()
        .arg(site.root())
        .args(["--dry-run", "-v"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Dry run"));
}
