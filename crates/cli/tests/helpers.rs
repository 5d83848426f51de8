use std::fs;

use fieldscope::{canonicalize_or_current, parse_epoch, sha256_file};
use tempfile::tempdir;

#[test]
fn canonicalize_or_current_returns_cwd_for_dot() {
    let cwd = std::env::current_dir().expect("cwd");
    assert_eq!(canonicalize_or_current(".").expect("canonicalize"), cwd);
}

#[test]
fn canonicalize_or_current_joins_missing_paths() {
    let cwd = std::env::current_dir().expect("cwd");
    let result = canonicalize_or_current("does/not/exist.json").expect("joined");
    assert_eq!(result, cwd.join("does/not/exist.json"));
}

#[test]
fn sha256_file_hashes_contents() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("hello.txt");
    fs::write(&path, b"hello").unwrap();
    assert_eq!(
        sha256_file(&path).unwrap(),
        "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    );
    assert!(sha256_file(&dir.path().join("missing")).is_err());
}

#[test]
fn parse_epoch_accepts_seconds() {
    let at = parse_epoch("1714564800").unwrap();
    assert_eq!(at.to_rfc3339(), "2024-05-01T12:00:00+00:00");
    assert!(parse_epoch("yesterday").is_err());
}

#[test]
fn tracing_filter_defaults_to_warn() {
    let filter = fieldscope::tracing_config::build_filter();
    assert!(!filter.to_string().is_empty());
}
