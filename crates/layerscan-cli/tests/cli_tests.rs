//! Integration tests for layerscan-cli.
//!
//! Note: Tests use `unwrap`/`expect` which is acceptable in test code.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use flate2::Compression;
use flate2::write::GzEncoder;
use predicates::prelude::*;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use tempfile::TempDir;

fn layerscan_cmd() -> Command {
    cargo_bin_cmd!("layerscan")
}

fn append_file(builder: &mut tar::Builder<Vec<u8>>, path: &str, data: &[u8]) {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, path, data).unwrap();
}

fn append_dir(builder: &mut tar::Builder<Vec<u8>>, path: &str) {
    let mut header = tar::Header::new_gnu();
    header.set_size(0);
    header.set_mode(0o755);
    header.set_entry_type(tar::EntryType::Directory);
    header.set_cksum();
    builder
        .append_data(&mut header, path, std::io::empty())
        .unwrap();
}

/// Builds a gzip layer with an os-release file, a whiteout and an opaque dir.
fn write_layer(dir: &Path) -> PathBuf {
    let mut builder = tar::Builder::new(Vec::new());
    append_dir(&mut builder, "etc/");
    append_file(
        &mut builder,
        "etc/os-release",
        b"NAME=\"Alpine Linux\"\nID=alpine\nVERSION_ID=3.19.1\n",
    );
    append_file(&mut builder, "etc/.wh.hostname", b"");
    append_dir(&mut builder, "var/");
    append_dir(&mut builder, "var/cache/");
    append_file(&mut builder, "var/cache/.wh..wh..opq", b"");
    append_dir(&mut builder, "proc/");
    append_file(&mut builder, "proc/cpuinfo", b"cpu");
    append_file(&mut builder, "app/main.pyc", b"bytecode");
    let tar = builder.into_inner().unwrap();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar).unwrap();
    let path = dir.join("layer.tar.gz");
    std::fs::write(&path, encoder.finish().unwrap()).unwrap();
    path
}

#[test]
fn test_version_flag() {
    layerscan_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("layerscan"));
}

#[test]
fn test_help_flag() {
    layerscan_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Inspect a container image layer blob"));
}

#[test]
fn test_layer_human_output() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let layer = write_layer(temp.path());

    layerscan_cmd()
        .arg("layer")
        .arg(&layer)
        .assert()
        .success()
        .stdout(predicate::str::contains("Layer inspected"))
        .stdout(predicate::str::contains("gzip"))
        .stdout(predicate::str::contains("etc/hostname"))
        .stdout(predicate::str::contains("var/cache/"))
        .stdout(predicate::str::contains("alpine 3.19.1"));
}

#[test]
fn test_layer_json_output() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let layer = write_layer(temp.path());

    let output = layerscan_cmd()
        .arg("layer")
        .arg("--json")
        .arg(&layer)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).expect("invalid JSON output");
    assert_eq!(json["status"], "success");
    assert_eq!(json["operation"], "layer");
    assert_eq!(json["data"]["compression"], "gzip");
    assert_eq!(json["data"]["whiteout_files"], serde_json::json!(["etc/hostname"]));
    assert_eq!(json["data"]["opaque_dirs"], serde_json::json!(["var/cache/"]));
    assert_eq!(json["data"]["os"]["family"], "alpine");
    // etc/os-release and app/main.pyc; proc/cpuinfo is skipped by default
    assert_eq!(json["data"]["files"], 2);
}

#[test]
fn test_layer_list_with_skip_flags() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let layer = write_layer(temp.path());

    let output = layerscan_cmd()
        .args(["layer", "--json", "--list", "--skip-files", "*.pyc"])
        .arg(&layer)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let paths: Vec<&str> = json["data"]["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec!["etc", "etc/os-release", "var", "var/cache"]);
}

#[test]
fn test_layer_no_default_skips() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let layer = write_layer(temp.path());

    layerscan_cmd()
        .args(["layer", "--list", "--no-default-skips"])
        .arg(&layer)
        .assert()
        .success()
        .stdout(predicate::str::contains("proc/cpuinfo"));
}

#[test]
fn test_layer_missing_file() {
    layerscan_cmd()
        .args(["layer", "/nonexistent/layerscan/layer.tar"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Source not found"));
}

#[test]
fn test_layer_truncated() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let mut builder = tar::Builder::new(Vec::new());
    append_file(&mut builder, "big.bin", &[7u8; 4096]);
    let tar = builder.into_inner().unwrap();
    let path = temp.path().join("truncated.tar");
    std::fs::write(&path, &tar[..1024]).unwrap();

    layerscan_cmd()
        .arg("layer")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("HINT"));
}

#[test]
fn test_fs_command() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let root = temp.path();
    std::fs::create_dir_all(root.join("etc")).unwrap();
    std::fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
    std::fs::write(root.join("etc/os-release"), "ID=debian\nVERSION_ID=12\n").unwrap();
    std::fs::write(root.join("node_modules/pkg/index.js"), "x").unwrap();

    let output = layerscan_cmd()
        .args(["fs", "--json", "--list", "--skip-dirs", "node_modules"])
        .arg(root)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["operation"], "fs");
    assert_eq!(json["data"]["files"], 1);
    assert_eq!(json["data"]["entries"][0]["path"], "etc/os-release");
    assert_eq!(json["data"]["os"]["family"], "debian");
}

#[test]
fn test_fs_rejects_file() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let layer = write_layer(temp.path());

    layerscan_cmd()
        .arg("fs")
        .arg(&layer)
        .assert()
        .failure()
        .stderr(predicate::str::contains("layerscan layer"));
}

#[test]
fn test_quiet_suppresses_output() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let layer = write_layer(temp.path());

    layerscan_cmd()
        .args(["layer", "--quiet"])
        .arg(&layer)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_completion_bash() {
    layerscan_cmd()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("layerscan"));
}
