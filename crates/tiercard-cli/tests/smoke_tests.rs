//! Smoke tests for the tiercard CLI

#![allow(deprecated)] // Command::cargo_bin
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const DATA: &str = r#"{
    "success": true,
    "top50sum": 5123.25,
    "tierPoint": 5123.25,
    "tier": {"rating": 5000, "name": "Amateur", "code": "AM"},
    "next": {"rating": 5500, "name": "Iron IV", "code": "IR"},
    "topList": [
        {"name": "Kamui", "button": 5, "pattern": "HD", "level": 10,
         "score": "97.10", "maxCombo": 0, "rating": "120.500"}
    ]
}"#;

fn tiercard() -> Command {
    Command::cargo_bin("tiercard").expect("tiercard binary should exist")
}

fn write_data(dir: &TempDir) -> String {
    let path = dir.path().join("tier.json");
    fs::write(&path, DATA).unwrap();
    path.to_str().unwrap().to_string()
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    tiercard()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_lists_subcommands() {
    tiercard()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("still"))
        .stdout(predicate::str::contains("loop"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_no_args_fails() {
    tiercard().assert().failure();
}

#[test]
fn test_still_requires_source() {
    tiercard()
        .arg("still")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--data"));
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn test_config_prints_yaml_defaults() {
    tiercard()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("max_attempts: 3"))
        .stdout(predicate::str::contains("width: 352"))
        .stdout(predicate::str::contains("height: 578"));
}

#[test]
fn test_config_json_merges_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("export.yaml");
    fs::write(&path, "encoder:\n  quality: 42\n").unwrap();
    tiercard()
        .args(["config", "--json", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"quality\": 42"));
}

// ============================================================================
// Exports
// ============================================================================

#[test]
fn test_still_export_writes_png() {
    let dir = TempDir::new().unwrap();
    let data = write_data(&dir);
    let out = dir.path().join("out");

    tiercard()
        .args([
            "still",
            "--data",
            &data,
            "--nickname",
            "tester",
            "-b",
            "5",
            "--out",
            out.to_str().unwrap(),
            "--color",
            "never",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("tester-5B-tier-card.png"))
        .stderr(predicate::str::contains("logging was not initialized").not());

    let png = fs::read(out.join("tester-5B-tier-card.png")).unwrap();
    assert_eq!(&png[1..4], b"PNG");
}

#[test]
fn test_missing_data_file_fails() {
    tiercard()
        .args(["still", "--data", "/nonexistent/tier.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_missing_badge_fails() {
    let dir = TempDir::new().unwrap();
    let data = write_data(&dir);
    tiercard()
        .args([
            "loop",
            "--data",
            &data,
            "--badge",
            "/nonexistent/badge.gif",
            "--out",
            dir.path().to_str().unwrap(),
        ])
        .assert()
        .failure();
}

// ============================================================================
// Fetch
// ============================================================================

#[cfg(feature = "fetch")]
fn serve_once(status: &'static str, body: &'static str) -> String {
    use std::io::{Read, Write};

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}/api/archive", listener.local_addr().unwrap());
    std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).unwrap();
    });
    base
}

#[cfg(feature = "fetch")]
#[test]
fn test_fetch_error_body_is_reported() {
    let dir = TempDir::new().unwrap();
    let base = serve_once(
        "404 Not Found",
        r#"{"success":false,"errorCode":101,"message":"존재하지 않는 유저입니다."}"#,
    );
    tiercard()
        .args([
            "still",
            "--fetch",
            "흑우",
            "--api-base",
            base.as_str(),
            "--out",
            dir.path().to_str().unwrap(),
            "--color",
            "never",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("존재하지 않는 유저입니다."))
        .stderr(predicate::str::contains("panicked").not());
}

#[cfg(feature = "fetch")]
#[test]
fn test_fetch_success_writes_png() {
    let dir = TempDir::new().unwrap();
    let base = serve_once("200 OK", DATA);
    tiercard()
        .args([
            "still",
            "--fetch",
            "tester",
            "--api-base",
            base.as_str(),
            "--out",
            dir.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("tester-4B-tier-card.png"));
}

#[cfg(feature = "fetch")]
#[test]
fn test_fetch_unreachable_host_fails_cleanly() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}/api/archive", listener.local_addr().unwrap());
    drop(listener);
    tiercard()
        .args(["-v", "still", "--fetch", "tester", "--locale", "en", "--api-base", base.as_str()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load player data."))
        .stderr(predicate::str::contains("caused by"))
        .stderr(predicate::str::contains("panicked").not());
}
