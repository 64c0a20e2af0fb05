#![allow(deprecated)]
//! CLI contract: exit codes and console output of the transit_vault binary.
//! Vault is mocked with wiremock; outputs are checked by substring.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use serde_json::json;
use tempfile::TempDir;
use tokio::runtime::Runtime;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SIGNATURE: &str = "vault:v1:MEUCIQDx3hb0";

fn assert_contains(haystack: &str, needle: &str) {
    assert!(
        haystack.contains(needle),
        "expected output to contain {needle:?}\n--- output ---\n{haystack}\n--- end ---"
    );
}

fn start_server() -> (Runtime, MockServer) {
    let rt = Runtime::new().expect("tokio runtime");
    let server = rt.block_on(MockServer::start());
    (rt, server)
}

fn mount_transit(rt: &Runtime, server: &MockServer) {
    rt.block_on(async {
        Mock::given(method("POST"))
            .and(path("/v1/transit/sign/k1"))
            .and(body_json(json!({ "input": "aGVsbG8=" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "signature": SIGNATURE }
            })))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/transit/verify/k1"))
            .and(body_json(json!({ "input": "aGVsbG8=", "signature": SIGNATURE })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": { "valid": true } })),
            )
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/transit/verify/k1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": { "valid": false } })),
            )
            .mount(server)
            .await;
    });
}

fn run(cmd: &str, address: &str, dir: &Path) -> std::process::Output {
    Command::cargo_bin("transit_vault")
        .unwrap()
        .current_dir(dir)
        .args([
            cmd,
            "-key",
            "k1",
            "-input",
            "doc.txt",
            "-signature",
            "doc.sig",
            "-token",
            "T",
            "-vaultaddress",
            address,
        ])
        .output()
        .unwrap()
}

fn request_count(rt: &Runtime, server: &MockServer) -> usize {
    rt.block_on(server.received_requests())
        .map(|r| r.len())
        .unwrap_or(0)
}

#[test]
fn missing_flags_print_usage() {
    let output = Command::cargo_bin("transit_vault")
        .unwrap()
        .args(["sign", "-key", "k1"])
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2), "{stderr}");
    assert_contains(&stderr.to_lowercase(), "required");
    assert_contains(&stderr, "Usage");
}

#[test]
fn unknown_subcommand_is_named() {
    let output = Command::cargo_bin("transit_vault")
        .unwrap()
        .args(["encrypt", "-key", "k1"])
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2), "{stderr}");
    assert_contains(&stderr, "encrypt");
}

#[test]
fn sign_then_verify_round_trip() {
    let (rt, server) = start_server();
    mount_transit(&rt, &server);
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("doc.txt"), "hello").unwrap();

    let output = run("sign", &server.uri(), dir.path());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(0), "{stdout}");
    assert_contains(&stdout, "doc.txt");
    assert_contains(&stdout, "doc.sig");
    assert_eq!(
        fs::read_to_string(dir.path().join("doc.sig")).unwrap(),
        SIGNATURE
    );

    let output = run("verify", &server.uri(), dir.path());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(0), "{stdout}");
    assert_contains(&stdout, "Signature is valid!");
    assert_contains(&stdout, "OK");
}

#[test]
fn flat_cmd_flag_still_works() {
    let (rt, server) = start_server();
    mount_transit(&rt, &server);
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("doc.txt"), "hello").unwrap();
    let uri = server.uri();

    let output = Command::cargo_bin("transit_vault")
        .unwrap()
        .current_dir(dir.path())
        .args([
            "-cmd",
            "sign",
            "-key",
            "k1",
            "-input",
            "doc.txt",
            "-signature",
            "doc.sig",
            "-vaultaddress",
            uri.as_str(),
        ])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert!(dir.path().join("doc.sig").exists());
}

#[test]
fn empty_signature_is_not_valid() {
    let (rt, server) = start_server();
    mount_transit(&rt, &server);
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("doc.txt"), "hello").unwrap();
    fs::write(dir.path().join("doc.sig"), "").unwrap();

    let output = run("verify", &server.uri(), dir.path());
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1), "{stdout}");
    assert_contains(&stdout, "Signature is not valid!");
    assert_contains(&stdout, "KO");
    assert_eq!(request_count(&rt, &server), 0);
}

#[test]
fn rejected_signature_exits_one() {
    let (rt, server) = start_server();
    mount_transit(&rt, &server);
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("doc.txt"), "hello").unwrap();
    fs::write(dir.path().join("doc.sig"), "vault:v1:tampered").unwrap();

    let output = run("verify", &server.uri(), dir.path());
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1), "{stdout}");
    assert_contains(&stdout, "not valid");
}

#[test]
fn unreadable_input_exits_without_remote_call() {
    let (rt, server) = start_server();
    mount_transit(&rt, &server);
    let dir = TempDir::new().unwrap();

    let output = run("sign", &server.uri(), dir.path());
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(3), "{stderr}");
    assert_contains(&stderr, "doc.txt");
    assert!(!dir.path().join("doc.sig").exists());
    assert_eq!(request_count(&rt, &server), 0);
}

#[test]
fn permission_denied_exits_with_remote_code() {
    let (rt, server) = start_server();
    rt.block_on(
        Mock::given(method("POST"))
            .and(path("/v1/transit/sign/k1"))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(json!({ "errors": ["permission denied"] })),
            )
            .mount(&server),
    );
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("doc.txt"), "hello").unwrap();

    let output = run("sign", &server.uri(), dir.path());
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(4), "{stderr}");
    assert_contains(&stderr, "permission denied");
    assert!(!dir.path().join("doc.sig").exists());
}

#[test]
fn non_utf8_signature_exits_one() {
    let (rt, server) = start_server();
    mount_transit(&rt, &server);
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("doc.txt"), "hello").unwrap();
    let mut signature = SIGNATURE.as_bytes().to_vec();
    signature[12] = 0xFF;
    fs::write(dir.path().join("doc.sig"), &signature).unwrap();

    let output = run("verify", &server.uri(), dir.path());
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1), "{stdout}");
    assert_contains(&stdout, "Signature is not valid!");
    assert_eq!(request_count(&rt, &server), 0);
}

#[test]
fn token_with_control_character_is_usage_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("doc.txt"), "hello").unwrap();

    let output = Command::cargo_bin("transit_vault")
        .unwrap()
        .current_dir(dir.path())
        .args([
            "sign",
            "-key",
            "k1",
            "-input",
            "doc.txt",
            "-signature",
            "doc.sig",
            "-token",
            "s.abc\u{1}def",
            "-vaultaddress",
            "https://127.0.0.1:1",
        ])
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2), "{stderr}");
    assert_contains(&stderr, "token");
    assert!(!dir.path().join("doc.sig").exists());
}
