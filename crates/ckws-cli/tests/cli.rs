//! CLI tests that need no network: argument handling and offline signing.

use std::io::Write;
use std::process::{Command, Output};

use chrono::{DateTime, Utc};
use ckws::PrivateKey;
use ckws::auth::{DATE_HEADER, KEY_ID_HEADER, SIGNATURE_HEADER, sign};
use tempfile::NamedTempFile;

const KEY_FILE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../ckws/tests/fixtures/eckey.pem");
const DATE: &str = "2020-12-22T12:00:00Z";

/// Run the CLI binary with arguments and a clean CKWS_* and RUST_LOG environment.
fn run_cli(args: &[&str], env: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ckws"));
    for var in [
        "CKWS_HOST",
        "CKWS_CONTAINER",
        "CKWS_ENVIRONMENT",
        "CKWS_DATABASE",
        "CKWS_KEY_ID",
        "CKWS_KEY_FILE",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.env("NO_COLOR", "1");
    cmd.envs(env.iter().copied());
    cmd.args(args);
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI and expect success.
fn run_cli_success(args: &[&str], env: &[(&str, &str)]) -> String {
    let output = run_cli(args, env);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn expected_signature(body: &[u8], path: &str) -> String {
    let key = PrivateKey::from_pem(&std::fs::read_to_string(KEY_FILE).unwrap()).unwrap();
    let timestamp = DateTime::parse_from_rfc3339(DATE).unwrap().with_timezone(&Utc);
    sign(body, timestamp, path, &key).unwrap()
}

#[test]
fn test_sign_json_matches_library() {
    let path = "/database/1/iCloud.com.example/development/public/records/query";
    let stdout = run_cli_success(
        &[
            "sign", "--key-id", "abc123", "--key-file", KEY_FILE, "--path", path, "--date", DATE,
            "--json",
        ],
        &[],
    );

    let headers: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(headers[KEY_ID_HEADER], "abc123");
    assert_eq!(headers[DATE_HEADER], DATE);
    assert_eq!(headers[SIGNATURE_HEADER], expected_signature(b"", path));
}

#[test]
fn test_sign_body_file_and_env_settings() {
    let mut body = NamedTempFile::new().unwrap();
    body.write_all(br#"{"query":{"recordType":"Users"}}"#).unwrap();
    let body_path = body.path().to_str().unwrap();

    let stdout = run_cli_success(
        &[
            "sign", "--operation", "records/query", "--body", body_path, "--date", DATE,
        ],
        &[
            ("CKWS_KEY_ID", "abc123"),
            ("CKWS_KEY_FILE", KEY_FILE),
            ("CKWS_CONTAINER", "iCloud.com.example"),
            ("CKWS_ENVIRONMENT", "production"),
            ("CKWS_DATABASE", "private"),
        ],
    );

    let path = "/database/1/iCloud.com.example/production/private/records/query";
    let payload = stdout.lines().next().unwrap();
    assert!(payload.starts_with("Payload: 2020-12-22T12:00:00Z:"));
    assert!(payload.ends_with(&format!(":{}", path)));

    let signature = format!(
        "{}: {}",
        SIGNATURE_HEADER,
        expected_signature(br#"{"query":{"recordType":"Users"}}"#, path)
    );
    assert!(stdout.lines().any(|line| line == signature));
}

#[test]
fn test_verbose_logs_key_loading_to_stderr() {
    let output = run_cli(
        &[
            "-vv", "sign", "--key-id", "abc123", "--key-file", KEY_FILE, "--path", "/x", "--date",
            DATE, "--json",
        ],
        &[],
    );
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("loaded signing key"));

    // Logs never reach stdout, which stays parseable.
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(serde_json::from_str::<serde_json::Value>(&stdout).is_ok());
}

#[test]
fn test_sign_without_key_fails() {
    let output = run_cli(&["sign", "--path", "/x"], &[]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No key id"));
}

#[test]
fn test_sign_rejects_bad_key_file() {
    let mut key = NamedTempFile::new().unwrap();
    key.write_all(b"not a key").unwrap();

    let output = run_cli(
        &[
            "sign", "--key-id", "abc123", "--key-file", key.path().to_str().unwrap(), "--path", "/x",
        ],
        &[],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load key"));
}

#[test]
fn test_fetch_without_container_fails() {
    let output = run_cli(
        &["fetch", "abc", "--key-id", "abc123", "--key-file", KEY_FILE],
        &[],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No container"));
}

#[test]
fn test_invalid_environment_fails() {
    let output = run_cli(
        &[
            "fetch", "abc", "--container", "iCloud.com.example", "--environment", "staging",
            "--key-id", "abc123", "--key-file", KEY_FILE,
        ],
        &[],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid environment"));
}

#[test]
fn test_save_rejects_malformed_asset_argument() {
    let output = run_cli(&["save", "--type", "Photos", "--asset", "image"], &[]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("expected field=path"));
}
