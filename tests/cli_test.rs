use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

// Nothing listens on the discard port, so any request fails fast.
const DEAD_API: &str = "http://127.0.0.1:9";

/// A `warehouse` invocation isolated from the developer's environment
fn warehouse(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("warehouse").unwrap();
    cmd.current_dir(dir)
        .env_remove("SHIPSTATION_API_KEY")
        .env_remove("SHIPSTATION_API_SECRET")
        .env_remove("SHIPSTATION_TIMEOUT_SECS")
        .env_remove("RUST_LOG")
        .env("SHIPSTATION_API_BASE", DEAD_API);
    cmd
}

fn with_credentials(cmd: &mut Command) -> &mut Command {
    cmd.env("SHIPSTATION_API_KEY", "test-key")
        .env("SHIPSTATION_API_SECRET", "test-secret")
        .env("SHIPSTATION_TIMEOUT_SECS", "2")
}

#[test]
fn test_help_lists_commands() {
    let temp = TempDir::new().unwrap();
    warehouse(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("rush"))
        .stdout(predicate::str::contains("tag"))
        .stdout(predicate::str::contains("mcp"));
}

#[test]
fn test_missing_credentials_is_auth_error() {
    let temp = TempDir::new().unwrap();
    warehouse(&temp)
        .args(["order", "9471"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Authentication error"))
        .stderr(predicate::str::contains("SHIPSTATION_API_KEY"));
}

#[test]
fn test_missing_credentials_fails_every_network_command() {
    let temp = TempDir::new().unwrap();
    let commands: [&[&str]; 6] = [
        &["rush", "9471", "--yes"],
        &["tag", "9471", "FRAGILE", "--yes"],
        &["search", "Noah"],
        &["tags"],
        &["orders", "--status", "shipped"],
        &["emails", "DC2"],
    ];
    for args in commands {
        warehouse(&temp).args(args).assert().code(3);
    }
}

#[test]
fn test_unreachable_upstream_is_upstream_error() {
    let temp = TempDir::new().unwrap();
    let mut cmd = warehouse(&temp);
    with_credentials(&mut cmd)
        .args(["rush", "9471", "--yes"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("ShipStation error"));
}

#[test]
fn test_credentials_from_dotenv() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join(".env"),
        "SHIPSTATION_API_KEY=from-file\nSHIPSTATION_API_SECRET=from-file\nSHIPSTATION_TIMEOUT_SECS=2\n",
    )
    .unwrap();

    // Credentials were found, so the failure is the dead upstream, not auth
    warehouse(&temp).args(["tags"]).assert().code(5);
}

#[test]
fn test_credentials_from_config_dotenv() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("config")).unwrap();
    fs::write(
        temp.path().join("config/.env"),
        "SHIPSTATION_API_KEY=k\nSHIPSTATION_API_SECRET=s\nSHIPSTATION_TIMEOUT_SECS=2\n",
    )
    .unwrap();

    warehouse(&temp).args(["order", "1"]).assert().code(5);
}

#[test]
fn test_invalid_status_is_usage_error() {
    let temp = TempDir::new().unwrap();
    warehouse(&temp)
        .args(["orders", "--status", "teleported"])
        .assert()
        .code(2);
}

#[test]
fn test_bad_timeout_is_usage_error() {
    let temp = TempDir::new().unwrap();
    warehouse(&temp)
        .env("SHIPSTATION_TIMEOUT_SECS", "soon")
        .arg("tags")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("SHIPSTATION_TIMEOUT_SECS"));
}

#[test]
fn test_empty_note_rejected_before_network() {
    let temp = TempDir::new().unwrap();
    let mut cmd = warehouse(&temp);
    with_credentials(&mut cmd)
        .args(["note", "9471", "   ", "--yes"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("note is empty"));
}
