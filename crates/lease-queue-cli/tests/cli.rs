//! Binary-level tests for the `lease-queue` command.

use assert_cmd::Command;
use predicates::prelude::*;

fn lease_queue() -> Command {
    let mut cmd = Command::cargo_bin("lease-queue").unwrap();
    cmd.env_remove("LEASE_QUEUE_URL");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    lease_queue()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("send"))
        .stdout(predicate::str::contains("receive"))
        .stdout(predicate::str::contains("ack"));
}

#[test]
fn test_missing_subcommand_fails() {
    lease_queue().assert().failure();
}

#[test]
fn test_zero_quantity_is_rejected_before_any_request() {
    lease_queue()
        .args(["receive", "--qty", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("qty"));
}

#[test]
fn test_unreachable_server_reports_request_failure() {
    lease_queue()
        .args(["stats", "--server-url", "http://127.0.0.1:1", "--timeout", "2"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Request failed"));
}

#[test]
fn test_completions_are_generated() {
    lease_queue()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lease-queue"));
}
