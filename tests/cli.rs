// ABOUTME: Command-line surface smoke tests.
// ABOUTME: Flags and required credentials must stay stable for CI callers.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_the_branch_selection_flags() {
    Command::cargo_bin("shipwatch")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--production")
                .and(predicate::str::contains("--preview"))
                .and(predicate::str::contains("--branch"))
                .and(predicate::str::contains("--poll-logs")),
        );
}

#[test]
fn missing_credentials_are_rejected_up_front() {
    Command::cargo_bin("shipwatch")
        .unwrap()
        .env_remove("SHIPWATCH_ACCOUNT_ID")
        .env_remove("SHIPWATCH_PROJECT")
        .env_remove("SHIPWATCH_API_KEY")
        .env_remove("SHIPWATCH_EMAIL")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--account-id"));
}
