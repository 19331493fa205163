#[path = "../helpers/mod.rs"]
mod helpers;

use assert_cmd::Command;
use helpers::{config_file, path_of, CHANNEL_ENV_VARS};
use predicates::prelude::*;
use predicates::str::contains;

/// Returns the binary with no channel configured from the outer environment.
fn multipush() -> Command {
    let mut cmd = Command::cargo_bin("multipush").unwrap();
    for key in CHANNEL_ENV_VARS {
        cmd.env_remove(key);
    }
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_reports_every_channel_when_nothing_is_configured() {
    let file = config_file("");

    multipush()
        .arg("--config")
        .arg(path_of(&file))
        .arg("Daily report")
        .arg("all good")
        .assert()
        .success()
        .stdout(contains(
            "[Email]: Message push failed! Reason: ConfigurationMissing: Email configuration not set",
        ))
        .stdout(contains(
            "[PushPlus]: Message push failed! Reason: ConfigurationMissing: PushPlus Token not configured",
        ))
        .stdout(contains(
            "[Server Push]: Message push failed! Reason: ConfigurationMissing: Server Push key not configured",
        ))
        .stdout(contains("[DingTalk]: Message push failed!"))
        .stdout(contains("[Feishu]: Message push failed!"))
        .stdout(contains("[WeChat Work]: Message push failed!"))
        .stdout(contains(
            "[Telegram]: Message push failed! Reason: ConfigurationMissing: Telegram Bot Token or Chat ID not configured",
        ))
        .stdout(contains("push successful").not());
}

#[test]
fn test_debug_flag_appends_error_details() {
    let file = config_file("");

    multipush()
        .env("NOTIFY_DEBUG", "true")
        .arg("--config")
        .arg(path_of(&file))
        .arg("Daily report")
        .arg("all good")
        .assert()
        .success()
        .stdout(contains("Error: Email configuration not set"))
        .stdout(contains("Details: ConfigurationMissing("));
}

#[test]
fn test_reads_body_from_file_and_stdin() {
    let file = config_file("");
    let body = config_file("[SUCCESS] Acct-A\nCurrent balance: $1.00, Used: $0.50\n");

    multipush()
        .arg("--config")
        .arg(path_of(&file))
        .arg("--content-file")
        .arg(path_of(&body))
        .arg("From file")
        .assert()
        .success()
        .stdout(contains("[Telegram]: Message push failed!"));

    multipush()
        .arg("--config")
        .arg(path_of(&file))
        .arg("From stdin")
        .write_stdin("piped body")
        .assert()
        .success()
        .stdout(contains("[Email]: Message push failed!"));
}

#[test]
fn test_missing_content_file_fails() {
    let file = config_file("");

    multipush()
        .arg("--config")
        .arg(path_of(&file))
        .arg("--content-file")
        .arg("/nonexistent/multipush-body.txt")
        .arg("Title")
        .assert()
        .failure()
        .stderr(contains("Failed to read content file"));
}

#[test]
fn test_invalid_config_exits_with_error() {
    let file = config_file("[http]\ntimeout_seconds = \"soon\"\n");

    multipush()
        .arg("--config")
        .arg(path_of(&file))
        .arg("Title")
        .arg("body")
        .assert()
        .code(1)
        .stderr(contains("Failed to load configuration"));
}
