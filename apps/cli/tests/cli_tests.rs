//! CLI 冒烟测试
//!
//! 只覆盖一次性命令与参数解析；长时运行路径用 `--duration` 限时。

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_check_config_accepts_valid_file() {
    let file = write_config(
        r#"
rate_hz = 400.0
filter_alpha = 0.5

[gait]
base_clearance_height = 0.03
"#,
    );

    Command::cargo_bin("loco-cli")
        .unwrap()
        .args(["check-config", "--config"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("400"));
}

#[test]
fn test_check_config_rejects_bad_alpha() {
    let file = write_config("filter_alpha = 1.5\n");

    Command::cargo_bin("loco-cli")
        .unwrap()
        .args(["check-config", "--config"])
        .arg(file.path())
        .assert()
        .failure();
}

#[test]
fn test_check_config_rejects_missing_file() {
    Command::cargo_bin("loco-cli")
        .unwrap()
        .args(["check-config", "--config", "/nonexistent/loco.toml"])
        .assert()
        .failure();
}

#[test]
fn test_run_with_duration_exits() {
    Command::cargo_bin("loco-cli")
        .unwrap()
        .args(["run", "--duration", "0.05"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ticks"));
}

#[test]
fn test_run_agent_flag_overrides_config() {
    Command::cargo_bin("loco-cli")
        .unwrap()
        .args(["run", "--duration", "0.05", "--agent"])
        .assert()
        .success()
        .stdout(predicate::str::contains("agent"));
}

#[test]
fn test_unknown_subcommand_fails() {
    Command::cargo_bin("loco-cli")
        .unwrap()
        .arg("definitely-not-a-command")
        .assert()
        .failure();
}
