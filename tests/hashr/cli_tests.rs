// Tests for the hashr binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn hashr() -> Command {
    Command::cargo_bin("hashr").unwrap()
}

#[test]
fn test_no_arguments_prints_usage() {
    hashr()
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_help_argument_prints_usage_and_fails() {
    hashr()
        .arg("-help")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--threads"));
}

#[test]
fn test_plain_output_on_stdout_logs_on_stderr() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("hello.txt"), b"hello world").unwrap();

    hashr()
        .arg(dir.path())
        .args(["--threads", "2", "--prefix", "p"])
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stdout(predicate::eq(format!(
            "SET \"p/hello.txt\" \"{}|{}|{}|{}\"\n",
            super::HELLO_MD5,
            super::HELLO_SHA1,
            super::HELLO_SHA256,
            super::HELLO_SHA512
        )))
        .stderr(predicate::str::contains("Done p/hello.txt in"));
}

#[test]
fn test_resp_output() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("notes.md"), b"").unwrap();

    hashr()
        .arg(dir.path())
        .args(["--format", "resp", "--key", "sums", "-q"])
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "*4\r\n$4\r\nHSET\r\n$4\r\nsums\r\n$8\r\nnotes.md\r\n",
        ))
        .stdout(predicate::str::contains("\r\n0|md|d41d8cd98f00b204e9800998ecf8427e|"))
        .stderr(predicate::str::contains("Done").not());
}

#[test]
fn test_zero_threads_fails() {
    let dir = TempDir::new().unwrap();

    hashr()
        .arg(dir.path())
        .args(["--threads", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--threads must be at least 1"));
}

#[test]
fn test_missing_directory_fails() {
    let dir = TempDir::new().unwrap();

    hashr()
        .arg(dir.path().join("nope"))
        .assert()
        .failure()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_stats_file_written() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("a.txt"), b"abc").unwrap();
    fs::write(data.join("b.txt"), b"hello world").unwrap();
    let stats_path = dir.path().join("stats.json");

    hashr()
        .arg(&data)
        .arg("--stats")
        .arg(&stats_path)
        .arg("-q")
        .assert()
        .success();

    let stats: serde_json::Value = serde_json::from_str(&fs::read_to_string(&stats_path).unwrap()).unwrap();
    assert_eq!(stats["files_hashed"], 2);
    assert_eq!(stats["files_failed"], 0);
    assert_eq!(stats["bytes_hashed"], 14);
    assert!(stats["duration"].is_f64());
}
