//! CLI subprocess integration tests.
//!
//! These tests invoke the `pinfile` binary as a subprocess and verify
//! exit codes, stdout content, and JSON output stability.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn pinfile_bin(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_pinfile"));
    cmd.current_dir(dir);
    cmd.env_remove("PINFILE_LOG");
    cmd
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn write_tree(dir: &Path) -> PathBuf {
    write(dir, "pins.pip", "pluggy==0.13.1\nvirtualenv==20.8.1\n");
    write(dir, "pip.pip", "pip==21.3.1\nvirtualenv\n");
    write(
        dir,
        "dev.pip",
        "# Local development.\n-c pins.pip\n-r pip.pip\n\npluggy==0.13.1\npylint==2.11.1\n",
    )
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn parse_json(output: &Output) -> serde_json::Value {
    let text = stdout(output);
    serde_json::from_str(&text)
        .unwrap_or_else(|e| panic!("--json must produce valid JSON: {e}\nstdout: {text}"))
}

#[test]
fn cli_version_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let output = pinfile_bin(dir.path()).arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("pinfile"));
}

#[test]
fn cli_help_lists_commands() {
    let dir = tempfile::tempdir().unwrap();
    let output = pinfile_bin(dir.path()).arg("--help").output().unwrap();
    assert!(output.status.success());
    let text = stdout(&output);
    for command in ["parse", "fmt", "expand", "check", "lock", "verify"] {
        assert!(text.contains(command), "help must mention {command}:\n{text}");
    }
}

#[test]
fn cli_parse_json_output_stable() {
    let dir = tempfile::tempdir().unwrap();
    let root = write_tree(dir.path());

    let output = pinfile_bin(dir.path())
        .args(["--json", "parse"])
        .arg(&root)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let parsed = parse_json(&output);
    let lines = parsed["lines"].as_array().unwrap();
    assert_eq!(lines[0]["value"]["type"], "comment");
    assert_eq!(lines[1]["line"], 2);
    assert_eq!(lines[1]["value"]["type"], "include");
    assert_eq!(lines[1]["value"]["value"]["kind"], "constraints");
    assert_eq!(lines[1]["value"]["value"]["target"], "pins.pip");
    assert_eq!(lines[4]["value"]["type"], "requirement");
    assert_eq!(lines[4]["value"]["value"]["name"], "pluggy");
    assert_eq!(lines[4]["value"]["value"]["version"], "0.13.1");
}

#[test]
fn cli_parse_defaults_to_configured_root() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path());
    write(dir.path(), "pinfile.toml", "root = \"dev.pip\"\n");

    let output = pinfile_bin(dir.path()).arg("parse").output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("pylint"), "{text}");
    assert!(text.contains("pins.pip"), "{text}");
}

#[test]
fn cli_fmt_check_and_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "messy.pip",
        "--requirement=other.pip\nPyLint == 2.11.1   #lint\n",
    );

    let check = pinfile_bin(dir.path())
        .args(["fmt", "--check"])
        .arg(&path)
        .output()
        .unwrap();
    assert_eq!(check.status.code(), Some(1));
    assert!(stderr(&check).contains("not formatted"));

    let written = pinfile_bin(dir.path())
        .args(["fmt", "--write"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(written.status.success(), "stderr: {}", stderr(&written));
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("-r other.pip\n"), "{content}");
    assert!(content.contains("PyLint==2.11.1"), "{content}");

    let recheck = pinfile_bin(dir.path())
        .args(["fmt", "--check"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(recheck.status.success());
}

#[test]
fn cli_expand_shows_origins() {
    let dir = tempfile::tempdir().unwrap();
    let root = write_tree(dir.path());

    let output = pinfile_bin(dir.path())
        .args(["--json", "expand"])
        .arg(&root)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let flat = parse_json(&output);
    let entries = flat["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 6);
    assert_eq!(entries[0]["kind"], "constraint");
    assert_eq!(entries[0]["line"], 1);
}

#[test]
fn cli_check_clean_tree_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let root = write_tree(dir.path());

    let output = pinfile_bin(dir.path())
        .args(["--json", "check"])
        .arg(&root)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let report = parse_json(&output);
    assert_eq!(report["has_conflicts"], false);
    assert!(report["conflicts"].as_array().unwrap().is_empty());
}

#[test]
fn cli_check_conflict_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    let root = write_tree(dir.path());
    write(dir.path(), "pip.pip", "pip==21.3.1\nvirtualenv==20.10.0\n");

    let output = pinfile_bin(dir.path())
        .arg("check")
        .arg(&root)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = stdout(&output);
    assert!(text.contains("virtualenv"), "{text}");
    assert!(text.contains("pip.pip:2"), "{text}");
}

#[test]
fn cli_check_conflict_behind_marker_spelling() {
    let dir = tempfile::tempdir().unwrap();
    let root = write(
        dir.path(),
        "dev.pip",
        "six==1.15.0; python_version<\"3.8\"\nsix==1.16.0 ; python_version < '3.8'\n",
    );

    let output = pinfile_bin(dir.path())
        .args(["--json", "check"])
        .arg(&root)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let report = parse_json(&output);
    assert_eq!(report["has_conflicts"], true);
    assert_eq!(report["conflicts"][0]["name"], "six");
}

#[test]
fn cli_unmarked_constraint_pins_marked_requirement() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "pins.pip", "tomli==1.2.3\n");
    let root = write(
        dir.path(),
        "dev.pip",
        "-c pins.pip\ntomli; python_version < \"3.11\"\n",
    );

    let output = pinfile_bin(dir.path())
        .args(["--json", "resolve"])
        .arg(&root)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let resolution = parse_json(&output);
    assert_eq!(resolution["pins"][0]["version"], "1.2.3");
}

#[test]
fn cli_check_deny_unpinned() {
    let dir = tempfile::tempdir().unwrap();
    let root = write(dir.path(), "dev.pip", "tox\npylint==2.11.1\n");

    let allowed = pinfile_bin(dir.path())
        .arg("check")
        .arg(&root)
        .output()
        .unwrap();
    assert!(allowed.status.success());

    let denied = pinfile_bin(dir.path())
        .args(["check", "--deny-unpinned"])
        .arg(&root)
        .output()
        .unwrap();
    assert_eq!(denied.status.code(), Some(1));
}

#[test]
fn cli_bad_manifest_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let root = write(dir.path(), "dev.pip", "pluggy>=0.13\n");

    let output = pinfile_bin(dir.path())
        .arg("check")
        .arg(&root)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("manifest error"));
}

#[test]
fn cli_missing_manifest_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let output = pinfile_bin(dir.path())
        .args(["parse", "nowhere.pip"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn cli_missing_include_exits_three() {
    let dir = tempfile::tempdir().unwrap();
    let root = write(dir.path(), "dev.pip", "-r missing.pip\npluggy==0.13.1\n");

    let output = pinfile_bin(dir.path())
        .arg("expand")
        .arg(&root)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("include error"));
}

#[test]
fn cli_include_cycle_exits_three() {
    let dir = tempfile::tempdir().unwrap();
    let root = write(dir.path(), "a.pip", "-r b.pip\n");
    write(dir.path(), "b.pip", "-r a.pip\n");

    let output = pinfile_bin(dir.path())
        .arg("check")
        .arg(&root)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("cycle"));
}

#[test]
fn cli_lock_then_verify() {
    let dir = tempfile::tempdir().unwrap();
    let root = write_tree(dir.path());
    let lock_path = dir.path().join("dev.lock");

    let lock = pinfile_bin(dir.path())
        .args(["--json", "lock"])
        .arg(&root)
        .arg("--output")
        .arg(&lock_path)
        .output()
        .unwrap();
    assert!(lock.status.success(), "stderr: {}", stderr(&lock));
    let payload = parse_json(&lock);
    assert_eq!(payload["pins"], 4);
    let fingerprint = payload["fingerprint"].as_str().unwrap().to_owned();
    assert_eq!(fingerprint.len(), 64);
    assert!(lock_path.exists());

    let verify = pinfile_bin(dir.path())
        .args(["--json", "verify"])
        .arg(&root)
        .arg("--lock")
        .arg(&lock_path)
        .output()
        .unwrap();
    assert!(verify.status.success(), "stderr: {}", stderr(&verify));
    let verdict = parse_json(&verify);
    assert_eq!(verdict["status"], "ok");
    assert_eq!(verdict["fingerprint"], fingerprint.as_str());

    write(dir.path(), "pins.pip", "pluggy==0.13.1\nvirtualenv==20.10.0\n");
    let drifted = pinfile_bin(dir.path())
        .arg("verify")
        .arg(&root)
        .arg("--lock")
        .arg(&lock_path)
        .output()
        .unwrap();
    assert_eq!(drifted.status.code(), Some(1));
    assert!(stderr(&drifted).contains("pinfile lock"));
}

#[test]
fn cli_precedence_flag_resolves_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let root = write(dir.path(), "dev.pip", "six==1.15.0\nsix==1.16.0\n");

    let strict = pinfile_bin(dir.path())
        .arg("resolve")
        .arg(&root)
        .output()
        .unwrap();
    assert_eq!(strict.status.code(), Some(1));

    let last = pinfile_bin(dir.path())
        .args(["--precedence", "last-wins", "--json", "resolve"])
        .arg(&root)
        .output()
        .unwrap();
    assert!(last.status.success(), "stderr: {}", stderr(&last));
    let resolution = parse_json(&last);
    assert_eq!(resolution["pins"][0]["version"], "1.16.0");
}

#[test]
fn cli_config_file_sets_lock_path() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path());
    write(
        dir.path(),
        "pinfile.toml",
        "root = \"dev.pip\"\nlock_file = \"locks/dev.lock\"\n",
    );
    std::fs::create_dir(dir.path().join("locks")).unwrap();

    let output = pinfile_bin(dir.path()).arg("lock").output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(dir.path().join("locks/dev.lock").exists());

    let verify = pinfile_bin(dir.path()).arg("verify").output().unwrap();
    assert!(verify.status.success(), "stderr: {}", stderr(&verify));
}

#[test]
fn cli_invalid_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "pinfile.toml", "max_depth = 0\n");
    let output = pinfile_bin(dir.path()).arg("parse").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn cli_completions_bash() {
    let dir = tempfile::tempdir().unwrap();
    let output = pinfile_bin(dir.path())
        .args(["completions", "bash"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("pinfile"));
}

#[test]
fn cli_man_pages_written() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("man");
    let output = pinfile_bin(dir.path())
        .arg("man-pages")
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(out.join("pinfile.1").exists());
}
