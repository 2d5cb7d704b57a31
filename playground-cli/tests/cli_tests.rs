//! `playground` binary against a temp HOME, in-process (no daemon).

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

const BLOG_APP: &str = r#"{
  "id": "blog",
  "name": "Blog",
  "description": "A static blog",
  "repoUrl": "https://example.com/org/blog.git",
  "defaultRunCommand": "echo serving-blog",
  "defaultPort": 1313
}"#;

fn playground_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("playground"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env("NO_COLOR", "1")
        .env_remove("PLAYGROUND_LOG");
    cmd
}

/// Temp home whose config points `git` at a script that fakes a clone.
fn home_with_fake_git() -> TempDir {
    let home = TempDir::new().expect("home");
    let base = home.path().join(".playgrounds");
    fs::create_dir_all(base.join("apps")).expect("apps dir");

    let git = home.path().join("fake-git");
    fs::write(
        &git,
        "#!/bin/sh\n[ \"$1\" = clone ] && mkdir -p \"$5\" && echo ok > \"$5/README.md\"\nexit 0\n",
    )
    .expect("fake git");
    fs::set_permissions(&git, fs::Permissions::from_mode(0o755)).expect("chmod");

    fs::write(
        base.join("config.yaml"),
        format!(
            "tools:\n  git: {}\n  container_runtime: {}\n",
            git.display(),
            home.path().join("no-runtime").display()
        ),
    )
    .expect("config");
    fs::write(base.join("apps").join("blog.json"), BLOG_APP).expect("app");
    home
}

fn list_json(home: &Path) -> serde_json::Value {
    let output = playground_cmd(home)
        .args(["list", "--json"])
        .output()
        .expect("run list");
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).expect("list json")
}

#[test]
fn empty_home_lists_nothing() {
    let home = TempDir::new().expect("home");
    playground_cmd(home.path())
        .arg("list")
        .assert()
        .success()
        .stdout(contains("No playgrounds yet."));
    assert_eq!(list_json(home.path()), serde_json::json!([]));
}

#[test]
fn paths_point_under_home() {
    let home = TempDir::new().expect("home");
    let meta = home.path().join(".playgrounds").join("meta.json");
    playground_cmd(home.path())
        .arg("paths")
        .assert()
        .success()
        .stdout(contains(meta.display().to_string()));
}

#[test]
fn create_repo_then_list_and_delete() {
    let home = home_with_fake_git();
    playground_cmd(home.path())
        .args([
            "create",
            "repo",
            "https://example.com/org/widget.git",
            "--run",
            "make dev",
            "--port",
            "4000",
        ])
        .assert()
        .success()
        .stdout(contains("created widget-"));

    let list = list_json(home.path());
    let id = list[0]["id"].as_str().expect("id").to_string();
    assert_eq!(list[0]["type"], "github");
    assert_eq!(list[0]["runCommand"], "make dev");
    assert_eq!(list[0]["port"], 4000);

    playground_cmd(home.path())
        .arg("list")
        .assert()
        .success()
        .stdout(contains(id.as_str()).and(contains("repo")));

    playground_cmd(home.path())
        .args(["delete", &id])
        .assert()
        .success()
        .stdout(contains("remove_directory").and(contains(format!("deleted {id}"))));
    assert_eq!(list_json(home.path()), serde_json::json!([]));

    playground_cmd(home.path())
        .args(["delete", &id])
        .assert()
        .failure()
        .stderr(contains("not found"));
}

#[test]
fn invalid_url_is_reported() {
    let home = home_with_fake_git();
    playground_cmd(home.path())
        .args(["create", "repo", "not a url"])
        .assert()
        .failure()
        .stderr(contains("invalid git URL"));
}

#[test]
fn catalog_lists_and_installs_once() {
    let home = home_with_fake_git();
    playground_cmd(home.path())
        .args(["catalog", "list"])
        .assert()
        .success()
        .stdout(contains("Blog").and(contains("1313")));

    playground_cmd(home.path())
        .args(["catalog", "install", "blog"])
        .assert()
        .success()
        .stdout(contains("installed blog-"));

    playground_cmd(home.path())
        .args(["catalog", "install", "blog"])
        .assert()
        .failure()
        .stderr(contains("already installed"));
}

#[test]
fn missing_runtime_is_reported() {
    let home = home_with_fake_git();
    playground_cmd(home.path())
        .args(["docker", "installed"])
        .assert()
        .failure()
        .stderr(contains("container runtime not found"));
    playground_cmd(home.path())
        .args(["create", "container", "nginx"])
        .assert()
        .failure()
        .stderr(contains("not found in PATH"));
}

#[test]
fn daemon_only_dev_commands_need_the_daemon() {
    let home = TempDir::new().expect("home");
    for args in [
        vec!["dev", "start", "x"],
        vec!["dev", "stop", "x"],
        vec!["dev", "log", "x"],
        vec!["dev", "log", "x", "--follow"],
    ] {
        playground_cmd(home.path())
            .args(&args)
            .assert()
            .failure()
            .stderr(contains("daemon is not running"));
    }
}

#[test]
fn daemon_status_when_stopped() {
    let home = TempDir::new().expect("home");
    playground_cmd(home.path())
        .args(["daemon", "status"])
        .assert()
        .success()
        .stdout(contains("\"running\": false"));
    playground_cmd(home.path())
        .args(["daemon", "stop"])
        .assert()
        .success()
        .stdout(contains("daemon is not running"));
}

#[test]
fn dev_run_streams_until_exit() {
    let home = home_with_fake_git();
    playground_cmd(home.path())
        .args(["catalog", "install", "blog"])
        .assert()
        .success();
    let id = list_json(home.path())[0]["id"]
        .as_str()
        .expect("id")
        .to_string();

    playground_cmd(home.path())
        .args(["dev", "run", &id])
        .assert()
        .success()
        .stdout(
            contains("$ echo serving-blog")
                .and(contains("serving-blog\n"))
                .and(contains("[process exited code=0 signal=null]")),
        );

    playground_cmd(home.path())
        .args(["dev", "run", &id, "--command", "exit 4"])
        .assert()
        .failure()
        .stdout(contains("code=4"))
        .stderr(contains("exited unsuccessfully"));
}

#[test]
fn dev_run_without_command_source_fails() {
    let home = home_with_fake_git();
    playground_cmd(home.path())
        .args(["create", "repo", "https://example.com/org/bare.git"])
        .assert()
        .success();
    let id = list_json(home.path())[0]["id"]
        .as_str()
        .expect("id")
        .to_string();

    playground_cmd(home.path())
        .args(["dev", "run", &id])
        .assert()
        .failure()
        .stderr(contains("no dev command configured").and(contains(id.as_str())));
}
