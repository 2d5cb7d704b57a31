//! Temp home with fake `git` / `docker` scripts wired in through `config.yaml`.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use playground_lifecycle::Playgrounds;
use tempfile::TempDir;

pub struct Harness {
    pub home: TempDir,
    pub tools: PathBuf,
    pub playgrounds: Playgrounds,
}

impl Harness {
    pub fn git_log(&self) -> String {
        fs::read_to_string(self.tools.join("git.log")).unwrap_or_default()
    }

    pub fn docker_log(&self) -> String {
        fs::read_to_string(self.tools.join("docker.log")).unwrap_or_default()
    }

    pub fn clone_count(&self) -> usize {
        self.git_log().lines().filter(|l| l.starts_with("clone ")).count()
    }

    pub fn repos_dir(&self) -> PathBuf {
        self.playgrounds.store().repos_dir()
    }
}

/// Harness with both fake tools and the given catalog apps (`(id, json)`).
pub fn harness(apps: &[(&str, &str)]) -> Harness {
    build(apps, true, true)
}

pub fn harness_without_runtime() -> Harness {
    build(&[], true, false)
}

pub fn harness_without_git() -> Harness {
    build(&[], false, true)
}

fn build(apps: &[(&str, &str)], git: bool, runtime: bool) -> Harness {
    let home = TempDir::new().expect("home");
    let tools = home.path().join("fake-bin");
    fs::create_dir_all(&tools).expect("tools dir");

    let git_path = write_script(&tools, "git", &fake_git(&tools));
    let docker_path = write_script(&tools, "docker", &fake_docker(&tools));
    let missing = tools.join("not-installed");

    let base = home.path().join(".playgrounds");
    fs::create_dir_all(base.join("apps")).expect("apps dir");
    let git_cfg = if git { &git_path } else { &missing };
    let runtime_cfg = if runtime { &docker_path } else { &missing };
    let config = format!(
        "tools:\n  git: {}\n  container_runtime: {}\n",
        git_cfg.display(),
        runtime_cfg.display(),
    );
    fs::write(base.join("config.yaml"), config).expect("config");
    for (id, json) in apps {
        fs::write(base.join("apps").join(format!("{id}.json")), json).expect("app");
    }

    let playgrounds = Playgrounds::open(home.path()).expect("open");
    Harness {
        home,
        tools,
        playgrounds,
    }
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("write script");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
    path
}

fn fake_git(tools: &Path) -> String {
    format!(
        r#"#!/bin/sh
echo "$@" >> "{log}"
if [ "$1" = "clone" ]; then
  url="$4"
  dest="$5"
  case "$url" in
    *fail*) echo "fatal: repository '$url' not found" >&2; exit 128 ;;
  esac
  mkdir -p "$dest" && echo "cloned from $url" > "$dest/README.md"
  case "$url" in
    *node*) echo '{{"scripts":{{"dev":"vite"}}}}' > "$dest/package.json" ;;
  esac
fi
exit 0
"#,
        log = tools.join("git.log").display()
    )
}

fn fake_docker(tools: &Path) -> String {
    format!(
        r#"#!/bin/sh
echo "$@" >> "{log}"
for a in "$@"; do last="$a"; done
case "$1" in
  pull)
    case "$2" in
      *missing*) echo "Error: pull access denied for $2" >&2; exit 1 ;;
    esac
    echo "pulled $2" ;;
  run)
    case "$last" in
      *gone*) echo "gone0000" ;;
      *weird*) echo "weird0000" ;;
      *) echo "c0ffee1234" ;;
    esac ;;
  inspect)
    case "$last" in
      weird*) echo "<no value>" ;;
      *) if [ -f "{state}/stopped-$last" ]; then echo false; else echo true; fi ;;
    esac ;;
  stop)
    case "$2" in
      gone*) echo "Error: No such container: $2" >&2; exit 1 ;;
    esac
    touch "{state}/stopped-$2" ;;
  rm)
    case "$2" in
      gone*) echo "Error: No such container: $2" >&2; exit 1 ;;
    esac ;;
esac
exit 0
"#,
        log = tools.join("docker.log").display(),
        state = tools.display()
    )
}
