//! `playground daemon start` as a child process, driven through the CLI.

#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};

use tempfile::TempDir;

fn playground_bin() -> PathBuf {
    PathBuf::from(assert_cmd::cargo::cargo_bin!("playground"))
}

fn playground(home: &Path, args: &[&str]) -> Output {
    Command::new(playground_bin())
        .env("HOME", home)
        .env("USERPROFILE", home)
        .env("NO_COLOR", "1")
        .args(args)
        .output()
        .expect("run playground")
}

struct DaemonProcess {
    child: Child,
    home: PathBuf,
}

impl DaemonProcess {
    fn start(home: &Path) -> Self {
        let child = Command::new(playground_bin())
            .env("HOME", home)
            .env("USERPROFILE", home)
            .args(["daemon", "start"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn daemon");
        Self {
            child,
            home: home.to_path_buf(),
        }
    }

    fn stop(&mut self) {
        let _ = playground(&self.home, &["daemon", "stop"]);

        let deadline = Instant::now() + Duration::from_secs(3);
        while Instant::now() < deadline {
            if let Ok(Some(_)) = self.child.try_wait() {
                return;
            }
            sleep(Duration::from_millis(50));
        }

        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Drop for DaemonProcess {
    fn drop(&mut self) {
        self.stop();
    }
}

fn daemon_running(home: &Path) -> bool {
    let output = playground(home, &["daemon", "status"]);
    if !output.status.success() {
        return false;
    }
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(&output.stdout) else {
        return false;
    };
    value
        .get("running")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        sleep(Duration::from_millis(100));
    }
    false
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Config pointing `git` at a script that fakes a clone.
fn write_fake_git(home: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let git = home.join("fake-git");
    std::fs::write(
        &git,
        "#!/bin/sh\n[ \"$1\" = clone ] && mkdir -p \"$5\"\nexit 0\n",
    )
    .expect("fake git");
    std::fs::set_permissions(&git, std::fs::Permissions::from_mode(0o755)).expect("chmod");
    let base = home.join(".playgrounds");
    std::fs::create_dir_all(&base).expect("base");
    std::fs::write(
        base.join("config.yaml"),
        format!("tools:\n  git: {}\n", git.display()),
    )
    .expect("config");
}

#[test]
fn dev_command_runs_in_daemon_across_cli_calls() {
    let home = TempDir::new().expect("home");
    write_fake_git(home.path());

    let mut daemon = DaemonProcess::start(home.path());
    assert!(
        wait_until(Duration::from_secs(5), || daemon_running(home.path())),
        "daemon did not report running state in time",
    );

    let created = playground(
        home.path(),
        &["create", "repo", "https://example.com/org/widget.git"],
    );
    assert!(created.status.success(), "create failed: {created:?}");
    let list: serde_json::Value =
        serde_json::from_slice(&playground(home.path(), &["list", "--json"]).stdout)
            .expect("list json");
    let id = list[0]["id"].as_str().expect("id").to_string();

    let started = playground(
        home.path(),
        &["dev", "start", &id, "--command", "echo hello-from-daemon; sleep 30"],
    );
    assert!(started.status.success(), "start failed: {started:?}");
    assert!(stdout(&started).contains("started"));

    let again = playground(home.path(), &["dev", "start", &id]);
    assert!(stdout(&again).contains("already running"));

    assert!(
        wait_until(Duration::from_secs(5), || {
            stdout(&playground(home.path(), &["dev", "log", &id])).contains("hello-from-daemon")
        }),
        "dev output never reached the daemon log",
    );

    let foreground = playground(home.path(), &["dev", "run", &id]);
    assert!(!foreground.status.success());
    assert!(
        String::from_utf8_lossy(&foreground.stderr).contains("daemon is running"),
        "dev run stderr: {}",
        String::from_utf8_lossy(&foreground.stderr)
    );

    let stopped = playground(home.path(), &["dev", "stop", &id]);
    assert!(stdout(&stopped).contains("stop requested"));

    let followed = playground(home.path(), &["dev", "log", &id, "--follow"]);
    assert!(followed.status.success());
    assert!(
        stdout(&followed).contains("[process exited code=null signal=SIGTERM]"),
        "follow output: {}",
        stdout(&followed)
    );

    daemon.stop();
    assert!(!daemon_running(home.path()));
}
