//! "Open in editor" and "open terminal" launchers.
//!
//! Launch selection is a pure function of the platform and what resolves on
//! `PATH`, returning a [`LaunchPlan`]; [`LaunchPlan::execute`] runs it.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use playground_core::error::io_err;
use playground_core::{paths, tools, PlaygroundError, PlaygroundId};

use crate::service::Playgrounds;

/// Linux terminal emulators in preference order, with their
/// working-directory flag style.
const TERMINALS: &[(&str, DirFlag)] = &[
    ("x-terminal-emulator", DirFlag::Joined("--working-directory=")),
    ("gnome-terminal", DirFlag::Joined("--working-directory=")),
    ("konsole", DirFlag::Separate("--workdir")),
    ("xfce4-terminal", DirFlag::Joined("--working-directory=")),
    ("alacritty", DirFlag::Separate("--working-directory")),
];

#[derive(Debug, Clone, Copy)]
enum DirFlag {
    Joined(&'static str),
    Separate(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Windows,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Run to completion; a non-zero exit is an error.
    Wait,
    /// Spawn and return immediately.
    Detach,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
    pub mode: LaunchMode,
}

impl LaunchPlan {
    fn wait(program: impl Into<OsString>, args: Vec<OsString>) -> Self {
        Self {
            program: program.into(),
            args,
            cwd: None,
            mode: LaunchMode::Wait,
        }
    }

    fn detach(program: impl Into<OsString>, args: Vec<OsString>) -> Self {
        Self {
            program: program.into(),
            args,
            cwd: None,
            mode: LaunchMode::Detach,
        }
    }

    pub fn execute(&self) -> Result<(), PlaygroundError> {
        tracing::debug!(program = ?self.program, args = ?self.args, mode = ?self.mode, "launching");
        match self.mode {
            LaunchMode::Wait => tools::run(
                Path::new(&self.program),
                &self.args,
                self.cwd.as_deref(),
            )
            .map(|_| ()),
            LaunchMode::Detach => {
                let mut cmd = Command::new(&self.program);
                cmd.args(&self.args)
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null());
                if let Some(dir) = &self.cwd {
                    cmd.current_dir(dir);
                }
                #[cfg(unix)]
                {
                    use std::os::unix::process::CommandExt;
                    cmd.process_group(0);
                }
                let mut child = cmd
                    .spawn()
                    .map_err(|e| io_err(PathBuf::from(&self.program), e))?;
                // Reaped on a background thread.
                std::thread::spawn(move || {
                    let _ = child.wait();
                });
                Ok(())
            }
        }
    }
}

/// Editor launch for `target`: configured editor, `code`, then the platform opener.
pub fn editor_plan(
    platform: Platform,
    configured: Option<&str>,
    target: &Path,
    on_path: impl Fn(&str) -> bool,
) -> Result<LaunchPlan, PlaygroundError> {
    let target = target.as_os_str().to_os_string();
    if let Some(raw) = configured.map(str::trim).filter(|s| !s.is_empty()) {
        let mut words = shell_words::split(raw)
            .map_err(|e| PlaygroundError::Validation(format!("invalid editor command {raw:?}: {e}")))?
            .into_iter()
            .map(OsString::from);
        let program = words
            .next()
            .ok_or_else(|| PlaygroundError::Validation("editor command is empty".to_string()))?;
        let mut args: Vec<OsString> = words.collect();
        args.push(target);
        return Ok(LaunchPlan::wait(program, args));
    }
    if on_path("code") {
        return Ok(LaunchPlan::wait("code", vec![target]));
    }
    Ok(match platform {
        Platform::MacOs => LaunchPlan::wait(
            "open",
            vec!["-a".into(), "Visual Studio Code".into(), target],
        ),
        Platform::Windows => LaunchPlan::wait(
            "cmd",
            vec!["/c".into(), "start".into(), "code".into(), target],
        ),
        Platform::Linux => LaunchPlan::wait("xdg-open", vec![target]),
    })
}

/// Terminal launch opened at `target`.
///
/// On Linux, fails with [`PlaygroundError::ToolNotFound`] naming every
/// emulator tried when none is on `PATH`.
pub fn terminal_plan(
    platform: Platform,
    target: &Path,
    on_path: impl Fn(&str) -> bool,
) -> Result<LaunchPlan, PlaygroundError> {
    let dir = target.as_os_str().to_os_string();
    match platform {
        Platform::MacOs => Ok(LaunchPlan::wait(
            "open",
            vec!["-a".into(), "Terminal".into(), dir],
        )),
        Platform::Windows => Ok(LaunchPlan::wait(
            "cmd",
            vec!["/c".into(), "start".into(), "wt".into(), "-d".into(), dir],
        )),
        Platform::Linux => {
            for &(bin, flag) in TERMINALS {
                if on_path(bin) {
                    let args = match flag {
                        DirFlag::Joined(prefix) => {
                            let mut joined = OsString::from(prefix);
                            joined.push(&dir);
                            vec![joined]
                        }
                        DirFlag::Separate(name) => vec![OsString::from(name), dir.clone()],
                    };
                    return Ok(LaunchPlan::detach(bin, args));
                }
            }
            let tried: Vec<&str> = TERMINALS.iter().map(|&(bin, _)| bin).collect();
            Err(PlaygroundError::ToolNotFound {
                tool: format!("terminal emulator (tried {})", tried.join(", ")),
            })
        }
    }
}

impl Playgrounds {
    pub fn open_editor(&self, id: &PlaygroundId) -> Result<(), PlaygroundError> {
        let record = self.find_repo(id)?;
        editor_plan(
            Platform::current(),
            self.config().editor.as_deref(),
            &record.path,
            tools::is_available,
        )?
        .execute()
    }

    pub fn open_terminal(&self, id: &PlaygroundId) -> Result<(), PlaygroundError> {
        let record = self.find_repo(id)?;
        open_terminal_at(&record.path)
    }

    /// Terminal at the playgrounds base directory.
    pub fn open_root(&self) -> Result<(), PlaygroundError> {
        self.store().ensure_dirs()?;
        open_terminal_at(&paths::base_dir_at(self.home()))
    }
}

fn open_terminal_at(dir: &Path) -> Result<(), PlaygroundError> {
    terminal_plan(Platform::current(), dir, tools::is_available)?.execute()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os(v: &[&str]) -> Vec<OsString> {
        v.iter().map(OsString::from).collect()
    }

    #[test]
    fn configured_editor_is_split_and_gets_target() {
        let plan = editor_plan(
            Platform::Linux,
            Some("zed --new"),
            Path::new("/p"),
            |_| true,
        )
        .unwrap();
        assert_eq!(plan.program, OsString::from("zed"));
        assert_eq!(plan.args, os(&["--new", "/p"]));
    }

    #[test]
    fn code_preferred_then_platform_fallback() {
        let plan = editor_plan(Platform::Linux, None, Path::new("/p"), |b| b == "code").unwrap();
        assert_eq!(plan.program, OsString::from("code"));

        let plan = editor_plan(Platform::Linux, None, Path::new("/p"), |_| false).unwrap();
        assert_eq!(plan.program, OsString::from("xdg-open"));

        let plan = editor_plan(Platform::MacOs, None, Path::new("/p"), |_| false).unwrap();
        assert_eq!(plan.args, os(&["-a", "Visual Studio Code", "/p"]));
    }

    #[test]
    fn linux_terminal_uses_first_available_with_its_flag() {
        let plan = terminal_plan(Platform::Linux, Path::new("/p"), |b| b == "konsole").unwrap();
        assert_eq!(plan.program, OsString::from("konsole"));
        assert_eq!(plan.args, os(&["--workdir", "/p"]));
        assert_eq!(plan.mode, LaunchMode::Detach);

        let plan = terminal_plan(
            Platform::Linux,
            Path::new("/p"),
            |b| b == "gnome-terminal" || b == "alacritty",
        )
        .unwrap();
        assert_eq!(plan.args, os(&["--working-directory=/p"]));
    }

    #[test]
    fn linux_terminal_without_emulator_is_tool_not_found() {
        let err = terminal_plan(Platform::Linux, Path::new("/p"), |_| false).unwrap_err();
        assert_eq!(err.kind(), playground_core::ErrorKind::ToolNotFound);
        let message = err.to_string();
        for &(bin, _) in TERMINALS {
            assert!(message.contains(bin), "{message}");
        }
    }

    #[test]
    fn windows_terminal_uses_wt() {
        let plan = terminal_plan(Platform::Windows, Path::new("C:\\p"), |_| false).unwrap();
        assert_eq!(plan.program, OsString::from("cmd"));
        assert_eq!(plan.args, os(&["/c", "start", "wt", "-d", "C:\\p"]));
    }
}
