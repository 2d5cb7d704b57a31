//! Resolving and running external tools.
//!
//! Every call is attempted exactly once and blocks until the tool exits; there
//! is no timeout.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use crate::error::{io_err, PlaygroundError};

/// Captured output of a successful tool run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Resolve `configured` (a bare name looked up on `PATH`, or a path) to an
/// executable.
pub fn resolve(configured: &str) -> Result<PathBuf, PlaygroundError> {
    which::which(configured).map_err(|_| PlaygroundError::ToolNotFound {
        tool: configured.to_string(),
    })
}

pub fn is_available(configured: &str) -> bool {
    which::which(configured).is_ok()
}

/// Run `program args…` and capture its output; a non-zero exit is
/// [`PlaygroundError::ExternalTool`].
pub fn run<I, S>(program: &Path, args: I, cwd: Option<&Path>) -> Result<ToolOutput, PlaygroundError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<OsString> = args.into_iter().map(|a| a.as_ref().to_os_string()).collect();
    let mut cmd = Command::new(program);
    cmd.args(&args).stdin(Stdio::null());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    let label = describe(program, &args);
    tracing::debug!(command = %label, "running external tool");
    let output = cmd.output().map_err(|e| io_err(program, e))?;
    into_result(label, output)
}

/// Run `command` through the platform shell with `cwd` as working directory.
pub fn run_shell(command: &str, cwd: &Path) -> Result<ToolOutput, PlaygroundError> {
    let mut cmd = shell_command(command);
    cmd.current_dir(cwd).stdin(Stdio::null());
    tracing::debug!(command = %command, cwd = %cwd.display(), "running shell command");
    let output = cmd.output().map_err(|e| io_err(cwd, e))?;
    into_result(command.to_string(), output)
}

/// A `Command` interpreting `command` with `sh -c` (or `cmd /C` on Windows).
pub fn shell_command(command: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    }
}

fn into_result(label: String, output: Output) -> Result<ToolOutput, PlaygroundError> {
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    if !output.status.success() {
        return Err(PlaygroundError::ExternalTool {
            command: label,
            status: output.status.to_string(),
            stderr: stderr.trim().to_string(),
        });
    }
    Ok(ToolOutput { stdout, stderr })
}

fn describe(program: &Path, args: &[OsString]) -> String {
    let name = program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string());
    let mut parts = vec![name];
    parts.extend(args.iter().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}
