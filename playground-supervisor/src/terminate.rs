//! Platform termination of a supervised process tree.

/// Ask the process (and its group) to terminate. Does not wait.
#[cfg(unix)]
pub(crate) fn request_termination(pid: u32) {
    use nix::sys::signal::{kill, killpg, Signal};
    use nix::unistd::Pid;

    let pid = Pid::from_raw(pid as i32);
    // Children are spawned as group leaders, so pgid == pid.
    if let Err(err) = killpg(pid, Signal::SIGTERM) {
        tracing::debug!(pid = %pid, error = %err, "killpg failed; signalling process");
        if let Err(err) = kill(pid, Signal::SIGTERM) {
            tracing::debug!(pid = %pid, error = %err, "SIGTERM failed");
        }
    }
}

#[cfg(windows)]
pub(crate) fn request_termination(pid: u32) {
    let spawned = std::process::Command::new("taskkill")
        .args(["/pid", &pid.to_string(), "/t", "/f"])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn();
    if let Err(err) = spawned {
        tracing::debug!(pid, error = %err, "taskkill failed to start");
    }
}

/// Name of a terminating signal, e.g. `"SIGTERM"`.
#[cfg(unix)]
pub(crate) fn signal_name(signal: i32) -> String {
    nix::sys::signal::Signal::try_from(signal)
        .map(|s| s.as_str().to_string())
        .unwrap_or_else(|_| signal.to_string())
}
