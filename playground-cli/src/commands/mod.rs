//! Subcommands, and the routing they share: through the daemon when one is
//! listening, in-process otherwise.

pub mod catalog;
pub mod create;
pub mod daemon;
pub mod dev;
pub mod docker;
pub mod list;
pub mod manage;
pub mod open;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

use playground_daemon::{dispatch, response_into_data, send_request, DaemonError, DaemonRequest};
use playground_lifecycle::Playgrounds;

pub fn home() -> Result<PathBuf> {
    Ok(playground_core::paths::home()?)
}

/// Run `request` on the daemon if it is up, else in this process.
pub fn call(home: &Path, request: DaemonRequest) -> Result<Value> {
    match send_request(home, &request) {
        Ok(response) => response_into_data(response).map_err(rejected),
        Err(DaemonError::DaemonNotRunning { .. }) => call_in_process(home, request),
        Err(err) => Err(err).context("daemon request failed"),
    }
}

/// Run `request` on the daemon; fail if it is not running.
pub fn call_daemon(home: &Path, request: DaemonRequest) -> Result<Value> {
    match playground_daemon::request(home, &request) {
        Ok(data) => Ok(data),
        Err(DaemonError::DaemonNotRunning { .. }) => {
            bail!("daemon is not running; start it with `playground daemon start`")
        }
        Err(err) => Err(rejected(err)),
    }
}

/// [`call`], decoding the response data into `T`.
pub fn call_as<T: DeserializeOwned>(home: &Path, request: DaemonRequest) -> Result<T> {
    let data = call(home, request)?;
    serde_json::from_value(data).context("unexpected response shape")
}

fn call_in_process(home: &Path, request: DaemonRequest) -> Result<Value> {
    let playgrounds = Playgrounds::open(home).context("failed to load playground settings")?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build async runtime")?;
    let response = runtime.block_on(dispatch(&playgrounds, request));
    response_into_data(response).map_err(rejected)
}

/// A daemon rejection surfaces as its message alone.
fn rejected(err: DaemonError) -> anyhow::Error {
    match err {
        DaemonError::Rejected { message, .. } => anyhow!(message),
        other => anyhow::Error::new(other),
    }
}
