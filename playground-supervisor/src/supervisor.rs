use std::collections::HashMap;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::sync::broadcast;

use playground_core::error::io_err;
use playground_core::{
    tools, Catalog, DevLog, MetadataStore, PlaygroundError, PlaygroundId, PlaygroundRecord,
    RepoPlayground,
};

use crate::events::{exit_marker, DevEvent, EVENT_CAPACITY};
use crate::log_buffer::{LogBuffer, Utf8Decoder};
use crate::resolve::resolve_command;
use crate::terminate;

const READ_CHUNK: usize = 8 * 1024;
/// How long to keep reading pipes after the process exits.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Result of [`ProcessSupervisor::start`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartOutcome {
    pub started: bool,
    pub pid: Option<u32>,
    pub command: String,
    /// True when a process was already running and nothing was spawned.
    pub already_running: bool,
}

/// One entry of the running registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningProcess {
    pub id: PlaygroundId,
    pub pid: Option<u32>,
    pub command: String,
}

#[derive(Default)]
struct State {
    running: HashMap<PlaygroundId, RunningProcess>,
    logs: HashMap<PlaygroundId, LogBuffer>,
    start_gates: HashMap<PlaygroundId, Arc<tokio::sync::Mutex<()>>>,
}

struct Inner {
    store: MetadataStore,
    catalog: Arc<Catalog>,
    state: Mutex<State>,
    events: broadcast::Sender<DevEvent>,
}

/// Spawns, tracks and stops dev commands of clone-backed playgrounds.
///
/// Cheap to clone; every clone shares one registry, one set of log buffers
/// and one event channel. Construct once per process.
#[derive(Clone)]
pub struct ProcessSupervisor {
    inner: Arc<Inner>,
}

impl ProcessSupervisor {
    pub fn new(store: MetadataStore, catalog: Arc<Catalog>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                store,
                catalog,
                state: Mutex::new(State::default()),
                events,
            }),
        }
    }

    /// Receive every event published from now on. No replay; use
    /// [`ProcessSupervisor::get_log`] for what came before.
    pub fn subscribe(&self) -> broadcast::Receiver<DevEvent> {
        self.inner.events.subscribe()
    }

    /// Start the dev command for `id`, or report the one already running.
    ///
    /// Concurrent starts for one id are serialized; only the first spawns.
    pub async fn start(
        &self,
        id: &PlaygroundId,
        command: Option<&str>,
    ) -> Result<StartOutcome, PlaygroundError> {
        let gate = self.inner.start_gate(id);
        let outcome = {
            let _guard = gate.lock().await;
            self.start_gated(id, command).await
        };
        drop(gate);
        self.inner.release_gate(id);
        outcome
    }

    async fn start_gated(
        &self,
        id: &PlaygroundId,
        command: Option<&str>,
    ) -> Result<StartOutcome, PlaygroundError> {
        if let Some(existing) = self.inner.lock().running.get(id).cloned() {
            tracing::debug!(id = %id, pid = ?existing.pid, "dev command already running");
            return Ok(StartOutcome {
                started: true,
                pid: existing.pid,
                command: existing.command,
                already_running: true,
            });
        }

        let record = self.load_repo(id).await?;
        let resolved = resolve_command(&record, command, &self.inner.catalog)?;
        tracing::info!(
            id = %id,
            command = %resolved.command,
            source = ?resolved.source,
            "starting dev command"
        );

        self.inner.reset_log(id, &format!("$ {}\n", resolved.command));

        let mut child = match spawn_shell(&record, &resolved.command) {
            Ok(child) => child,
            Err(err) => {
                tracing::error!(id = %id, error = %err, "dev command failed to spawn");
                self.inner.append(id, &format!("[failed to start: {err}]\n"));
                return Err(err);
            }
        };
        let pid = child.id();
        let stdout = OutputStream::new(child.stdout.take());
        let stderr = OutputStream::new(child.stderr.take());

        self.inner.lock().running.insert(
            id.clone(),
            RunningProcess {
                id: id.clone(),
                pid,
                command: resolved.command.clone(),
            },
        );
        tokio::spawn(supervise(
            self.inner.clone(),
            id.clone(),
            child,
            stdout,
            stderr,
        ));

        Ok(StartOutcome {
            started: true,
            pid,
            command: resolved.command,
            already_running: false,
        })
    }

    /// Request termination of the running command for `id`.
    ///
    /// Returns `false` when nothing is running. Does not wait; the registry
    /// entry is removed and the exit event published when the process is
    /// actually reaped.
    pub fn stop(&self, id: &PlaygroundId) -> bool {
        let pid = match self.inner.lock().running.get(id) {
            Some(entry) => entry.pid,
            None => return false,
        };
        tracing::info!(id = %id, pid = ?pid, "stopping dev command");
        if let Some(pid) = pid {
            terminate::request_termination(pid);
        }
        true
    }

    pub fn get_log(&self, id: &PlaygroundId) -> DevLog {
        let state = self.inner.lock();
        DevLog {
            running: state.running.contains_key(id),
            log: state
                .logs
                .get(id)
                .map(|buf| buf.as_str().to_string())
                .unwrap_or_default(),
        }
    }

    pub fn is_running(&self, id: &PlaygroundId) -> bool {
        self.inner.lock().running.contains_key(id)
    }

    /// Snapshot of the running registry, sorted by id.
    pub fn running(&self) -> Vec<RunningProcess> {
        let mut list: Vec<RunningProcess> = self.inner.lock().running.values().cloned().collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }

    /// Stop every running command; returns how many were signalled.
    pub fn shutdown(&self) -> usize {
        let ids: Vec<PlaygroundId> = self.inner.lock().running.keys().cloned().collect();
        ids.iter().filter(|id| self.stop(id)).count()
    }

    async fn load_repo(&self, id: &PlaygroundId) -> Result<RepoPlayground, PlaygroundError> {
        let store = self.inner.store.clone();
        let lookup = id.clone();
        let found = tokio::task::spawn_blocking(move || store.find(&lookup))
            .await
            .map_err(|e| io_err(self.inner.store.meta_path(), std::io::Error::other(e)))??;
        match found {
            Some(PlaygroundRecord::Repo(record)) => Ok(record),
            _ => Err(PlaygroundError::not_found(id.as_str())),
        }
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start_gate(&self, id: &PlaygroundId) -> Arc<tokio::sync::Mutex<()>> {
        self.lock().start_gates.entry(id.clone()).or_default().clone()
    }

    /// Drop the gate for `id` once no other start is holding or waiting on it.
    fn release_gate(&self, id: &PlaygroundId) {
        let mut state = self.lock();
        if state
            .start_gates
            .get(id)
            .is_some_and(|gate| Arc::strong_count(gate) == 1)
        {
            state.start_gates.remove(id);
        }
    }

    /// Append and publish under one lock so snapshot and stream agree on order.
    fn append(&self, id: &PlaygroundId, chunk: &str) {
        if chunk.is_empty() {
            return;
        }
        let mut state = self.lock();
        state.logs.entry(id.clone()).or_default().push(chunk);
        let _ = self.events.send(DevEvent::Log {
            id: id.clone(),
            chunk: chunk.to_string(),
        });
    }

    fn reset_log(&self, id: &PlaygroundId, first_line: &str) {
        let mut state = self.lock();
        let buf = state.logs.entry(id.clone()).or_default();
        buf.clear();
        buf.push(first_line);
        let _ = self.events.send(DevEvent::Log {
            id: id.clone(),
            chunk: first_line.to_string(),
        });
    }

    fn finish(&self, id: &PlaygroundId, code: Option<i32>, signal: Option<String>) {
        let marker = exit_marker(code, signal.as_deref());
        let mut state = self.lock();
        state.logs.entry(id.clone()).or_default().push(&marker);
        let _ = self.events.send(DevEvent::Log {
            id: id.clone(),
            chunk: marker,
        });
        state.running.remove(id);
        let _ = self.events.send(DevEvent::Exit {
            id: id.clone(),
            code,
            signal,
        });
    }
}

fn spawn_shell(record: &RepoPlayground, command: &str) -> Result<Child, PlaygroundError> {
    let mut cmd = tools::shell_command(command);
    cmd.current_dir(&record.path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(port) = record.port {
        cmd.env("PORT", port.to_string());
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }
    tokio::process::Command::from(cmd)
        .spawn()
        .map_err(|e| io_err(&record.path, e))
}

/// Owns both output pipes and the child until it is reaped.
async fn supervise<O, E>(
    inner: Arc<Inner>,
    id: PlaygroundId,
    mut child: Child,
    mut stdout: OutputStream<O>,
    mut stderr: OutputStream<E>,
) where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let status = loop {
        tokio::select! {
            chunk = stdout.next_chunk() => inner.append(&id, &chunk),
            chunk = stderr.next_chunk() => inner.append(&id, &chunk),
            status = child.wait() => break status,
        }
    };

    let drain = async {
        while !(stdout.is_done() && stderr.is_done()) {
            tokio::select! {
                chunk = stdout.next_chunk() => inner.append(&id, &chunk),
                chunk = stderr.next_chunk() => inner.append(&id, &chunk),
            }
        }
    };
    if tokio::time::timeout(DRAIN_GRACE, drain).await.is_err() {
        tracing::debug!(id = %id, "output pipes still open after exit; detaching");
    }

    let (code, signal) = match status {
        Ok(status) => (status.code(), exit_signal(&status)),
        Err(err) => {
            tracing::warn!(id = %id, error = %err, "failed to reap dev command");
            (None, None)
        }
    };
    tracing::info!(id = %id, code = ?code, signal = ?signal, "dev command exited");
    inner.finish(&id, code, signal);
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<String> {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map(terminate::signal_name)
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<String> {
    None
}

/// One pipe of the child, decoded incrementally.
struct OutputStream<R> {
    reader: Option<R>,
    decoder: Utf8Decoder,
    buf: Box<[u8]>,
}

impl<R: AsyncRead + Unpin> OutputStream<R> {
    fn new(reader: Option<R>) -> Self {
        Self {
            reader,
            decoder: Utf8Decoder::default(),
            buf: vec![0u8; READ_CHUNK].into_boxed_slice(),
        }
    }

    fn is_done(&self) -> bool {
        self.reader.is_none()
    }

    /// Next decoded text (possibly empty). Never resolves after end of stream.
    async fn next_chunk(&mut self) -> String {
        let Some(reader) = self.reader.as_mut() else {
            return std::future::pending().await;
        };
        match reader.read(&mut self.buf).await {
            Ok(0) | Err(_) => {
                self.reader = None;
                self.decoder.finish()
            }
            Ok(n) => self.decoder.decode(&self.buf[..n]),
        }
    }
}
