use std::fs;
use std::io::ErrorKind;
use std::os::unix::net::UnixStream as StdUnixStream;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast::{self, error::RecvError};

use playground_core::{PlaygroundError, PlaygroundId};
use playground_lifecycle::{NewRepo, Playgrounds};
use playground_supervisor::DevEvent;

use crate::error::{io_err, DaemonError};
use crate::paths::{run_dir, socket_path};
use crate::protocol::{DaemonRequest, DaemonResponse};

/// Start the daemon runtime and block the current thread until it exits.
pub fn start_blocking(home: &Path) -> Result<(), DaemonError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(home.to_path_buf()))
}

/// Run the daemon for the playgrounds under `home`.
pub async fn run(home: PathBuf) -> Result<(), DaemonError> {
    let playgrounds = Playgrounds::open(&home)?;
    serve(playgrounds).await
}

/// Serve `playgrounds` on its socket until a `stop` request or ctrl-c.
pub async fn serve(playgrounds: Playgrounds) -> Result<(), DaemonError> {
    let home = playgrounds.home().to_path_buf();
    ensure_runtime_dirs(&home)?;
    let started_at_unix = unix_seconds_now();

    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let socket_handle = {
        let shutdown = shutdown_tx.clone();
        let playgrounds = playgrounds.clone();
        tokio::spawn(async move {
            let result = socket_server_task(
                playgrounds,
                shutdown.clone(),
                shutdown.subscribe(),
                started_at_unix,
            )
            .await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, shutting down daemon");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(DaemonError::Protocol(format!("ctrl-c handler failed: {err}"))),
                    }
                }
            }
        })
    };

    let (socket_result, signal_result) = tokio::join!(socket_handle, signal_handle);

    let stopped = playgrounds.supervisor().shutdown();
    if stopped > 0 {
        tracing::info!(stopped, "stopped running dev commands");
    }

    handle_join("socket_server", socket_result)?;
    handle_join("signal_handler", signal_result)?;
    Ok(())
}

async fn socket_server_task(
    playgrounds: Playgrounds,
    shutdown_tx: broadcast::Sender<()>,
    mut shutdown_rx: broadcast::Receiver<()>,
    started_at_unix: u64,
) -> Result<(), DaemonError> {
    let socket = socket_path(playgrounds.home());
    prepare_socket_for_bind(&socket)?;

    let listener = UnixListener::bind(&socket).map_err(|e| io_err(&socket, e))?;
    set_socket_permissions(&socket)?;
    tracing::info!(socket = %socket.display(), "daemon listening");

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            accepted = listener.accept() => {
                let (stream, _) = accepted.map_err(|e| io_err(&socket, e))?;
                let playgrounds = playgrounds.clone();
                let shutdown_tx = shutdown_tx.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_socket_client(
                        stream,
                        playgrounds,
                        shutdown_tx,
                        started_at_unix,
                    ).await {
                        tracing::error!(error = %err, "socket client error");
                    }
                });
            }
        }
    }

    if socket.exists() {
        let _ = fs::remove_file(&socket);
    }
    Ok(())
}

async fn handle_socket_client(
    stream: UnixStream,
    playgrounds: Playgrounds,
    shutdown_tx: broadcast::Sender<()>,
    started_at_unix: u64,
) -> Result<(), DaemonError> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| io_err("daemon socket read", e))?
    {
        if line.trim().is_empty() {
            continue;
        }

        let request = match serde_json::from_str::<DaemonRequest>(&line) {
            Ok(request) => request,
            Err(err) => {
                write_response(
                    &mut writer,
                    &DaemonResponse::error(format!("invalid request: {err}")),
                )
                .await?;
                continue;
            }
        };
        tracing::debug!(request = ?request, "socket request");

        match request {
            DaemonRequest::Status => {
                let payload = status_payload(&playgrounds, started_at_unix);
                write_response(&mut writer, &DaemonResponse::ok(payload)).await?;
            }
            DaemonRequest::Stop => {
                let _ = shutdown_tx.send(());
                write_response(&mut writer, &DaemonResponse::ok(json!({ "stopping": true })))
                    .await?;
                break;
            }
            DaemonRequest::Subscribe { id } => {
                // Subscribe before taking the snapshot so nothing falls between.
                let events = playgrounds.supervisor().subscribe();
                let snapshot = match &id {
                    Some(id) => json!(playgrounds.supervisor().get_log(id)),
                    None => json!({ "running": playgrounds.supervisor().running() }),
                };
                write_response(&mut writer, &DaemonResponse::ok(snapshot)).await?;
                stream_events(&mut writer, events, id, shutdown_tx.subscribe()).await;
                break;
            }
            other => {
                let response = dispatch(&playgrounds, other).await;
                write_response(&mut writer, &response).await?;
            }
        }
    }

    Ok(())
}

/// Forward supervisor events to the client until it goes away, the
/// filtered id exits, or the daemon shuts down.
async fn stream_events(
    writer: &mut OwnedWriteHalf,
    mut events: broadcast::Receiver<DevEvent>,
    filter: Option<PlaygroundId>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => return,
            received = events.recv() => match received {
                Ok(event) => {
                    if filter.as_ref().is_some_and(|id| event.id() != id) {
                        continue;
                    }
                    let last = filter.is_some() && event.is_exit();
                    if let Err(err) = write_line(writer, &event).await {
                        tracing::debug!(error = %err, "subscriber went away");
                        return;
                    }
                    if last {
                        return;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "subscriber lagged; events dropped");
                }
                Err(RecvError::Closed) => return,
            }
        }
    }
}

/// Map one request onto a playground operation.
///
/// `stop` and `subscribe` only mean something on a daemon connection and are
/// rejected here.
pub async fn dispatch(playgrounds: &Playgrounds, request: DaemonRequest) -> DaemonResponse {
    match execute(playgrounds, request).await {
        Ok(data) => DaemonResponse::ok(data),
        Err(err) => {
            tracing::debug!(error = %err, "request failed");
            DaemonResponse::from(&err)
        }
    }
}

async fn execute(playgrounds: &Playgrounds, request: DaemonRequest) -> Result<Value, DaemonError> {
    match request {
        DaemonRequest::Status => Ok(status_payload(playgrounds, unix_seconds_now())),
        DaemonRequest::Stop | DaemonRequest::Subscribe { .. } => Err(DaemonError::Protocol(
            "this request needs a running daemon".to_string(),
        )),
        DaemonRequest::Paths => Ok(json!(playgrounds.paths())),
        DaemonRequest::List => blocking(playgrounds, |p| p.list()).await,
        DaemonRequest::CreateRepo {
            repo_url,
            run_command,
            port,
        } => {
            blocking(playgrounds, move |p| {
                p.create_repo(NewRepo {
                    repo_url,
                    run_command,
                    port,
                    app_store_id: None,
                })
            })
            .await
        }
        DaemonRequest::CreateContainer(new) => {
            blocking(playgrounds, move |p| p.create_container(new)).await
        }
        DaemonRequest::Delete { id } => blocking(playgrounds, move |p| p.delete(&id)).await,
        DaemonRequest::OpenEditor { id } => {
            blocking(playgrounds, move |p| p.open_editor(&id).map(|()| json!({ "opened": true })))
                .await
        }
        DaemonRequest::OpenTerminal { id } => {
            blocking(playgrounds, move |p| {
                p.open_terminal(&id).map(|()| json!({ "opened": true }))
            })
            .await
        }
        DaemonRequest::OpenRoot => {
            blocking(playgrounds, |p| p.open_root().map(|()| json!({ "opened": true }))).await
        }
        DaemonRequest::DockerInstalled => {
            blocking(playgrounds, |p| {
                Ok(json!({ "installed": p.runtime_available() }))
            })
            .await
        }
        DaemonRequest::DockerStop { container_id } => {
            blocking(playgrounds, move |p| {
                p.stop_container(&container_id)
                    .map(|()| json!({ "stopped": container_id }))
            })
            .await
        }
        DaemonRequest::DockerRemove { container_id } => {
            blocking(playgrounds, move |p| {
                p.remove_container(&container_id)
                    .map(|()| json!({ "removed": container_id }))
            })
            .await
        }
        DaemonRequest::DevStart { id, command } => {
            let outcome = playgrounds
                .supervisor()
                .start(&id, command.as_deref())
                .await?;
            Ok(json!(outcome))
        }
        DaemonRequest::DevStop { id } => {
            let stopped = playgrounds.supervisor().stop(&id);
            Ok(json!({ "stopped": stopped }))
        }
        DaemonRequest::DevLog { id } => Ok(json!(playgrounds.supervisor().get_log(&id))),
        DaemonRequest::Catalog => Ok(json!(playgrounds.catalog().apps())),
        DaemonRequest::Install { app_id } => {
            blocking(playgrounds, move |p| p.install_app(&app_id)).await
        }
    }
}

/// Run a filesystem/external-tool operation off the async workers.
async fn blocking<T, F>(playgrounds: &Playgrounds, f: F) -> Result<Value, DaemonError>
where
    T: Serialize + Send + 'static,
    F: FnOnce(&Playgrounds) -> Result<T, PlaygroundError> + Send + 'static,
{
    let playgrounds = playgrounds.clone();
    let value = tokio::task::spawn_blocking(move || f(&playgrounds))
        .await
        .map_err(|err| DaemonError::Protocol(format!("blocking task failed: {err}")))??;
    Ok(serde_json::to_value(value)?)
}

fn status_payload(playgrounds: &Playgrounds, started_at_unix: u64) -> Value {
    json!({
        "running": true,
        "pid": std::process::id(),
        "started_at_unix": started_at_unix,
        "socket": socket_path(playgrounds.home()),
        "dev_processes": playgrounds.supervisor().running(),
    })
}

fn prepare_socket_for_bind(socket: &Path) -> Result<(), DaemonError> {
    if !socket.exists() {
        return Ok(());
    }

    match StdUnixStream::connect(socket) {
        Ok(_) => {
            return Err(DaemonError::Protocol(format!(
                "daemon socket already in use: {}",
                socket.display()
            )));
        }
        Err(err) => {
            tracing::warn!(
                socket = %socket.display(),
                error = %err,
                "removing stale daemon socket before bind",
            );
        }
    }

    match fs::remove_file(socket) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(socket, err)),
    }
}

fn ensure_runtime_dirs(home: &Path) -> Result<(), DaemonError> {
    let run = run_dir(home);
    if !run.exists() {
        fs::create_dir_all(&run).map_err(|e| io_err(&run, e))?;
    }
    Ok(())
}

async fn write_line<T: Serialize>(
    writer: &mut OwnedWriteHalf,
    value: &T,
) -> Result<(), DaemonError> {
    let payload = serde_json::to_string(value)?;
    writer
        .write_all(payload.as_bytes())
        .await
        .map_err(|e| io_err("daemon socket write", e))?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| io_err("daemon socket write", e))?;
    writer
        .flush()
        .await
        .map_err(|e| io_err("daemon socket flush", e))?;
    Ok(())
}

async fn write_response(
    writer: &mut OwnedWriteHalf,
    response: &DaemonResponse,
) -> Result<(), DaemonError> {
    write_line(writer, response).await
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Protocol(format!(
            "{task} task join failure: {err}"
        ))),
    }
}

fn unix_seconds_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// `RUST_LOG`-style filter, default `info`; `PLAYGROUND_LOG_FORMAT=json`
/// switches to JSON lines.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("PLAYGROUND_LOG_FORMAT").is_ok_and(|v| v == "json");
    let _ = if json {
        fmt().json().with_env_filter(filter).try_init()
    } else {
        fmt().with_env_filter(filter).with_target(false).try_init()
    };
}

#[cfg(unix)]
fn set_socket_permissions(path: &Path) -> Result<(), DaemonError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_socket_permissions(_path: &Path) -> Result<(), DaemonError> {
    Ok(())
}
