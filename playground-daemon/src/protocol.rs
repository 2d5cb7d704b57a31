use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use playground_core::{AppId, ErrorKind, PlaygroundError, PlaygroundId};
use playground_lifecycle::NewContainer;
use playground_supervisor::DevEvent;

use crate::error::{io_err, DaemonError};
use crate::paths::socket_path;

/// JSON newline-delimited request, tagged by `cmd`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum DaemonRequest {
    Status,
    Stop,
    Paths,
    List,
    CreateRepo {
        repo_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        run_command: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        port: Option<u16>,
    },
    CreateContainer(NewContainer),
    Delete {
        id: PlaygroundId,
    },
    OpenEditor {
        id: PlaygroundId,
    },
    OpenTerminal {
        id: PlaygroundId,
    },
    OpenRoot,
    DockerInstalled,
    DockerStop {
        container_id: String,
    },
    DockerRemove {
        container_id: String,
    },
    DevStart {
        id: PlaygroundId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        command: Option<String>,
    },
    DevStop {
        id: PlaygroundId,
    },
    DevLog {
        id: PlaygroundId,
    },
    Catalog,
    Install {
        app_id: AppId,
    },
    /// Switch the connection to event streaming, optionally for one id.
    Subscribe {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<PlaygroundId>,
    },
}

/// JSON newline-delimited response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl DaemonResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
            kind: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message.into()),
            kind: None,
        }
    }
}

impl From<&DaemonError> for DaemonResponse {
    fn from(err: &DaemonError) -> Self {
        Self {
            kind: err.kind(),
            ..Self::error(err.to_string())
        }
    }
}

impl From<&PlaygroundError> for DaemonResponse {
    fn from(err: &PlaygroundError) -> Self {
        Self {
            kind: Some(err.kind()),
            ..Self::error(err.to_string())
        }
    }
}

fn connect(home: &Path) -> Result<(UnixStream, PathBuf), DaemonError> {
    let socket = socket_path(home);
    if !socket.exists() {
        return Err(DaemonError::DaemonNotRunning { socket });
    }

    let stream = UnixStream::connect(&socket).map_err(|err| {
        if matches!(
            err.kind(),
            std::io::ErrorKind::NotFound
                | std::io::ErrorKind::ConnectionRefused
                | std::io::ErrorKind::ConnectionReset
        ) {
            DaemonError::DaemonNotRunning {
                socket: socket.clone(),
            }
        } else {
            io_err(&socket, err)
        }
    })?;
    Ok((stream, socket))
}

fn write_request(
    stream: &mut UnixStream,
    socket: &Path,
    request: &DaemonRequest,
) -> Result<(), DaemonError> {
    let payload = serde_json::to_string(request)?;
    stream
        .write_all(payload.as_bytes())
        .map_err(|e| io_err(socket, e))?;
    stream.write_all(b"\n").map_err(|e| io_err(socket, e))?;
    stream.flush().map_err(|e| io_err(socket, e))
}

fn read_response(
    reader: &mut BufReader<UnixStream>,
    socket: &Path,
) -> Result<DaemonResponse, DaemonError> {
    let mut line = String::new();
    let read = reader.read_line(&mut line).map_err(|e| io_err(socket, e))?;
    if read == 0 {
        return Err(DaemonError::Protocol(
            "daemon closed connection before responding".to_string(),
        ));
    }
    Ok(serde_json::from_str(line.trim_end())?)
}

/// Send one JSON request to the daemon socket and return one response.
pub fn send_request(home: &Path, request: &DaemonRequest) -> Result<DaemonResponse, DaemonError> {
    let (mut stream, socket) = connect(home)?;
    write_request(&mut stream, &socket, request)?;
    let mut reader = BufReader::new(stream);
    read_response(&mut reader, &socket)
}

/// [`send_request`], unwrapping the response data.
pub fn request(home: &Path, request: &DaemonRequest) -> Result<Value, DaemonError> {
    response_into_data(send_request(home, request)?)
}

pub fn request_status(home: &Path) -> Result<Value, DaemonError> {
    let mut last_not_running: Option<DaemonError> = None;
    for attempt in 0..5 {
        match send_request(home, &DaemonRequest::Status) {
            Ok(response) => return response_into_data(response),
            Err(err @ DaemonError::DaemonNotRunning { .. }) => {
                last_not_running = Some(err);
                if attempt < 4 {
                    sleep(Duration::from_millis(100));
                    continue;
                }
            }
            Err(err) => return Err(err),
        }
    }

    Err(last_not_running.unwrap_or_else(|| {
        DaemonError::Protocol("daemon status retry loop exited unexpectedly".to_string())
    }))
}

pub fn request_stop(home: &Path) -> Result<(), DaemonError> {
    request(home, &DaemonRequest::Stop).map(|_| ())
}

/// Open an event stream. `snapshot` is the daemon's first response data: the
/// log of `id` when given, the running registry otherwise.
pub fn subscribe(home: &Path, id: Option<&PlaygroundId>) -> Result<Subscription, DaemonError> {
    let (mut stream, socket) = connect(home)?;
    write_request(
        &mut stream,
        &socket,
        &DaemonRequest::Subscribe { id: id.cloned() },
    )?;
    let mut reader = BufReader::new(stream);
    let snapshot = response_into_data(read_response(&mut reader, &socket)?)?;
    Ok(Subscription {
        reader,
        socket,
        snapshot,
    })
}

/// Blocking iterator over streamed [`DevEvent`]s; ends when the daemon
/// closes the connection.
pub struct Subscription {
    reader: BufReader<UnixStream>,
    socket: PathBuf,
    pub snapshot: Value,
}

impl Iterator for Subscription {
    type Item = Result<DevEvent, DaemonError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) if line.trim().is_empty() => continue,
                Ok(_) => {
                    return Some(serde_json::from_str(line.trim_end()).map_err(DaemonError::from))
                }
                Err(err) => return Some(Err(io_err(&self.socket, err))),
            }
        }
    }
}

/// Data of a successful response, or [`DaemonError::Rejected`].
pub fn response_into_data(response: DaemonResponse) -> Result<Value, DaemonError> {
    if response.ok {
        Ok(response.data.unwrap_or(Value::Null))
    } else {
        Err(DaemonError::Rejected {
            kind: response.kind,
            message: response
                .error
                .unwrap_or_else(|| "unknown daemon error".to_string()),
        })
    }
}
