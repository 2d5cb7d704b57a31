use std::path::PathBuf;

use playground_core::{ErrorKind, PlaygroundError};
use thiserror::Error;

/// Error surface for the daemon runtime and its client protocol.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Playground(#[from] PlaygroundError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("daemon protocol error: {0}")]
    Protocol(String),

    /// The daemon answered with `ok: false`.
    #[error("{message}")]
    Rejected {
        kind: Option<ErrorKind>,
        message: String,
    },

    #[error("daemon is not running (socket missing: {socket})")]
    DaemonNotRunning { socket: PathBuf },
}

impl DaemonError {
    /// Error kind carried over the wire, when there is one.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            DaemonError::Playground(err) => Some(err.kind()),
            DaemonError::Rejected { kind, .. } => *kind,
            DaemonError::Io { .. } => Some(ErrorKind::Io),
            _ => None,
        }
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
