//! Error types for playground-core.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors surfaced by lifecycle and supervisor entry points.
#[derive(Debug, Error)]
pub enum PlaygroundError {
    /// Malformed caller input (bad URL, empty image, ...).
    #[error("invalid input: {0}")]
    Validation(String),

    /// A required external binary could not be resolved.
    #[error("{tool} not found in PATH")]
    ToolNotFound { tool: String },

    /// No record with this id exists (or it has the wrong type for the operation).
    #[error("playground '{id}' not found")]
    PlaygroundNotFound { id: String },

    /// No catalog entry with this id exists.
    #[error("app with id \"{id}\" not found in catalog")]
    AppNotFound { id: String },

    /// A record already references this catalog app.
    #[error("app \"{name}\" is already installed")]
    AlreadyInstalled { app_id: String, name: String },

    /// An external tool ran and reported failure.
    #[error("`{command}` failed ({status}): {stderr}")]
    ExternalTool {
        command: String,
        status: String,
        stderr: String,
    },

    /// No source yielded a dev command for a playground.
    #[error("no dev command configured for {id} (tried: {})", .attempted.join("; "))]
    NoDevCommand { id: String, attempted: Vec<String> },

    /// Filesystem failure, with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Metadata serialization error (write path only; reads degrade instead).
    #[error("metadata JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `config.yaml` exists but does not parse.
    #[error("failed to parse config at {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

/// Coarse error category, stable across the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    ToolNotFound,
    NotFound,
    AlreadyInstalled,
    ExternalToolFailure,
    Io,
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::ToolNotFound => "tool_not_found",
            ErrorKind::NotFound => "not_found",
            ErrorKind::AlreadyInstalled => "already_installed",
            ErrorKind::ExternalToolFailure => "external_tool_failure",
            ErrorKind::Io => "io",
            ErrorKind::Config => "config",
        };
        f.write_str(s)
    }
}

impl PlaygroundError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlaygroundError::Validation(_) | PlaygroundError::NoDevCommand { .. } => {
                ErrorKind::Validation
            }
            PlaygroundError::ToolNotFound { .. } => ErrorKind::ToolNotFound,
            PlaygroundError::PlaygroundNotFound { .. } | PlaygroundError::AppNotFound { .. } => {
                ErrorKind::NotFound
            }
            PlaygroundError::AlreadyInstalled { .. } => ErrorKind::AlreadyInstalled,
            PlaygroundError::ExternalTool { .. } => ErrorKind::ExternalToolFailure,
            PlaygroundError::Io { .. }
            | PlaygroundError::Json(_)
            | PlaygroundError::HomeNotFound => ErrorKind::Io,
            PlaygroundError::Config { .. } => ErrorKind::Config,
        }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        PlaygroundError::PlaygroundNotFound { id: id.into() }
    }
}

/// Convenience constructor for [`PlaygroundError::Io`].
pub fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> PlaygroundError {
    PlaygroundError::Io {
        path: path.into(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_group_related_variants() {
        assert_eq!(PlaygroundError::not_found("x").kind(), ErrorKind::NotFound);
        assert_eq!(
            PlaygroundError::AppNotFound { id: "a".into() }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            PlaygroundError::NoDevCommand {
                id: "x".into(),
                attempted: vec![]
            }
            .kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn no_dev_command_message_lists_sources() {
        let err = PlaygroundError::NoDevCommand {
            id: "widget-1".into(),
            attempted: vec!["no explicit command".into(), "no stored runCommand".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("widget-1"));
        assert!(msg.contains("no explicit command; no stored runCommand"));
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::ExternalToolFailure).unwrap();
        assert_eq!(json, "\"external_tool_failure\"");
    }
}
