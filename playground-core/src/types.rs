//! Domain types for the playground registry.
//!
//! All path fields use `PathBuf`. Field names on the wire are camelCase and the
//! record discriminant is the `type` field (`"github"` / `"docker"`), so an
//! existing `meta.json` keeps loading.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Identifier of a playground record. Derived once at creation, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlaygroundId(pub String);

impl PlaygroundId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaygroundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for PlaygroundId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PlaygroundId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Identifier of an app catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppId(pub String);

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for AppId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AppId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A playground backed by a shallow clone of a source-control URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoPlayground {
    pub id: PlaygroundId,
    pub repo_url: String,
    /// Absolute path to the clone on disk.
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_store_id: Option<AppId>,
}

/// A playground backed by a detached container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPlayground {
    pub id: PlaygroundId,
    pub image: String,
    /// Identifier assigned by the container runtime.
    pub container_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    pub created_at: DateTime<Utc>,
}

/// One persisted playground.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlaygroundRecord {
    #[serde(rename = "github")]
    Repo(RepoPlayground),
    #[serde(rename = "docker")]
    Container(ContainerPlayground),
}

impl PlaygroundRecord {
    pub fn id(&self) -> &PlaygroundId {
        match self {
            PlaygroundRecord::Repo(r) => &r.id,
            PlaygroundRecord::Container(c) => &c.id,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            PlaygroundRecord::Repo(r) => r.created_at,
            PlaygroundRecord::Container(c) => c.created_at,
        }
    }

    pub fn port(&self) -> Option<u16> {
        match self {
            PlaygroundRecord::Repo(r) => r.port,
            PlaygroundRecord::Container(c) => c.port,
        }
    }

    /// Wire discriminant: `"github"` or `"docker"`.
    pub fn type_label(&self) -> &'static str {
        match self {
            PlaygroundRecord::Repo(_) => "github",
            PlaygroundRecord::Container(_) => "docker",
        }
    }

    pub fn as_repo(&self) -> Option<&RepoPlayground> {
        match self {
            PlaygroundRecord::Repo(r) => Some(r),
            PlaygroundRecord::Container(_) => None,
        }
    }
}

impl From<RepoPlayground> for PlaygroundRecord {
    fn from(r: RepoPlayground) -> Self {
        PlaygroundRecord::Repo(r)
    }
}

impl From<ContainerPlayground> for PlaygroundRecord {
    fn from(c: ContainerPlayground) -> Self {
        PlaygroundRecord::Container(c)
    }
}

// ---------------------------------------------------------------------------
// Live views (never persisted)
// ---------------------------------------------------------------------------

/// Live run-state of a container, as reported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerStatus {
    Running,
    Stopped,
    Unknown,
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerStatus::Running => write!(f, "Running"),
            ContainerStatus::Stopped => write!(f, "Stopped"),
            ContainerStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A record enriched with live status for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaygroundView {
    #[serde(flatten)]
    pub record: PlaygroundRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ContainerStatus>,
}

/// Snapshot of a supervised dev process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DevLog {
    pub running: bool,
    pub log: String,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// An installable app descriptor from the static catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogApp {
    pub id: AppId,
    pub name: String,
    pub description: String,
    #[serde(alias = "sourceUrl")]
    pub repo_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_run_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_command: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
