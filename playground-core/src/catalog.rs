//! Static app catalog.
//!
//! One descriptor per file in the catalog directory (`<id>.json`, `<id>.yaml`
//! or `<id>.yml`). Loaded once and held for the life of the process; callers
//! share it behind an `Arc`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::types::{AppId, CatalogApp};

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    apps: Vec<CatalogApp>,
}

/// Descriptor as written on disk; required fields are checked after parsing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawApp {
    id: Option<String>,
    name: Option<String>,
    description: Option<String>,
    #[serde(alias = "sourceUrl")]
    repo_url: Option<String>,
    default_run_command: Option<String>,
    default_port: Option<u16>,
    delete_command: Option<String>,
}

impl Catalog {
    /// Load every descriptor in `dir`, in file-name order.
    ///
    /// Never fails: a missing directory is an empty catalog, bad files are
    /// skipped with a warning.
    pub fn load(dir: &Path) -> Self {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(dir = %dir.display(), error = %err, "app catalog directory unavailable");
                return Self::default();
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && descriptor_format(p).is_some())
            .collect();
        files.sort();

        let apps = files.iter().filter_map(|path| load_descriptor(path)).collect();
        Self { apps }
    }

    pub fn from_apps(apps: Vec<CatalogApp>) -> Self {
        Self { apps }
    }

    pub fn apps(&self) -> &[CatalogApp] {
        &self.apps
    }

    /// Lookup by id; unknown ids are `None`.
    pub fn get(&self, id: &AppId) -> Option<&CatalogApp> {
        self.apps.iter().find(|app| &app.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

fn descriptor_format(path: &Path) -> Option<Format> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Some(Format::Json),
        Some("yaml") | Some("yml") => Some(Format::Yaml),
        _ => None,
    }
}

fn load_descriptor(path: &Path) -> Option<CatalogApp> {
    let format = descriptor_format(path)?;
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(err) => {
            tracing::error!(file = %path.display(), error = %err, "error reading app descriptor");
            return None;
        }
    };
    let parsed: Result<RawApp, String> = match format {
        Format::Json => serde_json::from_str(&contents).map_err(|e| e.to_string()),
        Format::Yaml => serde_yaml::from_str(&contents).map_err(|e| e.to_string()),
    };
    let raw = match parsed {
        Ok(raw) => raw,
        Err(err) => {
            tracing::error!(file = %path.display(), error = %err, "error parsing app descriptor");
            return None;
        }
    };

    let (Some(id), Some(name), Some(description), Some(repo_url)) = (
        non_empty(raw.id),
        non_empty(raw.name),
        non_empty(raw.description),
        non_empty(raw.repo_url),
    ) else {
        tracing::warn!(file = %path.display(), "invalid app descriptor: missing required fields");
        return None;
    };

    let stem = path.file_stem()?.to_string_lossy().into_owned();
    let id = if id != stem {
        tracing::warn!(file = %path.display(), expected = %stem, got = %id, "app id mismatch; using file name");
        stem
    } else {
        id
    };

    tracing::debug!(
        app = %id,
        has_run_command = raw.default_run_command.is_some(),
        "loaded app descriptor"
    );

    Some(CatalogApp {
        id: AppId::from(id),
        name,
        description,
        repo_url,
        default_run_command: raw.default_run_command,
        default_port: raw.default_port,
        delete_command: raw.delete_command,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
