//! JSON metadata store.
//!
//! # Storage layout
//!
//! ```text
//! <home>/.playgrounds/
//!   meta.json   (ordered list of records, most recent first)
//!   github/     (created alongside so clones always have a parent)
//! ```
//!
//! The file is rewritten in full on every mutation. There is no temp-file +
//! rename and no lock: two interleaved read-modify-write sequences can lose
//! one update, and a reader racing a writer can observe a torn file (which
//! then reads as empty). Entries that do not decode are skipped one by one;
//! the rest of the list survives.

use std::path::{Path, PathBuf};

use crate::error::{io_err, PlaygroundError};
use crate::paths::{base_dir_at, meta_path_at, repos_dir_at};
use crate::types::{PlaygroundId, PlaygroundRecord};

/// Durable mapping of playground id to record, backed by `meta.json`.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    home: PathBuf,
}

impl MetadataStore {
    /// Store rooted at `<home>/.playgrounds/`.
    pub fn at(home: &Path) -> Self {
        Self {
            home: home.to_path_buf(),
        }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn meta_path(&self) -> PathBuf {
        meta_path_at(&self.home)
    }

    pub fn base_dir(&self) -> PathBuf {
        base_dir_at(&self.home)
    }

    pub fn repos_dir(&self) -> PathBuf {
        repos_dir_at(&self.home)
    }

    /// Create the base and clone directories, and an empty `meta.json` if absent.
    pub fn ensure_dirs(&self) -> Result<(), PlaygroundError> {
        let base = self.base_dir();
        if !base.exists() {
            std::fs::create_dir_all(&base).map_err(|e| io_err(&base, e))?;
            set_dir_permissions(&base)?;
        }
        let repos = self.repos_dir();
        std::fs::create_dir_all(&repos).map_err(|e| io_err(&repos, e))?;
        let meta = self.meta_path();
        if !meta.exists() {
            std::fs::write(&meta, "[]").map_err(|e| io_err(&meta, e))?;
        }
        Ok(())
    }

    /// Every record currently on disk, in stored order.
    ///
    /// Unreadable or malformed content degrades to an empty list.
    pub fn read_all(&self) -> Result<Vec<PlaygroundRecord>, PlaygroundError> {
        self.ensure_dirs()?;
        let path = self.meta_path();
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "metadata unreadable; treating as empty");
                return Ok(Vec::new());
            }
        };
        let entries = match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "metadata malformed; treating as empty");
                return Ok(Vec::new());
            }
        };
        Ok(entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| decode_entry(index, entry))
            .collect())
    }

    /// Replace the file with `list`, pretty-printed with a trailing newline.
    pub fn write_all(&self, list: &[PlaygroundRecord]) -> Result<(), PlaygroundError> {
        self.ensure_dirs()?;
        let path = self.meta_path();
        let mut json = serde_json::to_string_pretty(list)?;
        json.push('\n');
        std::fs::write(&path, json).map_err(|e| io_err(&path, e))?;
        Ok(())
    }

    pub fn find(&self, id: &PlaygroundId) -> Result<Option<PlaygroundRecord>, PlaygroundError> {
        Ok(self.read_all()?.into_iter().find(|r| r.id() == id))
    }

    /// Read, put `record` at the front, write.
    pub fn insert_front(&self, record: PlaygroundRecord) -> Result<(), PlaygroundError> {
        let mut list = self.read_all()?;
        list.insert(0, record);
        self.write_all(&list)
    }
}

fn decode_entry(index: usize, entry: serde_json::Value) -> Option<PlaygroundRecord> {
    let id = entry
        .get("id")
        .and_then(|v| v.as_str())
        .unwrap_or("<none>")
        .to_string();
    match serde_json::from_value(entry) {
        Ok(record) => Some(record),
        Err(err) => {
            tracing::warn!(index, id = %id, error = %err, "skipping unrecognised metadata entry");
            None
        }
    }
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), PlaygroundError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), PlaygroundError> {
    Ok(())
}
