//! Home-rooted layout.
//!
//! ```text
//! <home>/.playgrounds/
//!   meta.json      (metadata store)
//!   config.yaml    (optional)
//!   apps/          (default catalog directory)
//!   github/<id>/   (one clone per repo playground)
//!   run/           (daemon socket)
//! ```
//!
//! Every helper takes `home` explicitly; tests pass a `TempDir`.

use std::path::{Path, PathBuf};

use crate::error::PlaygroundError;

pub const BASE_DIR: &str = ".playgrounds";
pub const REPOS_DIR: &str = "github";
pub const META_FILE: &str = "meta.json";
pub const CONFIG_FILE: &str = "config.yaml";
pub const APPS_DIR: &str = "apps";
pub const RUN_DIR: &str = "run";

pub fn base_dir_at(home: &Path) -> PathBuf {
    home.join(BASE_DIR)
}

pub fn repos_dir_at(home: &Path) -> PathBuf {
    base_dir_at(home).join(REPOS_DIR)
}

pub fn meta_path_at(home: &Path) -> PathBuf {
    base_dir_at(home).join(META_FILE)
}

pub fn config_path_at(home: &Path) -> PathBuf {
    base_dir_at(home).join(CONFIG_FILE)
}

pub fn default_catalog_dir_at(home: &Path) -> PathBuf {
    base_dir_at(home).join(APPS_DIR)
}

pub fn run_dir_at(home: &Path) -> PathBuf {
    base_dir_at(home).join(RUN_DIR)
}

/// The current user's home directory.
pub fn home() -> Result<PathBuf, PlaygroundError> {
    dirs::home_dir().ok_or(PlaygroundError::HomeNotFound)
}
