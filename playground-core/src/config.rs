//! Optional `config.yaml` under the base directory.
//!
//! ```yaml
//! tools:
//!   git: /usr/local/bin/git
//!   container_runtime: podman
//! editor: zed
//! catalog_dir: /opt/playground-apps
//! ```
//!
//! Every key is optional. A missing file yields [`Config::default`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, PlaygroundError};
use crate::paths::{config_path_at, default_catalog_dir_at};

/// External binaries the lifecycle shells out to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Version-control client; a bare name is looked up on `PATH`.
    pub git: String,
    /// Container runtime CLI (`docker`, `podman`, ...).
    pub container_runtime: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            git: "git".to_string(),
            container_runtime: "docker".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub tools: ToolConfig,
    /// Editor command used by "open in editor" instead of the platform default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
    /// Directory holding catalog descriptors; defaults to `<base>/apps`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_dir: Option<PathBuf>,
}

impl Config {
    pub fn catalog_dir_at(&self, home: &Path) -> PathBuf {
        self.catalog_dir
            .clone()
            .unwrap_or_else(|| default_catalog_dir_at(home))
    }
}

/// Load `<home>/.playgrounds/config.yaml`.
///
/// Returns defaults when absent, [`PlaygroundError::Config`] when malformed.
pub fn load_at(home: &Path) -> Result<Config, PlaygroundError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(&contents).map_err(|source| PlaygroundError::Config { path, source })
}
