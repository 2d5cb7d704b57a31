//! The [`Playgrounds`] facade.
//!
//! One value per process: it owns the loaded config, the cached catalog, the
//! metadata store and the single [`ProcessSupervisor`]. Lifecycle operations
//! are split across `repo`, `container` and `launch` as further `impl` blocks.
//! Every method here blocks on the filesystem or external tools; async
//! callers run them on `spawn_blocking`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use playground_core::{
    config, paths, Catalog, Config, MetadataStore, PlaygroundError, PlaygroundId,
    PlaygroundRecord, PlaygroundView, RepoPlayground,
};
use playground_supervisor::ProcessSupervisor;

use crate::cleanup::DeleteReport;
use crate::status::StatusProber;

/// Filesystem locations in effect, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsInfo {
    pub base_dir: PathBuf,
    pub repos_dir: PathBuf,
    pub meta_path: PathBuf,
    pub catalog_dir: PathBuf,
}

#[derive(Clone)]
pub struct Playgrounds {
    home: PathBuf,
    config: Config,
    store: MetadataStore,
    catalog: Arc<Catalog>,
    supervisor: ProcessSupervisor,
}

impl Playgrounds {
    /// Load `config.yaml` and the catalog under `home`.
    pub fn open(home: &Path) -> Result<Self, PlaygroundError> {
        let config = config::load_at(home)?;
        let catalog = Catalog::load(&config.catalog_dir_at(home));
        tracing::debug!(
            home = %home.display(),
            apps = catalog.apps().len(),
            "playgrounds opened"
        );
        Ok(Self::with_parts(home, config, catalog))
    }

    pub fn with_parts(home: &Path, config: Config, catalog: Catalog) -> Self {
        let store = MetadataStore::at(home);
        let catalog = Arc::new(catalog);
        let supervisor = ProcessSupervisor::new(store.clone(), catalog.clone());
        Self {
            home: home.to_path_buf(),
            config,
            store,
            catalog,
            supervisor,
        }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn supervisor(&self) -> &ProcessSupervisor {
        &self.supervisor
    }

    pub fn prober(&self) -> StatusProber {
        StatusProber::new(self.config.tools.container_runtime.clone())
    }

    pub fn paths(&self) -> PathsInfo {
        PathsInfo {
            base_dir: paths::base_dir_at(&self.home),
            repos_dir: paths::repos_dir_at(&self.home),
            meta_path: paths::meta_path_at(&self.home),
            catalog_dir: self.config.catalog_dir_at(&self.home),
        }
    }

    /// Every record, most recent first; containers carry a live status.
    pub fn list(&self) -> Result<Vec<PlaygroundView>, PlaygroundError> {
        let prober = self.prober();
        let views = self
            .store
            .read_all()?
            .into_iter()
            .map(|record| {
                let status = match &record {
                    PlaygroundRecord::Container(c) => Some(prober.status(&c.container_id)),
                    PlaygroundRecord::Repo(_) => None,
                };
                PlaygroundView { record, status }
            })
            .collect();
        Ok(views)
    }

    pub fn find(&self, id: &PlaygroundId) -> Result<PlaygroundRecord, PlaygroundError> {
        self.store
            .find(id)?
            .ok_or_else(|| PlaygroundError::not_found(id.as_str()))
    }

    /// Delete by id, dispatching on the record type.
    pub fn delete(&self, id: &PlaygroundId) -> Result<DeleteReport, PlaygroundError> {
        match self.find(id)? {
            PlaygroundRecord::Repo(_) => self.delete_repo(id),
            PlaygroundRecord::Container(_) => self.delete_container(id),
        }
    }

    pub(crate) fn find_repo(&self, id: &PlaygroundId) -> Result<RepoPlayground, PlaygroundError> {
        match self.store.find(id)? {
            Some(PlaygroundRecord::Repo(record)) => Ok(record),
            _ => Err(PlaygroundError::not_found(id.as_str())),
        }
    }

    pub(crate) fn remove_entry(
        &self,
        list: Vec<PlaygroundRecord>,
        id: &PlaygroundId,
    ) -> Result<(), PlaygroundError> {
        let remaining: Vec<PlaygroundRecord> =
            list.into_iter().filter(|r| r.id() != id).collect();
        self.store.write_all(&remaining)
    }
}
