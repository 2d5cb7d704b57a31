//! Clone-backed playgrounds.

use std::ffi::OsStr;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use playground_core::error::io_err;
use playground_core::{tools, AppId, PlaygroundError, PlaygroundId, PlaygroundRecord, RepoPlayground};

use crate::cleanup::{best_effort, DeleteReport};
use crate::naming;
use crate::service::Playgrounds;

/// Parameters of [`Playgrounds::create_repo`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRepo {
    pub repo_url: String,
    #[serde(default)]
    pub run_command: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub app_store_id: Option<AppId>,
}

impl NewRepo {
    pub fn url(repo_url: impl Into<String>) -> Self {
        Self {
            repo_url: repo_url.into(),
            ..Self::default()
        }
    }
}

impl Playgrounds {
    /// Shallow-clone `new.repo_url` into a fresh directory and record it.
    pub fn create_repo(&self, new: NewRepo) -> Result<RepoPlayground, PlaygroundError> {
        let git = tools::resolve(&self.config().tools.git)?;
        let url = new.repo_url.trim();
        if !is_clone_url(url) {
            return Err(PlaygroundError::Validation(format!("invalid git URL: {url:?}")));
        }

        let now = Utc::now();
        let (id, dir) = self.reserve_clone_dir(&naming::repo_base_name(url), now)?;
        tracing::info!(id = %id, url, dir = %dir.display(), "cloning repository");

        let clone = tools::run(
            &git,
            [
                OsStr::new("clone"),
                OsStr::new("--depth"),
                OsStr::new("1"),
                OsStr::new(url),
                dir.as_os_str(),
            ],
            None,
        );
        if let Err(err) = clone {
            if let Err(rm) = fs::remove_dir_all(&dir) {
                tracing::warn!(dir = %dir.display(), error = %rm, "failed to remove directory after clone failure");
            }
            return Err(err);
        }

        let record = RepoPlayground {
            id,
            repo_url: url.to_string(),
            path: dir,
            created_at: now,
            run_command: new.run_command.filter(|c| !c.trim().is_empty()),
            port: new.port,
            app_store_id: new.app_store_id,
        };
        self.store().insert_front(record.clone().into())?;
        Ok(record)
    }

    /// Install a catalog app as a clone-backed playground, at most once.
    pub fn install_app(&self, app_id: &AppId) -> Result<RepoPlayground, PlaygroundError> {
        let app = self
            .catalog()
            .get(app_id)
            .cloned()
            .ok_or_else(|| PlaygroundError::AppNotFound {
                id: app_id.to_string(),
            })?;

        let installed = self
            .store()
            .read_all()?
            .iter()
            .filter_map(PlaygroundRecord::as_repo)
            .any(|r| r.app_store_id.as_ref() == Some(app_id));
        if installed {
            return Err(PlaygroundError::AlreadyInstalled {
                app_id: app_id.to_string(),
                name: app.name,
            });
        }

        self.create_repo(NewRepo {
            repo_url: app.repo_url,
            run_command: app.default_run_command,
            port: app.default_port,
            app_store_id: Some(app.id),
        })
    }

    /// Stop, run the app's delete hook, remove the clone, drop the entry.
    ///
    /// Only a missing record is an error; every cleanup step is best-effort
    /// and reported. The list read at the start is the one written back.
    pub fn delete_repo(&self, id: &PlaygroundId) -> Result<DeleteReport, PlaygroundError> {
        let list = self.store().read_all()?;
        let record = list
            .iter()
            .find_map(|r| match r {
                PlaygroundRecord::Repo(repo) if &repo.id == id => Some(repo.clone()),
                _ => None,
            })
            .ok_or_else(|| PlaygroundError::not_found(id.as_str()))?;

        let mut report = DeleteReport::new(id.clone());

        if self.supervisor().is_running(id) {
            best_effort(&mut report, "stop_dev_command", || {
                self.supervisor().stop(id);
                Ok(())
            });
        } else {
            report.skip("stop_dev_command", "not running");
        }

        let hook = record
            .app_store_id
            .as_ref()
            .and_then(|app_id| self.catalog().get(app_id))
            .and_then(|app| app.delete_command.clone())
            .filter(|cmd| !cmd.trim().is_empty());
        match hook {
            Some(_) if !record.path.exists() => report.skip("delete_hook", "directory missing"),
            Some(cmd) => {
                best_effort(&mut report, "delete_hook", || {
                    tools::run_shell(&cmd, &record.path).map(|_| ())
                });
            }
            None => report.skip("delete_hook", "no catalog delete command"),
        }

        if record.path.exists() {
            best_effort(&mut report, "remove_directory", || {
                match fs::remove_dir_all(&record.path) {
                    Ok(()) => Ok(()),
                    Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
                    Err(err) => Err(io_err(&record.path, err)),
                }
            });
        } else {
            report.skip("remove_directory", "directory missing");
        }

        self.remove_entry(list, id)?;
        tracing::info!(id = %id, failures = report.failures().count(), "repo playground deleted");
        Ok(report)
    }

    /// Pick an unused id and exclusively create its directory.
    fn reserve_clone_dir(
        &self,
        base: &str,
        now: DateTime<Utc>,
    ) -> Result<(PlaygroundId, PathBuf), PlaygroundError> {
        let existing = self.store().read_all()?;
        let repos = self.store().repos_dir();
        let candidate = naming::timestamped(base, now);
        loop {
            let id = naming::first_free(&candidate, |c| {
                existing.iter().any(|r| r.id().as_str() == c) || repos.join(c).exists()
            });
            let dir = repos.join(&id);
            match fs::create_dir(&dir) {
                Ok(()) => return Ok((PlaygroundId::from(id), dir)),
                Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(io_err(&dir, err)),
            }
        }
    }
}

fn is_clone_url(url: &str) -> bool {
    !url.is_empty() && (url.starts_with("http://") || url.starts_with("https://") || url.contains(':'))
}
