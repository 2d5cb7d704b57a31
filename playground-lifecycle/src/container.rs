//! Container-backed playgrounds.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use playground_core::{tools, ContainerPlayground, PlaygroundError, PlaygroundId, PlaygroundRecord};

use crate::cleanup::{best_effort, DeleteReport};
use crate::naming;
use crate::service::Playgrounds;

/// Parameters of [`Playgrounds::create_container`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContainer {
    pub image: String,
    #[serde(default)]
    pub port: Option<u16>,
    /// Extra `run` arguments as one shell-style string, e.g. `-e A=1 --rm`.
    #[serde(default)]
    pub extra_args: Option<String>,
}

impl Playgrounds {
    /// Whether the configured container runtime resolves.
    pub fn runtime_available(&self) -> bool {
        tools::is_available(&self.config().tools.container_runtime)
    }

    /// Pull `new.image`, start it detached, and record the container.
    pub fn create_container(
        &self,
        new: NewContainer,
    ) -> Result<ContainerPlayground, PlaygroundError> {
        let runtime = tools::resolve(&self.config().tools.container_runtime)?;
        let image = new.image.trim();
        if image.is_empty() {
            return Err(PlaygroundError::Validation("image is required".to_string()));
        }
        let extra = match new.extra_args.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => shell_words::split(raw).map_err(|e| {
                PlaygroundError::Validation(format!("invalid extra arguments {raw:?}: {e}"))
            })?,
            _ => Vec::new(),
        };

        tracing::info!(image, "pulling image");
        tools::run(&runtime, ["pull", image], None)?;

        let mut args = vec!["run".to_string(), "-d".to_string()];
        if let Some(port) = new.port {
            args.push("-p".to_string());
            args.push(format!("{port}:{port}"));
        }
        args.extend(extra);
        args.push(image.to_string());
        let out = tools::run(&runtime, &args, None)?;
        let container_id = out.stdout.trim().to_string();

        let now = Utc::now();
        let existing = self.store().read_all()?;
        let id = naming::first_free(
            &naming::timestamped(&naming::container_base_name(image), now),
            |c| existing.iter().any(|r| r.id().as_str() == c),
        );
        let record = ContainerPlayground {
            id: PlaygroundId::from(id),
            image: image.to_string(),
            container_id,
            port: new.port,
            created_at: now,
        };
        tracing::info!(id = %record.id, container = %record.container_id, "container started");
        self.store().insert_front(record.clone().into())?;
        Ok(record)
    }

    pub fn stop_container(&self, container_id: &str) -> Result<(), PlaygroundError> {
        let runtime = tools::resolve(&self.config().tools.container_runtime)?;
        tools::run(&runtime, ["stop", container_id], None).map(|_| ())
    }

    pub fn remove_container(&self, container_id: &str) -> Result<(), PlaygroundError> {
        let runtime = tools::resolve(&self.config().tools.container_runtime)?;
        tools::run(&runtime, ["rm", container_id], None).map(|_| ())
    }

    /// Stop and remove the container independently, then drop the entry
    /// whatever the runtime said.
    pub fn delete_container(&self, id: &PlaygroundId) -> Result<DeleteReport, PlaygroundError> {
        let list = self.store().read_all()?;
        let container_id = list
            .iter()
            .find_map(|r| match r {
                PlaygroundRecord::Container(c) if &c.id == id => Some(c.container_id.clone()),
                _ => None,
            })
            .ok_or_else(|| PlaygroundError::not_found(id.as_str()))?;

        let mut report = DeleteReport::new(id.clone());
        best_effort(&mut report, "stop_container", || self.stop_container(&container_id));
        best_effort(&mut report, "remove_container", || {
            self.remove_container(&container_id)
        });

        self.remove_entry(list, id)?;
        tracing::info!(id = %id, failures = report.failures().count(), "container playground deleted");
        Ok(report)
    }
}
