//! `playground docker installed|stop|rm`

use anyhow::{bail, Result};
use clap::Subcommand;

use playground_daemon::DaemonRequest;

#[derive(Subcommand, Debug)]
pub enum DockerCommand {
    /// Check whether the container runtime resolves; exits non-zero if not.
    Installed,
    /// Stop a container by runtime id.
    Stop { container_id: String },
    /// Remove a container by runtime id.
    Rm { container_id: String },
}

pub fn run(command: DockerCommand) -> Result<()> {
    let home = super::home()?;
    match command {
        DockerCommand::Installed => {
            let data = super::call(&home, DaemonRequest::DockerInstalled)?;
            if data["installed"].as_bool() != Some(true) {
                bail!("container runtime not found");
            }
            println!("container runtime available");
        }
        DockerCommand::Stop { container_id } => {
            super::call(
                &home,
                DaemonRequest::DockerStop {
                    container_id: container_id.clone(),
                },
            )?;
            println!("stopped {container_id}");
        }
        DockerCommand::Rm { container_id } => {
            super::call(
                &home,
                DaemonRequest::DockerRemove {
                    container_id: container_id.clone(),
                },
            )?;
            println!("removed {container_id}");
        }
    }
    Ok(())
}
