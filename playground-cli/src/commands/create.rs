//! `playground create repo|container`

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use playground_core::{ContainerPlayground, RepoPlayground};
use playground_daemon::DaemonRequest;
use playground_lifecycle::NewContainer;

#[derive(Subcommand, Debug)]
pub enum CreateCommand {
    /// Shallow-clone a git URL into a new playground.
    Repo(RepoArgs),
    /// Pull an image and start it detached.
    Container(ContainerArgs),
}

#[derive(Args, Debug)]
pub struct RepoArgs {
    /// Clone URL (https://, http:// or scp-style).
    pub url: String,

    /// Dev command to store with the playground.
    #[arg(long = "run", value_name = "CMD")]
    pub run_command: Option<String>,

    /// Port the dev command should listen on (exported as PORT).
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Args, Debug)]
pub struct ContainerArgs {
    /// Image reference, e.g. `nginx:latest`.
    pub image: String,

    /// Publish this port on the host (same number inside).
    #[arg(long)]
    pub port: Option<u16>,

    /// Extra `run` arguments as one shell-quoted string.
    #[arg(long = "args", value_name = "ARGS", allow_hyphen_values = true)]
    pub extra_args: Option<String>,
}

pub fn run(command: CreateCommand) -> Result<()> {
    let home = super::home()?;
    match command {
        CreateCommand::Repo(args) => {
            let record: RepoPlayground = super::call_as(
                &home,
                DaemonRequest::CreateRepo {
                    repo_url: args.url,
                    run_command: args.run_command,
                    port: args.port,
                },
            )?;
            println!("created {}", record.id.to_string().bold());
            println!("  path: {}", record.path.display());
        }
        CreateCommand::Container(args) => {
            let record: ContainerPlayground = super::call_as(
                &home,
                DaemonRequest::CreateContainer(NewContainer {
                    image: args.image,
                    port: args.port,
                    extra_args: args.extra_args,
                }),
            )?;
            println!("created {}", record.id.to_string().bold());
            println!("  container: {}", record.container_id);
        }
    }
    Ok(())
}
