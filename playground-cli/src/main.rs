//! Playground: disposable clone and container sandboxes.
//!
//! # Usage
//!
//! ```text
//! playground list [--json]
//! playground paths
//! playground create repo <url> [--run <cmd>] [--port <port>]
//! playground create container <image> [--port <port>] [--args <args>]
//! playground delete <id>
//! playground open editor|terminal <id>
//! playground open root
//! playground docker installed|stop <cid>|rm <cid>
//! playground dev start <id> [--command <cmd>]
//! playground dev stop <id>
//! playground dev log <id> [--follow]
//! playground dev run <id> [--command <cmd>]
//! playground catalog list [--json]
//! playground catalog install <app>
//! playground daemon start|stop|status
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    catalog::CatalogCommand, create::CreateCommand, daemon::DaemonCommand, dev::DevCommand,
    docker::DockerCommand, list::ListArgs, manage::DeleteArgs, open::OpenCommand,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "playground",
    version,
    about = "Create, run and throw away repository and container playgrounds",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List playgrounds, most recent first.
    List(ListArgs),

    /// Show where playground data lives.
    Paths,

    /// Create a playground from a git URL or a container image.
    Create {
        #[command(subcommand)]
        command: CreateCommand,
    },

    /// Delete a playground and everything it owns.
    Delete(DeleteArgs),

    /// Open a playground in an editor or a terminal.
    Open {
        #[command(subcommand)]
        command: OpenCommand,
    },

    /// Container runtime helpers.
    Docker {
        #[command(subcommand)]
        command: DockerCommand,
    },

    /// Run, stop and inspect dev commands.
    Dev {
        #[command(subcommand)]
        command: DevCommand,
    },

    /// Browse and install apps from the catalog.
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },

    /// Run or control the background daemon.
    Daemon {
        #[command(subcommand)]
        command: DaemonCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    // The daemon installs its own subscriber.
    if !matches!(
        cli.command,
        Commands::Daemon {
            command: DaemonCommand::Start
        }
    ) {
        init_tracing();
    }

    match cli.command {
        Commands::List(args) => args.run(),
        Commands::Paths => commands::manage::paths(),
        Commands::Create { command } => commands::create::run(command),
        Commands::Delete(args) => args.run(),
        Commands::Open { command } => commands::open::run(command),
        Commands::Docker { command } => commands::docker::run(command),
        Commands::Dev { command } => commands::dev::run(command),
        Commands::Catalog { command } => commands::catalog::run(command),
        Commands::Daemon { command } => commands::daemon::run(command),
    }
}

/// Diagnostics go to stderr, filtered by `PLAYGROUND_LOG` (default `warn`).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_env("PLAYGROUND_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
