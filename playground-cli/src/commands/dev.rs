//! `playground dev start|stop|log|run`
//!
//! `start`, `stop` and `log` talk to the daemon, which owns the supervised
//! processes. `run` supervises in this process and stays in the foreground.

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use tokio::sync::broadcast::error::RecvError;

use playground_core::{DevLog, PlaygroundId};
use playground_daemon::{send_request, subscribe, DaemonError, DaemonRequest};
use playground_lifecycle::Playgrounds;
use playground_supervisor::{DevEvent, StartOutcome};

#[derive(Subcommand, Debug)]
pub enum DevCommand {
    /// Start the dev command in the daemon.
    Start {
        id: String,
        /// Run this instead of the stored or detected command.
        #[arg(long)]
        command: Option<String>,
    },
    /// Stop the running dev command.
    Stop { id: String },
    /// Print the captured output.
    Log {
        id: String,
        /// Keep streaming until the command exits.
        #[arg(long, short)]
        follow: bool,
    },
    /// Run the dev command in the foreground until it exits or ctrl-c.
    Run {
        id: String,
        #[arg(long)]
        command: Option<String>,
    },
}

pub fn run(command: DevCommand) -> Result<()> {
    let home = super::home()?;
    match command {
        DevCommand::Start { id, command } => {
            let data = super::call_daemon(
                &home,
                DaemonRequest::DevStart {
                    id: PlaygroundId::from(id.as_str()),
                    command,
                },
            )?;
            let outcome: StartOutcome =
                serde_json::from_value(data).context("unexpected start response")?;
            let pid = outcome
                .pid
                .map_or_else(|| "?".to_string(), |p| p.to_string());
            if outcome.already_running {
                println!("{id} already running (pid {pid}): {}", outcome.command);
            } else {
                println!("{id} started (pid {pid}): {}", outcome.command);
            }
        }
        DevCommand::Stop { id } => {
            let data = super::call_daemon(
                &home,
                DaemonRequest::DevStop {
                    id: PlaygroundId::from(id.as_str()),
                },
            )?;
            if data["stopped"].as_bool() == Some(true) {
                println!("stop requested for {id}");
            } else {
                println!("{id} is not running");
            }
        }
        DevCommand::Log { id, follow: false } => {
            let data = super::call_daemon(
                &home,
                DaemonRequest::DevLog {
                    id: PlaygroundId::from(id),
                },
            )?;
            let log: DevLog = serde_json::from_value(data).context("unexpected log response")?;
            print!("{}", log.log);
        }
        DevCommand::Log { id, follow: true } => follow(&home, &PlaygroundId::from(id))?,
        DevCommand::Run { id, command } => {
            ensure_no_daemon(&home, &id)?;
            let playgrounds =
                Playgrounds::open(&home).context("failed to load playground settings")?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("failed to build async runtime")?;
            runtime.block_on(foreground(playgrounds, PlaygroundId::from(id), command))?;
        }
    }
    Ok(())
}

/// Refuse foreground supervision while a daemon owns dev commands.
fn ensure_no_daemon(home: &Path, id: &str) -> Result<()> {
    match send_request(home, &DaemonRequest::Status) {
        Ok(_) => bail!(
            "daemon is running; use `playground dev start {id}` and `playground dev log {id} --follow`"
        ),
        Err(DaemonError::DaemonNotRunning { .. }) => Ok(()),
        Err(err) => Err(err).context("failed to query daemon status"),
    }
}

fn follow(home: &Path, id: &PlaygroundId) -> Result<()> {
    let subscription = match subscribe(home, Some(id)) {
        Ok(subscription) => subscription,
        Err(DaemonError::DaemonNotRunning { .. }) => {
            bail!("daemon is not running; start it with `playground daemon start`")
        }
        Err(err) => return Err(err).context("failed to subscribe to dev output"),
    };
    let snapshot: DevLog = serde_json::from_value(subscription.snapshot.clone())
        .context("unexpected log snapshot")?;

    let mut stdout = std::io::stdout();
    print!("{}", snapshot.log);
    stdout.flush().context("failed to write output")?;
    if !snapshot.running {
        return Ok(());
    }

    for event in subscription {
        match event.context("dev output stream failed")? {
            DevEvent::Log { chunk, .. } => {
                print!("{chunk}");
                stdout.flush().context("failed to write output")?;
            }
            DevEvent::Exit { .. } => break,
        }
    }
    Ok(())
}

async fn foreground(
    playgrounds: Playgrounds,
    id: PlaygroundId,
    command: Option<String>,
) -> Result<()> {
    let supervisor = playgrounds.supervisor();
    let mut events = supervisor.subscribe();
    supervisor.start(&id, command.as_deref()).await?;

    let mut stdout = std::io::stdout();
    let mut interrupted = false;
    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(DevEvent::Log { id: got, chunk }) if got == id => {
                    print!("{chunk}");
                    stdout.flush().context("failed to write output")?;
                }
                Ok(DevEvent::Exit { id: got, code, .. }) if got == id => {
                    if interrupted || code == Some(0) {
                        return Ok(());
                    }
                    bail!("dev command for {id} exited unsuccessfully");
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    eprintln!("[{skipped} output chunks skipped]");
                }
                Err(RecvError::Closed) => return Ok(()),
            },
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                supervisor.stop(&id);
            }
        }
    }
}
