//! `playground open editor|terminal|root`

use anyhow::Result;
use clap::Subcommand;

use playground_core::PlaygroundId;
use playground_daemon::DaemonRequest;

#[derive(Subcommand, Debug)]
pub enum OpenCommand {
    /// Open the clone in the configured editor.
    Editor { id: String },
    /// Open a terminal in the clone directory.
    Terminal { id: String },
    /// Open a terminal in the playgrounds base directory.
    Root,
}

pub fn run(command: OpenCommand) -> Result<()> {
    let home = super::home()?;
    let request = match command {
        OpenCommand::Editor { id } => DaemonRequest::OpenEditor {
            id: PlaygroundId::from(id),
        },
        OpenCommand::Terminal { id } => DaemonRequest::OpenTerminal {
            id: PlaygroundId::from(id),
        },
        OpenCommand::Root => DaemonRequest::OpenRoot,
    };
    super::call(&home, request)?;
    Ok(())
}
