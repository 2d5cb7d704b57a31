//! `playground delete <id>` and `playground paths`

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use playground_core::PlaygroundId;
use playground_daemon::DaemonRequest;
use playground_lifecycle::{DeleteReport, PathsInfo, StepOutcome};

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Playground id, as shown by `playground list`.
    pub id: String,
}

impl DeleteArgs {
    pub fn run(self) -> Result<()> {
        let home = super::home()?;
        let report: DeleteReport = super::call_as(
            &home,
            DaemonRequest::Delete {
                id: PlaygroundId::from(self.id),
            },
        )?;

        for step in &report.steps {
            let outcome = match &step.outcome {
                StepOutcome::Done => "done".green().to_string(),
                StepOutcome::Skipped { reason } => format!("{} ({reason})", "skipped".bright_black()),
                StepOutcome::Failed { error } => format!("{}: {error}", "failed".red()),
            };
            println!("  {:<18} {outcome}", step.step);
        }
        println!("deleted {}", report.id.to_string().bold());
        Ok(())
    }
}

pub fn paths() -> Result<()> {
    let home = super::home()?;
    let paths: PathsInfo = super::call_as(&home, DaemonRequest::Paths)
        .context("failed to resolve playground paths")?;
    println!("base:     {}", paths.base_dir.display());
    println!("clones:   {}", paths.repos_dir.display());
    println!("metadata: {}", paths.meta_path.display());
    println!("catalog:  {}", paths.catalog_dir.display());
    Ok(())
}
