//! `playground list`

use anyhow::{Context, Result};
use chrono::Local;
use clap::Args;
use tabled::{settings::Style, Table, Tabled};

use playground_core::{PlaygroundRecord, PlaygroundView};
use playground_daemon::DaemonRequest;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct PlaygroundRow {
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "type")]
    kind: &'static str,
    #[tabled(rename = "source")]
    source: String,
    #[tabled(rename = "port")]
    port: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "created")]
    created: String,
}

impl ListArgs {
    pub fn run(self) -> Result<()> {
        let home = super::home()?;
        let views: Vec<PlaygroundView> = super::call_as(&home, DaemonRequest::List)?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&views).context("failed to serialize list JSON")?
            );
            return Ok(());
        }

        if views.is_empty() {
            println!("No playgrounds yet.");
            println!("Run: playground create repo <url>");
            return Ok(());
        }

        let rows: Vec<PlaygroundRow> = views.iter().map(row).collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}

fn row(view: &PlaygroundView) -> PlaygroundRow {
    let (kind, source) = match &view.record {
        PlaygroundRecord::Repo(r) => ("repo", r.repo_url.clone()),
        PlaygroundRecord::Container(c) => ("container", c.image.clone()),
    };
    PlaygroundRow {
        id: view.record.id().to_string(),
        kind,
        source,
        port: view
            .record
            .port()
            .map_or_else(|| "-".to_string(), |p| p.to_string()),
        status: view
            .status
            .map_or_else(|| "-".to_string(), |s| s.to_string()),
        created: view
            .record
            .created_at()
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
    }
}
